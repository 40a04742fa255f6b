//! Destinations for emitted records.

use meminfo_error::Result;

use crate::record::RegionRecord;

/// Receives each completed region exactly once, in stream order.
///
/// An error from the sink aborts the run.
pub trait RegionSink {
    fn emit(&mut self, record: RegionRecord) -> Result<()>;
}

impl RegionSink for Vec<RegionRecord> {
    fn emit(&mut self, record: RegionRecord) -> Result<()> {
        self.push(record);
        Ok(())
    }
}

/// Adapts a closure into a [`RegionSink`].
pub struct FnSink<F>(pub F);

impl<F> RegionSink for FnSink<F>
where
    F: FnMut(RegionRecord) -> Result<()>,
{
    fn emit(&mut self, record: RegionRecord) -> Result<()> {
        (self.0)(record)
    }
}
