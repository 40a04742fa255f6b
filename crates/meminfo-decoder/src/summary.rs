//! Per-stream totals over integer slots.

use std::collections::BTreeMap;

use meminfo_error::Result;
use meminfo_symtab::SlotId;
use serde::Serialize;

use crate::record::{RegionRecord, StreamId};
use crate::sink::RegionSink;

/// Sum of every integer slot across one stream's regions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegionSummary {
    pub identity: StreamId,
    pub regions: u64,
    totals: Vec<i64>,
}

impl RegionSummary {
    #[must_use]
    pub fn new(identity: StreamId, slot_count: usize) -> Self {
        Self {
            identity,
            regions: 0,
            totals: vec![0; slot_count],
        }
    }

    pub fn absorb(&mut self, record: &RegionRecord) {
        self.regions += 1;
        for (slot, value) in record.populated() {
            if let (Some(total), Some(value)) =
                (self.totals.get_mut(slot.index()), value.as_integer())
            {
                *total += i64::from(value);
            }
        }
    }

    /// Total for `slot`; zero for text or unknown slots.
    #[must_use]
    pub fn total(&self, slot: SlotId) -> i64 {
        self.totals.get(slot.index()).copied().unwrap_or(0)
    }
}

/// Sink that folds records into one [`RegionSummary`] per identity.
#[derive(Debug, Clone, Default)]
pub struct SummarySink {
    slot_count: usize,
    summaries: BTreeMap<StreamId, RegionSummary>,
}

impl SummarySink {
    #[must_use]
    pub const fn new(slot_count: usize) -> Self {
        Self {
            slot_count,
            summaries: BTreeMap::new(),
        }
    }

    /// Summaries ordered by identity.
    #[must_use]
    pub fn into_summaries(self) -> Vec<RegionSummary> {
        self.summaries.into_values().collect()
    }
}

impl RegionSink for SummarySink {
    fn emit(&mut self, record: RegionRecord) -> Result<()> {
        let slot_count = self.slot_count;
        self.summaries
            .entry(record.identity())
            .or_insert_with(|| RegionSummary::new(record.identity(), slot_count))
            .absorb(&record);
        Ok(())
    }
}
