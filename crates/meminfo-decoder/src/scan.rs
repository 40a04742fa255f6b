//! Multi-stream driver.
//!
//! Streams are decoded one after another against a shared catalog. A stream
//! that cannot be opened contributes zero records; a stream that halts on a
//! malformed header keeps what it already emitted. Neither stops the run.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use meminfo_error::{MeminfoError, Result};
use serde::Serialize;
use tracing::{debug, info};

use crate::catalog::FieldCatalog;
use crate::config::DecoderConfig;
use crate::decoder::{DecodeOutcome, decode_stream};
use crate::record::StreamId;
use crate::sink::RegionSink;

/// Counters for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    pub streams: u64,
    pub streams_unavailable: u64,
    pub streams_halted: u64,
    pub records_emitted: u64,
    pub partial_regions_discarded: u64,
}

impl ScanReport {
    fn absorb(&mut self, outcome: &DecodeOutcome) {
        self.records_emitted += outcome.records_emitted;
        if outcome.stop.is_halt() {
            self.streams_halted += 1;
        }
        if outcome.discarded_partial_region {
            self.partial_regions_discarded += 1;
        }
    }
}

/// Runs the block decoder over a sequence of streams.
#[derive(Debug, Clone, Copy)]
pub struct ScanDriver<'c> {
    catalog: &'c FieldCatalog,
    line_limit: Option<u64>,
}

impl<'c> ScanDriver<'c> {
    #[must_use]
    pub const fn new(catalog: &'c FieldCatalog, config: &DecoderConfig) -> Self {
        Self {
            catalog,
            line_limit: config.max_lines_per_stream,
        }
    }

    /// Decode one already-open stream.
    pub fn scan_reader<R, S>(
        &self,
        identity: StreamId,
        reader: R,
        sink: &mut S,
    ) -> Result<DecodeOutcome>
    where
        R: BufRead,
        S: RegionSink + ?Sized,
    {
        decode_stream(self.catalog, identity, reader, self.line_limit, sink)
    }

    /// Open and decode each unit in order.
    ///
    /// `open` failures count as unavailable streams. Only sink failures
    /// end the run early.
    pub fn scan<I, F, R, S>(&self, units: I, sink: &mut S) -> Result<ScanReport>
    where
        I: IntoIterator<Item = (StreamId, F)>,
        F: FnOnce() -> io::Result<R>,
        R: BufRead,
        S: RegionSink + ?Sized,
    {
        let mut report = ScanReport::default();

        for (identity, open) in units {
            report.streams += 1;
            let reader = match open() {
                Ok(reader) => reader,
                Err(source) => {
                    let err = MeminfoError::StreamUnavailable {
                        identity: identity.0,
                        source,
                    };
                    debug!(identity = %identity, error = %err, "skipping stream");
                    report.streams_unavailable += 1;
                    continue;
                }
            };
            let outcome = self.scan_reader(identity, reader, sink)?;
            report.absorb(&outcome);
        }

        info!(
            streams = report.streams,
            streams_unavailable = report.streams_unavailable,
            streams_halted = report.streams_halted,
            records_emitted = report.records_emitted,
            "scan finished"
        );
        Ok(report)
    }

    /// [`ScanDriver::scan`] over files on disk.
    pub fn scan_files<I, P, S>(&self, files: I, sink: &mut S) -> Result<ScanReport>
    where
        I: IntoIterator<Item = (StreamId, P)>,
        P: AsRef<Path>,
        S: RegionSink + ?Sized,
    {
        self.scan(
            files.into_iter().map(|(identity, path)| {
                (identity, move || File::open(path.as_ref()).map(BufReader::new))
            }),
            sink,
        )
    }
}
