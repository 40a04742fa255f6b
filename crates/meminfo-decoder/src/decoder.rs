//! Two-state block decoder.
//!
//! `AwaitingHeader` parses the header grammar and opens a region;
//! `InRegion` stores recognized field lines until the terminator key
//! hands the record to the sink. A region still open when input stops is
//! dropped, never emitted.

use std::io::BufRead;

use meminfo_error::Result;
use tracing::{debug, warn};

use crate::catalog::FieldCatalog;
use crate::field_line::parse_field_line;
use crate::header::parse_header;
use crate::record::{RegionRecord, StreamId};
use crate::sink::RegionSink;

/// Why decoding of one stream ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Input exhausted.
    EndOfStream,
    /// An empty line ends the parsable content.
    EmptyLine { line_number: u64 },
    /// A line in header position did not match the header grammar.
    MalformedHeader { line_number: u64 },
    /// The reader failed mid-stream.
    ReadFault { line_number: u64 },
    /// The caller's per-stream line limit was reached.
    LineLimit { limit: u64 },
}

impl StopReason {
    /// Whether decoding halted before the input was exhausted.
    #[must_use]
    pub const fn is_halt(self) -> bool {
        matches!(self, Self::MalformedHeader { .. } | Self::ReadFault { .. })
    }
}

/// Observable decoder state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderPhase {
    AwaitingHeader,
    InRegion,
}

/// Effect of feeding one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStep {
    /// A header opened a region.
    Opened,
    /// A field line was matched and stored (or its key was unknown).
    Field,
    /// The line matched no field grammar and was skipped.
    Ignored,
    /// The terminator closed a region and the record went to the sink.
    Emitted,
    /// Decoding of this stream must stop.
    Stop(StopReason),
}

#[derive(Debug)]
enum State {
    AwaitingHeader,
    InRegion(RegionRecord),
}

/// Per-stream decoding state.
#[derive(Debug)]
pub struct StreamDecoder<'c> {
    catalog: &'c FieldCatalog,
    identity: StreamId,
    state: State,
    lines: u64,
    emitted: u64,
}

impl<'c> StreamDecoder<'c> {
    #[must_use]
    pub const fn new(catalog: &'c FieldCatalog, identity: StreamId) -> Self {
        Self {
            catalog,
            identity,
            state: State::AwaitingHeader,
            lines: 0,
            emitted: 0,
        }
    }

    #[must_use]
    pub const fn phase(&self) -> DecoderPhase {
        match self.state {
            State::AwaitingHeader => DecoderPhase::AwaitingHeader,
            State::InRegion(_) => DecoderPhase::InRegion,
        }
    }

    /// Lines fed so far.
    #[must_use]
    pub const fn lines(&self) -> u64 {
        self.lines
    }

    /// Records handed to the sink so far.
    #[must_use]
    pub const fn emitted(&self) -> u64 {
        self.emitted
    }

    /// Feed one line (line terminator already stripped).
    ///
    /// Only sink failures are errors.
    pub fn feed_line<S>(&mut self, line: &[u8], sink: &mut S) -> Result<LineStep>
    where
        S: RegionSink + ?Sized,
    {
        self.lines += 1;
        let line_number = self.lines;

        if line.is_empty() {
            return Ok(LineStep::Stop(StopReason::EmptyLine { line_number }));
        }

        let record = match &mut self.state {
            State::AwaitingHeader => {
                let Some(header) = parse_header(line) else {
                    return Ok(LineStep::Stop(StopReason::MalformedHeader { line_number }));
                };
                self.state = State::InRegion(RegionRecord::new(
                    self.identity,
                    header,
                    self.catalog.slot_count(),
                ));
                return Ok(LineStep::Opened);
            }
            State::InRegion(record) => record,
        };

        let Some(field) = parse_field_line(line) else {
            return Ok(LineStep::Ignored);
        };
        if let (Some(slot), Some(value)) = (self.catalog.lookup(field.key).slot(), field.value) {
            record.set(slot, value);
        }
        if !self.catalog.is_terminator(field.key) {
            return Ok(LineStep::Field);
        }

        if let State::InRegion(record) = std::mem::replace(&mut self.state, State::AwaitingHeader) {
            sink.emit(record)?;
            self.emitted += 1;
        }
        Ok(LineStep::Emitted)
    }

    /// End the stream, returning whether an open region was discarded.
    #[must_use]
    pub fn finish(self) -> bool {
        matches!(self.state, State::InRegion(_))
    }
}

/// Summary of one decoded stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOutcome {
    pub records_emitted: u64,
    pub lines_read: u64,
    pub stop: StopReason,
    /// An open region was dropped because input stopped before its terminator.
    pub discarded_partial_region: bool,
}

/// Decode one stream to completion, or to its first fatal fault.
///
/// Malformed headers, read faults and the line limit stop this stream
/// only; records already emitted stay emitted. Sink failures propagate.
pub fn decode_stream<R, S>(
    catalog: &FieldCatalog,
    identity: StreamId,
    mut reader: R,
    line_limit: Option<u64>,
    sink: &mut S,
) -> Result<DecodeOutcome>
where
    R: BufRead,
    S: RegionSink + ?Sized,
{
    debug!(identity = %identity, ?line_limit, "decoding stream");
    let mut decoder = StreamDecoder::new(catalog, identity);
    let mut buf = Vec::with_capacity(256);

    let stop = loop {
        if let Some(limit) = line_limit {
            if decoder.lines() >= limit {
                break StopReason::LineLimit { limit };
            }
        }

        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break StopReason::EndOfStream,
            Ok(_) => {}
            Err(err) => {
                let line_number = decoder.lines() + 1;
                warn!(
                    identity = %identity,
                    line_number,
                    error = %err,
                    "read fault, stopping stream"
                );
                break StopReason::ReadFault { line_number };
            }
        }

        if let LineStep::Stop(reason) = decoder.feed_line(strip_terminator(&buf), sink)? {
            if let StopReason::MalformedHeader { line_number } = reason {
                warn!(
                    identity = %identity,
                    line_number,
                    line = %String::from_utf8_lossy(strip_terminator(&buf)),
                    "malformed region header, stopping stream"
                );
            }
            break reason;
        }
    };

    let records_emitted = decoder.emitted();
    let lines_read = decoder.lines();
    let discarded_partial_region = decoder.finish();
    if discarded_partial_region {
        debug!(identity = %identity, lines_read, "dropped unterminated region");
    }
    debug!(
        identity = %identity,
        records_emitted,
        lines_read,
        stop = ?stop,
        "decoded stream"
    );

    Ok(DecodeOutcome {
        records_emitted,
        lines_read,
        stop,
        discarded_partial_region,
    })
}

fn strip_terminator(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::FieldValue;
    use meminfo_symtab::SlotId;

    const RSS: SlotId = SlotId(0);
    const PSS: SlotId = SlotId(1);
    const VM_FLAGS: SlotId = SlotId(2);

    fn catalog() -> FieldCatalog {
        FieldCatalog::new(
            [("Rss", RSS), ("Pss", PSS), ("VmFlags", VM_FLAGS)],
            "VmFlags",
            64,
        )
        .expect("catalog")
    }

    fn decode(input: &str) -> (Vec<RegionRecord>, DecodeOutcome) {
        let catalog = catalog();
        let mut records = Vec::new();
        let outcome = decode_stream(&catalog, StreamId(1), input.as_bytes(), None, &mut records)
            .expect("vec sink never fails");
        (records, outcome)
    }

    #[test]
    fn test_single_region_emitted() {
        let catalog = catalog();
        let mut records = Vec::new();
        let mut decoder = StreamDecoder::new(&catalog, StreamId(9));

        let header = b"00400000-00452000 r-xp 00000000 08:02 173521 /usr/bin/dbus-daemon";
        assert_eq!(decoder.feed_line(header, &mut records).expect("feed"), LineStep::Opened);
        assert_eq!(decoder.phase(), DecoderPhase::InRegion);
        assert_eq!(decoder.feed_line(b"Rss: 120", &mut records).expect("feed"), LineStep::Field);
        assert_eq!(
            decoder.feed_line(b"VmFlags: rd wr", &mut records).expect("feed"),
            LineStep::Emitted
        );
        assert_eq!(decoder.phase(), DecoderPhase::AwaitingHeader);
        assert!(!decoder.finish());

        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.identity(), StreamId(9));
        assert_eq!(record.value(RSS), Some(&FieldValue::Integer(120)));
        assert_eq!(record.text(VM_FLAGS), Some("rd wr"));
        assert_eq!(record.integer(PSS), 0);
    }

    #[test]
    fn test_header_only_stream_emits_nothing() {
        let (records, outcome) = decode("00400000-00452000 r-xp 00000000 08:02 173521\n");
        assert!(records.is_empty());
        assert_eq!(outcome.stop, StopReason::EndOfStream);
        assert!(outcome.discarded_partial_region);
    }

    #[test]
    fn test_unterminated_region_dropped_after_fields() {
        let mut input = String::from("1000-2000 rw-p 00000000 00:00 0\n");
        for i in 0..10 {
            input.push_str(&format!("Rss: {i}\n"));
        }
        let (records, outcome) = decode(&input);
        assert!(records.is_empty());
        assert_eq!(outcome.lines_read, 11);
        assert!(outcome.discarded_partial_region);
    }

    #[test]
    fn test_malformed_header_keeps_prior_records() {
        let input = "1000-2000 rw-p 00000000 00:00 0\nRss: 4 kB\nVmFlags: rd\nnot a header\n3000-4000 rw-p 00000000 00:00 0\nVmFlags: rd\n";
        let (records, outcome) = decode(input);
        assert_eq!(records.len(), 1);
        assert_eq!(outcome.stop, StopReason::MalformedHeader { line_number: 4 });
        assert!(outcome.stop.is_halt());
        assert!(!outcome.discarded_partial_region);
    }

    #[test]
    fn test_empty_line_stops() {
        let input = "1000-2000 rw-p 00000000 00:00 0\nVmFlags: rd\n\n3000-4000 rw-p 00000000 00:00 0\nVmFlags: rd\n";
        let (records, outcome) = decode(input);
        assert_eq!(records.len(), 1);
        assert_eq!(outcome.stop, StopReason::EmptyLine { line_number: 3 });
    }

    #[test]
    fn test_unknown_and_unmatched_lines_skipped() {
        let input = "1000-2000 rw-p 00000000 00:00 0\nProtectionKey: 0\n??? garbage\nPss: 8 kB\nVmFlags: rd wr\n";
        let (records, outcome) = decode(input);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].integer(PSS), 8);
        assert_eq!(records[0].populated().count(), 2);
        assert_eq!(outcome.stop, StopReason::EndOfStream);
    }

    #[test]
    fn test_terminator_without_value_still_emits() {
        let (records, _) = decode("1000-2000 rw-p 00000000 00:00 0\nVmFlags:\n");
        assert_eq!(records.len(), 1);
        assert!(records[0].value(VM_FLAGS).is_none());
    }

    #[test]
    fn test_crlf_lines() {
        let (records, _) = decode("1000-2000 rw-p 00000000 00:00 0\r\nRss: 3 kB\r\nVmFlags: rd\r\n");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].integer(RSS), 3);
    }

    #[test]
    fn test_no_stale_fields_between_regions() {
        let input = "1000-2000 rw-p 00000000 00:00 0\nRss: 5\nVmFlags: rd\n3000-4000 rw-p 00000000 00:00 0\nVmFlags: wr\n";
        let (records, _) = decode(input);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].integer(RSS), 5);
        assert!(records[1].value(RSS).is_none());
    }

    #[test]
    fn test_line_limit() {
        let catalog = catalog();
        let mut records = Vec::new();
        let input = "1000-2000 rw-p 00000000 00:00 0\nVmFlags: rd\n3000-4000 rw-p 00000000 00:00 0\nVmFlags: rd\n";
        let outcome = decode_stream(&catalog, StreamId(1), input.as_bytes(), Some(3), &mut records)
            .expect("decode");
        assert_eq!(records.len(), 1);
        assert_eq!(outcome.stop, StopReason::LineLimit { limit: 3 });
        assert!(outcome.discarded_partial_region);
    }

    #[test]
    fn test_sink_error_propagates() {
        let catalog = catalog();
        let mut sink =
            crate::sink::FnSink(|_record: RegionRecord| -> meminfo_error::Result<()> {
                Err(meminfo_error::MeminfoError::internal("sink closed"))
            });
        let err = decode_stream(
            &catalog,
            StreamId(1),
            "1000-2000 rw-p 00000000 00:00 0\nVmFlags: rd\n".as_bytes(),
            None,
            &mut sink,
        )
        .expect_err("sink failure is fatal");
        assert!(err.is_fatal_to_run());
    }
}
