//! Regional block decoder.
//!
//! Turns a repeating text stream of one header line followed by `key: value`
//! lines into fixed-shape [`RegionRecord`]s. Keys resolve to slots through a
//! preloaded [`meminfo_symtab::SymbolTable`] owned by a [`FieldCatalog`].
//!
//! ```text
//! 7f2c4a000000-7f2c4a021000 rw-p 00000000 00:00 0          [heap]
//! Size:                132 kB
//! Rss:                  12 kB
//! VmFlags: rd wr mr mw me ac sd
//! ```

pub mod catalog;
pub mod config;
mod cursor;
pub mod decoder;
pub mod field_line;
pub mod header;
pub mod record;
pub mod scan;
pub mod sink;
pub mod smaps;
pub mod summary;

pub use catalog::FieldCatalog;
pub use config::DecoderConfig;
pub use decoder::{DecodeOutcome, DecoderPhase, LineStep, StopReason, StreamDecoder, decode_stream};
pub use field_line::{FieldLine, parse_field_line};
pub use header::parse_header;
pub use record::{FieldValue, Permissions, RegionHeader, RegionRecord, StreamId};
pub use scan::{ScanDriver, ScanReport};
pub use sink::{FnSink, RegionSink};
pub use smaps::{SmapsField, smaps_path};
pub use summary::{RegionSummary, SummarySink};
