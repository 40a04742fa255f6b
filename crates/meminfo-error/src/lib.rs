//! Error type shared by the symbol table, the block decoder and the CLI.
//!
//! Only a few variants are fatal to a whole run: table setup failures,
//! bad configuration and sink write failures. Everything scoped to one
//! stream (unavailable stream, malformed header) is contained by the scan
//! driver and surfaces as a counter or a stop reason instead.

use std::io;

use thiserror::Error;

/// Primary error type for all meminfo operations.
#[derive(Debug, Error)]
pub enum MeminfoError {
    /// Symbol table bucket storage could not be reserved.
    #[error("could not allocate symbol lookup table with {capacity} buckets")]
    Allocation { capacity: usize },

    /// Capacity too small for a usable probe bound.
    #[error("symbol table capacity {capacity} is too small (need at least 2 buckets)")]
    InvalidCapacity { capacity: usize },

    /// An insert ran past the probe bound without finding a free bucket.
    #[error(
        "symbol table full inserting `{key}`: no free bucket within {probe_bound} probes of {capacity}"
    )]
    TableFull {
        key: String,
        capacity: usize,
        probe_bound: usize,
    },

    /// A stream could not be opened (the producer may have exited).
    #[error("stream {identity} unavailable: {source}")]
    StreamUnavailable {
        identity: u64,
        #[source]
        source: io::Error,
    },

    /// A header line did not match the region header grammar.
    #[error("malformed region header at line {line_number}: {line:?}")]
    MalformedHeader { line_number: u64, line: String },

    /// Read fault or sink write failure.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Invalid decoder configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Invariant violation inside the crate.
    #[error("internal error: {0}")]
    Internal(String),
}

impl MeminfoError {
    /// Build an [`MeminfoError::Internal`] from any message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Build a [`MeminfoError::Config`] from any message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether this error aborts the whole run rather than one stream.
    #[must_use]
    pub const fn is_fatal_to_run(&self) -> bool {
        !matches!(
            self,
            Self::StreamUnavailable { .. } | Self::MalformedHeader { .. }
        )
    }
}

/// Convenience alias used across the workspace.
pub type Result<T> = std::result::Result<T, MeminfoError>;
