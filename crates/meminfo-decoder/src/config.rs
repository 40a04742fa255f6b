//! Decoder configuration.

use meminfo_error::{MeminfoError, Result};
use meminfo_symtab::DEFAULT_TABLE_CAPACITY;
use serde::{Deserialize, Serialize};

use crate::field_line::{MAX_KEY_LEN, is_key_char};

/// Terminator key of the smaps format.
pub const DEFAULT_TERMINATOR_KEY: &str = "VmFlags";

/// Run-wide decoder settings. Every field has a default, so a JSON config
/// file may set only what it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DecoderConfig {
    /// Field key whose line closes a region.
    pub terminator_key: String,
    /// Symbol table bucket count.
    pub table_capacity: usize,
    /// Stop each stream after this many lines (external read limit).
    pub max_lines_per_stream: Option<u64>,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            terminator_key: DEFAULT_TERMINATOR_KEY.to_owned(),
            table_capacity: DEFAULT_TABLE_CAPACITY,
            max_lines_per_stream: None,
        }
    }
}

impl DecoderConfig {
    /// Parse and validate a JSON config document.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)
            .map_err(|err| MeminfoError::config(format!("config JSON: {err}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let key = self.terminator_key.as_str();
        if key.is_empty() || key.len() > MAX_KEY_LEN || !key.bytes().all(is_key_char) {
            return Err(MeminfoError::config(format!(
                "terminator_key `{key}` must be 1..={MAX_KEY_LEN} characters of [A-Za-z0-9_]"
            )));
        }
        if self.table_capacity < 2 {
            return Err(MeminfoError::config(format!(
                "table_capacity {} must be at least 2",
                self.table_capacity
            )));
        }
        if self.max_lines_per_stream == Some(0) {
            return Err(MeminfoError::config("max_lines_per_stream must be positive"));
        }
        Ok(())
    }
}
