//! Closed field enumeration for one run.

use std::collections::HashMap;

use meminfo_error::{MeminfoError, Result};
use meminfo_symtab::{SlotId, SlotLookup, SymbolTable, symbol_hash};
use tracing::debug;

use crate::field_line::{MAX_KEY_LEN, is_key_char};

/// The caller's `(name, slot)` list, preloaded into a [`SymbolTable`],
/// plus the terminator key that closes each region.
///
/// Immutable after construction; share it by reference across streams.
#[derive(Debug, Clone)]
pub struct FieldCatalog {
    table: SymbolTable,
    names: Vec<Option<String>>,
    terminator: String,
}

impl FieldCatalog {
    /// Build the catalog and its symbol table.
    ///
    /// Rejects names that cannot appear as a field key, duplicate names,
    /// distinct names sharing a symbol hash (lookups could not tell them
    /// apart), and an unusable terminator. A probe-bound overrun surfaces
    /// as [`MeminfoError::TableFull`].
    pub fn new<'a, I>(fields: I, terminator: &str, capacity: usize) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, SlotId)>,
    {
        validate_key(terminator, "terminator key")?;

        let fields: Vec<(&str, SlotId)> = fields.into_iter().collect();
        let mut by_hash: HashMap<u32, &str> = HashMap::with_capacity(fields.len());
        for &(name, _) in &fields {
            validate_key(name, "field name")?;
            if let Some(previous) = by_hash.insert(symbol_hash(name.as_bytes()), name) {
                let message = if previous == name {
                    format!("field `{name}` is registered twice")
                } else {
                    format!("field `{name}` shares a symbol hash with `{previous}`")
                };
                return Err(MeminfoError::config(message));
            }
        }

        let slot_count = fields
            .iter()
            .map(|(_, slot)| slot.index() + 1)
            .max()
            .unwrap_or(0);
        let mut names = vec![None; slot_count];
        for &(name, slot) in &fields {
            if names[slot.index()].is_some() {
                return Err(MeminfoError::config(format!(
                    "{slot} assigned to more than one field"
                )));
            }
            names[slot.index()] = Some(name.to_owned());
        }

        let table = SymbolTable::preload(capacity, fields.iter().copied())?;
        debug!(
            fields = table.len(),
            slot_count,
            terminator,
            "built field catalog"
        );

        Ok(Self {
            table,
            names,
            terminator: terminator.to_owned(),
        })
    }

    #[must_use]
    pub fn lookup(&self, key: &str) -> SlotLookup {
        self.table.lookup(key)
    }

    #[must_use]
    pub fn terminator(&self) -> &str {
        &self.terminator
    }

    #[must_use]
    pub fn is_terminator(&self, key: &str) -> bool {
        key == self.terminator
    }

    /// Record width: one past the highest registered slot.
    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn name_of(&self, slot: SlotId) -> Option<&str> {
        self.names.get(slot.index()).and_then(Option::as_deref)
    }

    /// Registered `(slot, name)` pairs in slot order.
    pub fn fields(&self) -> impl Iterator<Item = (SlotId, &str)> {
        self.names.iter().enumerate().filter_map(|(index, name)| {
            Some((SlotId(u32::try_from(index).ok()?), name.as_deref()?))
        })
    }

    #[must_use]
    pub const fn table(&self) -> &SymbolTable {
        &self.table
    }
}

fn validate_key(key: &str, what: &str) -> Result<()> {
    if key.is_empty() || key.len() > MAX_KEY_LEN || !key.bytes().all(is_key_char) {
        return Err(MeminfoError::config(format!(
            "{what} `{key}` must be 1..={MAX_KEY_LEN} characters of [A-Za-z0-9_]"
        )));
    }
    Ok(())
}
