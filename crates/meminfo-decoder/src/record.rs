//! Output record model: one [`RegionRecord`] per header-to-terminator block.

use bitflags::bitflags;
use meminfo_symtab::SlotId;
use serde::{Deserialize, Serialize};

/// Opaque caller identity attached to every record from one stream
/// (a process id for smaps).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StreamId(pub u64);

impl std::fmt::Display for StreamId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

bitflags! {
    /// Decoded permission set of a region header (`rwxp`, `r--s`, ...).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct Permissions: u8 {
        const READ = 1;
        const WRITE = 1 << 1;
        const EXEC = 1 << 2;
        const SHARED = 1 << 3;
        const PRIVATE = 1 << 4;
    }
}

impl Permissions {
    /// Decode a permission token; `-` and unknown characters contribute nothing.
    #[must_use]
    pub fn from_token(token: &str) -> Self {
        token.bytes().fold(Self::empty(), |acc, byte| {
            acc | match byte {
                b'r' => Self::READ,
                b'w' => Self::WRITE,
                b'x' => Self::EXEC,
                b's' => Self::SHARED,
                b'p' => Self::PRIVATE,
                _ => Self::empty(),
            }
        })
    }
}

/// Fixed header tuple of one region.
///
/// Hex tokens are kept as captured; typed accessors parse on demand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionHeader {
    pub start: String,
    pub end: String,
    pub perms: String,
    pub offset: String,
    pub dev_major: String,
    pub dev_minor: String,
    pub inode: u64,
    pub path: Option<String>,
}

impl RegionHeader {
    #[must_use]
    pub fn start_address(&self) -> Option<u64> {
        u64::from_str_radix(&self.start, 16).ok()
    }

    #[must_use]
    pub fn end_address(&self) -> Option<u64> {
        u64::from_str_radix(&self.end, 16).ok()
    }

    #[must_use]
    pub fn offset_value(&self) -> Option<u64> {
        u64::from_str_radix(&self.offset, 16).ok()
    }

    /// `end - start`, or `None` when either bound is unparsable or inverted.
    #[must_use]
    pub fn size_bytes(&self) -> Option<u64> {
        self.end_address()?.checked_sub(self.start_address()?)
    }

    #[must_use]
    pub fn permissions(&self) -> Permissions {
        Permissions::from_token(&self.perms)
    }

    /// `major:minor` as printed in the header.
    #[must_use]
    pub fn device(&self) -> String {
        format!("{}:{}", self.dev_major, self.dev_minor)
    }
}

/// Value stored in one slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Integer(i32),
    Text(String),
}

impl FieldValue {
    #[must_use]
    pub const fn as_integer(&self) -> Option<i32> {
        match self {
            Self::Integer(value) => Some(*value),
            Self::Text(_) => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Integer(_) => None,
        }
    }
}

/// One decoded region.
///
/// Slots never written read back as absent, and [`RegionRecord::integer`]
/// reports them as zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionRecord {
    identity: StreamId,
    header: RegionHeader,
    slots: Vec<Option<FieldValue>>,
}

impl RegionRecord {
    /// Fresh record with `slot_count` empty slots.
    #[must_use]
    pub fn new(identity: StreamId, header: RegionHeader, slot_count: usize) -> Self {
        Self {
            identity,
            header,
            slots: vec![None; slot_count],
        }
    }

    #[must_use]
    pub const fn identity(&self) -> StreamId {
        self.identity
    }

    #[must_use]
    pub const fn header(&self) -> &RegionHeader {
        &self.header
    }

    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Store `value` in `slot`; later lines for the same slot overwrite.
    ///
    /// Slots outside the record shape are ignored.
    pub fn set(&mut self, slot: SlotId, value: FieldValue) {
        if let Some(cell) = self.slots.get_mut(slot.index()) {
            *cell = Some(value);
        }
    }

    #[must_use]
    pub fn value(&self, slot: SlotId) -> Option<&FieldValue> {
        self.slots.get(slot.index()).and_then(Option::as_ref)
    }

    /// Integer in `slot`, zero when absent or textual.
    #[must_use]
    pub fn integer(&self, slot: SlotId) -> i32 {
        self.value(slot)
            .and_then(FieldValue::as_integer)
            .unwrap_or(0)
    }

    #[must_use]
    pub fn text(&self, slot: SlotId) -> Option<&str> {
        self.value(slot).and_then(FieldValue::as_text)
    }

    /// Populated slots in slot order.
    pub fn populated(&self) -> impl Iterator<Item = (SlotId, &FieldValue)> {
        self.slots.iter().enumerate().filter_map(|(index, cell)| {
            let value = cell.as_ref()?;
            let slot = SlotId(u32::try_from(index).ok()?);
            Some((slot, value))
        })
    }
}
