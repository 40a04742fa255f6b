//! Fixed-capacity symbol table mapping short field names to slot ids.
//!
//! The table is an open-addressing array of `capacity` buckets:
//! - bucket index starts at `symbol_hash(key) % capacity`
//! - collisions resolve by linear probing, wrapping past the last bucket
//! - both insert and lookup examine at most `capacity / 2` buckets
//!
//! Buckets store the key hash, not the key text. Two keys with the same
//! hash are indistinguishable; this is accepted for small, known key sets.
//! The table is built once, then only read.

use meminfo_error::{MeminfoError, Result};
use tracing::debug;

/// Bucket count used by the smaps catalog.
pub const DEFAULT_TABLE_CAPACITY: usize = 64;
/// Seed of the djb2 rolling hash.
pub const SYMBOL_HASH_SEED: u32 = 5381;
/// Multiplier of the djb2 rolling hash (`hash * 33 + byte`).
pub const SYMBOL_HASH_MULTIPLIER: u32 = 33;
/// Probe bound divisor: at most `capacity / PROBE_BOUND_DIVISOR` buckets are examined.
pub const PROBE_BOUND_DIVISOR: usize = 2;

/// Position of one field in an output record.
///
/// Values come from the caller's closed enumeration and are opaque here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(pub u32);

impl SlotId {
    /// Slot as an index into a dense per-record array.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for SlotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "slot#{}", self.0)
    }
}

/// Outcome of a lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotLookup {
    Found(SlotId),
    NotFound,
}

impl SlotLookup {
    /// The found slot, if any.
    #[must_use]
    pub const fn slot(self) -> Option<SlotId> {
        match self {
            Self::Found(slot) => Some(slot),
            Self::NotFound => None,
        }
    }

    #[must_use]
    pub const fn is_found(self) -> bool {
        matches!(self, Self::Found(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Bucket {
    hash: u32,
    slot: SlotId,
}

/// Open-addressing name to [`SlotId`] map with a fixed bucket count.
#[derive(Debug, Clone)]
pub struct SymbolTable {
    buckets: Box<[Option<Bucket>]>,
    len: usize,
}

impl SymbolTable {
    /// Allocate `capacity` empty buckets.
    ///
    /// Fails with [`MeminfoError::Allocation`] when the storage cannot be
    /// reserved and [`MeminfoError::InvalidCapacity`] below two buckets.
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        if capacity < PROBE_BOUND_DIVISOR {
            return Err(MeminfoError::InvalidCapacity { capacity });
        }

        let mut buckets: Vec<Option<Bucket>> = Vec::new();
        buckets
            .try_reserve_exact(capacity)
            .map_err(|_| MeminfoError::Allocation { capacity })?;
        buckets.resize(capacity, None);

        Ok(Self {
            buckets: buckets.into_boxed_slice(),
            len: 0,
        })
    }

    /// Build a table from a closed `(name, slot)` list.
    ///
    /// The first insert that overruns the probe bound aborts the build.
    pub fn preload<'a, I>(capacity: usize, fields: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, SlotId)>,
    {
        let mut table = Self::with_capacity(capacity)?;
        for (name, slot) in fields {
            table.insert(name, slot)?;
        }
        debug!(
            capacity,
            entries = table.len(),
            probe_bound = table.probe_bound(),
            "preloaded symbol table"
        );
        Ok(table)
    }

    /// Number of buckets.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    /// Maximum number of buckets any insert or lookup examines.
    #[must_use]
    pub fn probe_bound(&self) -> usize {
        self.capacity() / PROBE_BOUND_DIVISOR
    }

    /// Number of stored entries.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Store `key -> slot`, returning the bucket index used.
    ///
    /// Duplicate keys are not detected. On [`MeminfoError::TableFull`] the
    /// table is left unchanged.
    pub fn insert(&mut self, key: &str, slot: SlotId) -> Result<usize> {
        let hash = symbol_hash(key.as_bytes());
        let capacity = self.capacity();
        let start = self.home_bucket(hash);

        for probe in 0..self.probe_bound() {
            let bucket = (start + probe) % capacity;
            if self.buckets[bucket].is_none() {
                self.buckets[bucket] = Some(Bucket { hash, slot });
                self.len += 1;
                return Ok(bucket);
            }
        }

        Err(MeminfoError::TableFull {
            key: key.to_owned(),
            capacity,
            probe_bound: self.probe_bound(),
        })
    }

    /// Resolve `key` to its slot.
    #[must_use]
    pub fn lookup(&self, key: &str) -> SlotLookup {
        self.find(symbol_hash(key.as_bytes()))
            .map_or(SlotLookup::NotFound, |(_, entry)| {
                SlotLookup::Found(entry.slot)
            })
    }

    /// Bucket currently holding `key`, if reachable within the probe bound.
    #[must_use]
    pub fn bucket_of(&self, key: &str) -> Option<usize> {
        self.find(symbol_hash(key.as_bytes()))
            .map(|(bucket, _)| bucket)
    }

    fn find(&self, hash: u32) -> Option<(usize, Bucket)> {
        let capacity = self.capacity();
        let start = self.home_bucket(hash);

        for probe in 0..self.probe_bound() {
            let bucket = (start + probe) % capacity;
            // No deletions exist, so an empty bucket ends every probe chain.
            let entry = self.buckets[bucket]?;
            if entry.hash == hash {
                return Some((bucket, entry));
            }
        }
        None
    }

    fn home_bucket(&self, hash: u32) -> usize {
        hash as usize % self.capacity()
    }
}

/// djb2 rolling hash over raw bytes: `hash = hash * 33 + byte`, wrapping.
#[must_use]
pub const fn symbol_hash(bytes: &[u8]) -> u32 {
    let mut hash = SYMBOL_HASH_SEED;
    let mut i = 0;
    while i < bytes.len() {
        hash = hash
            .wrapping_mul(SYMBOL_HASH_MULTIPLIER)
            .wrapping_add(bytes[i] as u32);
        i += 1;
    }
    hash
}
