//! # Distinct Filter
//!
//! Hash-keyed membership over whole rows or a column subset.
//!
//! ## Keys
//!
//! A key is the canonical `RowSerde::serialize_key_into` encoding of the key
//! columns, so byte equality is value equality with NULL equal to NULL and
//! collation-aware text comparison. Keys map to the position of the row that
//! registered them in the owning row store.
//!
//! ## Removal
//!
//! Rows are never deleted from a row store. `remove` drops the key and
//! records the row's position as a tombstone; the finalize pass skips
//! tombstoned positions. Removing an absent key is a no-op.
//!
//! ## Memory
//!
//! Key bytes are charged to the `Distinct` pool of the optional budget. Keys
//! cannot spill, so a refusal is a hard `MemoryError`.

use crate::memory::{MemoryBudget, Pool};
use crate::storage::RowSerde;
use crate::types::{Collation, OwnedValue, Row};
use eyre::Result;
use hashbrown::{HashMap, HashSet};
use std::sync::Arc;

const KEY_OVERHEAD: usize = std::mem::size_of::<Vec<u8>>() + std::mem::size_of::<usize>();

#[derive(Debug)]
pub struct DistinctFilter {
    key_columns: Vec<usize>,
    collations: Vec<Collation>,
    keys: HashMap<Vec<u8>, usize>,
    removed: HashSet<usize>,
    budget: Option<Arc<MemoryBudget>>,
    charged_bytes: usize,
    key_buf: Vec<u8>,
}

impl DistinctFilter {
    pub fn new(
        key_columns: Vec<usize>,
        collations: Vec<Collation>,
        budget: Option<Arc<MemoryBudget>>,
    ) -> Self {
        Self {
            key_columns,
            collations,
            keys: HashMap::new(),
            removed: HashSet::new(),
            budget,
            charged_bytes: 0,
            key_buf: Vec::with_capacity(64),
        }
    }

    pub fn key_columns(&self) -> &[usize] {
        &self.key_columns
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn removed_count(&self) -> usize {
        self.removed.len()
    }

    pub fn is_removed(&self, position: usize) -> bool {
        self.removed.contains(&position)
    }

    pub fn memory_footprint(&self) -> usize {
        self.charged_bytes
    }

    fn encode(&mut self, row: &[OwnedValue]) {
        self.key_buf.clear();
        RowSerde::serialize_key_into(row, &self.key_columns, &self.collations, &mut self.key_buf);
    }

    pub fn contains(&mut self, row: &[OwnedValue]) -> bool {
        self.encode(row);
        self.keys.contains_key(self.key_buf.as_slice())
    }

    /// Registers `row`'s key at `position`. Returns `false` (and leaves
    /// membership unchanged) if the key is already present.
    pub fn insert(&mut self, row: &[OwnedValue], position: usize) -> Result<bool> {
        self.encode(row);
        if self.keys.contains_key(self.key_buf.as_slice()) {
            return Ok(false);
        }

        let cost = self.key_buf.len() + KEY_OVERHEAD;
        if let Some(budget) = &self.budget {
            budget.allocate(Pool::Distinct, cost)?;
        }
        self.charged_bytes += cost;

        self.keys.insert(self.key_buf.clone(), position);
        Ok(true)
    }

    /// Drops `row`'s key and tombstones the position it was registered at.
    pub fn remove(&mut self, row: &[OwnedValue]) -> Option<usize> {
        self.encode(row);
        let (key, position) = self.keys.remove_entry(self.key_buf.as_slice())?;

        let cost = key.len() + KEY_OVERHEAD;
        if let Some(budget) = &self.budget {
            budget.release(Pool::Distinct, cost);
        }
        self.charged_bytes -= cost;

        self.removed.insert(position);
        Some(position)
    }
}

impl Drop for DistinctFilter {
    fn drop(&mut self) {
        if let Some(budget) = &self.budget {
            budget.release(Pool::Distinct, self.charged_bytes);
        }
    }
}

/// Any-NULL scan over the first `visible` columns of `rows`, skipping
/// positions for which `skip` returns true. Stops at the first NULL.
pub fn scan_for_null<I>(rows: I, visible: usize, skip: impl Fn(usize) -> bool) -> Result<bool>
where
    I: IntoIterator<Item = Result<Row>>,
{
    for (position, row) in rows.into_iter().enumerate() {
        let row = row?;
        if !skip(position) && row.has_null_in(visible) {
            return Ok(true);
        }
    }
    Ok(false)
}
