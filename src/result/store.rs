//! # Row Store
//!
//! Append-only, replayable holder of a result's rows. It keeps the most
//! recently appended rows in memory and relocates older rows to a
//! [`SpillCoordinator`] once either bound is crossed:
//!
//! - the row threshold (`max_memory_rows`, `None` disables it), or
//! - a refusal from the shared [`MemoryBudget`] `Rows` pool.
//!
//! ```text
//!   logical position:  0 ........ spilled-1 | spilled ........ count-1
//!                      [   spill file      ] [   memory: Vec<Row>   ]
//! ```
//!
//! Overflow flushes every in-memory row, so the boundary moves right and the
//! spilled region always stays a prefix. Neither bound is an error.

use super::spill::{MergedRows, SpillCoordinator};
use crate::config::SPILL_FILE_PREFIX;
use crate::memory::{MemoryBudget, Pool};
use crate::storage::ReadHint;
use crate::types::Row;
use eyre::{ensure, Result};
use std::path::PathBuf;
use std::sync::Arc;

/// Runtime settings threaded from the builder into every store of a result.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub max_memory_rows: Option<usize>,
    pub spill_dir: PathBuf,
    pub budget: Option<Arc<MemoryBudget>>,
}

impl StoreConfig {
    pub fn new(spill_dir: impl Into<PathBuf>) -> Self {
        Self {
            max_memory_rows: Some(crate::config::DEFAULT_MAX_MEMORY_ROWS),
            spill_dir: spill_dir.into(),
            budget: None,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new(std::env::temp_dir())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreMode {
    InMemory,
    Spilling,
}

#[derive(Debug)]
pub struct RowStore {
    config: StoreConfig,
    memory: Vec<Row>,
    charged_bytes: usize,
    spill: SpillCoordinator,
    row_count: usize,
    sealed: bool,
}

impl RowStore {
    pub fn new(config: StoreConfig) -> Self {
        let spill = SpillCoordinator::new(config.spill_dir.clone(), SPILL_FILE_PREFIX);
        Self {
            config,
            memory: Vec::new(),
            charged_bytes: 0,
            spill,
            row_count: 0,
            sealed: false,
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Takes effect from the next append; rows already in memory stay until
    /// the next overflow.
    pub fn set_max_memory_rows(&mut self, max: Option<usize>) {
        self.config.max_memory_rows = max;
    }

    pub fn count(&self) -> usize {
        self.row_count
    }

    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }

    pub fn mode(&self) -> StoreMode {
        if self.spill.is_active() {
            StoreMode::Spilling
        } else {
            StoreMode::InMemory
        }
    }

    pub fn is_spilled(&self) -> bool {
        self.mode() == StoreMode::Spilling
    }

    /// Estimated bytes of rows currently held in memory.
    pub fn memory_footprint(&self) -> usize {
        self.memory.iter().map(Row::estimated_size).sum()
    }

    pub fn spilled_count(&self) -> usize {
        self.spill.row_count()
    }

    pub fn append(&mut self, row: Row) -> Result<()> {
        ensure!(!self.sealed, "row store is sealed");

        if let Some(max) = self.config.max_memory_rows {
            if self.memory.len() >= max {
                self.flush_memory()?;
                if max == 0 {
                    return self.spill_direct(&row);
                }
            }
        }

        let size = row.estimated_size();
        if !self.charge(size) {
            self.flush_memory()?;
            if !self.charge(size) {
                return self.spill_direct(&row);
            }
        }

        self.memory.push(row);
        self.row_count += 1;
        Ok(())
    }

    fn charge(&mut self, bytes: usize) -> bool {
        let Some(budget) = &self.config.budget else {
            return true;
        };
        if budget.try_allocate(Pool::Rows, bytes) {
            self.charged_bytes += bytes;
            true
        } else {
            false
        }
    }

    fn uncharge(&mut self) {
        if let Some(budget) = &self.config.budget {
            if self.charged_bytes > 0 {
                budget.release(Pool::Rows, self.charged_bytes);
            }
        }
        self.charged_bytes = 0;
    }

    fn spill_direct(&mut self, row: &Row) -> Result<()> {
        self.spill.spill(row)?;
        self.row_count += 1;
        Ok(())
    }

    fn flush_memory(&mut self) -> Result<()> {
        if self.memory.is_empty() {
            return Ok(());
        }

        let first_spill = !self.spill.is_active();
        for row in &self.memory {
            self.spill.spill(row)?;
        }

        if first_spill {
            tracing::debug!(
                rows = self.memory.len(),
                bytes = self.charged_bytes,
                path = ?self.spill.path(),
                budget = ?self.config.budget.as_ref().map(|b| b.stats()),
                "row store spilling to disk"
            );
        } else {
            tracing::trace!(rows = self.memory.len(), "flushed rows to spill file");
        }

        self.memory.clear();
        self.uncharge();
        Ok(())
    }

    /// Every row in append order. Sees rows appended up to this call.
    pub fn scan(&mut self) -> Result<MergedRows<'_>> {
        self.spill.merge(&self.memory)
    }

    /// Ends the write phase and makes all spilled rows readable by position.
    pub fn seal(&mut self) -> Result<()> {
        if self.sealed {
            return Ok(());
        }
        self.spill.seal()?;
        self.sealed = true;
        Ok(())
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Random access by position. Requires `seal`.
    pub fn get(&self, pos: usize, hint: &mut ReadHint) -> Result<Row> {
        ensure!(self.sealed, "row store must be sealed before positional reads");
        ensure!(
            pos < self.row_count,
            "row {} out of range ({} rows)",
            pos,
            self.row_count
        );

        let spilled = self.spill.row_count();
        if pos < spilled {
            self.spill.read_at(pos, hint)
        } else {
            Ok(self.memory[pos - spilled].clone())
        }
    }

    /// Drops every row and removes the spill file. The store stays usable as
    /// an empty, sealed store.
    pub fn release(&mut self) {
        self.memory = Vec::new();
        self.uncharge();
        self.spill.release();
        self.row_count = 0;
        self.sealed = true;
    }
}

impl Drop for RowStore {
    fn drop(&mut self) {
        self.uncharge();
    }
}
