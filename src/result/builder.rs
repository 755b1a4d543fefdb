//! # Result Builder
//!
//! `ResultBuilder` collects the schema and runtime settings of a result and
//! produces a `LocalResult` in the BUILDING state. Nothing here is global:
//! every setting ends up in the result's own [`StoreConfig`].
//!
//! ## Configuration Options
//!
//! | Option          | Default                   | Description                          |
//! |-----------------|---------------------------|--------------------------------------|
//! | visible_columns | all columns               | Columns exposed to readers           |
//! | max_memory_rows | `DEFAULT_MAX_MEMORY_ROWS` | Rows held in memory before spilling  |
//! | spill_dir       | OS temp dir               | Directory for spill and sort files   |
//! | memory_budget   | none                      | Shared byte budget across results    |
//!
//! ## Usage
//!
//! ```ignore
//! let mut result = LocalResult::builder()
//!     .column(ColumnDef::new("id", DataType::Int8))
//!     .column(ColumnDef::new("name", DataType::Text).with_collation(Collation::NoCase))
//!     .max_memory_rows(10_000)
//!     .spill_dir("/var/tmp/query")
//!     .build()?;
//! ```

use super::local::LocalResult;
use super::store::StoreConfig;
use crate::config::{DEFAULT_MAX_MEMORY_ROWS, MAX_COLUMNS};
use crate::error::ResultError;
use crate::memory::MemoryBudget;
use crate::types::ColumnDef;
use eyre::{bail, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub struct ResultBuilder {
    columns: Vec<ColumnDef>,
    visible: Option<usize>,
    max_memory_rows: Option<usize>,
    spill_dir: Option<PathBuf>,
    budget: Option<Arc<MemoryBudget>>,
}

impl Default for ResultBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultBuilder {
    pub fn new() -> Self {
        Self {
            columns: Vec::new(),
            visible: None,
            max_memory_rows: Some(DEFAULT_MAX_MEMORY_ROWS),
            spill_dir: None,
            budget: None,
        }
    }

    pub fn column(mut self, column: ColumnDef) -> Self {
        self.columns.push(column);
        self
    }

    pub fn columns<I: IntoIterator<Item = ColumnDef>>(mut self, columns: I) -> Self {
        self.columns.extend(columns);
        self
    }

    /// Number of leading columns exposed to readers. The remaining columns
    /// only take part in sorting.
    pub fn visible_columns(mut self, visible: usize) -> Self {
        self.visible = Some(visible);
        self
    }

    pub fn max_memory_rows(mut self, rows: usize) -> Self {
        self.max_memory_rows = Some(rows);
        self
    }

    /// Keeps every row in memory regardless of count. A memory budget, if
    /// set, can still force a spill.
    pub fn unbounded_memory(mut self) -> Self {
        self.max_memory_rows = None;
        self
    }

    pub fn spill_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.spill_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn memory_budget(mut self, budget: Arc<MemoryBudget>) -> Self {
        self.budget = Some(budget);
        self
    }

    pub fn build(self) -> Result<LocalResult> {
        if self.columns.is_empty() {
            bail!(ResultError::InvalidConfig(
                "a result needs at least one column".to_string()
            ));
        }
        if self.columns.len() > MAX_COLUMNS {
            bail!(ResultError::InvalidConfig(format!(
                "{} columns exceeds the maximum of {}",
                self.columns.len(),
                MAX_COLUMNS
            )));
        }
        let visible = self.visible.unwrap_or(self.columns.len());
        if visible == 0 || visible > self.columns.len() {
            bail!(ResultError::InvalidConfig(format!(
                "visible column count {} must be between 1 and {}",
                visible,
                self.columns.len()
            )));
        }

        let config = StoreConfig {
            max_memory_rows: self.max_memory_rows,
            spill_dir: self.spill_dir.unwrap_or_else(std::env::temp_dir),
            budget: self.budget,
        };

        Ok(LocalResult::new(self.columns, visible, config))
    }
}
