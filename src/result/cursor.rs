//! # Result Cursor
//!
//! Read-side view over a finalized result. [`FinalRows`] is the immutable
//! output of finalize: a sealed row store plus the `[start, end)` window
//! over it. Cursors share it through an `Arc`, so shallow copies read the
//! same rows without copying them, and the backing spill file is removed
//! when the last cursor lets go.
//!
//! ## Positions
//!
//! ```text
//!   row_id:   -1     0     1     2    ...   len-1    len
//!           before  [ rows of the window ........ ]  after last
//! ```

use super::store::RowStore;
use crate::storage::ReadHint;
use crate::types::Row;
use eyre::{ensure, Result};
use std::sync::Arc;

#[derive(Debug)]
pub struct FinalRows {
    store: RowStore,
    start: usize,
    end: usize,
    visible: usize,
}

impl FinalRows {
    pub fn new(store: RowStore, start: usize, end: usize, visible: usize) -> Self {
        debug_assert!(store.is_sealed());
        debug_assert!(start <= end && end <= store.count());
        Self {
            store,
            start,
            end,
            visible,
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn is_spilled(&self) -> bool {
        self.store.is_spilled()
    }

    /// Row `pos` of the window with hidden sort columns stripped.
    pub fn get(&self, pos: usize, hint: &mut ReadHint) -> Result<Row> {
        ensure!(
            pos < self.len(),
            "row {} out of range ({} rows)",
            pos,
            self.len()
        );
        let row = self.store.get(self.start + pos, hint)?;
        Ok(self.project(row))
    }

    fn project(&self, row: Row) -> Row {
        if row.len() > self.visible {
            Row::new(row[..self.visible].to_vec())
        } else {
            row
        }
    }

    /// Sequential pass over the whole window.
    pub fn rows(&self) -> impl Iterator<Item = Result<Row>> + '_ {
        let mut hint = ReadHint::default();
        (0..self.len()).map(move |pos| self.get(pos, &mut hint))
    }
}

#[derive(Debug)]
pub struct ResultCursor {
    rows: Arc<FinalRows>,
    position: Option<usize>,
    current: Option<Row>,
    hint: ReadHint,
}

impl ResultCursor {
    pub fn new(rows: Arc<FinalRows>) -> Self {
        Self {
            rows,
            position: None,
            current: None,
            hint: ReadHint::default(),
        }
    }

    pub fn rows(&self) -> &Arc<FinalRows> {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn next(&mut self) -> Result<bool> {
        let next = self.position.map_or(0, |p| (p + 1).min(self.len()));
        self.seek(next)
    }

    fn seek(&mut self, pos: usize) -> Result<bool> {
        if pos >= self.len() {
            self.position = Some(self.len());
            self.current = None;
            return Ok(false);
        }
        self.current = Some(self.rows.get(pos, &mut self.hint)?);
        self.position = Some(pos);
        Ok(true)
    }

    pub fn current_row(&self) -> Option<&Row> {
        self.current.as_ref()
    }

    pub fn reset(&mut self) {
        self.position = None;
        self.current = None;
    }

    pub fn row_id(&self) -> i64 {
        match self.position {
            None => -1,
            Some(p) => p as i64,
        }
    }

    pub fn has_next(&self) -> bool {
        self.position.map_or(0, |p| p + 1) < self.len()
    }

    pub fn is_after_last(&self) -> bool {
        self.position == Some(self.len())
    }

    /// Moves to `pos`. Out-of-range positions leave the cursor after the
    /// last row and return false.
    pub fn absolute(&mut self, pos: usize) -> Result<bool> {
        self.seek(pos)
    }

    pub fn row_at(&self, pos: usize) -> Result<Row> {
        let mut hint = ReadHint::default();
        self.rows.get(pos, &mut hint)
    }

    /// Independent cursor over the same rows, positioned before the first.
    pub fn share(&self) -> Self {
        Self::new(Arc::clone(&self.rows))
    }
}
