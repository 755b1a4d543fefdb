//! # Local Result
//!
//! `LocalResult` is the single concrete type behind both halves of the
//! result contract: producers drive it through [`RowSink`], consumers through
//! [`RowSource`].
//!
//! ## State Machine
//!
//! ```text
//!   BUILDING ──done()──► FINALIZING ──► READY ──close()──► CLOSED
//!      │                     │                               ▲
//!      │                     └──── I/O error ────────────────┤
//!      └──────────────────────── close() ────────────────────┘
//! ```
//!
//! | Operation              | BUILDING | READY          | CLOSED |
//! |------------------------|----------|----------------|--------|
//! | append / setters       | yes      | InvalidState   | InvalidState |
//! | done                   | finalize | no-op          | InvalidState |
//! | row_count              | live     | fixed          | InvalidState |
//! | next / reset           | InvalidState | yes        | InvalidState |
//! | contains_distinct      | yes      | yes            | InvalidState |
//! | remove_distinct        | yes      | InvalidState   | InvalidState |
//! | contains_null          | yes      | yes, resets    | InvalidState |
//! | close                  | yes      | yes            | no-op  |
//!
//! ## Finalize
//!
//! With no sort order and no removed rows, finalize seals the row store and
//! the window is just a `[start, end)` view over it. Otherwise the live rows
//! (tombstones skipped) are sorted if needed, streamed through the
//! [`WindowSelector`] into a fresh row store, and the input store is
//! released.
//!
//! ## contains_null
//!
//! On a READY result `contains_null` walks the cursor over every row and
//! leaves it reset to before the first row, even when the answer is cached.
//! Callers must not rely on the cursor position surviving the call.

use super::cursor::{FinalRows, ResultCursor};
use super::distinct::{scan_for_null, DistinctFilter};
use super::sort::{RowComparator, SortOrder, Sorter};
use super::store::{RowStore, StoreConfig};
use super::window::{WindowSelector, WindowSpec};
use super::ResultBuilder;
use crate::error::ResultError;
use crate::types::{Collation, ColumnDef, OwnedValue, Row};
use eyre::{bail, Result};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultState {
    Building,
    Finalizing,
    Ready,
    Closed,
}

impl std::fmt::Display for ResultState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ResultState::Building => "BUILDING",
            ResultState::Finalizing => "FINALIZING",
            ResultState::Ready => "READY",
            ResultState::Closed => "CLOSED",
        })
    }
}

/// Write side of a result.
pub trait RowSink {
    fn append(&mut self, row: Row) -> Result<()>;

    fn add_rows<I>(&mut self, rows: I) -> Result<()>
    where
        I: IntoIterator<Item = Row>,
        Self: Sized,
    {
        for row in rows {
            self.append(row)?;
        }
        Ok(())
    }

    fn done(&mut self) -> Result<()>;

    /// Whether a row with the same distinct key is present. Never registers
    /// the key.
    fn contains_distinct(&mut self, row: &[OwnedValue]) -> Result<bool>;

    fn remove_distinct(&mut self, row: &[OwnedValue]) -> Result<()>;
}

/// Read side of a result.
pub trait RowSource {
    fn row_count(&self) -> Result<usize>;

    fn next(&mut self) -> Result<bool>;

    /// Row under the cursor. `None` covers "before the first row", "past the
    /// last row" and any state other than READY, including CLOSED. Use
    /// [`LocalResult::try_current_row`] to tell a closed result apart.
    fn current_row(&self) -> Option<&Row>;

    fn reset(&mut self) -> Result<()>;

    fn contains_null(&mut self) -> Result<bool>;

    fn close(&mut self);
}

#[derive(Debug)]
pub struct LocalResult {
    columns: Arc<[ColumnDef]>,
    visible: usize,
    config: StoreConfig,
    state: ResultState,
    store: Option<RowStore>,
    distinct: Option<DistinctFilter>,
    distinct_columns: Option<Vec<usize>>,
    lookup: Option<DistinctFilter>,
    sort: Option<SortOrder>,
    window: WindowSpec,
    cursor: Option<ResultCursor>,
    null_cache: Option<bool>,
}

impl LocalResult {
    pub fn builder() -> ResultBuilder {
        ResultBuilder::new()
    }

    pub(crate) fn new(columns: Vec<ColumnDef>, visible: usize, config: StoreConfig) -> Self {
        let store = RowStore::new(config.clone());
        Self {
            columns: columns.into(),
            visible,
            config,
            state: ResultState::Building,
            store: Some(store),
            distinct: None,
            distinct_columns: None,
            lookup: None,
            sort: None,
            window: WindowSpec::default(),
            cursor: None,
            null_cache: None,
        }
    }

    pub fn state(&self) -> ResultState {
        self.state
    }

    pub fn is_closed(&self) -> bool {
        self.state == ResultState::Closed
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn visible_column_count(&self) -> usize {
        self.visible
    }

    pub fn sort_order(&self) -> Option<&SortOrder> {
        self.sort.as_ref()
    }

    pub fn window(&self) -> WindowSpec {
        self.window
    }

    pub fn is_distinct(&self) -> bool {
        self.distinct_columns.is_some()
    }

    pub fn is_spilled(&self) -> bool {
        match (&self.store, &self.cursor) {
            (Some(store), _) => store.is_spilled(),
            (None, Some(cursor)) => cursor.rows().is_spilled(),
            (None, None) => false,
        }
    }

    /// True while external storage is held and `close` would release it.
    pub fn needs_close(&self) -> bool {
        self.is_spilled()
    }

    pub fn memory_footprint(&self) -> usize {
        let store = self.store.as_ref().map_or(0, RowStore::memory_footprint);
        let keys = [&self.distinct, &self.lookup]
            .iter()
            .filter_map(|f| f.as_ref())
            .map(DistinctFilter::memory_footprint)
            .sum::<usize>();
        store + keys
    }

    fn ensure_state(&self, expected: ResultState, operation: &'static str) -> Result<()> {
        if self.state != expected {
            bail!(ResultError::InvalidState {
                operation,
                state: self.state,
            });
        }
        Ok(())
    }

    fn ensure_open(&self, operation: &'static str) -> Result<()> {
        if self.state == ResultState::Closed {
            bail!(ResultError::InvalidState {
                operation,
                state: self.state,
            });
        }
        Ok(())
    }

    fn check_row(&self, row: &[OwnedValue]) -> Result<()> {
        if row.len() != self.columns.len() {
            bail!(ResultError::ArityMismatch {
                expected: self.columns.len(),
                found: row.len(),
            });
        }
        for (column, (def, value)) in self.columns.iter().zip(row).enumerate() {
            if def.accepts(value) {
                continue;
            }
            if let Some(found) = value.data_type() {
                bail!(ResultError::TypeMismatch {
                    column,
                    expected: def.data_type(),
                    found,
                });
            }
        }
        Ok(())
    }

    fn collations(&self) -> Vec<Collation> {
        self.columns.iter().map(ColumnDef::collation).collect()
    }

    fn removed_count(&self) -> usize {
        self.distinct.as_ref().map_or(0, DistinctFilter::removed_count)
    }

    /// Any I/O failure is fatal: storage is released and the result closed.
    fn abort(&mut self) {
        tracing::debug!(state = %self.state, "result aborted, releasing storage");
        self.close();
    }

    pub fn set_max_memory_rows(&mut self, max: i64) -> Result<()> {
        self.ensure_state(ResultState::Building, "set max memory rows")?;
        let max = match max {
            -1 => None,
            n if n < -1 => bail!(ResultError::InvalidConfig(format!(
                "max memory rows must be -1 or non-negative, got {}",
                n
            ))),
            n => Some(usize::try_from(n).unwrap_or(usize::MAX)),
        };
        self.config.max_memory_rows = max;
        if let Some(store) = self.store.as_mut() {
            store.set_max_memory_rows(max);
        }
        Ok(())
    }

    pub fn set_sort_order(&mut self, order: SortOrder) -> Result<()> {
        self.ensure_state(ResultState::Building, "set sort order")?;
        order.validate(self.columns.len())?;
        self.sort = if order.is_empty() { None } else { Some(order) };
        Ok(())
    }

    /// Whole-row distinctness over the visible columns.
    pub fn set_distinct(&mut self) -> Result<()> {
        let all: Vec<usize> = (0..self.visible).collect();
        self.configure_distinct(all)
    }

    /// Distinctness over a subset of the visible columns.
    pub fn set_distinct_columns(&mut self, indexes: &[usize]) -> Result<()> {
        if indexes.is_empty() {
            bail!(ResultError::InvalidConfig(
                "distinct column list is empty".to_string()
            ));
        }
        if let Some(bad) = indexes.iter().find(|&&i| i >= self.visible) {
            bail!(ResultError::InvalidConfig(format!(
                "distinct column {} out of range ({} visible columns)",
                bad, self.visible
            )));
        }
        self.configure_distinct(indexes.to_vec())
    }

    fn configure_distinct(&mut self, key_columns: Vec<usize>) -> Result<()> {
        self.ensure_state(ResultState::Building, "set distinct")?;

        if let Some(existing) = &self.distinct_columns {
            if *existing == key_columns {
                return Ok(());
            }
            bail!(ResultError::InvalidConfig(
                "distinct mode is already configured".to_string()
            ));
        }
        if self.store.as_ref().is_some_and(|s| !s.is_empty()) {
            bail!(ResultError::InvalidConfig(
                "distinct must be configured before rows are added".to_string()
            ));
        }

        self.lookup = None;
        self.distinct_columns = Some(key_columns.clone());
        self.distinct = Some(DistinctFilter::new(
            key_columns,
            self.collations(),
            self.config.budget.clone(),
        ));
        Ok(())
    }

    pub fn set_limit(&mut self, limit: i64) -> Result<()> {
        self.ensure_state(ResultState::Building, "set limit")?;
        self.window.limit = limit;
        Ok(())
    }

    pub fn set_offset(&mut self, offset: i64) -> Result<()> {
        self.ensure_state(ResultState::Building, "set offset")?;
        self.window.offset = offset;
        Ok(())
    }

    pub fn set_fetch_percent(&mut self, fetch_percent: bool) -> Result<()> {
        self.ensure_state(ResultState::Building, "set fetch percent")?;
        self.window.fetch_percent = fetch_percent;
        Ok(())
    }

    pub fn set_with_ties(&mut self, with_ties: bool) -> Result<()> {
        self.ensure_state(ResultState::Building, "set with ties")?;
        self.window.with_ties = with_ties;
        Ok(())
    }

    fn lookup_columns(&self) -> Vec<usize> {
        match &self.distinct_columns {
            Some(columns) => columns.clone(),
            None => (0..self.visible).collect(),
        }
    }

    /// Builds the on-demand membership index over the current rows.
    fn ensure_lookup(&mut self) -> Result<()> {
        if self.lookup.is_some() {
            return Ok(());
        }

        let mut lookup = DistinctFilter::new(
            self.lookup_columns(),
            self.collations(),
            self.config.budget.clone(),
        );

        if let Some(cursor) = &self.cursor {
            for (pos, row) in cursor.rows().rows().enumerate() {
                lookup.insert(&row?, pos)?;
            }
        } else if let Some(store) = self.store.as_mut() {
            for (pos, row) in store.scan()?.enumerate() {
                lookup.insert(&row?, pos)?;
            }
        }

        self.lookup = Some(lookup);
        Ok(())
    }

    fn finalize(&mut self) -> Result<FinalRows> {
        let Some(mut store) = self.store.take() else {
            bail!("row store missing during finalize");
        };

        let removed = self.removed_count();
        let total = store.count() - removed;
        let spilled = store.is_spilled();

        if self.sort.is_none() && removed == 0 {
            store.seal()?;
            let (start, end) = self.window.bounds(total);
            tracing::debug!(total, window = end - start, spilled, "result finalized");
            return Ok(FinalRows::new(store, start, end, self.visible));
        }

        let comparator = self
            .sort
            .as_ref()
            .map(|order| Arc::new(RowComparator::new(order, &self.columns)));
        let selector = WindowSelector::new(self.window, comparator.clone());
        let mut out = RowStore::new(self.config.clone());

        let tombstones = self.distinct.as_ref();
        let live = store
            .scan()?
            .enumerate()
            .filter(|(pos, _)| !tombstones.is_some_and(|f| f.is_removed(*pos)))
            .map(|(_, row)| row);

        let written = match comparator {
            Some(cmp) => {
                let sorter = Sorter::new(cmp, self.config.clone());
                let sorted = if spilled {
                    sorter.sort_external(live)?
                } else {
                    sorter.sort_in_memory(live)?
                };
                selector.select(sorted, total, &mut out)?
            }
            None => selector.select(live, total, &mut out)?,
        };

        store.release();
        out.seal()?;
        tracing::debug!(total, window = written, spilled, "result finalized");
        Ok(FinalRows::new(out, 0, written, self.visible))
    }

    fn cursor_mut(&mut self, operation: &'static str) -> Result<&mut ResultCursor> {
        self.ensure_state(ResultState::Ready, operation)?;
        match self.cursor.as_mut() {
            Some(cursor) => Ok(cursor),
            None => bail!("ready result has no cursor"),
        }
    }

    fn cursor_ref(&self, operation: &'static str) -> Result<&ResultCursor> {
        self.ensure_state(ResultState::Ready, operation)?;
        match self.cursor.as_ref() {
            Some(cursor) => Ok(cursor),
            None => bail!("ready result has no cursor"),
        }
    }

    /// 0-based position of the cursor, `-1` before the first row.
    pub fn row_id(&self) -> Result<i64> {
        Ok(self.cursor_ref("read row id")?.row_id())
    }

    /// Like [`RowSource::current_row`], but fails with `InvalidState`
    /// outside READY instead of returning `None`.
    pub fn try_current_row(&self) -> Result<Option<&Row>> {
        Ok(self.cursor_ref("read current row")?.current_row())
    }

    pub fn has_next(&self) -> Result<bool> {
        Ok(self.cursor_ref("check for next row")?.has_next())
    }

    pub fn is_after_last(&self) -> Result<bool> {
        Ok(self.cursor_ref("check cursor position")?.is_after_last())
    }

    pub fn absolute(&mut self, pos: usize) -> Result<bool> {
        self.cursor_mut("position cursor")?.absolute(pos)
    }

    pub fn row_at(&self, pos: usize) -> Result<Row> {
        self.cursor_ref("read row")?.row_at(pos)
    }

    /// A second result over the same finalized rows with its own cursor.
    pub fn shallow_copy(&self) -> Result<LocalResult> {
        let cursor = self.cursor_ref("copy result")?.share();
        Ok(LocalResult {
            columns: Arc::clone(&self.columns),
            visible: self.visible,
            config: self.config.clone(),
            state: ResultState::Ready,
            store: None,
            distinct: None,
            distinct_columns: self.distinct_columns.clone(),
            lookup: None,
            sort: self.sort.clone(),
            window: self.window,
            cursor: Some(cursor),
            null_cache: self.null_cache,
        })
    }
}

impl RowSink for LocalResult {
    fn append(&mut self, row: Row) -> Result<()> {
        self.ensure_state(ResultState::Building, "append")?;
        self.check_row(&row)?;

        let Some(store) = self.store.as_mut() else {
            bail!("row store missing while building");
        };
        let position = store.count();

        if let Some(filter) = self.distinct.as_mut() {
            if !filter.insert(&row, position)? {
                return Ok(());
            }
        }
        if let Some(lookup) = self.lookup.as_mut() {
            lookup.insert(&row, position)?;
        }
        if self.null_cache == Some(false) && row.has_null_in(self.visible) {
            self.null_cache = Some(true);
        }

        if let Err(e) = store.append(row) {
            self.abort();
            return Err(e);
        }
        Ok(())
    }

    fn done(&mut self) -> Result<()> {
        match self.state {
            ResultState::Ready => return Ok(()),
            ResultState::Building => {}
            state => bail!(ResultError::InvalidState {
                operation: "finalize",
                state,
            }),
        }

        let has_sort = self.sort.is_some();
        self.window.validate(has_sort)?;
        if let Some(order) = &self.sort {
            order.validate(self.columns.len())?;
        }

        self.state = ResultState::Finalizing;
        match self.finalize() {
            Ok(rows) => {
                self.cursor = Some(ResultCursor::new(Arc::new(rows)));
                self.distinct = None;
                self.lookup = None;
                self.null_cache = None;
                self.state = ResultState::Ready;
                Ok(())
            }
            Err(e) => {
                self.abort();
                Err(e)
            }
        }
    }

    fn contains_distinct(&mut self, row: &[OwnedValue]) -> Result<bool> {
        self.ensure_open("check distinct")?;
        self.check_row(row)?;

        if let Some(filter) = self.distinct.as_mut() {
            return Ok(filter.contains(row));
        }

        if let Err(e) = self.ensure_lookup() {
            if e.downcast_ref::<std::io::Error>().is_some() {
                self.abort();
            }
            return Err(e);
        }
        match self.lookup.as_mut() {
            Some(lookup) => Ok(lookup.contains(row)),
            None => Ok(false),
        }
    }

    fn remove_distinct(&mut self, row: &[OwnedValue]) -> Result<()> {
        self.ensure_state(ResultState::Building, "remove distinct")?;
        self.check_row(row)?;

        let Some(filter) = self.distinct.as_mut() else {
            bail!(ResultError::InvalidConfig(
                "remove distinct requires distinct mode".to_string()
            ));
        };
        if filter.remove(row).is_some() {
            self.null_cache = None;
        }
        Ok(())
    }
}

impl RowSource for LocalResult {
    fn row_count(&self) -> Result<usize> {
        match self.state {
            ResultState::Building => Ok(self
                .store
                .as_ref()
                .map_or(0, |s| s.count() - self.removed_count())),
            ResultState::Ready => Ok(self.cursor_ref("count rows")?.len()),
            state => bail!(ResultError::InvalidState {
                operation: "count rows",
                state,
            }),
        }
    }

    fn next(&mut self) -> Result<bool> {
        let result = self.cursor_mut("advance cursor")?.next();
        if result.is_err() {
            self.abort();
        }
        result
    }

    fn current_row(&self) -> Option<&Row> {
        self.cursor.as_ref()?.current_row()
    }

    fn reset(&mut self) -> Result<()> {
        self.cursor_mut("reset cursor")?.reset();
        Ok(())
    }

    fn contains_null(&mut self) -> Result<bool> {
        match self.state {
            ResultState::Building => {
                if let Some(found) = self.null_cache {
                    return Ok(found);
                }
                let visible = self.visible;
                let tombstones = self.distinct.as_ref();
                let Some(store) = self.store.as_mut() else {
                    return Ok(false);
                };
                let found = store.scan().and_then(|rows| {
                    scan_for_null(rows, visible, |pos| {
                        tombstones.is_some_and(|f| f.is_removed(pos))
                    })
                });
                match found {
                    Ok(found) => {
                        self.null_cache = Some(found);
                        Ok(found)
                    }
                    Err(e) => {
                        self.abort();
                        Err(e)
                    }
                }
            }
            ResultState::Ready => {
                let visible = self.visible;
                let cached = self.null_cache;
                let cursor = self.cursor_mut("scan for null")?;

                cursor.reset();
                let found = match cached {
                    Some(found) => found,
                    None => {
                        let mut found = false;
                        loop {
                            match cursor.next() {
                                Ok(true) => {}
                                Ok(false) => break,
                                Err(e) => {
                                    self.abort();
                                    return Err(e);
                                }
                            }
                            if cursor.current_row().is_some_and(|r| r.has_null_in(visible)) {
                                found = true;
                                break;
                            }
                        }
                        found
                    }
                };
                cursor.reset();

                self.null_cache = Some(found);
                Ok(found)
            }
            state => bail!(ResultError::InvalidState {
                operation: "scan for null",
                state,
            }),
        }
    }

    fn close(&mut self) {
        if self.state == ResultState::Closed {
            return;
        }
        self.cursor = None;
        self.lookup = None;
        self.distinct = None;
        if let Some(mut store) = self.store.take() {
            store.release();
        }
        self.null_cache = None;
        self.state = ResultState::Closed;
    }
}

impl Drop for LocalResult {
    fn drop(&mut self) {
        self.close();
    }
}
