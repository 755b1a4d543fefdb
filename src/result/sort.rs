//! # Sorting
//!
//! Multi-key row ordering and the external merge sort used at finalize.
//!
//! ## Ordering
//!
//! A [`SortOrder`] is a list of [`SortColumn`]s. Binding it to the result's
//! column definitions yields a [`RowComparator`], which applies each
//! column's collation and null placement:
//!
//! | `NullOrdering` | Ascending | Descending |
//! |----------------|-----------|------------|
//! | `Default`      | first     | last       |
//! | `First`        | first     | first      |
//! | `Last`         | last      | last       |
//!
//! `Default` treats NULL as the lowest value.
//!
//! ## Algorithm
//!
//! ```text
//!   input rows ──► run buffer ──full──► stable sort ──► run file 0
//!                      │                               run file 1
//!                      │ input ends, no run written       ...
//!                      ▼                                   │
//!               in-memory sort                 > MAX_MERGE_FAN_IN runs?
//!                      │                          yes: merge in groups
//!                      ▼                                   ▼
//!                 SortedRows  ◄────────────── lazy k-way RunMerger
//! ```
//!
//! Runs hold `max(max_memory_rows, MIN_SORT_RUN_ROWS)` rows, or fewer when
//! the `Sort` budget pool refuses. The merge breaks comparator ties by run
//! index and each run is sorted stably, so the whole sort is stable: rows
//! that compare equal keep their input order.
//!
//! The final merge is lazy. A consumer that stops pulling (a satisfied
//! limit) never reads the rest of the runs.

use super::store::StoreConfig;
use crate::config::{MAX_MERGE_FAN_IN, MIN_SORT_RUN_ROWS, SORT_RUN_FILE_PREFIX};
use crate::error::ResultError;
use crate::memory::Pool;
use crate::storage::{SpillCursor, SpillFile};
use crate::types::{Collation, ColumnDef, OwnedValue, Row};
use eyre::{bail, Result};
use smallvec::SmallVec;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NullOrdering {
    #[default]
    Default,
    First,
    Last,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortColumn {
    pub column: usize,
    pub direction: SortDirection,
    pub nulls: NullOrdering,
}

impl SortColumn {
    pub fn asc(column: usize) -> Self {
        Self {
            column,
            direction: SortDirection::Ascending,
            nulls: NullOrdering::Default,
        }
    }

    pub fn desc(column: usize) -> Self {
        Self {
            column,
            direction: SortDirection::Descending,
            nulls: NullOrdering::Default,
        }
    }

    pub fn nulls_first(mut self) -> Self {
        self.nulls = NullOrdering::First;
        self
    }

    pub fn nulls_last(mut self) -> Self {
        self.nulls = NullOrdering::Last;
        self
    }

    fn nulls_sort_first(&self) -> bool {
        match self.nulls {
            NullOrdering::First => true,
            NullOrdering::Last => false,
            NullOrdering::Default => self.direction == SortDirection::Ascending,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortOrder {
    columns: SmallVec<[SortColumn; 4]>,
}

impl SortOrder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(mut self, column: SortColumn) -> Self {
        self.columns.push(column);
        self
    }

    pub fn columns(&self) -> &[SortColumn] {
        &self.columns
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn validate(&self, column_count: usize) -> Result<()> {
        if let Some(bad) = self.columns.iter().find(|c| c.column >= column_count) {
            bail!(ResultError::InvalidConfig(format!(
                "sort column {} out of range ({} columns)",
                bad.column, column_count
            )));
        }
        Ok(())
    }
}

impl FromIterator<SortColumn> for SortOrder {
    fn from_iter<I: IntoIterator<Item = SortColumn>>(iter: I) -> Self {
        Self {
            columns: iter.into_iter().collect(),
        }
    }
}

/// A `SortOrder` bound to column collations. Comparison is total and never
/// fails.
#[derive(Debug)]
pub struct RowComparator {
    keys: SmallVec<[(SortColumn, Collation); 4]>,
}

impl RowComparator {
    pub fn new(order: &SortOrder, columns: &[ColumnDef]) -> Self {
        let keys = order
            .columns()
            .iter()
            .map(|c| {
                let collation = columns
                    .get(c.column)
                    .map(ColumnDef::collation)
                    .unwrap_or_default();
                (*c, collation)
            })
            .collect();
        Self { keys }
    }

    pub fn compare(&self, a: &[OwnedValue], b: &[OwnedValue]) -> Ordering {
        for (key, collation) in &self.keys {
            let av = a.get(key.column).unwrap_or(&OwnedValue::Null);
            let bv = b.get(key.column).unwrap_or(&OwnedValue::Null);

            let cmp = match (av.is_null(), bv.is_null()) {
                (true, true) => Ordering::Equal,
                (true, false) if key.nulls_sort_first() => Ordering::Less,
                (true, false) => Ordering::Greater,
                (false, true) if key.nulls_sort_first() => Ordering::Greater,
                (false, true) => Ordering::Less,
                (false, false) => {
                    let cmp = av.compare(bv, *collation);
                    match key.direction {
                        SortDirection::Ascending => cmp,
                        SortDirection::Descending => cmp.reverse(),
                    }
                }
            };

            if cmp != Ordering::Equal {
                return cmp;
            }
        }
        Ordering::Equal
    }
}

pub struct Sorter {
    comparator: Arc<RowComparator>,
    config: StoreConfig,
}

impl Sorter {
    pub fn new(comparator: Arc<RowComparator>, config: StoreConfig) -> Self {
        Self { comparator, config }
    }

    /// Sorts `rows` entirely in memory.
    pub fn sort_in_memory(&self, rows: impl IntoIterator<Item = Result<Row>>) -> Result<SortedRows> {
        let mut buffer = rows.into_iter().collect::<Result<Vec<Row>>>()?;
        let cmp = &self.comparator;
        buffer.sort_by(|a, b| cmp.compare(a, b));
        Ok(SortedRows::Memory(buffer.into_iter()))
    }

    /// Bounded-memory sort. Falls back to a plain in-memory sort when the
    /// input fits in one run.
    pub fn sort_external(&self, rows: impl IntoIterator<Item = Result<Row>>) -> Result<SortedRows> {
        let run_limit = self
            .config
            .max_memory_rows
            .map_or(usize::MAX, |max| max.max(MIN_SORT_RUN_ROWS));

        let mut rows = rows.into_iter();
        let mut runs: Vec<SpillFile> = Vec::new();
        let mut buffer: Vec<Row> = Vec::new();
        let mut total = 0usize;

        loop {
            let exhausted = self.fill_run(&mut rows, &mut buffer, run_limit)?;
            total += buffer.len();

            if exhausted && runs.is_empty() {
                let cmp = &self.comparator;
                buffer.sort_by(|a, b| cmp.compare(a, b));
                return Ok(SortedRows::Memory(buffer.into_iter()));
            }

            if !buffer.is_empty() {
                runs.push(self.write_run(&mut buffer)?);
            }
            if exhausted {
                break;
            }
        }

        tracing::debug!(runs = runs.len(), rows = total, "external sort produced runs");

        let mut pass = 0;
        while runs.len() > MAX_MERGE_FAN_IN {
            pass += 1;
            let before = runs.len();
            runs = self.merge_pass(runs)?;
            tracing::debug!(pass, before, after = runs.len(), "external sort merge pass");
        }

        Ok(SortedRows::Merge(RunMerger::new(
            runs,
            Arc::clone(&self.comparator),
        )?))
    }

    /// Pulls rows into `buffer` until the run is full. Returns true when the
    /// input is exhausted.
    fn fill_run(
        &self,
        rows: &mut impl Iterator<Item = Result<Row>>,
        buffer: &mut Vec<Row>,
        run_limit: usize,
    ) -> Result<bool> {
        let budget = self.config.budget.as_deref();
        let mut charged = 0usize;

        let outcome = loop {
            if buffer.len() >= run_limit {
                break Ok(false);
            }
            let Some(row) = rows.next() else {
                break Ok(true);
            };
            let row = match row {
                Ok(row) => row,
                Err(e) => break Err(e),
            };

            let size = row.estimated_size();
            let refused = match budget {
                Some(b) if b.try_allocate(Pool::Sort, size) => {
                    charged += size;
                    false
                }
                Some(_) => true,
                None => false,
            };
            buffer.push(row);

            if refused && buffer.len() >= MIN_SORT_RUN_ROWS {
                break Ok(false);
            }
        };

        if let Some(b) = budget {
            b.release(Pool::Sort, charged);
        }
        outcome
    }

    fn write_run(&self, buffer: &mut Vec<Row>) -> Result<SpillFile> {
        let cmp = &self.comparator;
        buffer.sort_by(|a, b| cmp.compare(a, b));

        let mut run = SpillFile::create(&self.config.spill_dir, SORT_RUN_FILE_PREFIX)?;
        for row in buffer.drain(..) {
            run.append(&row)?;
        }
        run.seal()?;

        tracing::trace!(rows = run.row_count(), bytes = run.size_bytes(), "sort run flushed");
        Ok(run)
    }

    fn merge_pass(&self, runs: Vec<SpillFile>) -> Result<Vec<SpillFile>> {
        let mut merged = Vec::with_capacity(runs.len().div_ceil(MAX_MERGE_FAN_IN));
        let mut runs = runs.into_iter().peekable();

        while runs.peek().is_some() {
            let group: Vec<SpillFile> = runs.by_ref().take(MAX_MERGE_FAN_IN).collect();
            let merger = RunMerger::new(group, Arc::clone(&self.comparator))?;

            let mut out = SpillFile::create(&self.config.spill_dir, SORT_RUN_FILE_PREFIX)?;
            for row in merger {
                out.append(&row?)?;
            }
            out.seal()?;
            merged.push(out);
        }

        Ok(merged)
    }
}

struct HeapEntry {
    row: Row,
    run: usize,
    comparator: Arc<RowComparator>,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for HeapEntry {}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.comparator
            .compare(&self.row, &other.row)
            .then_with(|| self.run.cmp(&other.run))
    }
}

/// Lazy k-way merge over sorted run files.
pub struct RunMerger {
    _runs: Vec<SpillFile>,
    cursors: Vec<SpillCursor>,
    heap: BinaryHeap<Reverse<HeapEntry>>,
    comparator: Arc<RowComparator>,
}

impl RunMerger {
    fn new(runs: Vec<SpillFile>, comparator: Arc<RowComparator>) -> Result<Self> {
        let mut cursors: Vec<SpillCursor> = runs.iter().map(SpillFile::cursor).collect();
        let mut heap = BinaryHeap::with_capacity(cursors.len());

        for (run, cursor) in cursors.iter_mut().enumerate() {
            if let Some(row) = cursor.next() {
                heap.push(Reverse(HeapEntry {
                    row: row?,
                    run,
                    comparator: Arc::clone(&comparator),
                }));
            }
        }

        Ok(Self {
            _runs: runs,
            cursors,
            heap,
            comparator,
        })
    }

    fn advance(&mut self) -> Result<Option<Row>> {
        let Some(Reverse(top)) = self.heap.pop() else {
            return Ok(None);
        };

        if let Some(next) = self.cursors[top.run].next() {
            self.heap.push(Reverse(HeapEntry {
                row: next?,
                run: top.run,
                comparator: Arc::clone(&self.comparator),
            }));
        }

        Ok(Some(top.row))
    }
}

impl Iterator for RunMerger {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.advance() {
            Ok(Some(row)) => Some(Ok(row)),
            Ok(None) => None,
            Err(e) => {
                self.heap.clear();
                Some(Err(e))
            }
        }
    }
}

pub enum SortedRows {
    Memory(std::vec::IntoIter<Row>),
    Merge(RunMerger),
}

impl SortedRows {
    pub fn is_external(&self) -> bool {
        matches!(self, SortedRows::Merge(_))
    }
}

impl Iterator for SortedRows {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            SortedRows::Memory(rows) => rows.next().map(Ok),
            SortedRows::Merge(merger) => merger.next(),
        }
    }
}
