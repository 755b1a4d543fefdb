//! # Row Window Selection
//!
//! Applies `OFFSET` / `FETCH FIRST n [PERCENT] ROWS [WITH TIES]` to the
//! finalized row sequence.
//!
//! ```text
//!   total rows:  r0 r1 r2 r3 r4 r5 r6 r7
//!   offset = 2        └─┬─┘
//!   limit  = 3          skipped  r2 r3 r4          window
//!   with ties                         r5           r5 ties r4
//! ```
//!
//! The selector streams: it pulls exactly the rows it needs from the sorted
//! sequence and stops, so a lazy external merge behind it is never drained
//! past the window.

use super::sort::RowComparator;
use super::store::RowStore;
use crate::error::ResultError;
use crate::types::Row;
use eyre::{bail, Result};
use std::cmp::Ordering;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSpec {
    pub offset: i64,
    /// `-1` is unbounded, `0` is empty.
    pub limit: i64,
    pub fetch_percent: bool,
    pub with_ties: bool,
}

impl Default for WindowSpec {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: -1,
            fetch_percent: false,
            with_ties: false,
        }
    }
}

impl WindowSpec {
    pub fn validate(&self, has_sort: bool) -> Result<()> {
        if self.offset < 0 {
            bail!(ResultError::InvalidConfig(format!(
                "offset must be non-negative, got {}",
                self.offset
            )));
        }
        if self.limit < -1 {
            bail!(ResultError::InvalidConfig(format!(
                "limit must be -1 or non-negative, got {}",
                self.limit
            )));
        }
        if self.fetch_percent && !(0..=100).contains(&self.limit) {
            bail!(ResultError::InvalidConfig(format!(
                "fetch percent must be between 0 and 100, got {}",
                self.limit
            )));
        }
        if self.with_ties && !has_sort {
            bail!(ResultError::InvalidConfig(
                "WITH TIES requires a sort order".to_string()
            ));
        }
        Ok(())
    }

    /// Effective row limit for `total` rows, `None` when unbounded.
    pub fn effective_limit(&self, total: usize) -> Option<usize> {
        if self.limit < 0 {
            return None;
        }
        let limit = self.limit as u128;
        if self.fetch_percent {
            Some(((limit * total as u128).div_ceil(100)) as usize)
        } else {
            Some(usize::try_from(self.limit).unwrap_or(usize::MAX))
        }
    }

    /// `[start, end)` of the window over `total` rows, ignoring ties.
    pub fn bounds(&self, total: usize) -> (usize, usize) {
        let start = usize::try_from(self.offset).unwrap_or(usize::MAX).min(total);
        let end = match self.effective_limit(total) {
            Some(limit) => start.saturating_add(limit).min(total),
            None => total,
        };
        (start, end)
    }
}

pub struct WindowSelector {
    spec: WindowSpec,
    comparator: Option<Arc<RowComparator>>,
}

impl WindowSelector {
    pub fn new(spec: WindowSpec, comparator: Option<Arc<RowComparator>>) -> Self {
        Self { spec, comparator }
    }

    /// Streams the window of `rows` (holding `total` rows) into `out` and
    /// returns the number of rows written.
    pub fn select<I>(&self, rows: I, total: usize, out: &mut RowStore) -> Result<usize>
    where
        I: IntoIterator<Item = Result<Row>>,
    {
        let (start, end) = self.spec.bounds(total);
        let mut rows = rows.into_iter();

        for _ in 0..start {
            match rows.next() {
                Some(row) => {
                    row?;
                }
                None => return Ok(0),
            }
        }

        let mut written = 0;
        let mut last: Option<Row> = None;
        while start + written < end {
            let Some(row) = rows.next() else {
                break;
            };
            let row = row?;
            out.append(row.clone())?;
            last = Some(row);
            written += 1;
        }

        if self.spec.with_ties {
            if let (Some(last), Some(cmp)) = (last, self.comparator.as_deref()) {
                for row in rows {
                    let row = row?;
                    if cmp.compare(&last, &row) != Ordering::Equal {
                        break;
                    }
                    out.append(row)?;
                    written += 1;
                }
            }
        }

        Ok(written)
    }
}
