//! # Memory Budget Implementation
//!
//! A `MemoryBudget` is a byte limit shared by every result that opts into
//! it. Each [`Pool`] owns a reserved slice of the limit; whatever is left
//! after the reserves is an overflow area any pool may borrow from.
//!
//! ```text
//!   total_limit
//!   ├── Rows reserve      (ROWS_RESERVED)
//!   ├── Distinct reserve  (DISTINCT_RESERVED)
//!   ├── Sort reserve      (SORT_RESERVED)
//!   └── overflow          (total_limit - TOTAL_RESERVED)
//! ```
//!
//! A pool's usage beyond its reserve counts against the overflow area. An
//! allocation succeeds only when both the total limit and the remaining
//! overflow allow it; otherwise it fails with [`MemoryError`].
//!
//! What a refusal means is up to the caller. Row stores react by spilling,
//! the external sorter by closing its current run early, and distinct key
//! sets (which cannot spill) by failing the append.
//!
//! Counters are plain atomics updated with compare-and-swap, so one budget
//! can be shared across threads through `Arc`. Sizes are estimates
//! (`Row::estimated_size`, encoded key length), not allocator truth.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::OnceLock;

use eyre::{bail, Result};
use sysinfo::System;

pub use crate::config::{
    DEFAULT_BUDGET_PERCENT, DISTINCT_RESERVED, MIN_BUDGET_FLOOR, ROWS_RESERVED, SORT_RESERVED,
    TOTAL_RESERVED,
};

static SYSTEM_TOTAL_MEMORY: OnceLock<usize> = OnceLock::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pool {
    Rows,
    Distinct,
    Sort,
}

impl Pool {
    const ALL: [Pool; 3] = [Pool::Rows, Pool::Distinct, Pool::Sort];

    pub fn reserved_size(&self) -> usize {
        match self {
            Pool::Rows => ROWS_RESERVED,
            Pool::Distinct => DISTINCT_RESERVED,
            Pool::Sort => SORT_RESERVED,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Pool::Rows => "rows",
            Pool::Distinct => "distinct",
            Pool::Sort => "sort",
        }
    }

    fn slot(self) -> usize {
        self as usize
    }
}

/// Point-in-time usage snapshot, logged when a row store starts spilling.
#[derive(Debug, Clone, Copy)]
pub struct BudgetStats {
    pub total_limit: usize,
    pub rows_used: usize,
    pub distinct_used: usize,
    pub sort_used: usize,
    pub overflow_available: usize,
}

impl BudgetStats {
    pub fn total_used(&self) -> usize {
        self.rows_used + self.distinct_used + self.sort_used
    }
}

impl std::fmt::Display for BudgetStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "rows:{}/{},distinct:{}/{},sort:{}/{},overflow_free:{}",
            self.rows_used,
            ROWS_RESERVED,
            self.distinct_used,
            DISTINCT_RESERVED,
            self.sort_used,
            SORT_RESERVED,
            self.overflow_available
        )
    }
}

#[derive(Debug)]
pub struct MemoryError {
    pub pool: Pool,
    pub requested: usize,
    pub available: usize,
}

impl std::fmt::Display for MemoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "memory budget exceeded: {} pool requested {} bytes but only {} available",
            self.pool.name(),
            self.requested,
            self.available
        )
    }
}

impl std::error::Error for MemoryError {}

#[derive(Debug)]
pub struct MemoryBudget {
    total_limit: usize,
    used: [AtomicUsize; 3],
}

impl MemoryBudget {
    /// `DEFAULT_BUDGET_PERCENT` of system RAM, never below `MIN_BUDGET_FLOOR`.
    pub fn auto_detect() -> Self {
        let total_memory = *SYSTEM_TOTAL_MEMORY.get_or_init(|| {
            let mut sys = System::new();
            sys.refresh_memory();
            sys.total_memory() as usize
        });

        Self::with_limit((total_memory / 100).saturating_mul(DEFAULT_BUDGET_PERCENT))
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            total_limit: limit.max(MIN_BUDGET_FLOOR),
            used: [AtomicUsize::new(0), AtomicUsize::new(0), AtomicUsize::new(0)],
        }
    }

    pub fn total_limit(&self) -> usize {
        self.total_limit
    }

    pub fn pool_used(&self, pool: Pool) -> usize {
        self.used[pool.slot()].load(Ordering::Acquire)
    }

    pub fn total_used(&self) -> usize {
        Pool::ALL.iter().map(|p| self.pool_used(*p)).sum()
    }

    /// Bytes of the overflow area not yet borrowed by any pool.
    pub fn shared_available(&self) -> usize {
        let borrowed: usize = Pool::ALL
            .iter()
            .map(|p| self.pool_used(*p).saturating_sub(p.reserved_size()))
            .sum();
        self.total_limit
            .saturating_sub(TOTAL_RESERVED)
            .saturating_sub(borrowed)
    }

    /// Largest allocation `pool` could currently make.
    pub fn available(&self, pool: Pool) -> usize {
        let unreserved = pool.reserved_size().saturating_sub(self.pool_used(pool));
        unreserved + self.shared_available()
    }

    pub fn allocate(&self, pool: Pool, bytes: usize) -> Result<()> {
        if bytes == 0 {
            return Ok(());
        }

        let counter = &self.used[pool.slot()];
        let reserved = pool.reserved_size();
        let mut current = counter.load(Ordering::Acquire);

        loop {
            let total = self.total_used();
            if total.saturating_add(bytes) > self.total_limit {
                bail!(MemoryError {
                    pool,
                    requested: bytes,
                    available: self.total_limit.saturating_sub(total),
                });
            }

            let wanted = current + bytes;
            let borrow = wanted.saturating_sub(reserved) - current.saturating_sub(reserved);
            if borrow > self.shared_available() {
                bail!(MemoryError {
                    pool,
                    requested: bytes,
                    available: self.available(pool),
                });
            }

            match counter.compare_exchange_weak(current, wanted, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => return Ok(()),
                Err(actual) => current = actual,
            }
        }
    }

    /// Like [`allocate`](Self::allocate), for callers that treat a refusal
    /// as a signal rather than an error.
    pub fn try_allocate(&self, pool: Pool, bytes: usize) -> bool {
        self.allocate(pool, bytes).is_ok()
    }

    /// Returns `bytes` to `pool`. Releasing more than was charged clamps to 0.
    pub fn release(&self, pool: Pool, bytes: usize) {
        if bytes == 0 {
            return;
        }
        let _ = self.used[pool.slot()].fetch_update(Ordering::AcqRel, Ordering::Acquire, |v| {
            Some(v.saturating_sub(bytes))
        });
    }

    pub fn stats(&self) -> BudgetStats {
        BudgetStats {
            total_limit: self.total_limit,
            rows_used: self.pool_used(Pool::Rows),
            distinct_used: self.pool_used(Pool::Distinct),
            sort_used: self.pool_used(Pool::Sort),
            overflow_available: self.shared_available(),
        }
    }
}

impl Default for MemoryBudget {
    fn default() -> Self {
        Self::auto_detect()
    }
}
