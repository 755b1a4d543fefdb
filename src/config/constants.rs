//! # Result Engine Configuration Constants
//!
//! This module centralizes the numeric defaults used by the result engine,
//! grouping interdependent values together and documenting their
//! relationships. Constants that depend on each other are co-located to
//! prevent mismatch bugs.
//!
//! ## Dependency Graph
//!
//! ```text
//! DEFAULT_MAX_MEMORY_ROWS (40,000)
//!       │
//!       └─> MIN_SORT_RUN_ROWS (must be <=)
//!             External sort runs hold max(max_memory_rows, MIN_SORT_RUN_ROWS)
//!             rows. A tiny threshold would otherwise produce one run per row.
//!
//! MAX_MERGE_FAN_IN (64)
//!       │
//!       └─> Runs merged per pass. More runs than this trigger an
//!           intermediate merge pass that writes longer runs back to disk.
//!
//! SPILL_INDEX_STRIDE (64 rows)
//!       │
//!       └─> One byte offset recorded per stride. Random access reads at
//!           most SPILL_INDEX_STRIDE - 1 rows past the indexed offset.
//! ```
//!
//! ## Critical Invariants
//!
//! These invariants are enforced by compile-time assertions:
//!
//! 1. `MIN_SORT_RUN_ROWS <= DEFAULT_MAX_MEMORY_ROWS`
//! 2. `MAX_MERGE_FAN_IN >= 2` (a merge pass must reduce the run count)
//! 3. `TOTAL_RESERVED <= MIN_BUDGET_FLOOR` (reserved pools always fit)
//!
//! ## Memory Budget Relationships
//!
//! The memory budget constants define reservation pools:
//! - `ROWS_RESERVED`: In-memory row buffers of every row store
//! - `DISTINCT_RESERVED`: Distinct key sets and lookup indexes
//! - `SORT_RESERVED`: Run buffers of the external sorter
//!
//! Total reserved = sum of all pools. Remaining budget is shared dynamically.

// ============================================================================
// ROW STORE CONFIGURATION
// ============================================================================

/// Widest row a result accepts; spilled rows store their width as a `u16`.
pub const MAX_COLUMNS: usize = u16::MAX as usize;

/// Default number of rows a result keeps in memory before spilling.
/// `set_max_memory_rows(-1)` disables spilling entirely.
pub const DEFAULT_MAX_MEMORY_ROWS: usize = 40_000;

/// Rows between two entries of a spill file's sparse offset index.
pub const SPILL_INDEX_STRIDE: usize = 64;

/// Capacity of the buffered writer in front of each spill file.
pub const SPILL_WRITE_BUFFER_SIZE: usize = 64 * 1024;

/// File name prefix for row store spill files.
pub const SPILL_FILE_PREFIX: &str = "result_spill";

/// File name prefix for external sort runs.
pub const SORT_RUN_FILE_PREFIX: &str = "sort_run";

const _: () = assert!(SPILL_INDEX_STRIDE > 0, "SPILL_INDEX_STRIDE must be non-zero");

// ============================================================================
// EXTERNAL SORT CONFIGURATION
// ============================================================================

/// Smallest number of rows per sorted run.
pub const MIN_SORT_RUN_ROWS: usize = 16;

/// Maximum number of runs merged in a single pass.
pub const MAX_MERGE_FAN_IN: usize = 64;

const _: () = assert!(
    MIN_SORT_RUN_ROWS <= DEFAULT_MAX_MEMORY_ROWS,
    "MIN_SORT_RUN_ROWS must not exceed DEFAULT_MAX_MEMORY_ROWS"
);

const _: () = assert!(
    MAX_MERGE_FAN_IN >= 2,
    "MAX_MERGE_FAN_IN must be at least 2 or merge passes never converge"
);

// ============================================================================
// MEMORY BUDGET CONFIGURATION
// ============================================================================

/// Default memory budget as percentage of system RAM.
pub const DEFAULT_BUDGET_PERCENT: usize = 25;

/// Minimum memory budget floor in bytes (4MB).
pub const MIN_BUDGET_FLOOR: usize = 4 * 1024 * 1024;

/// Memory reserved for in-memory row buffers (1MB).
pub const ROWS_RESERVED: usize = 1024 * 1024;

/// Memory reserved for distinct key sets (512KB).
pub const DISTINCT_RESERVED: usize = 512 * 1024;

/// Memory reserved for external sort run buffers (512KB).
pub const SORT_RESERVED: usize = 512 * 1024;

/// Total reserved memory across all pools.
pub const TOTAL_RESERVED: usize = ROWS_RESERVED + DISTINCT_RESERVED + SORT_RESERVED;

const _: () = assert!(
    TOTAL_RESERVED <= MIN_BUDGET_FLOOR,
    "reserved pools must fit inside the minimum budget"
);
