//! # Memory Budget Management
//!
//! This module provides optional, process-wide memory accounting for the
//! result engine. A single `MemoryBudget` can be shared (via `Arc`) by many
//! results so that concurrently materializing queries spill earlier instead
//! of collectively exhausting memory.
//!
//! ## Architecture
//!
//! The memory budget system uses a **reserved minimums + shared pool** model:
//!
//! ```text
//! +----------------------------------------------------------+
//! |                  Total Memory Budget                      |
//! |  (default: 25% of system RAM, minimum floor: 4 MB)       |
//! +----------------------------------------------------------+
//! |                                                          |
//! |  Reserved Pools (guaranteed minimums):                   |
//! |  +----------+ +----------+ +----------+                  |
//! |  | Rows     | | Distinct | | Sort     |                  |
//! |  | 1 MB     | | 512 KB   | | 512 KB   |                  |
//! |  +----------+ +----------+ +----------+                  |
//! |                                                          |
//! |  Overflow (remainder):                                   |
//! |  +----------------------------------------------------+  |
//! |  | Available for any pool when its reserve is used up |  |
//! |  +----------------------------------------------------+  |
//! |                                                          |
//! +----------------------------------------------------------+
//! ```
//!
//! ## Configuration
//!
//! ```rust,ignore
//! // Auto-detect (25% of system RAM, 4MB floor)
//! let budget = Arc::new(MemoryBudget::auto_detect());
//!
//! // Explicit limit
//! let budget = Arc::new(MemoryBudget::with_limit(16 * 1024 * 1024));
//!
//! let result = LocalResult::builder()
//!     .column(ColumnDef::new("id", DataType::Int8))
//!     .memory_budget(Arc::clone(&budget))
//!     .build()?;
//! ```

mod budget;

pub use budget::{BudgetStats, MemoryBudget, MemoryError, Pool};
