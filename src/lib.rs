//! # resultset - Bounded-Memory Query Result Materialization
//!
//! `resultset` is the component of a SQL executor that receives the rows a
//! query pipeline produces, holds them under a memory bound (spilling
//! overflow to temp files), applies `DISTINCT`, `ORDER BY` and
//! `OFFSET`/`FETCH` semantics, and exposes the finalized rows through a
//! re-readable cursor.
//!
//! - **Bounded memory**: a row threshold and an optional shared byte budget
//! - **Transparent spilling**: spilled and in-memory rows read as one sequence
//! - **Stable external sort**: k-way merge of sorted runs, ties keep input order
//! - **Tie-aware windows**: offset, limit, percent limits and `WITH TIES`
//!
//! ## Quick Start
//!
//! ```ignore
//! use resultset::{row, ColumnDef, DataType, LocalResult, RowSink, RowSource};
//! use resultset::{SortColumn, SortOrder};
//!
//! let mut result = LocalResult::builder()
//!     .column(ColumnDef::new("id", DataType::Int8))
//!     .column(ColumnDef::new("name", DataType::Text))
//!     .build()?;
//!
//! result.set_sort_order(SortOrder::new().then(SortColumn::desc(0)))?;
//! result.set_limit(10)?;
//! result.append(row![1i64, "alice"])?;
//! result.append(row![2i64, "bob"])?;
//! result.done()?;
//!
//! while result.next()? {
//!     println!("{:?}", result.current_row());
//! }
//! result.close();
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │   LocalResult (RowSink + RowSource)          │
//! ├──────────────┬──────────────┬───────────────┤
//! │ DistinctFilter│   Sorter     │ WindowSelector│
//! ├──────────────┴──────────────┴───────────────┤
//! │        RowStore  ──►  SpillCoordinator       │
//! ├─────────────────────────────────────────────┤
//! │   RowSerde + SpillFile (BufWriter / mmap)    │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Module Overview
//!
//! - [`result`]: Row store, spilling, distinct, sort, window, cursor
//! - [`storage`]: Row encoding and spill files
//! - [`memory`]: Shared memory budget with reserved pools
//! - [`types`]: `OwnedValue`, `Row`, `ColumnDef`, `DataType`
//! - [`config`]: Compile-time defaults
//! - [`error`]: Typed result errors
//!
//! ## Errors
//!
//! Every fallible call returns `eyre::Result`. Lifecycle, configuration and
//! row-shape errors are [`ResultError`]s, budget refusals are
//! [`MemoryError`]s, and both can be recovered with `downcast_ref`. I/O
//! failures close the result.
//!
//! ## Logging
//!
//! The crate emits `tracing` events (spills, sort runs, merge passes,
//! finalize) and never installs a subscriber.

pub mod config;
pub mod error;
pub mod memory;
pub mod result;
pub mod storage;
pub mod types;

pub use error::ResultError;
pub use memory::{MemoryBudget, MemoryError, Pool};
pub use result::{
    LocalResult, NullOrdering, ResultBuilder, ResultState, RowSink, RowSource, SortColumn,
    SortDirection, SortOrder, StoreConfig, WindowSpec,
};
pub use types::{Collation, ColumnDef, DataType, OwnedValue, Row};
