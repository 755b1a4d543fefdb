//! # Result Materialization
//!
//! This module holds the engine that buffers a query's rows under a memory
//! bound and turns them into a finalized, re-readable result.
//!
//! ## Components
//!
//! ```text
//!   producer ──append──► DistinctFilter ──► RowStore ──overflow──► SpillCoordinator
//!                                              │                        │
//!                                         done()│◄──── unified scan ─────┘
//!                                              ▼
//!                                 Sorter (in-memory or external merge)
//!                                              ▼
//!                                       WindowSelector
//!                                              ▼
//!   consumer ◄──next/current_row──── ResultCursor over FinalRows
//! ```
//!
//! | Module     | Type                   | Role                                   |
//! |------------|------------------------|----------------------------------------|
//! | `store`    | `RowStore`             | Append-only rows, memory + spill       |
//! | `spill`    | `SpillCoordinator`     | External sequential store              |
//! | `distinct` | `DistinctFilter`       | Hash-keyed membership, tombstones      |
//! | `sort`     | `Sorter`               | Stable in-memory / external sort       |
//! | `window`   | `WindowSelector`       | Offset, limit, percent, ties           |
//! | `cursor`   | `ResultCursor`         | Positioned reads over final rows       |
//! | `local`    | `LocalResult`          | State machine tying it all together    |
//!
//! A result is single-producer, single-consumer. Nothing in this module is
//! synchronized; `Arc` is used only so cursors can share finalized rows.

mod builder;
mod cursor;
mod distinct;
mod local;
mod sort;
mod spill;
mod store;
mod window;

pub use builder::ResultBuilder;
pub use cursor::{FinalRows, ResultCursor};
pub use distinct::DistinctFilter;
pub use local::{LocalResult, ResultState, RowSink, RowSource};
pub use sort::{
    NullOrdering, RowComparator, RunMerger, SortColumn, SortDirection, SortOrder, SortedRows, Sorter,
};
pub use spill::SpillCoordinator;
pub use store::{RowStore, StoreConfig, StoreMode};
pub use window::{WindowSelector, WindowSpec};
