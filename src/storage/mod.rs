//! # Spill Storage
//!
//! Byte-level storage used when a result outgrows memory.
//!
//! ## Module Structure
//!
//! - `row_serde`: Row and distinct-key encoding
//! - `spill_file`: Append-only temp file with mmap reads and a sparse row index
//!
//! Nothing here is persistent: every file is created under the configured
//! spill directory and removed when its owner is dropped.

mod row_serde;
mod spill_file;

pub use row_serde::RowSerde;
pub use spill_file::{ReadHint, SpillCursor, SpillFile};
