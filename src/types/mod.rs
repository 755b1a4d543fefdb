//! # Value and Schema Types
//!
//! This module provides the typed row model shared by every component of the
//! result engine.
//!
//! ## Module Structure
//!
//! - `data_type`: Storage-level `DataType` discriminant
//! - `owned_value`: Heap-owned `OwnedValue` with total-order comparison
//! - `column`: `ColumnDef` with name, type, and collation
//! - `row`: Shared, immutable `Row`
//!
//! ## Key Types
//!
//! | Type | Purpose |
//! |------|---------|
//! | `DataType` | Column type discriminant |
//! | `OwnedValue` | One typed value (or NULL) |
//! | `Collation` | Text ordering/equality rule of a column |
//! | `ColumnDef` | Column definition with metadata |
//! | `Row` | Fixed-arity value sequence |

mod column;
mod data_type;
mod owned_value;
mod row;

pub use column::{Collation, ColumnDef};
pub use data_type::DataType;
pub(crate) use owned_value::normalize_decimal;
pub use owned_value::OwnedValue;
pub use row::Row;
