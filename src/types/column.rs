//! # Column Definitions
//!
//! A `ColumnDef` pairs a `DataType` with the metadata the result engine
//! needs to order and deduplicate values: the column name and its text
//! collation.
//!
//! ## Usage
//!
//! ```ignore
//! use resultset::types::{Collation, ColumnDef, DataType};
//!
//! let id = ColumnDef::new("id", DataType::Int8);
//! let name = ColumnDef::new("name", DataType::Text).with_collation(Collation::NoCase);
//! ```

use super::{DataType, OwnedValue};

/// How text values of a column are ordered and compared for equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Collation {
    /// Byte-wise UTF-8 order.
    #[default]
    Binary,
    /// Unicode lower-case folding before comparison.
    NoCase,
}

/// Column definition with type and collation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    name: String,
    data_type: DataType,
    collation: Collation,
}

impl ColumnDef {
    /// Creates a new column definition with the given name and type.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            collation: Collation::Binary,
        }
    }

    /// Sets the collation. Only meaningful for text columns.
    pub fn with_collation(mut self, collation: Collation) -> Self {
        self.collation = collation;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn collation(&self) -> Collation {
        self.collation
    }

    /// Returns true if `value` may be stored in this column. NULL fits every column.
    pub fn accepts(&self, value: &OwnedValue) -> bool {
        match value.data_type() {
            None => true,
            Some(dt) => dt == self.data_type,
        }
    }
}
