//! # Column Data Types
//!
//! The `DataType` enum names the storage-level type of every column in a
//! result. All rows of one result share the same per-column types; values
//! arrive already typed from the expression evaluator and are only checked
//! against the declared type, never coerced.
//!
//! ## Type Categories
//!
//! | Category | Types | Fixed Size |
//! |----------|-------|------------|
//! | **Boolean** | Bool | 1 byte |
//! | **Integer** | Int8 | 8 bytes |
//! | **Float** | Float8 | 8 bytes |
//! | **Date/Time** | Date, Time, Timestamp | 4-8 bytes |
//! | **Identifier** | Uuid | 16 bytes |
//! | **Text** | Text | Variable |
//! | **Binary** | Blob | Variable |
//! | **Numeric** | Decimal | 18 bytes |
//!
//! ## Discriminant Values
//!
//! Discriminants are grouped by category:
//! - 0-10: Fixed-width primitives (bool, int, float, datetime, uuid)
//! - 20-21: Variable-length text/binary
//! - 30: Numeric types

/// Storage-level type of a result column.
///
/// Uses `#[repr(u8)]` for a single-byte discriminant.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Bool = 0,
    Int8 = 3,
    Float8 = 5,
    Date = 6,
    Time = 7,
    Timestamp = 8,
    Uuid = 10,

    Text = 20,
    Blob = 21,

    Decimal = 30,
}

impl DataType {
    /// Returns the fixed byte size for this type, or None for variable-length types.
    pub fn fixed_size(&self) -> Option<usize> {
        match self {
            DataType::Bool => Some(1),
            DataType::Int8 => Some(8),
            DataType::Float8 => Some(8),
            DataType::Date => Some(4),
            DataType::Time => Some(8),
            DataType::Timestamp => Some(8),
            DataType::Uuid => Some(16),
            DataType::Decimal => Some(18),
            DataType::Text | DataType::Blob => None,
        }
    }

    /// Returns true if this type requires variable-length encoding.
    pub fn is_variable(&self) -> bool {
        self.fixed_size().is_none()
    }

    /// Returns true if this is a numeric type.
    pub fn is_numeric(&self) -> bool {
        matches!(self, DataType::Int8 | DataType::Float8 | DataType::Decimal)
    }

    /// Returns true if text collations apply to this type.
    pub fn is_text(&self) -> bool {
        matches!(self, DataType::Text)
    }

    pub fn name(&self) -> &'static str {
        match self {
            DataType::Bool => "BOOLEAN",
            DataType::Int8 => "BIGINT",
            DataType::Float8 => "DOUBLE",
            DataType::Date => "DATE",
            DataType::Time => "TIME",
            DataType::Timestamp => "TIMESTAMP",
            DataType::Uuid => "UUID",
            DataType::Text => "TEXT",
            DataType::Blob => "BLOB",
            DataType::Decimal => "DECIMAL",
        }
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<u8> for DataType {
    type Error = eyre::Report;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(DataType::Bool),
            3 => Ok(DataType::Int8),
            5 => Ok(DataType::Float8),
            6 => Ok(DataType::Date),
            7 => Ok(DataType::Time),
            8 => Ok(DataType::Timestamp),
            10 => Ok(DataType::Uuid),
            20 => Ok(DataType::Text),
            21 => Ok(DataType::Blob),
            30 => Ok(DataType::Decimal),
            _ => eyre::bail!("invalid DataType discriminant: {}", value),
        }
    }
}
