//! # Heap-Owned Value Representation
//!
//! `OwnedValue` is the value type carried by every result row. Values are
//! produced by the expression evaluator, already typed, and never mutated
//! after a row has been accepted.
//!
//! ## Comparison Semantics
//!
//! Result processing needs a *total* order, so comparison here differs from
//! SQL tri-valued logic:
//!
//! - NULL placement is decided by the caller (sort columns carry their own
//!   null ordering); `compare` itself ranks NULL below everything.
//! - Float: `-0.0 == 0.0`, NaN equals NaN and sorts above every number.
//! - Decimal: compared numerically across scales (`1.50 == 1.5`).
//! - Text: byte order under `Collation::Binary`, lower-case folded under
//!   `Collation::NoCase`.
//! - Mismatched types fall back to a fixed type rank. Rows are validated
//!   against the column types on entry, so this only orders corrupt input
//!   deterministically.

use super::{Collation, DataType};
use std::cmp::Ordering;

/// Fully-owned SQL value.
#[derive(Debug, Clone, PartialEq)]
pub enum OwnedValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Blob(Vec<u8>),
    Date(i32),
    Time(i64),
    Timestamp(i64),
    Uuid([u8; 16]),
    Decimal(i128, i16),
}

fn format_decimal(digits: i128, scale: i16) -> String {
    if scale <= 0 {
        match digits {
            0 => "0".to_string(),
            _ => format!("{}{}", digits, "0".repeat(scale.unsigned_abs() as usize)),
        }
    } else {
        let divisor = 10i128.pow(scale as u32);
        let int_part = digits / divisor;
        let frac_part = (digits % divisor).abs();
        let sign = if digits < 0 && int_part == 0 { "-" } else { "" };
        format!(
            "{}{}.{:0>width$}",
            sign,
            int_part,
            frac_part,
            width = scale as usize
        )
    }
}

/// Strips trailing zero digits so equal decimals share one representation.
/// The scale goes negative when needed: `10` and `1e1` both become `(1, -1)`.
pub(crate) fn normalize_decimal(mut digits: i128, mut scale: i16) -> (i128, i16) {
    if digits == 0 {
        return (0, 0);
    }
    while scale > i16::MIN && digits % 10 == 0 {
        digits /= 10;
        scale -= 1;
    }
    (digits, scale)
}

fn compare_decimal(a: (i128, i16), b: (i128, i16)) -> Ordering {
    let (ad, ascale) = normalize_decimal(a.0, a.1);
    let (bd, bscale) = normalize_decimal(b.0, b.1);
    if ascale == bscale {
        return ad.cmp(&bd);
    }
    let (lo, hi, flipped) = if ascale < bscale {
        ((ad, ascale), (bd, bscale), false)
    } else {
        ((bd, bscale), (ad, ascale), true)
    };
    let shift = (i32::from(hi.1) - i32::from(lo.1)) as u32;
    let ordering = match 10i128
        .checked_pow(shift)
        .and_then(|factor| lo.0.checked_mul(factor))
    {
        Some(scaled) => scaled.cmp(&hi.0),
        None => {
            let lo_f = lo.0 as f64 / 10f64.powi(lo.1 as i32);
            let hi_f = hi.0 as f64 / 10f64.powi(hi.1 as i32);
            compare_float(lo_f, hi_f)
        }
    };
    if flipped {
        ordering.reverse()
    } else {
        ordering
    }
}

pub(crate) fn compare_float(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

fn compare_text(a: &str, b: &str, collation: Collation) -> Ordering {
    match collation {
        Collation::Binary => a.cmp(b),
        Collation::NoCase => a
            .chars()
            .flat_map(char::to_lowercase)
            .cmp(b.chars().flat_map(char::to_lowercase)),
    }
}

impl OwnedValue {
    /// Returns true if this value is NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, OwnedValue::Null)
    }

    /// Returns the DataType for this value, or None for NULL.
    pub fn data_type(&self) -> Option<DataType> {
        match self {
            OwnedValue::Null => None,
            OwnedValue::Bool(_) => Some(DataType::Bool),
            OwnedValue::Int(_) => Some(DataType::Int8),
            OwnedValue::Float(_) => Some(DataType::Float8),
            OwnedValue::Text(_) => Some(DataType::Text),
            OwnedValue::Blob(_) => Some(DataType::Blob),
            OwnedValue::Date(_) => Some(DataType::Date),
            OwnedValue::Time(_) => Some(DataType::Time),
            OwnedValue::Timestamp(_) => Some(DataType::Timestamp),
            OwnedValue::Uuid(_) => Some(DataType::Uuid),
            OwnedValue::Decimal(_, _) => Some(DataType::Decimal),
        }
    }

    /// Approximate heap + inline bytes held by this value.
    pub fn estimated_size(&self) -> usize {
        let inline = std::mem::size_of::<Self>();
        match self {
            OwnedValue::Text(s) => inline + s.capacity(),
            OwnedValue::Blob(b) => inline + b.capacity(),
            _ => inline,
        }
    }

    fn type_rank(&self) -> u8 {
        match self {
            OwnedValue::Null => 0,
            OwnedValue::Bool(_) => 1,
            OwnedValue::Int(_) => 2,
            OwnedValue::Float(_) => 3,
            OwnedValue::Decimal(_, _) => 4,
            OwnedValue::Date(_) => 5,
            OwnedValue::Time(_) => 6,
            OwnedValue::Timestamp(_) => 7,
            OwnedValue::Text(_) => 8,
            OwnedValue::Blob(_) => 9,
            OwnedValue::Uuid(_) => 10,
        }
    }

    /// Total order over values of one column under the given collation.
    pub fn compare(&self, other: &OwnedValue, collation: Collation) -> Ordering {
        match (self, other) {
            (OwnedValue::Null, OwnedValue::Null) => Ordering::Equal,
            (OwnedValue::Bool(a), OwnedValue::Bool(b)) => a.cmp(b),
            (OwnedValue::Int(a), OwnedValue::Int(b)) => a.cmp(b),
            (OwnedValue::Float(a), OwnedValue::Float(b)) => compare_float(*a, *b),
            (OwnedValue::Text(a), OwnedValue::Text(b)) => compare_text(a, b, collation),
            (OwnedValue::Blob(a), OwnedValue::Blob(b)) => a.cmp(b),
            (OwnedValue::Date(a), OwnedValue::Date(b)) => a.cmp(b),
            (OwnedValue::Time(a), OwnedValue::Time(b)) => a.cmp(b),
            (OwnedValue::Timestamp(a), OwnedValue::Timestamp(b)) => a.cmp(b),
            (OwnedValue::Uuid(a), OwnedValue::Uuid(b)) => a.cmp(b),
            (OwnedValue::Decimal(ad, as_), OwnedValue::Decimal(bd, bs)) => {
                compare_decimal((*ad, *as_), (*bd, *bs))
            }
            _ => self.type_rank().cmp(&other.type_rank()),
        }
    }

    /// Formats the value as a display string.
    pub fn display_string(&self) -> String {
        match self {
            OwnedValue::Null => "NULL".to_string(),
            OwnedValue::Bool(b) => if *b { "true" } else { "false" }.to_string(),
            OwnedValue::Int(i) => i.to_string(),
            OwnedValue::Float(f) => f.to_string(),
            OwnedValue::Text(s) => s.clone(),
            OwnedValue::Blob(b) => {
                let hex: String = b.iter().map(|byte| format!("{:02x}", byte)).collect();
                format!("\\x{}", hex)
            }
            OwnedValue::Date(d) => format!("date:{}", d),
            OwnedValue::Time(t) => format!("time:{}", t),
            OwnedValue::Timestamp(ts) => format!("ts:{}", ts),
            OwnedValue::Uuid(u) => {
                let h: String = u.iter().map(|b| format!("{:02x}", b)).collect();
                format!(
                    "{}-{}-{}-{}-{}",
                    &h[0..8],
                    &h[8..12],
                    &h[12..16],
                    &h[16..20],
                    &h[20..32]
                )
            }
            OwnedValue::Decimal(digits, scale) => format_decimal(*digits, *scale),
        }
    }
}

impl std::fmt::Display for OwnedValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.display_string())
    }
}

impl From<i64> for OwnedValue {
    fn from(v: i64) -> Self {
        OwnedValue::Int(v)
    }
}

impl From<f64> for OwnedValue {
    fn from(v: f64) -> Self {
        OwnedValue::Float(v)
    }
}

impl From<bool> for OwnedValue {
    fn from(v: bool) -> Self {
        OwnedValue::Bool(v)
    }
}

impl From<&str> for OwnedValue {
    fn from(v: &str) -> Self {
        OwnedValue::Text(v.to_string())
    }
}

impl From<String> for OwnedValue {
    fn from(v: String) -> Self {
        OwnedValue::Text(v)
    }
}

impl<T: Into<OwnedValue>> From<Option<T>> for OwnedValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(OwnedValue::Null, Into::into)
    }
}
