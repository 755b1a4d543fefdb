//! # Row Serialization for Spill Files and Distinct Keys
//!
//! This module provides the byte encoding of rows written to spill files and
//! the canonical encoding of distinct keys.
//!
//! ## Design Goals
//!
//! 1. **Buffer reuse**: Serialize into a caller-owned `Vec<u8>`
//! 2. **Compact encoding**: One discriminant byte per column, no padding
//! 3. **Type preserving**: Every value deserializes to the variant it was
//! 4. **Deterministic**: Same row always produces same bytes
//!
//! ## Encoding Format
//!
//! ```text
//! Row := [col_count: u16 BE] [Column]*
//! Column := [discriminant: u8] [Data]
//!
//! Discriminants:
//!   0x01 = NULL (no data)
//!   0x02 = FALSE (no data)
//!   0x03 = TRUE (no data)
//!   0x10 = NEG_INFINITY (no data, deserializes to Float)
//!   0x12 = NEG_INT (8 bytes big-endian i64)
//!   0x13 = NEG_FLOAT (8 bytes f64 bits)
//!   0x14 = ZERO (no data, deserializes to Int(0))
//!   0x15 = POS_FLOAT (8 bytes f64 bits, includes +0.0)
//!   0x16 = POS_INT (8 bytes big-endian i64)
//!   0x18 = POS_INFINITY (no data, deserializes to Float)
//!   0x19 = NAN (no data, deserializes to Float)
//!   0x20 = TEXT ([len: u32] [utf8_bytes])
//!   0x21 = BLOB ([len: u32] [bytes])
//!   0x30 = DATE (4 bytes i32)
//!   0x31 = TIME (8 bytes i64)
//!   0x32 = TIMESTAMP (8 bytes i64)
//!   0x40 = UUID (16 bytes)
//!   0x83 = DECIMAL (16 + 2 bytes: digits as i128 + scale)
//! ```
//!
//! ## Distinct Keys
//!
//! `serialize_key_into` uses the same discriminants over the key columns
//! after canonicalizing each value, so two keys are equal exactly when their
//! bytes are equal:
//!
//! - `Collation::NoCase` text is lower-cased per character, the same folding
//!   the comparator applies (no context-sensitive final sigma)
//! - `-0.0` encodes as `+0.0`, every NaN as the single `NAN` discriminant
//! - Decimals drop every trailing zero digit, going to a negative scale when
//!   needed (`1.50` encodes as `1.5`, `10` and `1e1` both as `1e1`)
//!
//! NULL keys encode as `NULL`, so NULL equals NULL inside a key.

use crate::types::{normalize_decimal, Collation, OwnedValue, Row};
use eyre::{bail, ensure, Result};

mod discriminant {
    pub const NULL: u8 = 0x01;
    pub const FALSE: u8 = 0x02;
    pub const TRUE: u8 = 0x03;

    pub const NEG_INFINITY: u8 = 0x10;

    pub const NEG_INT: u8 = 0x12;
    pub const NEG_FLOAT: u8 = 0x13;
    pub const ZERO: u8 = 0x14;
    pub const POS_FLOAT: u8 = 0x15;
    pub const POS_INT: u8 = 0x16;

    pub const POS_INFINITY: u8 = 0x18;
    pub const NAN: u8 = 0x19;

    pub const TEXT: u8 = 0x20;
    pub const BLOB: u8 = 0x21;

    pub const DATE: u8 = 0x30;
    pub const TIME: u8 = 0x31;
    pub const TIMESTAMP: u8 = 0x32;

    pub const UUID: u8 = 0x40;

    pub const DECIMAL: u8 = 0x83;
}

pub struct RowSerde;

impl RowSerde {
    /// Rows wider than `u16::MAX` columns are rejected by the result builder.
    pub fn serialize_row_into(row: &[OwnedValue], buf: &mut Vec<u8>) {
        debug_assert!(row.len() <= crate::config::MAX_COLUMNS);
        buf.extend_from_slice(&(row.len() as u16).to_be_bytes());

        for value in row {
            Self::serialize_value_into(value, buf);
        }
    }

    /// Appends the canonical key encoding of `columns` of `row`.
    pub fn serialize_key_into(
        row: &[OwnedValue],
        columns: &[usize],
        collations: &[Collation],
        buf: &mut Vec<u8>,
    ) {
        buf.extend_from_slice(&(columns.len() as u16).to_be_bytes());

        for &col in columns {
            let value = &row[col];
            match (value, collations.get(col).copied().unwrap_or_default()) {
                (OwnedValue::Text(s), Collation::NoCase) => {
                    let folded: String = s.chars().flat_map(char::to_lowercase).collect();
                    Self::write_bytes(discriminant::TEXT, folded.as_bytes(), buf);
                }
                (OwnedValue::Float(f), _) if *f == 0.0 => {
                    buf.push(discriminant::POS_FLOAT);
                    buf.extend_from_slice(&0f64.to_bits().to_be_bytes());
                }
                (OwnedValue::Decimal(digits, scale), _) => {
                    let (digits, scale) = normalize_decimal(*digits, *scale);
                    buf.push(discriminant::DECIMAL);
                    buf.extend_from_slice(&digits.to_be_bytes());
                    buf.extend_from_slice(&scale.to_be_bytes());
                }
                _ => Self::serialize_value_into(value, buf),
            }
        }
    }

    fn write_bytes(disc: u8, bytes: &[u8], buf: &mut Vec<u8>) {
        buf.push(disc);
        buf.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
        buf.extend_from_slice(bytes);
    }

    fn serialize_value_into(value: &OwnedValue, buf: &mut Vec<u8>) {
        match value {
            OwnedValue::Null => {
                buf.push(discriminant::NULL);
            }
            OwnedValue::Bool(b) => {
                buf.push(if *b {
                    discriminant::TRUE
                } else {
                    discriminant::FALSE
                });
            }
            OwnedValue::Int(i) => {
                if *i < 0 {
                    buf.push(discriminant::NEG_INT);
                    buf.extend_from_slice(&i.to_be_bytes());
                } else if *i == 0 {
                    buf.push(discriminant::ZERO);
                } else {
                    buf.push(discriminant::POS_INT);
                    buf.extend_from_slice(&i.to_be_bytes());
                }
            }
            OwnedValue::Float(f) => {
                if f.is_nan() {
                    buf.push(discriminant::NAN);
                } else if *f == f64::NEG_INFINITY {
                    buf.push(discriminant::NEG_INFINITY);
                } else if *f == f64::INFINITY {
                    buf.push(discriminant::POS_INFINITY);
                } else if f.is_sign_negative() {
                    buf.push(discriminant::NEG_FLOAT);
                    buf.extend_from_slice(&f.to_bits().to_be_bytes());
                } else {
                    buf.push(discriminant::POS_FLOAT);
                    buf.extend_from_slice(&f.to_bits().to_be_bytes());
                }
            }
            OwnedValue::Text(s) => Self::write_bytes(discriminant::TEXT, s.as_bytes(), buf),
            OwnedValue::Blob(b) => Self::write_bytes(discriminant::BLOB, b, buf),
            OwnedValue::Date(d) => {
                buf.push(discriminant::DATE);
                buf.extend_from_slice(&d.to_be_bytes());
            }
            OwnedValue::Time(t) => {
                buf.push(discriminant::TIME);
                buf.extend_from_slice(&t.to_be_bytes());
            }
            OwnedValue::Timestamp(ts) => {
                buf.push(discriminant::TIMESTAMP);
                buf.extend_from_slice(&ts.to_be_bytes());
            }
            OwnedValue::Uuid(u) => {
                buf.push(discriminant::UUID);
                buf.extend_from_slice(u);
            }
            OwnedValue::Decimal(digits, scale) => {
                buf.push(discriminant::DECIMAL);
                buf.extend_from_slice(&digits.to_be_bytes());
                buf.extend_from_slice(&scale.to_be_bytes());
            }
        }
    }

    pub fn deserialize_row(data: &[u8], offset: &mut usize) -> Result<Row> {
        let col_count = u16::from_be_bytes(Self::read_array(data, offset, "column count")?) as usize;

        let mut values = Vec::with_capacity(col_count);
        for _ in 0..col_count {
            values.push(Self::deserialize_value(data, offset)?);
        }

        Ok(Row::new(values))
    }

    /// Advances `offset` past one encoded row without materializing it.
    pub fn skip_row(data: &[u8], offset: &mut usize) -> Result<()> {
        let col_count = u16::from_be_bytes(Self::read_array(data, offset, "column count")?) as usize;

        for _ in 0..col_count {
            let [disc] = Self::read_array::<1>(data, offset, "discriminant")?;
            let payload = match disc {
                discriminant::NULL
                | discriminant::FALSE
                | discriminant::TRUE
                | discriminant::ZERO
                | discriminant::NAN
                | discriminant::NEG_INFINITY
                | discriminant::POS_INFINITY => 0,
                discriminant::DATE => 4,
                discriminant::NEG_INT
                | discriminant::POS_INT
                | discriminant::NEG_FLOAT
                | discriminant::POS_FLOAT
                | discriminant::TIME
                | discriminant::TIMESTAMP => 8,
                discriminant::UUID => 16,
                discriminant::DECIMAL => 18,
                discriminant::TEXT | discriminant::BLOB => {
                    u32::from_be_bytes(Self::read_array(data, offset, "length")?) as usize
                }
                other => bail!("unknown value discriminant: 0x{:02x}", other),
            };
            ensure!(
                data.len() >= *offset + payload,
                "truncated row: value payload"
            );
            *offset += payload;
        }

        Ok(())
    }

    fn read_array<const N: usize>(data: &[u8], offset: &mut usize, what: &str) -> Result<[u8; N]> {
        ensure!(data.len() >= *offset + N, "truncated row: missing {}", what);
        let mut out = [0u8; N];
        out.copy_from_slice(&data[*offset..*offset + N]);
        *offset += N;
        Ok(out)
    }

    fn read_slice<'d>(data: &'d [u8], offset: &mut usize, what: &str) -> Result<&'d [u8]> {
        let len = u32::from_be_bytes(Self::read_array(data, offset, what)?) as usize;
        ensure!(data.len() >= *offset + len, "truncated row: {} data", what);
        let slice = &data[*offset..*offset + len];
        *offset += len;
        Ok(slice)
    }

    fn deserialize_value(data: &[u8], offset: &mut usize) -> Result<OwnedValue> {
        let [disc] = Self::read_array::<1>(data, offset, "discriminant")?;

        match disc {
            discriminant::NULL => Ok(OwnedValue::Null),
            discriminant::FALSE => Ok(OwnedValue::Bool(false)),
            discriminant::TRUE => Ok(OwnedValue::Bool(true)),

            discriminant::ZERO => Ok(OwnedValue::Int(0)),
            discriminant::NEG_INT | discriminant::POS_INT => Ok(OwnedValue::Int(
                i64::from_be_bytes(Self::read_array(data, offset, "int")?),
            )),

            discriminant::NAN => Ok(OwnedValue::Float(f64::NAN)),
            discriminant::NEG_INFINITY => Ok(OwnedValue::Float(f64::NEG_INFINITY)),
            discriminant::POS_INFINITY => Ok(OwnedValue::Float(f64::INFINITY)),
            discriminant::NEG_FLOAT | discriminant::POS_FLOAT => Ok(OwnedValue::Float(
                f64::from_bits(u64::from_be_bytes(Self::read_array(data, offset, "float")?)),
            )),

            discriminant::TEXT => {
                let bytes = Self::read_slice(data, offset, "text")?;
                let s = std::str::from_utf8(bytes)?;
                Ok(OwnedValue::Text(s.to_string()))
            }
            discriminant::BLOB => Ok(OwnedValue::Blob(
                Self::read_slice(data, offset, "blob")?.to_vec(),
            )),

            discriminant::DATE => Ok(OwnedValue::Date(i32::from_be_bytes(Self::read_array(
                data, offset, "date",
            )?))),
            discriminant::TIME => Ok(OwnedValue::Time(i64::from_be_bytes(Self::read_array(
                data, offset, "time",
            )?))),
            discriminant::TIMESTAMP => Ok(OwnedValue::Timestamp(i64::from_be_bytes(
                Self::read_array(data, offset, "timestamp")?,
            ))),

            discriminant::UUID => Ok(OwnedValue::Uuid(Self::read_array(data, offset, "uuid")?)),

            discriminant::DECIMAL => {
                let digits = i128::from_be_bytes(Self::read_array(data, offset, "decimal digits")?);
                let scale = i16::from_be_bytes(Self::read_array(data, offset, "decimal scale")?);
                Ok(OwnedValue::Decimal(digits, scale))
            }

            other => bail!("unknown value discriminant: 0x{:02x}", other),
        }
    }
}
