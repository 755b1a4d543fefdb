//! # Result Rows
//!
//! A `Row` is an immutable, fixed-arity sequence of `OwnedValue`s. Rows are
//! shared rather than copied as they move between the row store, the sorter,
//! and the cursor, so cloning a `Row` only bumps a reference count.

use super::OwnedValue;
use std::ops::Deref;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    values: Arc<[OwnedValue]>,
}

impl Row {
    pub fn new(values: Vec<OwnedValue>) -> Self {
        Self {
            values: values.into(),
        }
    }

    pub fn values(&self) -> &[OwnedValue] {
        &self.values
    }

    /// Approximate bytes held by this row, including the shared header.
    pub fn estimated_size(&self) -> usize {
        let header = std::mem::size_of::<Self>() + 2 * std::mem::size_of::<usize>();
        header
            + self
                .values
                .iter()
                .map(OwnedValue::estimated_size)
                .sum::<usize>()
    }

    pub fn has_null_in(&self, columns: usize) -> bool {
        self.values.iter().take(columns).any(OwnedValue::is_null)
    }
}

impl Deref for Row {
    type Target = [OwnedValue];

    fn deref(&self) -> &[OwnedValue] {
        &self.values
    }
}

impl From<Vec<OwnedValue>> for Row {
    fn from(values: Vec<OwnedValue>) -> Self {
        Row::new(values)
    }
}

impl FromIterator<OwnedValue> for Row {
    fn from_iter<I: IntoIterator<Item = OwnedValue>>(iter: I) -> Self {
        Row::new(iter.into_iter().collect())
    }
}

/// Builds a [`Row`] from a list of values convertible into [`OwnedValue`].
///
/// ```ignore
/// let r = row![1i64, "a", OwnedValue::Null];
/// ```
#[macro_export]
macro_rules! row {
    ($($value:expr),* $(,)?) => {
        $crate::types::Row::new(vec![$($crate::types::OwnedValue::from($value)),*])
    };
}
