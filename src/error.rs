//! # Result Errors
//!
//! Typed errors raised by the result engine. They travel inside
//! `eyre::Report` like every other error in the crate, so callers that need
//! to branch on the kind use `downcast_ref`:
//!
//! ```ignore
//! if let Err(report) = result.append(row) {
//!     match report.downcast_ref::<ResultError>() {
//!         Some(ResultError::InvalidState { .. }) => { /* finalized already */ }
//!         _ => return Err(report),
//!     }
//! }
//! ```
//!
//! I/O errors are not represented here; they surface as wrapped
//! `std::io::Error`s with the spill file path as context.

use crate::result::ResultState;
use crate::types::DataType;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultError {
    InvalidState {
        operation: &'static str,
        state: ResultState,
    },
    InvalidConfig(String),
    ArityMismatch {
        expected: usize,
        found: usize,
    },
    TypeMismatch {
        column: usize,
        expected: DataType,
        found: DataType,
    },
}

impl std::fmt::Display for ResultError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResultError::InvalidState { operation, state } => {
                write!(f, "cannot {} while result is {}", operation, state)
            }
            ResultError::InvalidConfig(msg) => write!(f, "invalid result configuration: {}", msg),
            ResultError::ArityMismatch { expected, found } => write!(
                f,
                "row has {} values but result has {} columns",
                found, expected
            ),
            ResultError::TypeMismatch {
                column,
                expected,
                found,
            } => write!(
                f,
                "column {} expects {} but row holds {}",
                column, expected, found
            ),
        }
    }
}

impl std::error::Error for ResultError {}
