use crate::domain::position::MAX_ALLOCATED_VALUE;
use std::fmt;

/// Input problems detected before any network call is made.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// No row has both a symbol and a positive allocated value.
    NoValidPositions,
    InvalidAllocatedValue { value: f64 },
    RowOutOfRange { index: usize, len: usize },
    InvalidParameter { name: &'static str, detail: String },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoValidPositions => write!(
                f,
                "no valid positions: enter at least one symbol with a value greater than 0"
            ),
            Self::InvalidAllocatedValue { value } => {
                write!(
                    f,
                    "allocated value must be a number between 0 and {MAX_ALLOCATED_VALUE} (got {value})"
                )
            }
            Self::RowOutOfRange { index, len } => {
                write!(f, "row index {index} out of range (portfolio has {len} rows)")
            }
            Self::InvalidParameter { name, detail } => write!(f, "invalid {name}: {detail}"),
        }
    }
}

impl std::error::Error for ValidationError {}
