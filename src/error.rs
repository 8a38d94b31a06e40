//! Error types shared by vectors, tensors and the matrix algorithms.
//!
//! Every failure is reported immediately to the caller; no operation retries
//! or returns a partially computed tensor.

use crate::backend::Backend;
use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = core::result::Result<T, TensorError>;

/// Coarse classification of a [`TensorError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Operand shapes are incompatible with the requested algorithm.
    DimensionMismatch,

    /// A constructor received the wrong number of elements or an unusable shape.
    ConstructionSizeMismatch,

    /// A lane, column, row or rank index broke an access contract.
    ContractViolation,

    /// The requested kernel backend cannot run on this CPU.
    Backend,
}

/// Errors reported by the crate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TensorError {
    /// Inner dimensions disagree, an operand has the wrong rank, or a
    /// transpose input is not block-aligned. Carries every offending shape.
    #[error("dimension mismatch in `{op}`: shapes {shapes:?}")]
    DimensionMismatch {
        /// Name of the failing operation.
        op: &'static str,
        /// Logical shapes of the operands, in argument order.
        shapes: Vec<Vec<usize>>,
    },

    /// A literal or flat constructor got a different number of elements than
    /// it needs.
    #[error("construction size mismatch: expected {expected} elements, got {actual}")]
    ConstructionSizeMismatch {
        /// Element count implied by the shape or the vector width.
        expected: usize,
        /// Element count actually supplied.
        actual: usize,
    },

    /// Rank 0, a zero extent, or an extent product that overflows `usize`.
    #[error("invalid tensor shape {shape:?}: rank and every extent must be non-zero")]
    InvalidShape {
        /// The rejected shape.
        shape: Vec<usize>,
    },

    /// Lane index `>= N`.
    #[error("lane {index} out of range for a {lanes}-lane vector")]
    LaneOutOfRange {
        /// Requested lane.
        index: usize,
        /// Vector width.
        lanes: usize,
    },

    /// Block access with a column that is not a multiple of the vector width.
    #[error("column {col} is not aligned to the {lanes}-lane block width")]
    MisalignedColumn {
        /// Requested column.
        col: usize,
        /// Vector width.
        lanes: usize,
    },

    /// Row or column outside the logical shape.
    #[error("index {index:?} out of bounds for shape {shape:?}")]
    IndexOutOfBounds {
        /// Requested `(row, col)`.
        index: Vec<usize>,
        /// Logical shape of the tensor.
        shape: Vec<usize>,
    },

    /// `dim(rank)` with a rank outside `-ndim..ndim`.
    #[error("rank {rank} out of range for a rank-{ndim} tensor")]
    RankOutOfRange {
        /// Requested rank (negative counts from the innermost dimension).
        rank: isize,
        /// Number of dimensions.
        ndim: usize,
    },

    /// The requested backend is not supported here.
    #[error("backend {0:?} is not supported on this CPU")]
    BackendUnavailable(Backend),
}

impl TensorError {
    /// Returns the coarse kind of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::DimensionMismatch { .. } => ErrorKind::DimensionMismatch,
            Self::ConstructionSizeMismatch { .. } | Self::InvalidShape { .. } => {
                ErrorKind::ConstructionSizeMismatch
            }
            Self::LaneOutOfRange { .. }
            | Self::MisalignedColumn { .. }
            | Self::IndexOutOfBounds { .. }
            | Self::RankOutOfRange { .. } => ErrorKind::ContractViolation,
            Self::BackendUnavailable(_) => ErrorKind::Backend,
        }
    }

    pub(crate) fn dimension_mismatch(op: &'static str, shapes: &[&[usize]]) -> Self {
        Self::DimensionMismatch {
            op,
            shapes: shapes.iter().map(|s| s.to_vec()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_group_contract_violations() {
        let lane = TensorError::LaneOutOfRange { index: 9, lanes: 8 };
        let col = TensorError::MisalignedColumn { col: 3, lanes: 8 };
        let rank = TensorError::RankOutOfRange { rank: -3, ndim: 2 };
        for err in [lane, col, rank] {
            assert_eq!(err.kind(), ErrorKind::ContractViolation);
        }
        assert_eq!(
            TensorError::InvalidShape { shape: vec![] }.kind(),
            ErrorKind::ConstructionSizeMismatch
        );
    }

    #[test]
    fn dimension_mismatch_reports_both_shapes() {
        let err = TensorError::dimension_mismatch("multiply", &[&[2, 3], &[4, 2]]);
        assert_eq!(err.kind(), ErrorKind::DimensionMismatch);
        assert_eq!(
            err.to_string(),
            "dimension mismatch in `multiply`: shapes [[2, 3], [4, 2]]"
        );
    }
}
