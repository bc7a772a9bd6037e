//! Error types for kyvos.

use thiserror::Error;

/// Errors that can occur while building or querying the hypercube index.
///
/// All of these are configuration errors reported at an entry point, before
/// any index state is published. A query that finds nothing is *not* an
/// error; it surfaces as `None` in the result slot.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CubeError {
    /// Pointset holds no points.
    #[error("pointset is empty")]
    EmptyPointset,

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Worker count violates the build partition preconditions.
    #[error(
        "worker count {workers} incompatible with code length {code_bits}: \
         need workers < code_bits and (code_bits - 1) divisible by workers"
    )]
    WorkerPartition { workers: usize, code_bits: usize },

    /// Per-query examination budget outside `1..=N`.
    #[error("budget {budget} out of range 1..={points}")]
    BudgetOutOfRange { budget: usize, points: usize },

    /// Flat buffer length is not a whole number of rows.
    #[error("buffer of {len} scalars is not a multiple of dimension {dim}")]
    DimensionMismatch { len: usize, dim: usize },
}

/// Result type alias for kyvos operations.
pub type Result<T> = std::result::Result<T, CubeError>;
