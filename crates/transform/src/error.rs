//! Error types for transform operations.

use thiserror::Error;

/// Errors that can occur when building, composing, or carving transforms.
#[derive(Error, Debug)]
pub enum TransformError {
    /// Dimension counts do not line up.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// The matrix is not a valid homogeneous affine matrix.
    #[error("invalid transform matrix: {0}")]
    InvalidMatrix(String),

    /// The transform has no inverse.
    #[error("transform is not invertible: {0}")]
    NonInvertible(String),

    /// The selected source dimensions cannot be carved out as an
    /// independent sub-transform.
    #[error("transform is not separable: {0}")]
    Unseparable(String),

    /// A carved sub-transform landed at unexpected target dimensions.
    #[error("unstable dimensions: {0}")]
    UnstableDimensions(String),
}

impl TransformError {
    /// Create a DimensionMismatch error.
    pub fn dimension_mismatch(expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch { expected, actual }
    }

    /// Create an InvalidMatrix error.
    pub fn invalid_matrix(msg: impl Into<String>) -> Self {
        Self::InvalidMatrix(msg.into())
    }

    /// Create an Unseparable error.
    pub fn unseparable(msg: impl Into<String>) -> Self {
        Self::Unseparable(msg.into())
    }

    /// Create an UnstableDimensions error.
    pub fn unstable(msg: impl Into<String>) -> Self {
        Self::UnstableDimensions(msg.into())
    }
}

/// Result type for transform operations.
pub type Result<T> = std::result::Result<T, TransformError>;
