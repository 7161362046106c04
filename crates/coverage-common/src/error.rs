//! Error types for the coverage data model.

use thiserror::Error;

/// Result type alias using CoverageError.
pub type CoverageResult<T> = Result<T, CoverageError>;

/// Errors raised while constructing or validating coverage model types.
#[derive(Debug, Error)]
pub enum CoverageError {
    /// Dimension counts of CRS, grid geometry, and buffer disagree.
    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// Band list and buffer band count disagree.
    #[error("band mismatch: {0}")]
    BandMismatch(String),

    /// Grid extent bounds are inverted or empty.
    #[error("invalid grid extent: {0}")]
    InvalidExtent(String),

    /// CRS code string not recognized.
    #[error("unsupported CRS: {0}")]
    UnsupportedCrs(String),

    /// Index outside the grid extent or buffer shape.
    #[error("index out of bounds: {0}")]
    OutOfBounds(String),
}

impl CoverageError {
    /// Create a DimensionMismatch error.
    pub fn dimension_mismatch(msg: impl Into<String>) -> Self {
        Self::DimensionMismatch(msg.into())
    }

    /// Create a BandMismatch error.
    pub fn band_mismatch(msg: impl Into<String>) -> Self {
        Self::BandMismatch(msg.into())
    }

    /// Create an InvalidExtent error.
    pub fn invalid_extent(msg: impl Into<String>) -> Self {
        Self::InvalidExtent(msg.into())
    }

    /// Create an OutOfBounds error.
    pub fn out_of_bounds(msg: impl Into<String>) -> Self {
        Self::OutOfBounds(msg.into())
    }
}
