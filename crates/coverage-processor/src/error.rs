//! Error types for coverage processing.

use coverage_common::CoverageError;
use thiserror::Error;

/// Errors that can occur while running coverage operations.
#[derive(Error, Debug)]
pub enum ProcessingError {
    /// No operation registered under the requested name.
    #[error("no operation named '{0}' is registered")]
    OperationNotFound(String),

    /// A parameter value is missing, has the wrong kind, or is malformed.
    #[error("invalid parameter '{param}': {message}")]
    InvalidParameter { param: String, message: String },

    /// A source coverage could not be brought onto the common geometry.
    #[error("cannot reproject coverage '{coverage}': {message}")]
    CannotReproject { coverage: String, message: String },

    /// Sources disagree on their 2D geometry after reconciliation.
    ///
    /// This indicates a misbehaving reconciler rather than bad input.
    #[error("incompatible geometry: {0}")]
    IncompatibleGeometry(String),

    /// Coverage model error (bad shapes, band counts, extents).
    #[error("coverage model error: {0}")]
    Model(#[from] CoverageError),
}

impl ProcessingError {
    /// Create an OperationNotFound error.
    pub fn operation_not_found(name: impl Into<String>) -> Self {
        Self::OperationNotFound(name.into())
    }

    /// Create an InvalidParameter error.
    pub fn invalid_parameter(param: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            param: param.into(),
            message: message.into(),
        }
    }

    /// Create a CannotReproject error carrying the coverage display name.
    pub fn cannot_reproject(coverage: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CannotReproject {
            coverage: coverage.into(),
            message: message.into(),
        }
    }

    /// Create an IncompatibleGeometry error.
    pub fn incompatible_geometry(msg: impl Into<String>) -> Self {
        Self::IncompatibleGeometry(msg.into())
    }
}

/// Result type for coverage processing operations.
pub type Result<T> = std::result::Result<T, ProcessingError>;
