//! Error types used by the crate.

use geocanvas_types::error::GeocanvasTypesError;
use thiserror::Error;

/// Canvas error type.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CanvasError {
    /// Argument cannot be used: degenerate CRS, singular transform, mismatched dimensions etc.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// Coordinates could not be transformed: no operation path between two CRSs, or a point outside of the validity
    /// domain of a projection.
    #[error("transform failed: {0}")]
    Transform(String),
    /// The coordinate operation factory could not create an operation.
    #[error("operation factory failed: {0}")]
    Factory(String),
    /// Operation is not defined for the given input.
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),
}

impl From<GeocanvasTypesError> for CanvasError {
    fn from(value: GeocanvasTypesError) -> Self {
        match value {
            GeocanvasTypesError::InvalidArgument(message) => Self::InvalidArgument(message),
            GeocanvasTypesError::UnsupportedOperation(message) => {
                Self::UnsupportedOperation(message)
            }
            GeocanvasTypesError::Projection(message) => Self::Transform(message),
        }
    }
}
