//! Error type used by the crate.

use thiserror::Error;

/// Error enum.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GeocanvasTypesError {
    /// Input value is not acceptable (NaN coordinates, inverted envelope, mismatched CRS etc).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// The operation is not defined for the given geometry or CRS.
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),
    /// A map projection could not be applied to a point.
    #[error("projection failed: {0}")]
    Projection(String),
}
