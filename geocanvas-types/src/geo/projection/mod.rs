//! Map projections: conversion between geographic and projected cartesian coordinates.

mod web_mercator;

pub use web_mercator::WebMercator;

#[cfg(feature = "geodesy")]
mod geodesy;
#[cfg(feature = "geodesy")]
pub use self::geodesy::GeodesyProjection;

/// Converts points from one coordinate space into another and back.
///
/// Both directions return `None` if the point is outside of the domain of the projection.
pub trait Projection {
    /// Point type of the source space.
    type InPoint;
    /// Point type of the target space.
    type OutPoint;

    /// Converts a point from the source into the target space.
    fn project(&self, input: &Self::InPoint) -> Option<Self::OutPoint>;
    /// Converts a point from the target back into the source space.
    fn unproject(&self, input: &Self::OutPoint) -> Option<Self::InPoint>;
}
