//! Value types used by the `geocanvas` referenced canvas: cartesian points and rectangles, [`Envelope`]s, coordinate
//! reference systems ([`crs::Crs`]), map projections ([`geo::Projection`]) and an ISO 19107 style geometry wrapper
//! ([`geometry::IsoGeometry`]).

pub mod cartesian;
pub mod crs;
mod envelope;
pub mod error;
pub mod geo;
pub mod geometry;

pub use cartesian::{CartesianPoint2d, NewCartesianPoint2d};
pub use envelope::Envelope;
