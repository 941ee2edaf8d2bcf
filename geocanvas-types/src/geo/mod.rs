//! Geographic coordinates (latitude and longitude) (see [`GeoPoint`]) and conversion between geographic and
//! projected coordinates (see [`Projection`]).

mod datum;
mod point;
pub mod projection;

pub use datum::Datum;
pub use point::{GeoPoint, GeoPoint2d, NewGeoPoint};
pub use projection::Projection;
