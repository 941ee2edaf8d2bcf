//! Coordinate reference systems.
//!
//! A [`Crs`] is an immutable description of a coordinate space: its axes, units and, for geodetic systems, the
//! datum. Systems are compared structurally, ignoring their names, so two independently constructed descriptions of
//! the same space are equal and hash to the same value.

use std::borrow::Cow;
use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use nalgebra::Matrix3;

use crate::cartesian::Point2d;
use crate::error::GeocanvasTypesError;
use crate::geo::projection::WebMercator;
use crate::geo::{Datum, GeoPoint2d, Projection};

mod axis;

pub use axis::{Axis, AxisDirection, Unit};

/// Projection used by a projected CRS.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum ProjectionType {
    /// Spherical Web Mercator.
    WebMercator,
    /// Projection given by a `geodesy` operator definition.
    Other(String),
}

/// Kind of a coordinate reference system together with its defining parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum CrsKind {
    /// Longitude and latitude in degrees on the given datum.
    Geographic {
        /// Datum of the system.
        datum: Datum,
    },
    /// Easting and northing in meters, obtained by projecting geographic coordinates.
    Projected {
        /// Datum of the base geographic system.
        datum: Datum,
        /// Map projection.
        projection: ProjectionType,
    },
    /// Local cartesian plane without a relation to the Earth.
    Engineering {
        /// Unit of both axes.
        unit: Unit,
    },
    /// Display-like plane obtained by applying an affine conversion to a 2d base system. Axes point right and down
    /// and are measured in pixels.
    Derived {
        /// System the conversion starts from.
        base: Arc<Crs>,
        /// Affine conversion from the base system, in homogeneous form.
        conversion: Matrix3<f64>,
    },
    /// Time measured from an epoch.
    Temporal {
        /// Origin of the time axis.
        epoch: DateTime<Utc>,
        /// Unit of the time axis.
        unit: Unit,
    },
    /// Height above the ellipsoid.
    Vertical {
        /// Unit of the height axis.
        unit: Unit,
    },
    /// Ordered combination of other systems, e.g. horizontal + time.
    Compound {
        /// Components of the system in axis order.
        components: Vec<Arc<Crs>>,
    },
}

/// Coordinate reference system.
#[derive(Debug, Clone)]
pub struct Crs {
    name: Cow<'static, str>,
    kind: CrsKind,
}

impl Crs {
    /// WGS84 geographic system with longitude as the first axis.
    pub const WGS84: Crs = Crs {
        name: Cow::Borrowed("WGS 84"),
        kind: CrsKind::Geographic {
            datum: Datum::WGS84,
        },
    };

    /// Web Mercator projected system.
    pub const EPSG3857: Crs = Crs {
        name: Cow::Borrowed("WGS 84 / Pseudo-Mercator"),
        kind: CrsKind::Projected {
            datum: Datum::WGS84,
            projection: ProjectionType::WebMercator,
        },
    };

    /// Creates a geographic system on the given datum.
    pub fn geographic(name: impl Into<Cow<'static, str>>, datum: Datum) -> Self {
        Self {
            name: name.into(),
            kind: CrsKind::Geographic { datum },
        }
    }

    /// Creates a projected system.
    pub fn projected(
        name: impl Into<Cow<'static, str>>,
        datum: Datum,
        projection: ProjectionType,
    ) -> Self {
        Self {
            name: name.into(),
            kind: CrsKind::Projected { datum, projection },
        }
    }

    /// Creates a local cartesian system.
    pub fn engineering(name: impl Into<Cow<'static, str>>, unit: Unit) -> Self {
        Self {
            name: name.into(),
            kind: CrsKind::Engineering { unit },
        }
    }

    /// Creates a system derived from a 2d `base` through an affine `conversion`. All coefficients of the conversion
    /// must be finite.
    pub fn derived(
        name: impl Into<Cow<'static, str>>,
        base: Arc<Crs>,
        conversion: Matrix3<f64>,
    ) -> Result<Self, GeocanvasTypesError> {
        if base.dimension() != 2 {
            return Err(GeocanvasTypesError::InvalidArgument(format!(
                "base of a derived CRS must be 2-dimensional, got {}",
                base.dimension()
            )));
        }

        if conversion.iter().any(|v| !v.is_finite()) {
            return Err(GeocanvasTypesError::InvalidArgument(
                "conversion of a derived CRS must have finite coefficients".into(),
            ));
        }

        Ok(Self {
            name: name.into(),
            kind: CrsKind::Derived { base, conversion },
        })
    }

    /// Creates a temporal system. The unit must be a unit of time.
    pub fn temporal(
        name: impl Into<Cow<'static, str>>,
        epoch: DateTime<Utc>,
        unit: Unit,
    ) -> Result<Self, GeocanvasTypesError> {
        if unit.to_seconds().is_none() {
            return Err(GeocanvasTypesError::InvalidArgument(format!(
                "{unit:?} is not a unit of time"
            )));
        }

        Ok(Self {
            name: name.into(),
            kind: CrsKind::Temporal { epoch, unit },
        })
    }

    /// Temporal system counting seconds since the Unix epoch.
    pub fn unix_time() -> Self {
        Self {
            name: Cow::Borrowed("Unix time"),
            kind: CrsKind::Temporal {
                epoch: DateTime::UNIX_EPOCH,
                unit: Unit::Second,
            },
        }
    }

    /// Creates a vertical system. The unit must be a unit of length.
    pub fn vertical(
        name: impl Into<Cow<'static, str>>,
        unit: Unit,
    ) -> Result<Self, GeocanvasTypesError> {
        if !unit.is_linear() {
            return Err(GeocanvasTypesError::InvalidArgument(format!(
                "{unit:?} is not a unit of length"
            )));
        }

        Ok(Self {
            name: name.into(),
            kind: CrsKind::Vertical { unit },
        })
    }

    /// Ellipsoidal height in meters.
    pub fn ellipsoidal_height() -> Self {
        Self {
            name: Cow::Borrowed("Ellipsoidal height"),
            kind: CrsKind::Vertical { unit: Unit::Metre },
        }
    }

    /// Combines the systems into a compound one. Nested compound systems are flattened.
    pub fn compound(
        name: impl Into<Cow<'static, str>>,
        components: impl IntoIterator<Item = Crs>,
    ) -> Result<Self, GeocanvasTypesError> {
        let mut flat = vec![];
        for component in components {
            match component.kind {
                CrsKind::Compound { components } => flat.extend(components),
                _ => flat.push(Arc::new(component)),
            }
        }

        if flat.is_empty() {
            return Err(GeocanvasTypesError::InvalidArgument(
                "compound CRS must have at least one component".into(),
            ));
        }

        Ok(Self {
            name: name.into(),
            kind: CrsKind::Compound { components: flat },
        })
    }

    /// Name of the system. Names are not considered when comparing systems.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Kind and parameters of the system.
    pub fn kind(&self) -> &CrsKind {
        &self.kind
    }

    /// Axes of the system in coordinate order.
    pub fn axes(&self) -> Vec<Axis> {
        match &self.kind {
            CrsKind::Geographic { .. } => vec![
                Axis::new(AxisDirection::East, Unit::Degree),
                Axis::new(AxisDirection::North, Unit::Degree),
            ],
            CrsKind::Projected { .. } => vec![
                Axis::new(AxisDirection::East, Unit::Metre),
                Axis::new(AxisDirection::North, Unit::Metre),
            ],
            CrsKind::Engineering { unit } => vec![
                Axis::new(AxisDirection::East, *unit),
                Axis::new(AxisDirection::North, *unit),
            ],
            CrsKind::Derived { .. } => vec![
                Axis::new(AxisDirection::DisplayRight, Unit::Pixel),
                Axis::new(AxisDirection::DisplayDown, Unit::Pixel),
            ],
            CrsKind::Temporal { unit, .. } => vec![Axis::new(AxisDirection::Future, *unit)],
            CrsKind::Vertical { unit } => vec![Axis::new(AxisDirection::Up, *unit)],
            CrsKind::Compound { components } => components.iter().flat_map(|c| c.axes()).collect(),
        }
    }

    /// Number of axes.
    pub fn dimension(&self) -> usize {
        match &self.kind {
            CrsKind::Temporal { .. } | CrsKind::Vertical { .. } => 1,
            CrsKind::Compound { components } => components.iter().map(|c| c.dimension()).sum(),
            _ => 2,
        }
    }

    /// Components of a compound system, or the system itself for all other kinds.
    pub fn components(&self) -> Vec<&Crs> {
        match &self.kind {
            CrsKind::Compound { components } => components.iter().map(|c| c.as_ref()).collect(),
            _ => vec![self],
        }
    }

    /// Horizontal 2d part of the system: the system itself if it is 2d, the first 2d component of a compound
    /// system, or `None` if there is no such component.
    pub fn horizontal_component(&self) -> Option<&Crs> {
        match &self.kind {
            CrsKind::Temporal { .. } | CrsKind::Vertical { .. } => None,
            CrsKind::Compound { components } => components
                .iter()
                .find_map(|c| c.horizontal_component()),
            _ => Some(self),
        }
    }

    /// Returns true if any of the axes is a time axis.
    pub fn has_temporal_axis(&self) -> bool {
        self.axes().iter().any(|a| a.is_temporal())
    }

    /// Returns true if any of the axes is a height axis.
    pub fn has_vertical_axis(&self) -> bool {
        self.axes().iter().any(|a| a.is_vertical())
    }

    /// Datum of geographic and projected systems.
    pub fn datum(&self) -> Option<Datum> {
        match &self.kind {
            CrsKind::Geographic { datum } | CrsKind::Projected { datum, .. } => Some(*datum),
            _ => None,
        }
    }

    /// Projection from the geographic coordinates into this system, if it is a projected system.
    pub fn get_projection(
        &self,
    ) -> Option<Box<dyn Projection<InPoint = GeoPoint2d, OutPoint = Point2d> + Send + Sync>> {
        match &self.kind {
            CrsKind::Projected {
                datum,
                projection: ProjectionType::WebMercator,
            } => Some(Box::new(WebMercator::<GeoPoint2d, Point2d>::new(*datum))),
            #[cfg(feature = "geodesy")]
            CrsKind::Projected {
                projection: ProjectionType::Other(definition),
                ..
            } => Some(Box::new(crate::geo::projection::GeodesyProjection::<
                GeoPoint2d,
                Point2d,
            >::new(definition)?)),
            _ => None,
        }
    }

    /// Converts a moment of time into the coordinate of a temporal system.
    pub fn temporal_value(&self, time: DateTime<Utc>) -> Option<f64> {
        let CrsKind::Temporal { epoch, unit } = &self.kind else {
            return None;
        };

        let seconds = (time - *epoch).num_milliseconds() as f64 / 1000.0;
        Some(seconds / unit.to_seconds()?)
    }

    /// Converts a coordinate of a temporal system back into a moment of time.
    pub fn temporal_time(&self, value: f64) -> Option<DateTime<Utc>> {
        let CrsKind::Temporal { epoch, unit } = &self.kind else {
            return None;
        };

        if !value.is_finite() {
            return None;
        }

        let millis = (value * unit.to_seconds()? * 1000.0).round() as i64;
        epoch.checked_add_signed(Duration::milliseconds(millis))
    }
}

impl PartialEq for Crs {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

impl Eq for Crs {}

impl Hash for Crs {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(&self.kind).hash(state);
        self.dimension().hash(state);
        match &self.kind {
            CrsKind::Derived { base, .. } => base.hash(state),
            CrsKind::Compound { components } => {
                for component in components {
                    component.hash(state);
                }
            }
            CrsKind::Engineering { unit }
            | CrsKind::Temporal { unit, .. }
            | CrsKind::Vertical { unit } => unit.hash(state),
            CrsKind::Geographic { .. } | CrsKind::Projected { .. } => {}
        }
    }
}

impl Display for Crs {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}
