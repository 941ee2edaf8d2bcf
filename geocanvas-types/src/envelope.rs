//! See [`Envelope`].

use std::sync::Arc;

use approx::AbsDiffEq;

use crate::cartesian::Rect;
use crate::crs::Crs;
use crate::error::GeocanvasTypesError;

/// Axis-aligned bounding box in a coordinate reference system.
///
/// Lower corner is never greater than the upper one and no coordinate is NaN. Infinite bounds are allowed to
/// describe open ranges on extra axes (e.g. an unbounded time range), but such an envelope is degenerate when used as
/// a view area.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    lower: Vec<f64>,
    upper: Vec<f64>,
    crs: Option<Arc<Crs>>,
}

impl Envelope {
    /// Creates a new envelope.
    ///
    /// Fails if the corners have different dimensions, the dimension differs from the CRS dimension, any coordinate is
    /// NaN or a lower coordinate is greater than the upper one.
    pub fn new(
        lower: Vec<f64>,
        upper: Vec<f64>,
        crs: Option<Arc<Crs>>,
    ) -> Result<Self, GeocanvasTypesError> {
        if lower.len() != upper.len() || lower.is_empty() {
            return Err(GeocanvasTypesError::InvalidArgument(format!(
                "envelope corners must have the same non-zero dimension, got {} and {}",
                lower.len(),
                upper.len()
            )));
        }

        if let Some(crs) = &crs {
            if crs.dimension() != lower.len() {
                return Err(GeocanvasTypesError::InvalidArgument(format!(
                    "envelope dimension {} does not match dimension {} of {crs}",
                    lower.len(),
                    crs.dimension()
                )));
            }
        }

        for (axis, (l, u)) in lower.iter().zip(&upper).enumerate() {
            if l.is_nan() || u.is_nan() {
                return Err(GeocanvasTypesError::InvalidArgument(format!(
                    "envelope has NaN bound on axis {axis}"
                )));
            }
            if l > u {
                return Err(GeocanvasTypesError::InvalidArgument(format!(
                    "envelope lower bound {l} is greater than upper bound {u} on axis {axis}"
                )));
            }
        }

        Ok(Self { lower, upper, crs })
    }

    /// Creates a 2d envelope from a rectangle.
    pub fn from_rect(rect: Rect, crs: Option<Arc<Crs>>) -> Result<Self, GeocanvasTypesError> {
        Self::new(
            vec![rect.x_min, rect.y_min],
            vec![rect.x_max, rect.y_max],
            crs,
        )
    }

    /// Number of axes.
    pub fn dimension(&self) -> usize {
        self.lower.len()
    }

    /// Coordinate reference system of the envelope, if known.
    pub fn crs(&self) -> Option<&Arc<Crs>> {
        self.crs.as_ref()
    }

    /// Returns a copy of the envelope with the given CRS. Fails if the dimensions do not match.
    pub fn with_crs(self, crs: Arc<Crs>) -> Result<Self, GeocanvasTypesError> {
        Self::new(self.lower, self.upper, Some(crs))
    }

    /// Lower corner.
    pub fn lower_corner(&self) -> &[f64] {
        &self.lower
    }

    /// Upper corner.
    pub fn upper_corner(&self) -> &[f64] {
        &self.upper
    }

    /// Minimum along the axis. Panics if the axis is out of range.
    pub fn minimum(&self, axis: usize) -> f64 {
        self.lower[axis]
    }

    /// Maximum along the axis. Panics if the axis is out of range.
    pub fn maximum(&self, axis: usize) -> f64 {
        self.upper[axis]
    }

    /// Extent along the axis. Panics if the axis is out of range.
    pub fn span(&self, axis: usize) -> f64 {
        self.upper[axis] - self.lower[axis]
    }

    /// Middle of the axis range. Panics if the axis is out of range.
    pub fn median(&self, axis: usize) -> f64 {
        (self.upper[axis] + self.lower[axis]) / 2.0
    }

    /// Rectangle spanned by the first two axes. `None` for 1d envelopes.
    pub fn to_rect(&self) -> Option<Rect> {
        if self.dimension() < 2 {
            return None;
        }

        Some(Rect::new(
            self.lower[0],
            self.lower[1],
            self.upper[0],
            self.upper[1],
        ))
    }

    /// Returns true if the first two axes do not span a finite, non-empty area.
    pub fn is_degenerate(&self) -> bool {
        self.to_rect().map(|r| r.is_degenerate()).unwrap_or(true)
    }

    /// Returns true if the point is inside the envelope or on its border.
    pub fn contains(&self, point: &[f64]) -> bool {
        point.len() == self.dimension()
            && point
                .iter()
                .zip(self.lower.iter().zip(&self.upper))
                .all(|(p, (l, u))| l <= p && p <= u)
    }
}

impl AbsDiffEq for Envelope {
    type Epsilon = f64;

    fn default_epsilon() -> Self::Epsilon {
        f64::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        let close = |a: &[f64], b: &[f64]| {
            a.len() == b.len()
                && a.iter().zip(b).all(|(a, b)| {
                    if a.is_infinite() || b.is_infinite() {
                        a == b
                    } else {
                        a.abs_diff_eq(b, epsilon)
                    }
                })
        };

        self.crs == other.crs && close(&self.lower, &other.lower) && close(&self.upper, &other.upper)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn rejects_invalid_bounds() {
        assert_matches!(
            Envelope::new(vec![1.0, 0.0], vec![0.0, 1.0], None),
            Err(GeocanvasTypesError::InvalidArgument(_))
        );
        assert_matches!(
            Envelope::new(vec![f64::NAN, 0.0], vec![0.0, 1.0], None),
            Err(GeocanvasTypesError::InvalidArgument(_))
        );
        assert_matches!(
            Envelope::new(vec![0.0], vec![0.0, 1.0], None),
            Err(GeocanvasTypesError::InvalidArgument(_))
        );
        assert_matches!(
            Envelope::new(vec![0.0], vec![1.0], Some(Arc::new(Crs::WGS84))),
            Err(GeocanvasTypesError::InvalidArgument(_))
        );
    }

    #[test]
    fn degenerate() {
        let point = Envelope::new(vec![1.0, 1.0], vec![1.0, 1.0], None).expect("valid");
        assert!(point.is_degenerate());

        let open = Envelope::new(vec![0.0, f64::NEG_INFINITY], vec![1.0, 0.0], None).expect("valid");
        assert!(open.is_degenerate());

        let area = Envelope::from_rect(Rect::new(-10.0, -10.0, 10.0, 10.0), None).expect("valid");
        assert!(!area.is_degenerate());
        assert_eq!(area.median(0), 0.0);
        assert_eq!(area.span(1), 20.0);
        assert!(area.contains(&[0.0, 10.0]));
        assert!(!area.contains(&[0.0, 10.1]));
    }
}
