use geo::{LineString, Point, Polygon};

/// Boundary of a geometry, following ISO 19107 vocabulary.
#[derive(Debug, Clone, PartialEq)]
pub enum Boundary {
    /// Boundary of a curve.
    Curve(CurveBoundary),
    /// Boundary of a surface.
    Surface(SurfaceBoundary),
}

/// End points of a curve. Closed curves have an empty boundary, in which case both points are `None`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveBoundary {
    start: Option<Point<f64>>,
    end: Option<Point<f64>>,
}

impl CurveBoundary {
    pub(crate) fn from_line_string(line: &LineString<f64>) -> Self {
        if line.0.is_empty() || line.is_closed() {
            return Self::empty();
        }

        Self {
            start: line.0.first().map(|c| Point::from(*c)),
            end: line.0.last().map(|c| Point::from(*c)),
        }
    }

    /// Boundary of a closed curve.
    pub fn empty() -> Self {
        Self {
            start: None,
            end: None,
        }
    }

    /// Start point of the curve.
    pub fn start_point(&self) -> Option<Point<f64>> {
        self.start
    }

    /// End point of the curve.
    pub fn end_point(&self) -> Option<Point<f64>> {
        self.end
    }

    /// Returns true if the curve is closed.
    pub fn is_empty(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }
}

/// Rings bounding a surface.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceBoundary {
    exterior: LineString<f64>,
    interiors: Vec<LineString<f64>>,
}

impl SurfaceBoundary {
    pub(crate) fn from_polygon(polygon: &Polygon<f64>) -> Self {
        Self {
            exterior: polygon.exterior().clone(),
            interiors: polygon.interiors().to_vec(),
        }
    }

    /// Outer ring.
    pub fn exterior(&self) -> &LineString<f64> {
        &self.exterior
    }

    /// Rings of the holes.
    pub fn interiors(&self) -> &[LineString<f64>] {
        &self.interiors
    }
}
