use crate::cartesian::point::CartesianPoint2d;
use approx::AbsDiffEq;
use nalgebra::{Point2, Scalar};
use num_traits::{FromPrimitive, Num};
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in a cartesian space.
///
/// Rectangles do not carry a coordinate system; they are used both for pixel bounds of a canvas and for areas in the
/// objective space. For a CRS-aware box see [`Envelope`](crate::Envelope).
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rect<N = f64> {
    /// Minimum x.
    pub x_min: N,
    /// Minimum y.
    pub y_min: N,
    /// Maximum x.
    pub x_max: N,
    /// Maximum y.
    pub y_max: N,
}

impl<N: Num + Copy + PartialOrd + Scalar + FromPrimitive> Rect<N> {
    /// Creates a new rectangle from its corner coordinates.
    pub fn new(x_min: N, y_min: N, x_max: N, y_max: N) -> Self {
        Self {
            x_min,
            y_min,
            x_max,
            y_max,
        }
    }

    /// Creates a rectangle from the minimum corner and its width and height.
    pub fn from_origin_size(x: N, y: N, width: N, height: N) -> Self {
        Self::new(x, y, x + width, y + height)
    }

    /// Minimum x.
    pub fn x_min(&self) -> N {
        self.x_min
    }

    /// Maximum x.
    pub fn x_max(&self) -> N {
        self.x_max
    }

    /// Minimum y.
    pub fn y_min(&self) -> N {
        self.y_min
    }

    /// Maximum y.
    pub fn y_max(&self) -> N {
        self.y_max
    }

    /// Width of the rectangle.
    pub fn width(&self) -> N {
        self.x_max - self.x_min
    }

    /// Height of the rectangle.
    pub fn height(&self) -> N {
        self.y_max - self.y_min
    }

    /// Returns true if the rectangle has no area.
    pub fn is_empty(&self) -> bool {
        !(self.width() > N::zero() && self.height() > N::zero())
    }

    /// Smallest rectangle containing both `self` and `other`.
    pub fn merge(&self, other: Self) -> Self {
        Self {
            x_min: if self.x_min < other.x_min {
                self.x_min
            } else {
                other.x_min
            },
            y_min: if self.y_min < other.y_min {
                self.y_min
            } else {
                other.y_min
            },
            x_max: if self.x_max > other.x_max {
                self.x_max
            } else {
                other.x_max
            },
            y_max: if self.y_max > other.y_max {
                self.y_max
            } else {
                other.y_max
            },
        }
    }

    /// Bounding rectangle of the points. Returns `None` if the iterator is empty.
    pub fn from_points<'a, P: CartesianPoint2d<Num = N> + 'a>(
        mut points: impl Iterator<Item = &'a P>,
    ) -> Option<Self> {
        let first = points.next()?;
        let mut x_min = first.x();
        let mut y_min = first.y();
        let mut x_max = first.x();
        let mut y_max = first.y();

        for p in points {
            if x_min > p.x() {
                x_min = p.x();
            }
            if y_min > p.y() {
                y_min = p.y();
            }
            if x_max < p.x() {
                x_max = p.x();
            }
            if y_max < p.y() {
                y_max = p.y();
            }
        }

        Some(Self {
            x_min,
            y_min,
            x_max,
            y_max,
        })
    }

    /// Returns true if the point is inside the rectangle or on its border.
    pub fn contains(&self, point: &impl CartesianPoint2d<Num = N>) -> bool {
        self.x_min <= point.x()
            && self.x_max >= point.x()
            && self.y_min <= point.y()
            && self.y_max >= point.y()
    }

    /// Scales the rectangle around its center.
    pub fn magnify(&self, factor: N) -> Self {
        let two = N::from_f64(2.0).expect("const conversion failed");
        let cx = (self.x_min + self.x_max) / two;
        let cy = (self.y_min + self.y_max) / two;
        let half_width = self.width() / two * factor;
        let half_height = self.height() / two * factor;
        Self {
            x_min: cx - half_width,
            x_max: cx + half_width,
            y_min: cy - half_height,
            y_max: cy + half_height,
        }
    }

    /// Center point.
    pub fn center(&self) -> Point2<N> {
        let two = N::from_f64(2.0).expect("const conversion failed");
        Point2::new(
            (self.x_min + self.x_max) / two,
            (self.y_min + self.y_max) / two,
        )
    }

    /// Corners of the rectangle, counterclockwise starting from the minimum one.
    pub fn into_quadrangle(self) -> [Point2<N>; 4] {
        [
            Point2::new(self.x_min, self.y_min),
            Point2::new(self.x_max, self.y_min),
            Point2::new(self.x_max, self.y_max),
            Point2::new(self.x_min, self.y_max),
        ]
    }
}

impl Rect<f64> {
    /// Returns true if the rectangle cannot be used as a view area: its width or height is zero, negative, NaN or
    /// infinite.
    pub fn is_degenerate(&self) -> bool {
        let width = self.width();
        let height = self.height();
        !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0)
    }

    /// Points along the border of the rectangle. Every edge is split into `segments` parts, so
    /// `4 * segments` points are returned.
    pub fn sample_border(&self, segments: usize) -> Vec<Point2<f64>> {
        let segments = segments.max(1);
        let corners = self.into_quadrangle();
        let mut points = Vec::with_capacity(segments * 4);
        for i in 0..4 {
            let from = corners[i];
            let to = corners[(i + 1) % 4];
            for step in 0..segments {
                let k = step as f64 / segments as f64;
                points.push(from + (to - from) * k);
            }
        }

        points
    }
}

impl AbsDiffEq for Rect<f64> {
    type Epsilon = f64;

    fn default_epsilon() -> Self::Epsilon {
        f64::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        self.x_min.abs_diff_eq(&other.x_min, epsilon)
            && self.y_min.abs_diff_eq(&other.y_min, epsilon)
            && self.x_max.abs_diff_eq(&other.x_max, epsilon)
            && self.y_max.abs_diff_eq(&other.y_max, epsilon)
    }
}
