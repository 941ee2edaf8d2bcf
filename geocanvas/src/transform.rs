//! Math transforms between coordinate spaces.

use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use geocanvas_types::cartesian::{Point2d, Rect};
use geocanvas_types::crs::Crs;
use geocanvas_types::geo::{GeoPoint, GeoPoint2d, NewGeoPoint, Projection};
use geocanvas_types::Envelope;
use nalgebra::{Matrix3, Point2};

use crate::error::CanvasError;

/// Projection from geographic (longitude, latitude) into projected cartesian coordinates.
pub type MapProjection = dyn Projection<InPoint = GeoPoint2d, OutPoint = Point2d> + Send + Sync;

/// Transformation of coordinate tuples from a source space into a target space.
///
/// Transforms are cheap to clone. Geographic coordinates are always ordered as longitude, latitude.
#[derive(Clone)]
pub enum MathTransform {
    /// Leaves coordinates of the given dimension unchanged.
    Identity(usize),
    /// 2d affine transform in homogeneous form.
    Affine(Matrix3<f64>),
    /// 1d transform `x * scale + offset`.
    Linear {
        /// Multiplier.
        scale: f64,
        /// Added after scaling.
        offset: f64,
    },
    /// Map projection applied forward (geographic to projected) or backward.
    Projection {
        /// The projection.
        projection: Arc<MapProjection>,
        /// Apply `unproject` instead of `project`.
        inverse: bool,
    },
    /// Independent transforms applied to consecutive blocks of coordinates.
    PassThrough(Vec<MathTransform>),
    /// Keeps only the coordinates with the given indices.
    Select {
        /// Dimension of the input tuples.
        source_dimension: usize,
        /// Indices of the kept coordinates, in output order.
        indices: Vec<usize>,
    },
    /// Transforms applied one after another.
    Concatenated(Vec<MathTransform>),
}

impl MathTransform {
    /// Creates a projection transform.
    pub fn projection(projection: impl Into<Arc<MapProjection>>) -> Self {
        Self::Projection {
            projection: projection.into(),
            inverse: false,
        }
    }

    /// Dimension of the input tuples.
    pub fn source_dimension(&self) -> usize {
        match self {
            Self::Identity(dimension) => *dimension,
            Self::Affine(_) | Self::Projection { .. } => 2,
            Self::Linear { .. } => 1,
            Self::PassThrough(parts) => parts.iter().map(|p| p.source_dimension()).sum(),
            Self::Select {
                source_dimension, ..
            } => *source_dimension,
            Self::Concatenated(steps) => steps.first().map(|s| s.source_dimension()).unwrap_or(0),
        }
    }

    /// Dimension of the output tuples.
    pub fn target_dimension(&self) -> usize {
        match self {
            Self::Identity(dimension) => *dimension,
            Self::Affine(_) | Self::Projection { .. } => 2,
            Self::Linear { .. } => 1,
            Self::PassThrough(parts) => parts.iter().map(|p| p.target_dimension()).sum(),
            Self::Select { indices, .. } => indices.len(),
            Self::Concatenated(steps) => steps.last().map(|s| s.target_dimension()).unwrap_or(0),
        }
    }

    /// Returns true if the transform does not change coordinates.
    pub fn is_identity(&self) -> bool {
        match self {
            Self::Identity(_) => true,
            Self::Affine(m) => *m == Matrix3::identity(),
            Self::Linear { scale, offset } => *scale == 1.0 && *offset == 0.0,
            Self::Projection { .. } => false,
            Self::PassThrough(parts) => parts.iter().all(|p| p.is_identity()),
            Self::Select {
                source_dimension,
                indices,
            } => indices.len() == *source_dimension && indices.iter().enumerate().all(|(i, v)| i == *v),
            Self::Concatenated(steps) => steps.iter().all(|s| s.is_identity()),
        }
    }

    /// Returns the 2d affine matrix equivalent to this transform, if the transform is linear in two dimensions.
    pub fn as_affine(&self) -> Option<Matrix3<f64>> {
        match self {
            Self::Identity(2) => Some(Matrix3::identity()),
            Self::Affine(m) => Some(*m),
            Self::Concatenated(steps) => steps
                .iter()
                .try_fold(Matrix3::identity(), |acc, step| Some(step.as_affine()? * acc)),
            _ => None,
        }
    }

    /// Transforms a coordinate tuple.
    pub fn transform(&self, coordinates: &[f64]) -> Result<Vec<f64>, CanvasError> {
        if coordinates.len() != self.source_dimension() {
            return Err(CanvasError::InvalidArgument(format!(
                "expected {} coordinates, got {}",
                self.source_dimension(),
                coordinates.len()
            )));
        }

        match self {
            Self::Identity(_) => Ok(coordinates.to_vec()),
            Self::Affine(m) => {
                let p = m.transform_point(&Point2::new(coordinates[0], coordinates[1]));
                Ok(vec![p.x, p.y])
            }
            Self::Linear { scale, offset } => Ok(vec![coordinates[0] * scale + offset]),
            Self::Projection {
                projection,
                inverse: false,
            } => {
                let projected = projection
                    .project(&GeoPoint2d::lonlat(coordinates[0], coordinates[1]))
                    .ok_or_else(|| outside_domain(coordinates))?;
                Ok(vec![projected.x, projected.y])
            }
            Self::Projection {
                projection,
                inverse: true,
            } => {
                let geo = projection
                    .unproject(&Point2d::new(coordinates[0], coordinates[1]))
                    .ok_or_else(|| outside_domain(coordinates))?;
                Ok(vec![geo.lon(), geo.lat()])
            }
            Self::PassThrough(parts) => {
                let mut result = Vec::with_capacity(self.target_dimension());
                let mut offset = 0;
                for part in parts {
                    let dimension = part.source_dimension();
                    result.extend(part.transform(&coordinates[offset..offset + dimension])?);
                    offset += dimension;
                }
                Ok(result)
            }
            Self::Select { indices, .. } => Ok(indices.iter().map(|i| coordinates[*i]).collect()),
            Self::Concatenated(steps) => {
                let mut current = coordinates.to_vec();
                for step in steps {
                    current = step.transform(&current)?;
                }
                Ok(current)
            }
        }
    }

    /// Transforms a 2d point.
    pub fn transform_point(&self, point: &Point2d) -> Result<Point2d, CanvasError> {
        let result = self.transform(&[point.x, point.y])?;
        match result[..] {
            [x, y] => Ok(Point2d::new(x, y)),
            _ => Err(CanvasError::InvalidArgument(format!(
                "transform produces {} coordinates, expected 2",
                result.len()
            ))),
        }
    }

    /// Transforms a rectangle by sampling `segments` points along every edge and taking the bounding box of the
    /// results.
    pub fn transform_rect(&self, rect: &Rect, segments: usize) -> Result<Rect, CanvasError> {
        if let Some(m) = self.as_affine() {
            let points: Vec<_> = rect
                .into_quadrangle()
                .iter()
                .map(|p| m.transform_point(p))
                .collect();
            return Rect::from_points(points.iter())
                .ok_or_else(|| CanvasError::InvalidArgument("empty rectangle".into()));
        }

        let points = rect
            .sample_border(segments)
            .iter()
            .map(|p| self.transform_point(p))
            .collect::<Result<Vec<_>, _>>()?;
        Rect::from_points(points.iter())
            .ok_or_else(|| CanvasError::InvalidArgument("empty rectangle".into()))
    }

    /// Transforms an envelope into `target` CRS.
    ///
    /// 2d envelopes are densified along their edges, higher dimensional ones are transformed through all of their
    /// corners.
    pub fn transform_envelope(
        &self,
        envelope: &Envelope,
        target: Option<Arc<Crs>>,
        segments: usize,
    ) -> Result<Envelope, CanvasError> {
        if envelope.dimension() == 2 && self.target_dimension() == 2 {
            let rect = envelope
                .to_rect()
                .ok_or_else(|| CanvasError::InvalidArgument("envelope is not 2d".into()))?;
            let transformed = self.transform_rect(&rect, segments)?;
            return Ok(Envelope::from_rect(transformed, target)?);
        }

        let dimension = envelope.dimension();
        if dimension > 16 {
            return Err(CanvasError::UnsupportedOperation(format!(
                "transforming {dimension}-dimensional envelopes"
            )));
        }

        let mut lower = vec![f64::INFINITY; self.target_dimension()];
        let mut upper = vec![f64::NEG_INFINITY; self.target_dimension()];
        for corner_index in 0..(1usize << dimension) {
            let corner: Vec<f64> = (0..dimension)
                .map(|axis| {
                    if corner_index & (1 << axis) == 0 {
                        envelope.minimum(axis)
                    } else {
                        envelope.maximum(axis)
                    }
                })
                .collect();
            let transformed = self.transform(&corner)?;
            for (axis, value) in transformed.into_iter().enumerate() {
                lower[axis] = lower[axis].min(value);
                upper[axis] = upper[axis].max(value);
            }
        }

        Ok(Envelope::new(lower, upper, target)?)
    }

    /// Inverse of the transform.
    pub fn inverse(&self) -> Result<MathTransform, CanvasError> {
        match self {
            Self::Identity(dimension) => Ok(Self::Identity(*dimension)),
            Self::Affine(m) => Ok(Self::Affine(invert_affine(m)?)),
            Self::Linear { scale, offset } => {
                if *scale == 0.0 || !scale.is_finite() {
                    return Err(CanvasError::Transform(
                        "linear transform is not invertible".into(),
                    ));
                }
                Ok(Self::Linear {
                    scale: 1.0 / scale,
                    offset: -offset / scale,
                })
            }
            Self::Projection {
                projection,
                inverse,
            } => Ok(Self::Projection {
                projection: projection.clone(),
                inverse: !inverse,
            }),
            Self::PassThrough(parts) => Ok(Self::PassThrough(
                parts.iter().map(|p| p.inverse()).collect::<Result<_, _>>()?,
            )),
            Self::Select { .. } if self.is_identity() => {
                Ok(Self::Identity(self.source_dimension()))
            }
            Self::Select { .. } => Err(CanvasError::UnsupportedOperation(
                "inverse of a dimension-dropping transform".into(),
            )),
            Self::Concatenated(steps) => Ok(Self::Concatenated(
                steps
                    .iter()
                    .rev()
                    .map(|s| s.inverse())
                    .collect::<Result<_, _>>()?,
            )),
        }
    }

    /// Transform that applies `self` and then `next`.
    pub fn concatenate(self, next: MathTransform) -> Result<MathTransform, CanvasError> {
        if self.target_dimension() != next.source_dimension() {
            return Err(CanvasError::InvalidArgument(format!(
                "cannot concatenate transform with {} output dimensions and transform with {} input dimensions",
                self.target_dimension(),
                next.source_dimension()
            )));
        }

        if self.is_identity() && self.source_dimension() == next.source_dimension() {
            return Ok(next);
        }
        if next.is_identity() && next.target_dimension() == self.target_dimension() {
            return Ok(self);
        }

        if let (Self::Affine(first), Self::Affine(second)) = (&self, &next) {
            return Ok(Self::Affine(second * first));
        }

        let mut steps = vec![];
        for transform in [self, next] {
            match transform {
                Self::Concatenated(inner) => steps.extend(inner),
                other => steps.push(other),
            }
        }

        Ok(Self::Concatenated(steps))
    }
}

impl Debug for MathTransform {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Identity(dimension) => write!(f, "Identity({dimension})"),
            Self::Affine(m) => f.debug_tuple("Affine").field(m).finish(),
            Self::Linear { scale, offset } => f
                .debug_struct("Linear")
                .field("scale", scale)
                .field("offset", offset)
                .finish(),
            Self::Projection { inverse, .. } => f
                .debug_struct("Projection")
                .field("inverse", inverse)
                .finish_non_exhaustive(),
            Self::PassThrough(parts) => f.debug_tuple("PassThrough").field(parts).finish(),
            Self::Select {
                source_dimension,
                indices,
            } => f
                .debug_struct("Select")
                .field("source_dimension", source_dimension)
                .field("indices", indices)
                .finish(),
            Self::Concatenated(steps) => f.debug_tuple("Concatenated").field(steps).finish(),
        }
    }
}

/// Inverts a 2d affine matrix. Fails if the matrix is singular or contains non-finite values.
pub fn invert_affine(m: &Matrix3<f64>) -> Result<Matrix3<f64>, CanvasError> {
    let inverse = m
        .try_inverse()
        .ok_or_else(|| CanvasError::Transform("affine transform is not invertible".into()))?;
    if inverse.iter().any(|v| !v.is_finite()) {
        return Err(CanvasError::Transform(
            "affine transform is not invertible".into(),
        ));
    }

    Ok(inverse)
}

fn outside_domain(coordinates: &[f64]) -> CanvasError {
    CanvasError::Transform(format!(
        "point {coordinates:?} is outside of the projection domain"
    ))
}
