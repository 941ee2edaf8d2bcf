//! Composition of view changes into the objective-to-display affine transform.

use geocanvas_types::cartesian::Rect;
use log::debug;
use nalgebra::{Matrix3, Point2, Vector2};

use crate::error::CanvasError;

/// Coefficients of an accumulated transform closer than this to an integer are rounded to that integer.
pub const DEFAULT_ROUNDING_EPSILON: f64 = 1e-12;

/// Running objective-to-display affine transform of a canvas.
///
/// Every successful change increments the [`version`](AffineAccumulator::version) of the accumulator, so that state
/// derived from the transform (e.g. the display CRS) can detect that it must be rebuilt. The transform always stays
/// invertible: changes that would make it singular are rejected and leave the accumulator untouched.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffineAccumulator {
    transform: Matrix3<f64>,
    version: u64,
    epsilon: f64,
}

impl Default for AffineAccumulator {
    fn default() -> Self {
        Self {
            transform: Matrix3::identity(),
            version: 0,
            epsilon: DEFAULT_ROUNDING_EPSILON,
        }
    }
}

impl AffineAccumulator {
    /// Creates a new accumulator starting from the given transform.
    pub fn new(transform: Matrix3<f64>) -> Result<Self, CanvasError> {
        check_invertible(&transform)?;
        Ok(Self {
            transform,
            ..Default::default()
        })
    }

    /// Sets the tolerance used to round coefficients to integers after every change.
    pub fn with_rounding_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Current objective-to-display transform.
    pub fn transform(&self) -> Matrix3<f64> {
        self.transform
    }

    /// Number of changes applied to the accumulator so far.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Concatenates `delta` to the current transform: `T := T × delta`, so the change is expressed in objective
    /// units and is applied before the current transform.
    ///
    /// Returns `false` without touching the transform or the version if `delta` is an identity.
    pub fn apply_change(&mut self, delta: &Matrix3<f64>) -> Result<bool, CanvasError> {
        if delta.is_identity(0.0) {
            return Ok(false);
        }

        self.replace(self.transform * delta)
    }

    /// Pre-concatenates `delta` to the current transform: `T := delta × T`. Use this for changes expressed in display
    /// units, like dragging the view by some pixels.
    pub fn apply_display_change(&mut self, delta: &Matrix3<f64>) -> Result<bool, CanvasError> {
        if delta.is_identity(0.0) {
            return Ok(false);
        }

        self.replace(delta * self.transform)
    }

    /// Replaces the transform. Returns `false` if the new transform equals the current one.
    pub fn set_transform(&mut self, transform: Matrix3<f64>) -> Result<bool, CanvasError> {
        if transform == self.transform {
            return Ok(false);
        }

        self.replace(transform)
    }

    /// Resets the transform so that `area` (in objective units) fills `bounds` (in display units).
    ///
    /// See [`compute_reset`] for the meaning of the parameters. Degenerate `area` or empty `bounds` leave the
    /// transform unchanged, in which case `false` is returned.
    pub fn reset_to(
        &mut self,
        area: &Rect,
        bounds: &Rect,
        y_axis_upward: bool,
        preserve_rotation: bool,
        axis_proportions: f64,
    ) -> bool {
        let Some(transform) = compute_reset(
            &self.transform,
            area,
            bounds,
            y_axis_upward,
            preserve_rotation,
            axis_proportions,
        ) else {
            debug!("Ignoring view reset to degenerate area {area:?} in bounds {bounds:?}");
            return false;
        };

        let transform = round_if_almost_integer(transform, self.epsilon);
        if transform == self.transform {
            return false;
        }

        self.transform = transform;
        self.version += 1;
        true
    }

    /// Rotation angle of the current transform in radians, see [`rotation`].
    pub fn rotation(&self) -> f64 {
        rotation(&self.transform)
    }

    /// Display units per objective unit, see [`uniform_scale`].
    pub fn scale(&self) -> f64 {
        uniform_scale(&self.transform)
    }

    fn replace(&mut self, transform: Matrix3<f64>) -> Result<bool, CanvasError> {
        let transform = round_if_almost_integer(transform, self.epsilon);
        check_invertible(&transform)?;

        if transform == self.transform {
            return Ok(false);
        }

        self.transform = transform;
        self.version += 1;
        Ok(true)
    }
}

/// Computes a transform mapping the center of `area` onto the center of `bounds` and scaling the area to fill the
/// bounds.
///
/// Aspect ratio depends on `axis_proportions`:
/// * `NaN`: horizontal and vertical scales are computed independently and the area fills the bounds exactly;
/// * `1.0`: both axes take the smaller of the two scales, so the whole area is visible without distortion;
/// * any other value: the vertical scale is `axis_proportions` times the horizontal one.
///
/// With `y_axis_upward` the vertical axis is flipped, as display coordinates grow downwards. With
/// `preserve_rotation` the rotation of `current` is applied again around the center of `bounds`.
///
/// Returns `None` if `area` has zero, negative or non-finite size, or if `bounds` are empty.
pub fn compute_reset(
    current: &Matrix3<f64>,
    area: &Rect,
    bounds: &Rect,
    y_axis_upward: bool,
    preserve_rotation: bool,
    axis_proportions: f64,
) -> Option<Matrix3<f64>> {
    if area.is_degenerate() || bounds.is_degenerate() {
        return None;
    }

    let mut sx = bounds.width() / area.width();
    let mut sy = bounds.height() / area.height();
    if axis_proportions.is_nan() {
        // Independent scales.
    } else if axis_proportions == 1.0 {
        let scale = sx.min(sy);
        sx = scale;
        sy = scale;
    } else {
        sy = axis_proportions * sx;
    }

    if y_axis_upward {
        sy = -sy;
    }

    if !(sx.is_normal() && sy.is_normal()) {
        return None;
    }

    let area_center = area.center();
    let bounds_center = bounds.center();
    let mut transform = Matrix3::new_translation(&bounds_center.coords)
        * Matrix3::new_nonuniform_scaling(&Vector2::new(sx, sy))
        * Matrix3::new_translation(&-area_center.coords);

    if preserve_rotation {
        let angle = rotation(current);
        if angle != 0.0 {
            transform = rotation_about(angle, &bounds_center) * transform;
        }
    }

    Some(transform)
}

/// Rotation around `center` by `angle` radians.
pub fn rotation_about(angle: f64, center: &Point2<f64>) -> Matrix3<f64> {
    Matrix3::new_translation(&center.coords)
        * Matrix3::new_rotation(angle)
        * Matrix3::new_translation(&-center.coords)
}

/// Rounds every coefficient that is closer than `epsilon` to an integer.
pub fn round_if_almost_integer(mut transform: Matrix3<f64>, epsilon: f64) -> Matrix3<f64> {
    for value in transform.iter_mut() {
        let rounded = value.round();
        if (*value - rounded).abs() <= epsilon {
            *value = rounded;
        }
    }

    transform
}

/// Rotation component of a 2d affine transform in radians.
///
/// The angle is measured from the image of the first axis, so a flipped vertical axis does not affect it.
pub fn rotation(transform: &Matrix3<f64>) -> f64 {
    transform[(1, 0)].atan2(transform[(0, 0)])
}

/// Geometric mean of the scale factors of a 2d affine transform: square root of the absolute value of its
/// determinant.
pub fn uniform_scale(transform: &Matrix3<f64>) -> f64 {
    let linear = transform.fixed_view::<2, 2>(0, 0);
    linear.determinant().abs().sqrt()
}

pub(crate) fn check_invertible(transform: &Matrix3<f64>) -> Result<(), CanvasError> {
    if transform.iter().any(|v| !v.is_finite()) {
        return Err(CanvasError::InvalidArgument(
            "affine transform has non-finite coefficients".into(),
        ));
    }

    let linear = transform.fixed_view::<2, 2>(0, 0);
    if linear.determinant() == 0.0 || transform.try_inverse().is_none() {
        return Err(CanvasError::InvalidArgument(
            "affine transform is not invertible".into(),
        ));
    }

    Ok(())
}
