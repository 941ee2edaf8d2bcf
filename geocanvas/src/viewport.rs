//! User level view operations.

use chrono::{DateTime, Utc};
use geocanvas_types::cartesian::{Point2d, Rect};
use geocanvas_types::Envelope;
use nalgebra::Matrix3;

use crate::error::CanvasError;

/// Capability of changing what part of the objective space is visible on the display.
///
/// Methods returning `Result<bool, _>` return `true` if the view was actually changed. Every change notifies the
/// canvas listeners and advises a running render pass to stop.
pub trait ViewportController {
    /// Current objective-to-display transform.
    fn objective_to_display(&self) -> Matrix3<f64>;

    /// Replaces the objective-to-display transform. The transform must be invertible.
    fn set_objective_to_display(&self, transform: Matrix3<f64>) -> Result<bool, CanvasError>;

    /// Applies a change expressed in objective units before the current view transform.
    fn apply_change(&self, delta: &Matrix3<f64>) -> Result<bool, CanvasError>;

    /// Applies a change expressed in display units after the current view transform.
    fn apply_display_change(&self, delta: &Matrix3<f64>) -> Result<bool, CanvasError>;

    /// Shows the given area on the whole display, keeping the current rotation.
    ///
    /// The envelope is converted into the horizontal objective CRS if it has a different CRS. An envelope without a
    /// CRS is taken to be in the objective CRS. A degenerate area is ignored and `false` is returned.
    fn set_visible_area(&self, area: &Envelope) -> Result<bool, CanvasError>;

    /// Region of the objective space visible on the display, together with the temporal and elevation ranges on the
    /// extra axes of the objective CRS. Extra axes without a range are unbounded.
    fn visible_envelope(&self) -> Result<Envelope, CanvasError>;

    /// Sets the visible time range, adding a time axis to the objective CRS if it does not have one.
    fn set_temporal_range(&self, start: DateTime<Utc>, end: DateTime<Utc>)
        -> Result<(), CanvasError>;

    /// Visible time range.
    fn temporal_range(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)>;

    /// Sets the visible elevation range, adding a height axis to the objective CRS if it does not have one.
    fn set_elevation_range(&self, min: f64, max: f64) -> Result<(), CanvasError>;

    /// Visible elevation range.
    fn elevation_range(&self) -> Option<(f64, f64)>;

    /// Ground distance in meters corresponding to one display unit at the center of the display.
    ///
    /// Returns `1.0` if the distance cannot be measured.
    fn geographic_scale(&self) -> f64;

    /// Objective coordinates of the display center.
    fn center(&self) -> Result<Point2d, CanvasError>;

    /// Moves the view so that `center` (in objective coordinates) is shown at the display center.
    fn set_center(&self, center: &Point2d) -> Result<bool, CanvasError>;

    /// Moves the content by the given number of display units.
    fn translate_display(&self, dx: f64, dy: f64) -> Result<bool, CanvasError>;

    /// Moves the content by the given distance in objective units.
    fn translate_objective(&self, dx: f64, dy: f64) -> Result<bool, CanvasError>;

    /// Rotation of the view in radians.
    fn rotation(&self) -> f64;

    /// Rotates the view around the display center to the given angle.
    fn set_rotation(&self, angle: f64) -> Result<bool, CanvasError>;

    /// Rotates the view around the display center by the given angle.
    fn rotate(&self, angle: f64) -> Result<bool, CanvasError>;

    /// Display units per objective unit.
    fn scale(&self) -> f64;

    /// Magnifies the view by `factor` around `anchor` (in display coordinates), or around the display center if no
    /// anchor is given.
    fn zoom(&self, factor: f64, anchor: Option<Point2d>) -> Result<bool, CanvasError>;

    /// Bounds of the display in display units.
    fn display_bounds(&self) -> Rect;

    /// Changes the bounds of the display. The view transform is kept.
    fn set_display_bounds(&self, bounds: Rect) -> Result<bool, CanvasError>;

    /// Display-to-device transform.
    fn display_to_device(&self) -> Matrix3<f64>;

    /// Replaces the display-to-device transform. The transform must be invertible.
    fn set_display_to_device(&self, transform: Matrix3<f64>) -> Result<bool, CanvasError>;
}
