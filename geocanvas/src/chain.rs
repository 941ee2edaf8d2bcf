//! Objective, display and device coordinate systems of a canvas.

use std::sync::Arc;

use geocanvas_types::crs::Crs;

use crate::error::CanvasError;
use crate::transform::MathTransform;

/// Level of the canvas coordinate system chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChainLevel {
    /// Horizontal component of the objective CRS, where the data is defined.
    Objective,
    /// Display CRS, derived from the objective one through the view transform. Measured in display pixels.
    Display,
    /// Device CRS, derived from the display one through the display-to-device transform.
    Device,
}

/// Capability of keeping the chain of coordinate systems `objective -> display -> device` consistent.
pub trait CrsChain {
    /// Current objective CRS.
    fn objective_crs(&self) -> Arc<Crs>;

    /// Replaces the objective CRS keeping the same region visible.
    ///
    /// Fails with [`CanvasError::InvalidArgument`] if the CRS has no horizontal 2d component and with
    /// [`CanvasError::Transform`] if coordinates cannot be converted from the previous objective CRS into the new one.
    /// On failure the canvas is not changed.
    fn set_objective_crs(&self, crs: Crs) -> Result<(), CanvasError>;

    /// CRS of the display, derived from the horizontal component of the objective CRS through the current view
    /// transform.
    ///
    /// The same instance is returned until the objective CRS or the view transform changes.
    fn display_crs(&self) -> Result<Arc<Crs>, CanvasError>;

    /// CRS of the output device, derived from the display CRS through the display-to-device transform.
    fn device_crs(&self) -> Result<Arc<Crs>, CanvasError>;

    /// Transform converting coordinates between two levels of the chain.
    fn transform_between(
        &self,
        from: ChainLevel,
        to: ChainLevel,
    ) -> Result<MathTransform, CanvasError>;

    /// Transform from an arbitrary CRS into the objective CRS. Transforms are cached until the objective CRS
    /// changes.
    ///
    /// Sources without time and height axes are converted into the horizontal component of the objective CRS, so
    /// 2d data keeps its transform after a time or elevation range adds axes to the objective CRS.
    fn transform_to_objective(&self, source: &Crs) -> Result<MathTransform, CanvasError>;

    /// Transform between two arbitrary systems.
    fn find_transform(&self, source: &Crs, target: &Crs) -> Result<MathTransform, CanvasError>;
}
