use std::sync::Arc;

use geocanvas_types::cartesian::Rect;
use geocanvas_types::crs::Crs;
use geocanvas_types::Envelope;
use nalgebra::Matrix3;

use super::{Canvas, CanvasState};
use crate::affine::AffineAccumulator;
use crate::config::CanvasConfiguration;
use crate::error::CanvasError;
use crate::operation::{DefaultOperationFactory, OperationFactory};
use crate::viewport::ViewportController;

/// Convenience type to initialize a [`Canvas`].
///
/// ```
/// use geocanvas::{CanvasBuilder, CrsChain};
/// use geocanvas_types::cartesian::Rect;
/// use geocanvas_types::crs::Crs;
/// use geocanvas_types::Envelope;
///
/// let canvas = CanvasBuilder::new()
///     .with_objective_crs(Crs::EPSG3857)
///     .with_display_bounds(Rect::new(0.0, 0.0, 1024.0, 768.0))
///     .with_visible_area(Envelope::from_rect(Rect::new(-10.0, -10.0, 10.0, 10.0), Some(Crs::WGS84.into())).unwrap())
///     .build()
///     .unwrap();
///
/// assert_eq!(*canvas.objective_crs(), Crs::EPSG3857);
/// ```
pub struct CanvasBuilder {
    objective: Crs,
    display_bounds: Rect,
    config: CanvasConfiguration,
    objective_to_display: Matrix3<f64>,
    display_to_device: Matrix3<f64>,
    visible_area: Option<Envelope>,
    factory: Option<Arc<dyn OperationFactory>>,
}

impl Default for CanvasBuilder {
    fn default() -> Self {
        Self {
            objective: Crs::WGS84,
            display_bounds: Rect::new(0.0, 0.0, 0.0, 0.0),
            config: CanvasConfiguration::default(),
            objective_to_display: Matrix3::identity(),
            display_to_device: Matrix3::identity(),
            visible_area: None,
            factory: None,
        }
    }
}

impl CanvasBuilder {
    /// Creates a builder with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the objective CRS. It must have a horizontal component.
    ///
    /// Defaults to [`Crs::WGS84`].
    pub fn with_objective_crs(mut self, crs: Crs) -> Self {
        self.objective = crs;
        self
    }

    /// Sets the display bounds in display units.
    ///
    /// Defaults to an empty rectangle, in which case view resets are ignored until the bounds are set.
    pub fn with_display_bounds(mut self, bounds: Rect) -> Self {
        self.display_bounds = bounds;
        self
    }

    /// Sets the canvas configuration.
    pub fn with_configuration(mut self, config: CanvasConfiguration) -> Self {
        self.config = config;
        self
    }

    /// Sets whether the vertical objective axis points up on the display. Defaults to `true`.
    pub fn with_y_axis_upward(mut self, value: bool) -> Self {
        self.config.set_y_axis_upward(value);
        self
    }

    /// Sets ratio of the vertical to the horizontal scale, see [`CanvasConfiguration::axis_proportions`].
    pub fn with_axis_proportions(mut self, value: f64) -> Self {
        self.config.set_axis_proportions(value);
        self
    }

    /// Sets the initial objective-to-display transform. Ignored if a visible area is given.
    pub fn with_objective_to_display(mut self, transform: Matrix3<f64>) -> Self {
        self.objective_to_display = transform;
        self
    }

    /// Sets the display-to-device transform. Defaults to identity.
    pub fn with_display_to_device(mut self, transform: Matrix3<f64>) -> Self {
        self.display_to_device = transform;
        self
    }

    /// Sets the area visible after the canvas is created.
    pub fn with_visible_area(mut self, area: Envelope) -> Self {
        self.visible_area = Some(area);
        self
    }

    /// Sets the factory used to find coordinate operations. Defaults to [`DefaultOperationFactory`].
    pub fn with_operation_factory(mut self, factory: impl OperationFactory + 'static) -> Self {
        self.factory = Some(Arc::new(factory));
        self
    }

    /// Creates the canvas.
    ///
    /// Fails if the objective CRS has no horizontal component, the display bounds are not finite, any of the
    /// transforms is not invertible or the visible area cannot be converted into the objective CRS.
    pub fn build(self) -> Result<Canvas, CanvasError> {
        let affine = AffineAccumulator::new(self.objective_to_display)?;
        let state = CanvasState::new(
            self.objective,
            self.display_bounds,
            affine,
            self.display_to_device,
            self.config,
        )?;
        let factory = self.factory.unwrap_or_else(|| {
            Arc::new(DefaultOperationFactory::new()) as Arc<dyn OperationFactory>
        });

        let canvas = Canvas::from_state(state, factory);
        if let Some(area) = &self.visible_area {
            canvas.set_visible_area(area)?;
        }

        Ok(canvas)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::CrsChain;
    use assert_matches::assert_matches;
    use geocanvas_types::crs::Unit;

    #[test]
    fn defaults() {
        let canvas = CanvasBuilder::new().build().expect("valid defaults");
        assert_eq!(*canvas.objective_crs(), Crs::WGS84);
        assert_eq!(canvas.objective_to_display(), Matrix3::identity());
        assert_eq!(canvas.configuration(), CanvasConfiguration::default());
    }

    #[test]
    fn invalid_parts_are_rejected() {
        assert_matches!(
            CanvasBuilder::new()
                .with_objective_crs(Crs::unix_time())
                .build(),
            Err(CanvasError::InvalidArgument(_))
        );
        assert_matches!(
            CanvasBuilder::new()
                .with_objective_to_display(Matrix3::zeros())
                .build(),
            Err(CanvasError::InvalidArgument(_))
        );
        assert_matches!(
            CanvasBuilder::new()
                .with_display_to_device(Matrix3::new_scaling(0.0))
                .build(),
            Err(CanvasError::InvalidArgument(_))
        );

        let local = Arc::new(Crs::engineering("local", Unit::Metre));
        let area = Envelope::from_rect(Rect::new(0.0, 0.0, 1.0, 1.0), Some(local)).expect("valid");
        assert_matches!(
            CanvasBuilder::new()
                .with_display_bounds(Rect::new(0.0, 0.0, 100.0, 100.0))
                .with_visible_area(area)
                .build(),
            Err(CanvasError::Transform(_))
        );
    }
}
