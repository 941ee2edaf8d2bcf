use crate::affine::DEFAULT_ROUNDING_EPSILON;

const DEFAULT_DENSIFICATION: usize = 8;

/// Tunables of a [`Canvas`](crate::Canvas).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CanvasConfiguration {
    y_axis_upward: bool,
    axis_proportions: f64,
    rounding_epsilon: f64,
    densification: usize,
}

impl Default for CanvasConfiguration {
    fn default() -> Self {
        Self {
            y_axis_upward: true,
            axis_proportions: 1.0,
            rounding_epsilon: DEFAULT_ROUNDING_EPSILON,
            densification: DEFAULT_DENSIFICATION,
        }
    }
}

impl CanvasConfiguration {
    /// Whether the vertical objective axis points up on the display. Since display coordinates grow downwards, this
    /// flips the vertical axis when the view is reset. Default is `true`.
    pub fn y_axis_upward(&self) -> bool {
        self.y_axis_upward
    }

    /// Sets whether the vertical objective axis points up on the display.
    pub fn with_y_axis_upward(mut self, value: bool) -> Self {
        self.y_axis_upward = value;
        self
    }

    /// Sets whether the vertical objective axis points up on the display.
    pub fn set_y_axis_upward(&mut self, value: bool) {
        self.y_axis_upward = value;
    }

    /// Ratio of the vertical to the horizontal scale used when the view is reset to an area.
    ///
    /// `1.0` (default) keeps the shapes undistorted and fits the whole area into the display. `NaN` stretches the
    /// area to fill the display. Other values fix the ratio of the scales.
    pub fn axis_proportions(&self) -> f64 {
        self.axis_proportions
    }

    /// Sets ratio of the vertical to the horizontal scale.
    pub fn with_axis_proportions(mut self, value: f64) -> Self {
        self.axis_proportions = value;
        self
    }

    /// Sets ratio of the vertical to the horizontal scale.
    pub fn set_axis_proportions(&mut self, value: f64) {
        self.axis_proportions = value;
    }

    /// Coefficients of the view transform closer than this to an integer are rounded after every change.
    pub fn rounding_epsilon(&self) -> f64 {
        self.rounding_epsilon
    }

    /// Sets the rounding tolerance of the view transform coefficients.
    pub fn with_rounding_epsilon(mut self, value: f64) -> Self {
        self.rounding_epsilon = value;
        self
    }

    /// Sets the rounding tolerance of the view transform coefficients.
    pub fn set_rounding_epsilon(&mut self, value: f64) {
        self.rounding_epsilon = value;
    }

    /// Number of segments every envelope edge is split into when an envelope is reprojected.
    pub fn densification(&self) -> usize {
        self.densification
    }

    /// Sets the number of segments per envelope edge used for reprojection.
    pub fn with_densification(mut self, value: usize) -> Self {
        self.densification = value.max(1);
        self
    }

    /// Sets the number of segments per envelope edge used for reprojection.
    pub fn set_densification(&mut self, value: usize) {
        self.densification = value.max(1);
    }
}
