use serde::{Deserialize, Serialize};

/// Unit of measure of a coordinate system axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Unit {
    /// Angular degree.
    Degree,
    /// Meter.
    Metre,
    /// International foot.
    Foot,
    /// Second of time.
    Second,
    /// Day of 86400 seconds.
    Day,
    /// Display pixel. Has no fixed ground length.
    Pixel,
}

impl Unit {
    /// Returns true for units of length.
    pub fn is_linear(&self) -> bool {
        self.to_metres().is_some()
    }

    /// Returns true for angular units.
    pub fn is_angular(&self) -> bool {
        matches!(self, Unit::Degree)
    }

    /// Length of one unit in meters, if the unit is a unit of length.
    pub fn to_metres(&self) -> Option<f64> {
        match self {
            Unit::Metre => Some(1.0),
            Unit::Foot => Some(0.3048),
            _ => None,
        }
    }

    /// Duration of one unit in seconds, if the unit is a unit of time.
    pub fn to_seconds(&self) -> Option<f64> {
        match self {
            Unit::Second => Some(1.0),
            Unit::Day => Some(86_400.0),
            _ => None,
        }
    }
}

/// Direction of a coordinate system axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AxisDirection {
    /// Towards east (longitude, easting).
    East,
    /// Towards north (latitude, northing).
    North,
    /// Up, away from the center of the body.
    Up,
    /// Towards the future.
    Future,
    /// Right on the display surface.
    DisplayRight,
    /// Down on the display surface.
    DisplayDown,
}

/// Coordinate system axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Axis {
    direction: AxisDirection,
    unit: Unit,
}

impl Axis {
    /// Creates a new axis.
    pub const fn new(direction: AxisDirection, unit: Unit) -> Self {
        Self { direction, unit }
    }

    /// Direction of the axis.
    pub fn direction(&self) -> AxisDirection {
        self.direction
    }

    /// Unit of the axis.
    pub fn unit(&self) -> Unit {
        self.unit
    }

    /// Returns true for temporal axes.
    pub fn is_temporal(&self) -> bool {
        self.direction == AxisDirection::Future
    }

    /// Returns true for vertical axes.
    pub fn is_vertical(&self) -> bool {
        self.direction == AxisDirection::Up
    }
}
