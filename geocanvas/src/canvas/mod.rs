//! See [`Canvas`].

use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use geo::GeodesicDistance;
use geocanvas_types::cartesian::{CartesianPoint2dFloat, Point2d, Rect};
use geocanvas_types::crs::{Crs, CrsKind};
use geocanvas_types::geo::{GeoPoint2d, NewGeoPoint};
use geocanvas_types::Envelope;
use log::{debug, info, warn};
use nalgebra::{Matrix3, Vector2};
use parking_lot::Mutex;

use crate::affine::{check_invertible, compute_reset, rotation_about, AffineAccumulator};
use crate::cache::TransformCache;
use crate::chain::{ChainLevel, CrsChain};
use crate::config::CanvasConfiguration;
use crate::error::CanvasError;
use crate::listener::{CanvasEvent, ListenerHandle, ListenerList};
use crate::monitor::RenderingMonitor;
use crate::operation::OperationFactory;
use crate::transform::{invert_affine, MathTransform};
use crate::viewport::ViewportController;

mod builder;

pub use builder::CanvasBuilder;

/// Referenced 2d canvas.
///
/// A canvas keeps three coordinate systems consistent:
/// * the *objective* CRS, where the displayed data is defined,
/// * the *display* CRS, derived from the horizontal component of the objective CRS through the view transform
///   (pan, zoom, rotation, axis flip),
/// * the *device* CRS, derived from the display CRS through the display-to-device transform (e.g. HiDPI scaling).
///
/// All the state is guarded by a single lock, so a canvas can be shared between threads. Every public method either
/// succeeds completely or leaves the canvas unchanged. Listeners are notified after the lock is released, so they can
/// read the canvas state from the callbacks.
///
/// ```
/// use geocanvas::{Canvas, CanvasBuilder, ViewportController};
/// use geocanvas_types::cartesian::{Point2d, Rect};
/// use geocanvas_types::crs::Crs;
/// use geocanvas_types::Envelope;
///
/// let canvas = CanvasBuilder::new()
///     .with_objective_crs(Crs::WGS84)
///     .with_display_bounds(Rect::new(0.0, 0.0, 800.0, 600.0))
///     .build()
///     .unwrap();
///
/// let area = Envelope::from_rect(Rect::new(-10.0, -10.0, 10.0, 10.0), None).unwrap();
/// canvas.set_visible_area(&area).unwrap();
///
/// let display = canvas.objective_to_display().transform_point(&Point2d::new(0.0, 0.0));
/// assert!((display.x - 400.0).abs() < 1e-9);
/// assert!((display.y - 300.0).abs() < 1e-9);
/// ```
pub struct Canvas {
    state: Mutex<CanvasState>,
    factory: Arc<dyn OperationFactory>,
    listeners: ListenerList<CanvasEvent>,
    monitor: RenderingMonitor,
}

#[derive(Debug)]
struct CanvasState {
    objective: Arc<Crs>,
    horizontal: Arc<Crs>,
    objective_version: u64,
    affine: AffineAccumulator,
    display_to_device: Matrix3<f64>,
    device_version: u64,
    display_bounds: Rect,
    config: CanvasConfiguration,
    cache: TransformCache,
    temporal_range: Option<(DateTime<Utc>, DateTime<Utc>)>,
    elevation_range: Option<(f64, f64)>,
    display_crs: Option<DerivedCrs>,
    device_crs: Option<DerivedCrs>,
}

/// Derived CRS together with the versions of the state it was built from.
#[derive(Debug, Clone)]
struct DerivedCrs {
    crs: Arc<Crs>,
    built_from: [u64; 3],
}

impl Canvas {
    /// Creates a canvas with default configuration. The view transform is identity.
    pub fn new(objective: Crs, display_bounds: Rect) -> Result<Self, CanvasError> {
        CanvasBuilder::new()
            .with_objective_crs(objective)
            .with_display_bounds(display_bounds)
            .build()
    }

    fn from_state(state: CanvasState, factory: Arc<dyn OperationFactory>) -> Self {
        Self {
            state: Mutex::new(state),
            factory,
            listeners: ListenerList::new(),
            monitor: RenderingMonitor::new(),
        }
    }

    /// Current configuration.
    pub fn configuration(&self) -> CanvasConfiguration {
        self.state.lock().config
    }

    /// Replaces the configuration. The view transform is not changed, new values are used starting from the next view
    /// operation.
    pub fn set_configuration(&self, config: CanvasConfiguration) {
        let mut state = self.state.lock();
        state.affine = state
            .affine
            .with_rounding_epsilon(config.rounding_epsilon());
        state.config = config;
    }

    /// Monitor of the render pass drawing this canvas.
    pub fn monitor(&self) -> &RenderingMonitor {
        &self.monitor
    }

    /// Adds a listener notified about every change of the canvas.
    pub fn subscribe(
        &self,
        listener: impl Fn(&CanvasEvent) + Send + Sync + 'static,
    ) -> ListenerHandle {
        self.listeners.subscribe(listener)
    }

    /// Removes a listener. Returns false if there was no such listener.
    pub fn unsubscribe(&self, handle: ListenerHandle) -> bool {
        self.listeners.unsubscribe(handle)
    }

    /// Resets the view so that `area` (in horizontal objective coordinates) fills the display bounds.
    ///
    /// Uses the aspect and axis direction policy of the [configuration](CanvasConfiguration). A degenerate area or
    /// empty display bounds leave the view unchanged and `false` is returned.
    pub fn reset_to(&self, area: &Rect, preserve_rotation: bool) -> bool {
        self.change_view(|state| {
            let bounds = state.display_bounds;
            let config = state.config;
            Ok(state.affine.reset_to(
                area,
                &bounds,
                config.y_axis_upward(),
                preserve_rotation,
                config.axis_proportions(),
            ))
        })
        .unwrap_or(false)
    }

    fn change_view(
        &self,
        change: impl FnOnce(&mut CanvasState) -> Result<bool, CanvasError>,
    ) -> Result<bool, CanvasError> {
        let (old, new) = {
            let mut state = self.state.lock();
            let old = state.affine.transform();
            if !change(&mut state)? {
                return Ok(false);
            }

            (old, state.affine.transform())
        };

        self.monitor.request_stop();
        self.listeners
            .notify(|| CanvasEvent::TransformChanged { old, new });
        Ok(true)
    }

    fn fire(&self, events: Vec<CanvasEvent>) {
        if events.is_empty() {
            return;
        }

        self.monitor.request_stop();
        for event in events {
            self.listeners.notify(|| event);
        }
    }
}

impl Debug for Canvas {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Canvas")
            .field("state", &*self.state.lock())
            .field("listeners", &self.listeners)
            .field("monitor", &self.monitor)
            .finish_non_exhaustive()
    }
}

impl CanvasState {
    fn new(
        objective: Crs,
        display_bounds: Rect,
        affine: AffineAccumulator,
        display_to_device: Matrix3<f64>,
        config: CanvasConfiguration,
    ) -> Result<Self, CanvasError> {
        let horizontal = horizontal_of(&objective)?;
        check_bounds(&display_bounds)?;
        check_invertible(&display_to_device)?;

        Ok(Self {
            objective: Arc::new(objective),
            horizontal,
            objective_version: 0,
            affine: affine.with_rounding_epsilon(config.rounding_epsilon()),
            display_to_device,
            device_version: 0,
            display_bounds,
            config,
            cache: TransformCache::new(),
            temporal_range: None,
            elevation_range: None,
            display_crs: None,
            device_crs: None,
        })
    }

    fn display_crs(&mut self) -> Result<Arc<Crs>, CanvasError> {
        let key = [self.objective_version, self.affine.version(), 0];
        if let Some(cached) = &self.display_crs {
            if cached.built_from == key {
                return Ok(cached.crs.clone());
            }
        }

        debug!(
            "Building display CRS for {} (view version {})",
            self.horizontal,
            self.affine.version()
        );
        let crs = Arc::new(Crs::derived(
            format!("{} display", self.horizontal.name()),
            self.horizontal.clone(),
            self.affine.transform(),
        )?);
        self.display_crs = Some(DerivedCrs {
            crs: crs.clone(),
            built_from: key,
        });

        Ok(crs)
    }

    fn device_crs(&mut self) -> Result<Arc<Crs>, CanvasError> {
        let key = [
            self.objective_version,
            self.affine.version(),
            self.device_version,
        ];
        if let Some(cached) = &self.device_crs {
            if cached.built_from == key {
                return Ok(cached.crs.clone());
            }
        }

        let display = self.display_crs()?;
        debug!("Building device CRS for {display}");
        let crs = Arc::new(Crs::derived(
            format!("{} device", self.horizontal.name()),
            display,
            self.display_to_device,
        )?);
        self.device_crs = Some(DerivedCrs {
            crs: crs.clone(),
            built_from: key,
        });

        Ok(crs)
    }

    /// Transform from the horizontal objective space into the given chain level.
    fn from_objective(&self, level: ChainLevel) -> Result<MathTransform, CanvasError> {
        let objective_to_display = MathTransform::Affine(self.affine.transform());
        match level {
            ChainLevel::Objective => Ok(MathTransform::Identity(2)),
            ChainLevel::Display => Ok(objective_to_display),
            ChainLevel::Device => {
                objective_to_display.concatenate(MathTransform::Affine(self.display_to_device))
            }
        }
    }

    fn display_to_objective(&self) -> Result<Matrix3<f64>, CanvasError> {
        invert_affine(&self.affine.transform())
    }

    /// Display bounds in horizontal objective coordinates.
    fn visible_rect(&self) -> Result<Rect, CanvasError> {
        MathTransform::Affine(self.display_to_objective()?).transform_rect(&self.display_bounds, 1)
    }

    /// Region that the display would show with the rotation of the view removed.
    fn unrotated_visible_rect(&self) -> Result<Rect, CanvasError> {
        let center = self.display_bounds.center();
        let unrotated = rotation_about(-self.affine.rotation(), &center) * self.affine.transform();
        MathTransform::Affine(invert_affine(&unrotated)?).transform_rect(&self.display_bounds, 1)
    }

    /// System that coordinates in `source` are converted into by the cache: the objective CRS itself, or its
    /// horizontal component for sources without time and height axes.
    fn objective_target(&self, source: &Crs) -> Arc<Crs> {
        if source.has_temporal_axis() || source.has_vertical_axis() {
            self.objective.clone()
        } else {
            self.horizontal.clone()
        }
    }

    /// Replaces the objective CRS, adjusting the view transform so that the same region stays visible. Returns the
    /// events to fire. The state is not changed on error.
    fn replace_objective(
        &mut self,
        factory: &dyn OperationFactory,
        crs: Crs,
    ) -> Result<Vec<CanvasEvent>, CanvasError> {
        let horizontal = horizontal_of(&crs)?;
        if crs == *self.objective {
            return Ok(vec![]);
        }

        let mut affine = self.affine;
        let old_transform = affine.transform();
        let transform_changed = if horizontal == self.horizontal {
            false
        } else {
            let refitted = self.refit_transform(factory, &horizontal)?;
            affine.set_transform(refitted)?
        };

        let old = std::mem::replace(&mut self.objective, Arc::new(crs));
        let new = self.objective.clone();
        self.horizontal = horizontal;
        self.objective_version += 1;
        self.affine = affine;
        self.cache.clear();

        info!("Objective CRS changed from {old} to {new}");

        let mut events = vec![CanvasEvent::ObjectiveCrsChanged { old, new }];
        if transform_changed {
            events.push(CanvasEvent::TransformChanged {
                old: old_transform,
                new: self.affine.transform(),
            });
        }

        Ok(events)
    }

    /// View transform for the new horizontal objective CRS showing the currently visible region.
    fn refit_transform(
        &self,
        factory: &dyn OperationFactory,
        horizontal: &Crs,
    ) -> Result<Matrix3<f64>, CanvasError> {
        let operation = factory
            .create_operation(&self.horizontal, horizontal)
            .map_err(into_transform_error)?;
        let current = self.affine.transform();

        if let Some(old_to_new) = operation.as_affine() {
            // display = T * old = T * A^-1 * new
            return Ok(current * invert_affine(&old_to_new)?);
        }

        if self.display_bounds.is_degenerate() {
            debug!("Display bounds are empty, view transform is kept");
            return Ok(current);
        }

        // compute_reset puts the rotation back, so the unrotated region is fitted.
        let visible = self.unrotated_visible_rect()?;
        let area = operation.transform_rect(&visible, self.config.densification())?;
        match compute_reset(
            &current,
            &area,
            &self.display_bounds,
            self.config.y_axis_upward(),
            true,
            self.config.axis_proportions(),
        ) {
            Some(transform) => Ok(transform),
            None => {
                warn!("Visible area {area:?} in the new objective CRS is degenerate, view transform is kept");
                Ok(current)
            }
        }
    }

    /// Rectangle in horizontal objective coordinates covered by the envelope. `None` if the envelope is degenerate.
    fn area_in_objective(
        &mut self,
        factory: &dyn OperationFactory,
        area: &Envelope,
    ) -> Result<Option<Rect>, CanvasError> {
        if area.is_degenerate() {
            return Ok(None);
        }

        let envelope = match area.crs() {
            Some(crs) if **crs != *self.horizontal => {
                let target = self.horizontal.clone();
                let objective = self.objective_target(crs);
                let operation = self
                    .cache
                    .resolve(factory, crs, &target, &objective)
                    .map_err(into_transform_error)?;
                operation.transform_envelope(area, Some(target), self.config.densification())?
            }
            _ => area.clone(),
        };

        Ok(envelope.to_rect().filter(|rect| !rect.is_degenerate()))
    }

    fn visible_envelope(&self) -> Result<Envelope, CanvasError> {
        let rect = self.visible_rect()?;
        let mut lower = vec![];
        let mut upper = vec![];
        let mut horizontal_added = false;

        for component in self.objective.components() {
            match component.kind() {
                CrsKind::Temporal { .. } => {
                    let range = self.temporal_range.and_then(|(start, end)| {
                        Some((
                            component.temporal_value(start)?,
                            component.temporal_value(end)?,
                        ))
                    });
                    let (min, max) = range.unwrap_or((f64::NEG_INFINITY, f64::INFINITY));
                    lower.push(min);
                    upper.push(max);
                }
                CrsKind::Vertical { .. } => {
                    let (min, max) = self
                        .elevation_range
                        .unwrap_or((f64::NEG_INFINITY, f64::INFINITY));
                    lower.push(min);
                    upper.push(max);
                }
                _ if !horizontal_added => {
                    lower.extend([rect.x_min, rect.y_min]);
                    upper.extend([rect.x_max, rect.y_max]);
                    horizontal_added = true;
                }
                _ => {
                    for _ in 0..component.dimension() {
                        lower.push(f64::NEG_INFINITY);
                        upper.push(f64::INFINITY);
                    }
                }
            }
        }

        Ok(Envelope::new(lower, upper, Some(self.objective.clone()))?)
    }

    fn add_axis_if_missing(
        &mut self,
        factory: &dyn OperationFactory,
        has_axis: impl Fn(&Crs) -> bool,
        axis: Crs,
    ) -> Result<Vec<CanvasEvent>, CanvasError> {
        if has_axis(self.objective.as_ref()) {
            return Ok(vec![]);
        }

        let name = format!("{} + {}", self.objective.name(), axis.name());
        let compound = Crs::compound(name, [(*self.objective).clone(), axis])?;
        self.replace_objective(factory, compound)
    }

    /// Ground distance in meters between two display points one unit apart around the display center.
    fn ground_scale(&self) -> Result<f64, CanvasError> {
        let display_to_objective = self.display_to_objective()?;
        let center = self.display_bounds.center();
        let a = display_to_objective.transform_point(&Point2d::new(center.x - 0.5, center.y));
        let b = display_to_objective.transform_point(&Point2d::new(center.x + 0.5, center.y));

        let distance = match self.horizontal.kind() {
            CrsKind::Geographic { .. } => geodesic_distance(&a, &b)?,
            CrsKind::Projected { .. } => {
                let projection = self.horizontal.get_projection().ok_or_else(|| {
                    CanvasError::UnsupportedOperation(format!(
                        "projection of {} is not available",
                        self.horizontal
                    ))
                })?;
                let unproject = MathTransform::Projection {
                    projection: projection.into(),
                    inverse: true,
                };
                geodesic_distance(&unproject.transform_point(&a)?, &unproject.transform_point(&b)?)?
            }
            CrsKind::Engineering { unit } => {
                let metres = unit.to_metres().ok_or_else(|| {
                    CanvasError::UnsupportedOperation(format!(
                        "{unit:?} has no ground length"
                    ))
                })?;
                a.distance(&b) * metres
            }
            _ => {
                return Err(CanvasError::UnsupportedOperation(format!(
                    "measuring distances in {}",
                    self.horizontal
                )))
            }
        };

        if distance.is_finite() && distance > 0.0 {
            Ok(distance)
        } else {
            Err(CanvasError::Transform(format!(
                "invalid ground distance {distance}"
            )))
        }
    }
}

impl CrsChain for Canvas {
    fn objective_crs(&self) -> Arc<Crs> {
        self.state.lock().objective.clone()
    }

    fn set_objective_crs(&self, crs: Crs) -> Result<(), CanvasError> {
        let events = self
            .state
            .lock()
            .replace_objective(self.factory.as_ref(), crs)?;
        self.fire(events);
        Ok(())
    }

    fn display_crs(&self) -> Result<Arc<Crs>, CanvasError> {
        self.state.lock().display_crs()
    }

    fn device_crs(&self) -> Result<Arc<Crs>, CanvasError> {
        self.state.lock().device_crs()
    }

    fn transform_between(
        &self,
        from: ChainLevel,
        to: ChainLevel,
    ) -> Result<MathTransform, CanvasError> {
        let state = self.state.lock();
        state
            .from_objective(from)?
            .inverse()?
            .concatenate(state.from_objective(to)?)
    }

    fn transform_to_objective(&self, source: &Crs) -> Result<MathTransform, CanvasError> {
        let mut state = self.state.lock();
        let target = state.objective_target(source);
        state
            .cache
            .resolve(self.factory.as_ref(), source, &target, &target)
    }

    fn find_transform(&self, source: &Crs, target: &Crs) -> Result<MathTransform, CanvasError> {
        let mut state = self.state.lock();
        let objective = state.objective_target(source);
        state
            .cache
            .resolve(self.factory.as_ref(), source, target, &objective)
    }
}

impl ViewportController for Canvas {
    fn objective_to_display(&self) -> Matrix3<f64> {
        self.state.lock().affine.transform()
    }

    fn set_objective_to_display(&self, transform: Matrix3<f64>) -> Result<bool, CanvasError> {
        self.change_view(|state| state.affine.set_transform(transform))
    }

    fn apply_change(&self, delta: &Matrix3<f64>) -> Result<bool, CanvasError> {
        self.change_view(|state| state.affine.apply_change(delta))
    }

    fn apply_display_change(&self, delta: &Matrix3<f64>) -> Result<bool, CanvasError> {
        self.change_view(|state| state.affine.apply_display_change(delta))
    }

    fn set_visible_area(&self, area: &Envelope) -> Result<bool, CanvasError> {
        let factory = self.factory.clone();
        self.change_view(|state| {
            let Some(rect) = state.area_in_objective(factory.as_ref(), area)? else {
                debug!("Ignoring degenerate visible area {area:?}");
                return Ok(false);
            };

            let bounds = state.display_bounds;
            let config = state.config;
            Ok(state.affine.reset_to(
                &rect,
                &bounds,
                config.y_axis_upward(),
                true,
                config.axis_proportions(),
            ))
        })
    }

    fn visible_envelope(&self) -> Result<Envelope, CanvasError> {
        self.state.lock().visible_envelope()
    }

    fn set_temporal_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<(), CanvasError> {
        if start > end {
            return Err(CanvasError::InvalidArgument(format!(
                "time range start {start} is after its end {end}"
            )));
        }

        let events = {
            let mut state = self.state.lock();
            let mut events = state.add_axis_if_missing(
                self.factory.as_ref(),
                Crs::has_temporal_axis,
                Crs::unix_time(),
            )?;

            let new = Some((start, end));
            if state.temporal_range != new {
                let old = std::mem::replace(&mut state.temporal_range, new);
                events.push(CanvasEvent::TemporalRangeChanged { old, new });
            }

            events
        };

        self.fire(events);
        Ok(())
    }

    fn temporal_range(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        self.state.lock().temporal_range
    }

    fn set_elevation_range(&self, min: f64, max: f64) -> Result<(), CanvasError> {
        if min.is_nan() || max.is_nan() || min > max {
            return Err(CanvasError::InvalidArgument(format!(
                "invalid elevation range [{min}, {max}]"
            )));
        }

        let events = {
            let mut state = self.state.lock();
            let mut events = state.add_axis_if_missing(
                self.factory.as_ref(),
                Crs::has_vertical_axis,
                Crs::ellipsoidal_height(),
            )?;

            let new = Some((min, max));
            if state.elevation_range != new {
                let old = std::mem::replace(&mut state.elevation_range, new);
                events.push(CanvasEvent::ElevationRangeChanged { old, new });
            }

            events
        };

        self.fire(events);
        Ok(())
    }

    fn elevation_range(&self) -> Option<(f64, f64)> {
        self.state.lock().elevation_range
    }

    fn geographic_scale(&self) -> f64 {
        match self.state.lock().ground_scale() {
            Ok(scale) => scale,
            Err(err) => {
                warn!("Failed to measure ground distance at the display center, using 1.0: {err}");
                1.0
            }
        }
    }

    fn center(&self) -> Result<Point2d, CanvasError> {
        let state = self.state.lock();
        Ok(state
            .display_to_objective()?
            .transform_point(&state.display_bounds.center()))
    }

    fn set_center(&self, center: &Point2d) -> Result<bool, CanvasError> {
        self.change_view(|state| {
            let current = state.affine.transform().transform_point(center);
            let delta = state.display_bounds.center() - current;
            state
                .affine
                .apply_display_change(&Matrix3::new_translation(&delta))
        })
    }

    fn translate_display(&self, dx: f64, dy: f64) -> Result<bool, CanvasError> {
        self.apply_display_change(&Matrix3::new_translation(&Vector2::new(dx, dy)))
    }

    fn translate_objective(&self, dx: f64, dy: f64) -> Result<bool, CanvasError> {
        self.apply_change(&Matrix3::new_translation(&Vector2::new(dx, dy)))
    }

    fn rotation(&self) -> f64 {
        self.state.lock().affine.rotation()
    }

    fn set_rotation(&self, angle: f64) -> Result<bool, CanvasError> {
        check_finite("rotation angle", angle)?;
        self.change_view(|state| {
            let delta = angle - state.affine.rotation();
            if delta == 0.0 {
                return Ok(false);
            }

            let center = state.display_bounds.center();
            state
                .affine
                .apply_display_change(&rotation_about(delta, &center))
        })
    }

    fn rotate(&self, angle: f64) -> Result<bool, CanvasError> {
        check_finite("rotation angle", angle)?;
        self.change_view(|state| {
            let center = state.display_bounds.center();
            state
                .affine
                .apply_display_change(&rotation_about(angle, &center))
        })
    }

    fn scale(&self) -> f64 {
        self.state.lock().affine.scale()
    }

    fn zoom(&self, factor: f64, anchor: Option<Point2d>) -> Result<bool, CanvasError> {
        if !(factor.is_finite() && factor > 0.0) {
            return Err(CanvasError::InvalidArgument(format!(
                "zoom factor must be positive, got {factor}"
            )));
        }

        self.change_view(|state| {
            let anchor = anchor.unwrap_or_else(|| state.display_bounds.center());
            let delta = Matrix3::new_translation(&anchor.coords)
                * Matrix3::new_scaling(factor)
                * Matrix3::new_translation(&-anchor.coords);
            state.affine.apply_display_change(&delta)
        })
    }

    fn display_bounds(&self) -> Rect {
        self.state.lock().display_bounds
    }

    fn set_display_bounds(&self, bounds: Rect) -> Result<bool, CanvasError> {
        check_bounds(&bounds)?;

        let old = {
            let mut state = self.state.lock();
            if state.display_bounds == bounds {
                return Ok(false);
            }

            std::mem::replace(&mut state.display_bounds, bounds)
        };

        self.fire(vec![CanvasEvent::DisplayBoundsChanged { old, new: bounds }]);
        Ok(true)
    }

    fn display_to_device(&self) -> Matrix3<f64> {
        self.state.lock().display_to_device
    }

    fn set_display_to_device(&self, transform: Matrix3<f64>) -> Result<bool, CanvasError> {
        check_invertible(&transform)?;

        let old = {
            let mut state = self.state.lock();
            if state.display_to_device == transform {
                return Ok(false);
            }

            state.device_version += 1;
            std::mem::replace(&mut state.display_to_device, transform)
        };

        self.fire(vec![CanvasEvent::DeviceTransformChanged {
            old,
            new: transform,
        }]);
        Ok(true)
    }
}

fn horizontal_of(crs: &Crs) -> Result<Arc<Crs>, CanvasError> {
    crs.horizontal_component()
        .map(|horizontal| Arc::new(horizontal.clone()))
        .ok_or_else(|| {
            CanvasError::InvalidArgument(format!("{crs} has no horizontal component"))
        })
}

fn check_bounds(bounds: &Rect) -> Result<(), CanvasError> {
    let finite = [bounds.x_min, bounds.y_min, bounds.x_max, bounds.y_max]
        .iter()
        .all(|v| v.is_finite());
    if !finite || bounds.x_min > bounds.x_max || bounds.y_min > bounds.y_max {
        return Err(CanvasError::InvalidArgument(format!(
            "invalid display bounds {bounds:?}"
        )));
    }

    Ok(())
}

fn check_finite(name: &str, value: f64) -> Result<(), CanvasError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(CanvasError::InvalidArgument(format!(
            "{name} must be finite, got {value}"
        )))
    }
}

fn into_transform_error(error: CanvasError) -> CanvasError {
    match error {
        CanvasError::Factory(message) => CanvasError::Transform(message),
        other => other,
    }
}

fn geodesic_distance(a: &Point2d, b: &Point2d) -> Result<f64, CanvasError> {
    for point in [a, b] {
        if !GeoPoint2d::lonlat(point.x, point.y).is_valid() {
            return Err(CanvasError::Transform(format!(
                "({}, {}) is not a valid geographic position",
                point.x, point.y
            )));
        }
    }

    Ok(geo::Point::new(a.x, a.y).geodesic_distance(&geo::Point::new(b.x, b.y)))
}
