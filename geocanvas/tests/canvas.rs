use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use approx::assert_abs_diff_eq;
use assert_matches::assert_matches;
use chrono::{TimeZone, Utc};
use geocanvas::{
    CanvasBuilder, CanvasError, CanvasEvent, CrsChain, DefaultOperationFactory, MathTransform,
    OperationFactory, ViewportController,
};
use geocanvas_types::cartesian::{Point2d, Rect};
use geocanvas_types::crs::{Crs, CrsKind, Unit};
use geocanvas_types::Envelope;
use nalgebra::{Matrix3, Vector2};
use parking_lot::Mutex;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn bounds() -> Rect {
    Rect::new(0.0, 0.0, 800.0, 600.0)
}

fn area(x_min: f64, y_min: f64, x_max: f64, y_max: f64, crs: Option<Crs>) -> Envelope {
    Envelope::from_rect(Rect::new(x_min, y_min, x_max, y_max), crs.map(Arc::new))
        .expect("valid envelope")
}

fn recorded_events(canvas: &geocanvas::Canvas) -> Arc<Mutex<Vec<CanvasEvent>>> {
    let events = Arc::new(Mutex::new(vec![]));
    let events_clone = events.clone();
    canvas.subscribe(move |event| events_clone.lock().push(event.clone()));
    events
}

#[test]
fn wgs84_view_maps_origin_to_display_center() {
    init_logger();
    let canvas = CanvasBuilder::new()
        .with_objective_crs(Crs::WGS84)
        .with_display_bounds(bounds())
        .with_y_axis_upward(true)
        .build()
        .expect("valid canvas");

    assert!(canvas
        .set_visible_area(&area(-10.0, -10.0, 10.0, 10.0, None))
        .expect("valid area"));

    let transform = canvas.objective_to_display();
    assert_abs_diff_eq!(
        transform.transform_point(&Point2d::new(0.0, 0.0)),
        Point2d::new(400.0, 300.0),
        epsilon = 1e-9
    );
    assert!(transform[(1, 1)] < 0.0);

    let display = canvas.display_crs().expect("derived");
    let to_display = canvas.transform_to_objective(&display).expect("derived");
    assert_abs_diff_eq!(
        to_display
            .transform_point(&Point2d::new(400.0, 300.0))
            .expect("2d"),
        Point2d::new(0.0, 0.0),
        epsilon = 1e-9
    );
}

#[test]
fn visible_area_round_trip() {
    init_logger();
    // Same aspect ratio as the display, so the area fills the display exactly.
    let canvas = CanvasBuilder::new()
        .with_display_bounds(bounds())
        .build()
        .expect("valid canvas");
    let requested = area(10.0, 40.0, 18.0, 46.0, Some(Crs::WGS84));
    canvas.set_visible_area(&requested).expect("valid area");
    assert_abs_diff_eq!(
        canvas.visible_envelope().expect("invertible"),
        requested,
        epsilon = 1e-9
    );

    // Free aspect stretches any area to the display.
    let stretched = CanvasBuilder::new()
        .with_display_bounds(bounds())
        .with_axis_proportions(f64::NAN)
        .build()
        .expect("valid canvas");
    let requested = area(-1.0, -50.0, 1.0, 50.0, Some(Crs::WGS84));
    stretched.set_visible_area(&requested).expect("valid area");
    assert_abs_diff_eq!(
        stretched.visible_envelope().expect("invertible"),
        requested,
        epsilon = 1e-9
    );
}

#[test]
fn visible_area_is_reprojected() {
    init_logger();
    let canvas = CanvasBuilder::new()
        .with_objective_crs(Crs::EPSG3857)
        .with_display_bounds(Rect::new(0.0, 0.0, 600.0, 600.0))
        .build()
        .expect("valid canvas");

    canvas
        .set_visible_area(&area(-10.0, -10.0, 10.0, 10.0, Some(Crs::WGS84)))
        .expect("projectable area");

    let visible = canvas.visible_envelope().expect("invertible");
    assert_abs_diff_eq!(visible.minimum(0), -1_118_889.97, epsilon = 0.1);
    assert_abs_diff_eq!(visible.maximum(1), 1_118_889.97, epsilon = 0.1);
}

#[test]
fn degenerate_visible_area_is_ignored() {
    let canvas = CanvasBuilder::new()
        .with_display_bounds(bounds())
        .build()
        .expect("valid canvas");
    let events = recorded_events(&canvas);

    let before = canvas.objective_to_display();
    assert!(!canvas
        .set_visible_area(&area(5.0, 5.0, 5.0, 10.0, None))
        .expect("ignored"));
    let unbounded = Envelope::new(vec![0.0, f64::NEG_INFINITY], vec![1.0, 1.0], None)
        .expect("infinite bounds are allowed");
    assert!(!canvas.set_visible_area(&unbounded).expect("ignored"));

    assert_eq!(canvas.objective_to_display(), before);
    assert!(events.lock().is_empty());
}

#[test]
fn failed_objective_change_keeps_state() {
    init_logger();
    let canvas = CanvasBuilder::new()
        .with_display_bounds(bounds())
        .with_visible_area(area(-10.0, -10.0, 10.0, 10.0, None))
        .build()
        .expect("valid canvas");
    let events = recorded_events(&canvas);
    let transform = canvas.objective_to_display();
    let display = canvas.display_crs().expect("derived");

    assert_matches!(
        canvas.set_objective_crs(Crs::engineering("local grid", Unit::Pixel)),
        Err(CanvasError::Transform(_))
    );
    assert_matches!(
        canvas.set_objective_crs(Crs::unix_time()),
        Err(CanvasError::InvalidArgument(_))
    );

    assert_eq!(*canvas.objective_crs(), Crs::WGS84);
    assert_eq!(canvas.objective_to_display(), transform);
    assert!(Arc::ptr_eq(&display, &canvas.display_crs().expect("derived")));
    assert!(events.lock().is_empty());
}

#[test]
fn objective_change_keeps_visible_region() {
    init_logger();
    let canvas = CanvasBuilder::new()
        .with_display_bounds(Rect::new(0.0, 0.0, 600.0, 600.0))
        .with_visible_area(area(-10.0, -10.0, 10.0, 10.0, None))
        .build()
        .expect("valid canvas");
    let events = recorded_events(&canvas);
    canvas.rotate(0.7).expect("finite angle");
    let ground_scale = canvas.geographic_scale();
    events.lock().clear();

    canvas.set_objective_crs(Crs::EPSG3857).expect("same datum");
    assert_eq!(*canvas.objective_crs(), Crs::EPSG3857);
    assert_abs_diff_eq!(canvas.rotation(), 0.7, epsilon = 1e-9);
    assert_abs_diff_eq!(canvas.geographic_scale() / ground_scale, 1.0, epsilon = 0.02);

    let center = canvas.center().expect("invertible");
    assert_abs_diff_eq!(center, Point2d::new(0.0, 0.0), epsilon = 1e-6);

    {
        let events = events.lock();
        assert_matches!(
            &events[0],
            CanvasEvent::ObjectiveCrsChanged { old, new } if **old == Crs::WGS84 && **new == Crs::EPSG3857
        );
        assert_matches!(&events[1], CanvasEvent::TransformChanged { .. });
    }

    // A round trip does not zoom out the rotated view.
    canvas.set_objective_crs(Crs::WGS84).expect("same datum");
    canvas.set_objective_crs(Crs::EPSG3857).expect("same datum");
    assert_abs_diff_eq!(canvas.rotation(), 0.7, epsilon = 1e-9);
    assert_abs_diff_eq!(canvas.geographic_scale() / ground_scale, 1.0, epsilon = 0.03);
}

#[test]
fn affine_objective_change_is_folded_into_view() {
    let feet = Crs::engineering("plant, feet", Unit::Foot);
    let metres = Crs::engineering("plant, metres", Unit::Metre);
    let canvas = CanvasBuilder::new()
        .with_objective_crs(feet)
        .with_display_bounds(bounds())
        .with_visible_area(area(0.0, 0.0, 800.0, 600.0, None))
        .build()
        .expect("valid canvas");
    let before = canvas.visible_envelope().expect("invertible");

    canvas.set_objective_crs(metres).expect("unit conversion");
    let after = canvas.visible_envelope().expect("invertible");
    for axis in 0..2 {
        assert_abs_diff_eq!(after.minimum(axis), before.minimum(axis) * 0.3048, epsilon = 1e-9);
        assert_abs_diff_eq!(after.maximum(axis), before.maximum(axis) * 0.3048, epsilon = 1e-9);
    }
}

#[test]
fn identity_change_is_silent() {
    let canvas = CanvasBuilder::new()
        .with_display_bounds(bounds())
        .with_visible_area(area(-10.0, -10.0, 10.0, 10.0, None))
        .build()
        .expect("valid canvas");
    let events = recorded_events(&canvas);
    let before = canvas.objective_to_display();

    assert!(!canvas.apply_change(&Matrix3::identity()).expect("identity"));
    assert!(!canvas.translate_display(0.0, 0.0).expect("identity"));
    assert!(!canvas.zoom(1.0, None).expect("identity"));
    assert_eq!(canvas.objective_to_display(), before);
    assert!(events.lock().is_empty());

    assert!(canvas.translate_display(5.0, 0.0).expect("invertible"));
    assert_eq!(events.lock().len(), 1);
}

#[test]
fn display_crs_is_reused() {
    let canvas = CanvasBuilder::new()
        .with_display_bounds(bounds())
        .build()
        .expect("valid canvas");
    let first = canvas.display_crs().expect("derived");
    let second = canvas.display_crs().expect("derived");
    assert!(Arc::ptr_eq(&first, &second));

    canvas
        .apply_change(&Matrix3::new_translation(&Vector2::new(1.0, 1.0)))
        .expect("invertible");
    assert!(!Arc::ptr_eq(&first, &canvas.display_crs().expect("derived")));
}

#[test]
fn temporal_range_adds_time_axis() {
    init_logger();
    let canvas = CanvasBuilder::new()
        .with_display_bounds(bounds())
        .with_visible_area(area(-10.0, -10.0, 10.0, 10.0, None))
        .build()
        .expect("valid canvas");
    let events = recorded_events(&canvas);
    let transform = canvas.objective_to_display();

    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let end = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
    canvas.set_temporal_range(start, end).expect("valid range");

    let objective = canvas.objective_crs();
    assert_eq!(objective.dimension(), 3);
    assert!(objective.has_temporal_axis());
    assert_matches!(objective.kind(), CrsKind::Compound { .. });
    assert_eq!(canvas.temporal_range(), Some((start, end)));
    assert_eq!(canvas.objective_to_display(), transform);

    let visible = canvas.visible_envelope().expect("invertible");
    assert_eq!(visible.dimension(), 3);
    assert_abs_diff_eq!(visible.minimum(2), start.timestamp() as f64);
    assert_abs_diff_eq!(visible.maximum(2), end.timestamp() as f64);

    {
        let events = events.lock();
        assert_eq!(events.len(), 2);
        assert_matches!(&events[0], CanvasEvent::ObjectiveCrsChanged { .. });
        assert_matches!(&events[1], CanvasEvent::TemporalRangeChanged { old: None, .. });
    }

    // The time axis is added only once.
    canvas.set_temporal_range(start, start).expect("valid range");
    assert_eq!(canvas.objective_crs().dimension(), 3);

    assert_matches!(
        canvas.set_temporal_range(end, start),
        Err(CanvasError::InvalidArgument(_))
    );
    assert_eq!(canvas.temporal_range(), Some((start, start)));
}

#[test]
fn planar_data_reaches_objective_with_time_axis() {
    let canvas = CanvasBuilder::new()
        .with_objective_crs(Crs::EPSG3857)
        .with_display_bounds(bounds())
        .build()
        .expect("valid canvas");
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    canvas.set_temporal_range(start, start).expect("valid range");
    assert!(canvas.objective_crs().has_temporal_axis());

    let to_objective = canvas
        .transform_to_objective(&Crs::WGS84)
        .expect("horizontal component is reachable");
    let projected = to_objective.transform(&[10.0, 52.0]).expect("inside domain");
    assert_eq!(projected.len(), 2);
    assert_abs_diff_eq!(projected[0], 1_113_194.9, epsilon = 0.1);
    assert_abs_diff_eq!(projected[1], 6_800_125.5, epsilon = 0.1);

    let timed = Crs::compound("wgs84 + time", [Crs::WGS84, Crs::unix_time()]).expect("valid");
    let to_objective = canvas
        .transform_to_objective(&timed)
        .expect("component-wise");
    let projected = to_objective
        .transform(&[10.0, 52.0, 1_704_067_200.0])
        .expect("inside domain");
    assert_abs_diff_eq!(projected[0], 1_113_194.9, epsilon = 0.1);
    assert_abs_diff_eq!(projected[2], 1_704_067_200.0, epsilon = 1e-6);

    let area = area(-10.0, -10.0, 10.0, 10.0, Some(Crs::WGS84));
    assert!(canvas.set_visible_area(&area).expect("reprojected area"));
}

#[test]
fn elevation_range_adds_height_axis() {
    let canvas = CanvasBuilder::new()
        .with_display_bounds(bounds())
        .build()
        .expect("valid canvas");
    canvas.set_elevation_range(0.0, 100.0).expect("valid range");
    assert!(canvas.objective_crs().has_vertical_axis());

    let visible = canvas.visible_envelope().expect("invertible");
    assert_eq!(visible.lower_corner()[2], 0.0);
    assert_eq!(visible.upper_corner()[2], 100.0);

    assert_matches!(
        canvas.set_elevation_range(f64::NAN, 1.0),
        Err(CanvasError::InvalidArgument(_))
    );
}

#[test]
fn geographic_scale() {
    init_logger();
    let canvas = CanvasBuilder::new()
        .with_display_bounds(bounds())
        .with_visible_area(area(-10.0, -10.0, 10.0, 10.0, None))
        .build()
        .expect("valid canvas");
    // 30 pixels per degree at the equator.
    assert_abs_diff_eq!(
        canvas.geographic_scale(),
        111_319.49 / 30.0,
        epsilon = 1.0
    );

    let mercator = CanvasBuilder::new()
        .with_objective_crs(Crs::EPSG3857)
        .with_display_bounds(bounds())
        .build()
        .expect("valid canvas");
    assert_abs_diff_eq!(mercator.geographic_scale(), 1.0, epsilon = 1e-3);

    // Display center is far outside of valid latitudes.
    let invalid = CanvasBuilder::new()
        .with_display_bounds(bounds())
        .with_objective_to_display(Matrix3::new_translation(&Vector2::new(0.0, -1000.0)))
        .build()
        .expect("valid canvas");
    assert_eq!(invalid.geographic_scale(), 1.0);

    let pixels = CanvasBuilder::new()
        .with_objective_crs(Crs::engineering("screen", Unit::Pixel))
        .build()
        .expect("valid canvas");
    assert_eq!(pixels.geographic_scale(), 1.0);
}

#[derive(Default)]
struct CountingFactory {
    calls: AtomicUsize,
}

impl OperationFactory for CountingFactory {
    fn create_operation(&self, source: &Crs, target: &Crs) -> Result<MathTransform, CanvasError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        DefaultOperationFactory.create_operation(source, target)
    }
}

struct SharedFactory(Arc<CountingFactory>);

impl OperationFactory for SharedFactory {
    fn create_operation(&self, source: &Crs, target: &Crs) -> Result<MathTransform, CanvasError> {
        self.0.create_operation(source, target)
    }
}

#[test]
fn transforms_to_objective_are_cached() {
    let factory = Arc::new(CountingFactory::default());
    let canvas = CanvasBuilder::new()
        .with_objective_crs(Crs::EPSG3857)
        .with_display_bounds(bounds())
        .with_operation_factory(SharedFactory(factory.clone()))
        .build()
        .expect("valid canvas");

    let first = canvas.transform_to_objective(&Crs::WGS84).expect("same datum");
    canvas.transform_to_objective(&Crs::WGS84).expect("same datum");
    assert_eq!(factory.calls.load(Ordering::SeqCst), 1);
    assert_abs_diff_eq!(
        first.transform(&[10.0, 0.0]).expect("projectable")[0],
        1_113_194.9,
        epsilon = 0.1
    );

    assert_matches!(
        canvas.transform_to_objective(&Crs::engineering("local", Unit::Metre)),
        Err(CanvasError::Factory(_))
    );

    // Changing the objective CRS invalidates the cache.
    let calls = factory.calls.load(Ordering::SeqCst);
    canvas.set_objective_crs(Crs::WGS84).expect("same datum");
    canvas.set_objective_crs(Crs::EPSG3857).expect("same datum");
    let after_change = factory.calls.load(Ordering::SeqCst);
    canvas.transform_to_objective(&Crs::WGS84).expect("same datum");
    assert_eq!(factory.calls.load(Ordering::SeqCst), after_change + 1);
    assert!(after_change > calls);
}

#[test]
fn listeners_can_read_canvas() {
    let canvas = Arc::new(
        CanvasBuilder::new()
            .with_display_bounds(bounds())
            .build()
            .expect("valid canvas"),
    );
    let observed = Arc::new(Mutex::new(None));

    let canvas_clone = Arc::downgrade(&canvas);
    let observed_clone = observed.clone();
    let handle = canvas.subscribe(move |event| {
        if let (CanvasEvent::TransformChanged { new, .. }, Some(canvas)) =
            (event, canvas_clone.upgrade())
        {
            *observed_clone.lock() = Some(canvas.objective_to_display() == *new);
        }
    });

    canvas.translate_display(1.0, 2.0).expect("invertible");
    assert_eq!(*observed.lock(), Some(true));

    assert!(canvas.unsubscribe(handle));
}

#[test]
fn view_change_advises_renderer_to_stop() {
    let canvas = CanvasBuilder::new()
        .with_display_bounds(bounds())
        .build()
        .expect("valid canvas");

    canvas.monitor().start();
    assert!(!canvas.monitor().stop_requested());
    canvas.zoom(2.0, Some(Point2d::new(0.0, 0.0))).expect("valid");
    assert!(canvas.monitor().stop_requested());
    canvas.monitor().finish();
}

#[test]
fn display_bounds_change() {
    let canvas = CanvasBuilder::new()
        .with_display_bounds(bounds())
        .build()
        .expect("valid canvas");
    let events = recorded_events(&canvas);

    assert!(canvas
        .set_display_bounds(Rect::new(0.0, 0.0, 1024.0, 768.0))
        .expect("valid bounds"));
    assert!(!canvas
        .set_display_bounds(Rect::new(0.0, 0.0, 1024.0, 768.0))
        .expect("valid bounds"));
    assert_matches!(
        &events.lock()[..],
        [CanvasEvent::DisplayBoundsChanged { old, .. }] if *old == bounds()
    );
}
