use std::sync::{Arc, Mutex};

use super::*;
use crate::foundation::core::Point;
use crate::render::frame::FrameRGBA;

#[derive(Default)]
struct Log {
    calls: Vec<String>,
    advanced_ms: f64,
    advances: u32,
    released: u32,
}

struct RecordingSurface {
    log: Arc<Mutex<Log>>,
    fail_paint: bool,
    frame: FrameRGBA,
}

impl MapSurface for RecordingSurface {
    fn wait_for_paint(&mut self, _cancel: &CancelToken) -> TripReelResult<()> {
        if self.fail_paint {
            return Err(TripReelError::validation("style failed to load"));
        }
        Ok(())
    }

    fn fly_to(&mut self, _target: CameraView, duration_ms: f64, ease: Ease) {
        self.log
            .lock()
            .unwrap()
            .calls
            .push(format!("fly_to {duration_ms:.3} {ease:?}"));
    }

    fn fit_bounds(&mut self, _bounds: GeoBounds, padding_px: f64, duration_ms: f64, ease: Ease) {
        self.log
            .lock()
            .unwrap()
            .calls
            .push(format!("fit_bounds {padding_px} {duration_ms:.3} {ease:?}"));
    }

    fn advance(&mut self, dt_ms: f64) -> TripReelResult<()> {
        let mut log = self.log.lock().unwrap();
        log.advanced_ms += dt_ms;
        log.advances += 1;
        Ok(())
    }

    fn raster(&self) -> &FrameRGBA {
        &self.frame
    }

    fn project(&self, p: GeoPoint) -> Point {
        Point::new(p.lon, p.lat)
    }

    fn set_route(&mut self, coords: &[GeoPoint]) {
        self.log
            .lock()
            .unwrap()
            .calls
            .push(format!("set_route {}", coords.len()));
    }

    fn clear_route(&mut self) {
        self.log.lock().unwrap().calls.push("clear_route".to_string());
    }

    fn release(&mut self) {
        self.log.lock().unwrap().released += 1;
    }
}

struct RecordingFactory {
    log: Arc<Mutex<Log>>,
    fail_paint: bool,
}

impl MapFactory for RecordingFactory {
    fn create(
        &mut self,
        canvas: Canvas,
        _initial: CameraView,
    ) -> TripReelResult<Box<dyn MapSurface>> {
        Ok(Box::new(RecordingSurface {
            log: Arc::clone(&self.log),
            fail_paint: self.fail_paint,
            frame: FrameRGBA::transparent(canvas),
        }))
    }
}

fn canvas() -> Canvas {
    Canvas {
        width: 8,
        height: 8,
    }
}

fn view() -> CameraView {
    CameraView::new(GeoPoint::new(2.35, 48.85), 10.0)
}

fn driver(log: &Arc<Mutex<Log>>) -> CameraDriver {
    let mut factory = RecordingFactory {
        log: Arc::clone(log),
        fail_paint: false,
    };
    CameraDriver::initialize(
        &mut factory,
        canvas(),
        view(),
        Fps::new(30, 1).unwrap(),
        &CancelToken::new(),
    )
    .unwrap()
}

#[test]
fn animation_duration_matches_frame_budget() {
    let log = Arc::new(Mutex::new(Log::default()));
    let mut d = driver(&log);
    d.fly_to(view(), 60, Ease::InOutCubic);
    d.fit_leg(GeoPoint::new(0.0, 0.0), GeoPoint::new(1.0, 1.0), 120.0, 90);
    for _ in 0..90 {
        d.tick().unwrap();
    }
    let log = log.lock().unwrap();
    assert_eq!(log.calls[0], "fly_to 2000.000 InOutCubic");
    assert_eq!(log.calls[1], "fit_bounds 120 3000.000 Linear");
    assert!((log.advanced_ms - 3000.0).abs() < 1e-6);
}

#[test]
fn route_is_sampled_polyline() {
    let log = Arc::new(Mutex::new(Log::default()));
    let mut d = driver(&log);
    d.show_route(GeoPoint::new(0.0, 0.0), GeoPoint::new(10.0, 10.0))
        .unwrap();
    assert_eq!(log.lock().unwrap().calls[0], "set_route 33");

    let line = leg_polyline(GeoPoint::new(0.0, 0.0), GeoPoint::new(10.0, 20.0), 4);
    assert_eq!(line.len(), 5);
    assert_eq!(line[2], GeoPoint::new(5.0, 10.0));
}

#[test]
fn route_changes_repaint_without_moving_the_clock() {
    let log = Arc::new(Mutex::new(Log::default()));
    let mut d = driver(&log);
    d.show_route(GeoPoint::new(0.0, 0.0), GeoPoint::new(1.0, 1.0))
        .unwrap();
    assert_eq!(log.lock().unwrap().advances, 1);
    d.clear_route().unwrap();

    let log = log.lock().unwrap();
    assert_eq!(log.calls, vec!["set_route 33".to_string(), "clear_route".to_string()]);
    assert_eq!(log.advances, 2);
    assert_eq!(log.advanced_ms, 0.0);
}

#[test]
fn release_is_idempotent_and_runs_on_drop() {
    let log = Arc::new(Mutex::new(Log::default()));
    let mut d = driver(&log);
    d.release();
    d.release();
    drop(d);
    let log = log.lock().unwrap();
    assert_eq!(log.released, 1);
    assert_eq!(log.calls, vec!["clear_route".to_string()]);

    let log2 = Arc::new(Mutex::new(Log::default()));
    drop(driver(&log2));
    assert_eq!(log2.lock().unwrap().released, 1);
}

#[test]
fn failed_initial_paint_releases_and_maps_error() {
    let log = Arc::new(Mutex::new(Log::default()));
    let mut factory = RecordingFactory {
        log: Arc::clone(&log),
        fail_paint: true,
    };
    let err = CameraDriver::initialize(
        &mut factory,
        canvas(),
        view(),
        Fps::new(30, 1).unwrap(),
        &CancelToken::new(),
    )
    .err()
    .expect("paint fails");
    assert!(matches!(err, TripReelError::SurfaceInit(_)));
    assert_eq!(log.lock().unwrap().released, 1);
}
