use std::f64::consts::PI;

use crate::animation::ease::Ease;
use crate::foundation::cancel::CancelToken;
use crate::foundation::core::{Canvas, GeoBounds, GeoPoint, Point, Rect};
use crate::foundation::error::{TripReelError, TripReelResult};
use crate::map::surface::{CameraView, MapFactory, MapSurface};
use crate::render::frame::FrameRGBA;
use crate::render::paint::{self, RenderTarget};

const TILE_PX: f64 = 256.0;
const MAX_LAT: f64 = 85.051_128_78;
const MIN_ZOOM: f64 = 0.0;
const MAX_ZOOM: f64 = 18.0;
const GRID_STEPS_DEG: [f64; 12] = [30.0, 10.0, 5.0, 2.0, 1.0, 0.5, 0.2, 0.1, 0.05, 0.02, 0.01, 0.005];
const GRID_MIN_SPACING_PX: f64 = 80.0;
const GRID_MAX_LINES: usize = 512;

/// Colors and stroke sizes of the built-in map.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FlatMapStyle {
    /// Background fill.
    pub water: [u8; 4],
    /// Graticule line color (straight alpha).
    pub grid: [u8; 4],
    /// Graticule line width in pixels.
    pub grid_width: f64,
    /// Route polyline color.
    pub route: [u8; 4],
    /// Route polyline width in pixels.
    pub route_width: f64,
    /// Radius of the markers at both route ends.
    pub marker_radius: f64,
}

impl Default for FlatMapStyle {
    fn default() -> Self {
        Self {
            water: [170, 211, 223, 255],
            grid: [255, 255, 255, 110],
            grid_width: 1.0,
            route: [214, 55, 62, 255],
            route_width: 4.0,
            marker_radius: 7.0,
        }
    }
}

/// Normalized Web-Mercator position in `[0, 1]²`, y pointing south.
pub(crate) fn mercator(p: GeoPoint) -> Point {
    let lat = p.lat.clamp(-MAX_LAT, MAX_LAT).to_radians();
    let x = (p.lon + 180.0) / 360.0;
    let y = (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / PI) / 2.0;
    Point::new(x, y)
}

pub(crate) fn inverse_mercator(m: Point) -> GeoPoint {
    let lon = m.x * 360.0 - 180.0;
    let lat = (PI * (1.0 - 2.0 * m.y)).sinh().atan().to_degrees();
    GeoPoint::new(lon, lat)
}

fn world_px(zoom: f64) -> f64 {
    TILE_PX * zoom.exp2()
}

#[derive(Clone, Copy, Debug)]
struct Transition {
    from: CameraView,
    to: CameraView,
    elapsed_ms: f64,
    duration_ms: f64,
    ease: Ease,
}

impl Transition {
    fn progress(&self) -> f64 {
        if self.duration_ms <= 0.0 {
            return 1.0;
        }
        (self.elapsed_ms / self.duration_ms).clamp(0.0, 1.0)
    }

    fn sample(&self) -> CameraView {
        let t = self.ease.apply(self.progress());
        let a = mercator(self.from.center);
        let b = mercator(self.to.center);
        CameraView {
            center: inverse_mercator(a.lerp(b, t)),
            zoom: self.from.zoom + (self.to.zoom - self.from.zoom) * t,
        }
    }
}

/// CPU map surface: a Web-Mercator graticule over water, plus the route and its end markers.
///
/// Repaints only when the camera or the route changed.
pub struct FlatMapSurface {
    canvas: Canvas,
    style: FlatMapStyle,
    view: CameraView,
    transition: Option<Transition>,
    route: Vec<GeoPoint>,
    target: Option<RenderTarget>,
    empty: FrameRGBA,
    dirty: bool,
}

impl FlatMapSurface {
    /// Allocate a surface showing `initial`.
    pub fn new(canvas: Canvas, initial: CameraView, style: FlatMapStyle) -> TripReelResult<Self> {
        if canvas.width == 0 || canvas.height == 0 {
            return Err(TripReelError::surface("map canvas must be non-empty"));
        }
        let target = RenderTarget::new(canvas).map_err(|e| TripReelError::surface(e.to_string()))?;
        Ok(Self {
            canvas,
            style,
            view: CameraView::new(initial.center, initial.zoom.clamp(MIN_ZOOM, MAX_ZOOM)),
            transition: None,
            route: Vec::new(),
            target: Some(target),
            empty: FrameRGBA::transparent(Canvas {
                width: 0,
                height: 0,
            }),
            dirty: true,
        })
    }

    /// Current camera.
    pub fn view(&self) -> CameraView {
        self.view
    }

    /// Return `true` while a camera transition is running.
    pub fn is_animating(&self) -> bool {
        self.transition.is_some()
    }

    /// Camera that fits `bounds` into the canvas inset by `padding_px`.
    pub fn view_for_bounds(&self, bounds: GeoBounds, padding_px: f64) -> CameraView {
        let sw = mercator(bounds.sw);
        let ne = mercator(bounds.ne);
        let dx = (ne.x - sw.x).abs() * TILE_PX;
        let dy = (sw.y - ne.y).abs() * TILE_PX;
        let avail_w = (f64::from(self.canvas.width) - 2.0 * padding_px).max(1.0);
        let avail_h = (f64::from(self.canvas.height) - 2.0 * padding_px).max(1.0);

        let scale = match (dx > f64::EPSILON, dy > f64::EPSILON) {
            (true, true) => (avail_w / dx).min(avail_h / dy),
            (true, false) => avail_w / dx,
            (false, true) => avail_h / dy,
            (false, false) => MAX_ZOOM.exp2(),
        };
        CameraView {
            center: inverse_mercator(sw.midpoint(ne)),
            zoom: scale.log2().clamp(MIN_ZOOM, MAX_ZOOM),
        }
    }

    fn start(&mut self, to: CameraView, duration_ms: f64, ease: Ease) {
        let to = CameraView::new(to.center, to.zoom.clamp(MIN_ZOOM, MAX_ZOOM));
        if duration_ms <= 0.0 {
            self.view = to;
            self.transition = None;
        } else {
            self.transition = Some(Transition {
                from: self.view,
                to,
                elapsed_ms: 0.0,
                duration_ms,
                ease,
            });
        }
        self.dirty = true;
    }

    fn unproject(&self, s: Point) -> GeoPoint {
        let ws = world_px(self.view.zoom);
        let c = mercator(self.view.center);
        let m = Point::new(
            c.x + (s.x - f64::from(self.canvas.width) / 2.0) / ws,
            c.y + (s.y - f64::from(self.canvas.height) / 2.0) / ws,
        );
        let g = inverse_mercator(m);
        GeoPoint::new(g.lon.clamp(-180.0, 180.0), g.lat.clamp(-MAX_LAT, MAX_LAT))
    }

    fn grid_step(&self) -> f64 {
        let px_per_deg = world_px(self.view.zoom) / 360.0;
        let mut step = GRID_STEPS_DEG[0];
        for s in GRID_STEPS_DEG {
            if s * px_per_deg < GRID_MIN_SPACING_PX {
                break;
            }
            step = s;
        }
        step
    }

    fn repaint(&mut self) -> TripReelResult<()> {
        let Some(mut target) = self.target.take() else {
            return Err(TripReelError::surface("map surface used after release"));
        };
        let w = f64::from(self.canvas.width);
        let h = f64::from(self.canvas.height);
        let style = self.style;
        let step = self.grid_step();
        let top_left = self.unproject(Point::ZERO);
        let bottom_right = self.unproject(Point::new(w, h));
        let route: Vec<Point> = self.route.iter().map(|p| self.project(*p)).collect();

        let ctx = target.begin();
        paint::fill_rect(ctx, Rect::new(0.0, 0.0, w, h), style.water);

        let lon_lines = (((bottom_right.lon - top_left.lon) / step).ceil() as usize + 1).min(GRID_MAX_LINES);
        let first_lon = (top_left.lon / step).floor() * step;
        for i in 0..=lon_lines {
            let x = self.project(GeoPoint::new(first_lon + i as f64 * step, 0.0)).x;
            if (0.0..=w).contains(&x) {
                let half = style.grid_width / 2.0;
                paint::fill_rect(ctx, Rect::new(x - half, 0.0, x + half, h), style.grid);
            }
        }
        let lat_lines = (((top_left.lat - bottom_right.lat) / step).ceil() as usize + 1).min(GRID_MAX_LINES);
        let first_lat = (bottom_right.lat / step).floor() * step;
        for i in 0..=lat_lines {
            let lat = first_lat + i as f64 * step;
            if lat.abs() > MAX_LAT {
                continue;
            }
            let y = self.project(GeoPoint::new(0.0, lat)).y;
            if (0.0..=h).contains(&y) {
                let half = style.grid_width / 2.0;
                paint::fill_rect(ctx, Rect::new(0.0, y - half, w, y + half), style.grid);
            }
        }

        for pair in route.windows(2) {
            paint::fill_segment(ctx, pair[0], pair[1], style.route_width, style.route);
        }
        for end in [route.first(), route.last()].into_iter().flatten() {
            paint::fill_shape(
                ctx,
                &kurbo::Circle::new(*end, style.marker_radius),
                style.route,
            );
            paint::fill_shape(
                ctx,
                &kurbo::Circle::new(*end, style.marker_radius * 0.5),
                [255, 255, 255, 255],
            );
        }

        target.finish();
        self.target = Some(target);
        self.dirty = false;
        Ok(())
    }
}

impl MapSurface for FlatMapSurface {
    fn wait_for_paint(&mut self, cancel: &CancelToken) -> TripReelResult<()> {
        cancel.check()?;
        self.repaint()
    }

    fn fly_to(&mut self, target: CameraView, duration_ms: f64, ease: Ease) {
        self.start(target, duration_ms, ease);
    }

    fn fit_bounds(&mut self, bounds: GeoBounds, padding_px: f64, duration_ms: f64, ease: Ease) {
        let to = self.view_for_bounds(bounds, padding_px);
        self.start(to, duration_ms, ease);
    }

    fn advance(&mut self, dt_ms: f64) -> TripReelResult<()> {
        if self.target.is_none() {
            return Err(TripReelError::surface("map surface used after release"));
        }
        if let Some(mut tr) = self.transition.take() {
            tr.elapsed_ms += dt_ms.max(0.0);
            self.view = tr.sample();
            if tr.progress() < 1.0 {
                self.transition = Some(tr);
            }
            self.dirty = true;
        }
        if self.dirty {
            self.repaint()?;
        }
        Ok(())
    }

    fn raster(&self) -> &FrameRGBA {
        match &self.target {
            Some(t) => t.frame(),
            None => &self.empty,
        }
    }

    fn project(&self, p: GeoPoint) -> Point {
        let ws = world_px(self.view.zoom);
        let m = mercator(p);
        let c = mercator(self.view.center);
        Point::new(
            (m.x - c.x) * ws + f64::from(self.canvas.width) / 2.0,
            (m.y - c.y) * ws + f64::from(self.canvas.height) / 2.0,
        )
    }

    fn set_route(&mut self, coords: &[GeoPoint]) {
        self.route = coords.to_vec();
        self.dirty = true;
    }

    fn clear_route(&mut self) {
        if !self.route.is_empty() {
            self.route.clear();
            self.dirty = true;
        }
    }

    fn release(&mut self) {
        self.target = None;
        self.route.clear();
        self.transition = None;
    }
}

/// [`MapFactory`] producing [`FlatMapSurface`]s.
#[derive(Clone, Debug, Default)]
pub struct FlatMapFactory {
    /// Style applied to every surface.
    pub style: FlatMapStyle,
}

impl MapFactory for FlatMapFactory {
    fn create(
        &mut self,
        canvas: Canvas,
        initial: CameraView,
    ) -> TripReelResult<Box<dyn MapSurface>> {
        Ok(Box::new(FlatMapSurface::new(canvas, initial, self.style)?))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/map/flat.rs"]
mod tests;
