use crate::animation::ease::Ease;
use crate::foundation::cancel::CancelToken;
use crate::foundation::core::{Canvas, GeoBounds, GeoPoint, Point};
use crate::foundation::error::TripReelResult;
use crate::render::frame::FrameRGBA;

/// Camera position: center coordinate plus a Web-Mercator zoom level.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CameraView {
    /// Center of the viewport.
    pub center: GeoPoint,
    /// Zoom level; world width is `256 × 2^zoom` pixels.
    pub zoom: f64,
}

impl CameraView {
    /// Construct a view.
    pub fn new(center: GeoPoint, zoom: f64) -> Self {
        Self { center, zoom }
    }
}

/// A map-rendering surface with its own animation clock.
///
/// Camera transitions are non-blocking: they are sampled as the clock moves through
/// [`MapSurface::advance`], and [`MapSurface::raster`] always reflects the current clock.
pub trait MapSurface {
    /// Block until the initial paint is complete.
    fn wait_for_paint(&mut self, cancel: &CancelToken) -> TripReelResult<()>;

    /// Animate the camera to `target` over `duration_ms`.
    fn fly_to(&mut self, target: CameraView, duration_ms: f64, ease: Ease);

    /// Animate the camera so `bounds` fits the viewport inset by `padding_px`.
    fn fit_bounds(&mut self, bounds: GeoBounds, padding_px: f64, duration_ms: f64, ease: Ease);

    /// Move the animation clock forward by `dt_ms` and repaint.
    fn advance(&mut self, dt_ms: f64) -> TripReelResult<()>;

    /// Current raster, premultiplied RGBA8 at canvas size.
    fn raster(&self) -> &FrameRGBA;

    /// Screen position of `p` under the current camera.
    fn project(&self, p: GeoPoint) -> Point;

    /// Show a route polyline. The raster picks it up on the next `advance`.
    fn set_route(&mut self, coords: &[GeoPoint]);

    /// Remove the route polyline. The raster drops it on the next `advance`.
    fn clear_route(&mut self);

    /// Free the surface. Further calls other than `release` are not expected.
    fn release(&mut self);
}

/// Creates map surfaces sized to the output canvas.
pub trait MapFactory {
    /// Allocate a surface showing `initial`.
    fn create(
        &mut self,
        canvas: Canvas,
        initial: CameraView,
    ) -> TripReelResult<Box<dyn MapSurface>>;
}
