use crate::animation::ease::Ease;
use crate::foundation::cancel::CancelToken;
use crate::foundation::core::{Canvas, Fps, GeoBounds, GeoPoint};
use crate::foundation::error::{TripReelError, TripReelResult};
use crate::map::surface::{CameraView, MapFactory, MapSurface};

const ROUTE_SEGMENTS: usize = 32;

/// Drives a [`MapSurface`] in lockstep with the output frame clock.
///
/// Every animation is issued with a duration of exactly `frames` output frames, and
/// [`CameraDriver::tick`] advances the surface clock by exactly one frame, so the camera lands on
/// its target on the frame after a stage ends.
pub(crate) struct CameraDriver {
    surface: Box<dyn MapSurface>,
    fps: Fps,
    released: bool,
}

impl CameraDriver {
    /// Allocate the surface through `factory` and wait for its initial paint.
    ///
    /// A surface whose initial paint fails is released before the error is returned.
    #[tracing::instrument(skip(factory, cancel))]
    pub(crate) fn initialize(
        factory: &mut dyn MapFactory,
        canvas: Canvas,
        initial: CameraView,
        fps: Fps,
        cancel: &CancelToken,
    ) -> TripReelResult<Self> {
        let surface = factory.create(canvas, initial).map_err(surface_error)?;
        let mut driver = Self {
            surface,
            fps,
            released: false,
        };
        driver
            .surface
            .wait_for_paint(cancel)
            .map_err(surface_error)?;
        tracing::debug!("map surface painted");
        Ok(driver)
    }

    pub(crate) fn fly_to(&mut self, target: CameraView, frames: u64, ease: Ease) {
        let duration_ms = self.fps.frames_to_ms(frames);
        tracing::debug!(?target, duration_ms, "camera fly_to");
        self.surface.fly_to(target, duration_ms, ease);
    }

    /// Frame a travel leg. Legs always pan linearly so the icon overlay keeps pace.
    pub(crate) fn fit_leg(&mut self, from: GeoPoint, to: GeoPoint, padding_px: f64, frames: u64) {
        let duration_ms = self.fps.frames_to_ms(frames);
        let bounds = GeoBounds::from_points(from, to);
        tracing::debug!(?bounds, duration_ms, "camera fit_bounds");
        self.surface
            .fit_bounds(bounds, padding_px, duration_ms, Ease::Linear);
    }

    /// Show the leg's route. The raster includes it before this returns.
    pub(crate) fn show_route(&mut self, from: GeoPoint, to: GeoPoint) -> TripReelResult<()> {
        self.surface.set_route(&leg_polyline(from, to, ROUTE_SEGMENTS));
        self.surface.advance(0.0)
    }

    /// Remove the route. The raster no longer shows it once this returns.
    pub(crate) fn clear_route(&mut self) -> TripReelResult<()> {
        self.surface.clear_route();
        self.surface.advance(0.0)
    }

    /// Advance the surface clock by one output frame.
    pub(crate) fn tick(&mut self) -> TripReelResult<()> {
        self.surface.advance(self.fps.frame_duration_ms())
    }

    pub(crate) fn surface(&self) -> &dyn MapSurface {
        self.surface.as_ref()
    }

    /// Clear the route and release the surface. Idempotent.
    pub(crate) fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.surface.clear_route();
        self.surface.release();
        tracing::debug!("map surface released");
    }
}

impl Drop for CameraDriver {
    fn drop(&mut self) {
        self.release();
    }
}

/// Straight lon/lat polyline from `from` to `to`, sampled at `segments + 1` points.
///
/// The transport icon follows the same interpolation, so it stays on the drawn line.
pub(crate) fn leg_polyline(from: GeoPoint, to: GeoPoint, segments: usize) -> Vec<GeoPoint> {
    let n = segments.max(1);
    (0..=n)
        .map(|i| from.lerp(to, i as f64 / n as f64))
        .collect()
}

fn surface_error(e: TripReelError) -> TripReelError {
    match e {
        TripReelError::SurfaceInit(_) | TripReelError::Cancelled => e,
        other => TripReelError::surface(other.to_string()),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/map/driver.rs"]
mod tests;
