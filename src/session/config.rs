use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::animation::ease::Ease;
use crate::foundation::core::{Canvas, Fps};
use crate::foundation::error::{TripReelError, TripReelResult};

/// Fixed stage durations in milliseconds.
///
/// Each value is converted to frames exactly once, when the stage plan is built.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StageTimings {
    /// Opening title slide.
    pub title_ms: u64,
    /// Each travel leg, including the starting-location leg.
    pub travel_ms: u64,
    /// Darken transition at the start of a photo showcase.
    pub showcase_intro_ms: u64,
    /// Each photo within a showcase.
    pub photo_ms: u64,
    /// Undarken transition at the end of a photo showcase.
    pub showcase_outro_ms: u64,
    /// Arrival at a stop without photos.
    pub visit_ms: u64,
    /// Closing slide.
    pub end_ms: u64,
}

impl Default for StageTimings {
    fn default() -> Self {
        Self {
            title_ms: 3000,
            travel_ms: 3000,
            showcase_intro_ms: 1000,
            photo_ms: 2500,
            showcase_outro_ms: 1000,
            visit_ms: 2000,
            end_ms: 2500,
        }
    }
}

/// Overlay geometry and motion parameters.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OverlayStyle {
    /// Labels wider than this fraction of the canvas width are truncated with an ellipsis.
    pub label_max_width_frac: f64,
    /// Label font size in pixels.
    pub label_size_px: f32,
    /// Title and end slide font size in pixels.
    pub title_size_px: f32,
    /// Caption font size in pixels.
    pub caption_size_px: f32,
    /// Fraction of the title/end stages spent fading in (and again fading out).
    pub slide_fade_frac: f64,
    /// Opacity of the origin label during a travel leg.
    pub origin_label_opacity: f32,
    /// Peak black overlay opacity behind the photo carousel.
    pub backdrop_darkness: f32,
    /// Transport icon edge length in pixels.
    pub icon_size_px: f64,
    /// Vertical bob amplitude of the transport icon.
    pub bob_amplitude_px: f64,
    /// Bob period in milliseconds.
    pub bob_period_ms: f64,
    /// Relative scale amplitude of the centered photo pulse.
    pub pulse_amplitude: f64,
    /// Pulse period in milliseconds.
    pub pulse_period_ms: f64,
    /// Scale of previous/next carousel photos relative to the current one.
    pub neighbor_scale: f64,
    /// Tilt of carousel neighbors in degrees.
    pub neighbor_tilt_deg: f64,
    /// Opacity of carousel neighbors.
    pub neighbor_opacity: f32,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            label_max_width_frac: 0.4,
            label_size_px: 28.0,
            title_size_px: 64.0,
            caption_size_px: 26.0,
            slide_fade_frac: 0.3,
            origin_label_opacity: 0.6,
            backdrop_darkness: 0.7,
            icon_size_px: 56.0,
            bob_amplitude_px: 6.0,
            bob_period_ms: 800.0,
            pulse_amplitude: 0.02,
            pulse_period_ms: 2000.0,
            neighbor_scale: 0.7,
            neighbor_tilt_deg: 6.0,
            neighbor_opacity: 0.5,
        }
    }
}

/// Camera framing parameters.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CameraStyle {
    /// Zoom level used when arriving at a stop.
    pub stop_zoom: f64,
    /// Padding in pixels around a travel leg's bounding box.
    pub leg_padding_px: f64,
    /// Easing for arrival and showcase fly-ins. Travel legs are always linear.
    pub arrival_ease: Ease,
}

impl Default for CameraStyle {
    fn default() -> Self {
        Self {
            stop_zoom: 11.0,
            leg_padding_px: 120.0,
            arrival_ease: Ease::InOutCubic,
        }
    }
}

/// How frame production is paced against the wall clock.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Pacing {
    /// Produce frames as fast as the pipeline allows.
    #[default]
    Offline,
    /// Wait for each frame's deadline, like a display-refresh driven capture.
    Realtime,
}

/// Immutable configuration of a [`crate::Compositor`].
///
/// Passed at construction; two compositors never share mutable styling state.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReelConfig {
    /// Output resolution.
    pub canvas: Canvas,
    /// Output frame rate.
    pub fps: Fps,
    /// Stage durations.
    pub timings: StageTimings,
    /// Overlay geometry and motion.
    pub overlay: OverlayStyle,
    /// Camera framing.
    pub camera: CameraStyle,
    /// Emit a progress update at least every this many frames within a stage.
    pub progress_interval_frames: u64,
    /// Ranked output formats, most preferred first.
    pub format_preferences: Vec<String>,
    /// Closing slide text.
    pub end_text: String,
    /// Frame pacing.
    pub pacing: Pacing,
    /// TrueType/OpenType font used for every overlay text. Without it text is laid out with
    /// fixed-advance metrics and glyphs are not drawn.
    pub font_path: Option<PathBuf>,
}

impl Default for ReelConfig {
    fn default() -> Self {
        Self {
            canvas: Canvas {
                width: 1280,
                height: 720,
            },
            fps: Fps { num: 30, den: 1 },
            timings: StageTimings::default(),
            overlay: OverlayStyle::default(),
            camera: CameraStyle::default(),
            progress_interval_frames: 15,
            format_preferences: vec![
                "video/webm;codecs=vp9".to_string(),
                "video/webm;codecs=vp8".to_string(),
                "video/webm".to_string(),
                "video/mp4".to_string(),
            ],
            end_text: "Thanks for watching".to_string(),
            pacing: Pacing::Offline,
            font_path: None,
        }
    }
}

impl ReelConfig {
    /// Parse a configuration from a JSON reader. Missing fields take their defaults.
    pub fn from_reader<R: std::io::Read>(r: R) -> TripReelResult<Self> {
        let cfg: Self = serde_json::from_reader(r)
            .map_err(|e| TripReelError::validation(format!("parse config JSON: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Parse a configuration from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> TripReelResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            TripReelError::validation(format!("open config JSON '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Check value ranges.
    pub fn validate(&self) -> TripReelResult<()> {
        Fps::new(self.fps.num, self.fps.den)?;
        let Canvas { width, height } = self.canvas;
        if width == 0 || height == 0 {
            return Err(TripReelError::validation("canvas width/height must be non-zero"));
        }
        if width > u32::from(u16::MAX) || height > u32::from(u16::MAX) {
            return Err(TripReelError::validation(
                "canvas width/height must fit in 16 bits",
            ));
        }
        if !width.is_multiple_of(2) || !height.is_multiple_of(2) {
            return Err(TripReelError::validation(
                "canvas width/height must be even (required for yuv420p output)",
            ));
        }
        let t = &self.timings;
        for (name, ms) in [
            ("titleMs", t.title_ms),
            ("travelMs", t.travel_ms),
            ("showcaseIntroMs", t.showcase_intro_ms),
            ("photoMs", t.photo_ms),
            ("showcaseOutroMs", t.showcase_outro_ms),
            ("visitMs", t.visit_ms),
            ("endMs", t.end_ms),
        ] {
            if self.fps.ms_to_frames(ms) == 0 {
                return Err(TripReelError::validation(format!(
                    "{name} must last at least one frame"
                )));
            }
        }
        let o = &self.overlay;
        if !(o.label_max_width_frac > 0.0 && o.label_max_width_frac <= 1.0) {
            return Err(TripReelError::validation(
                "labelMaxWidthFrac must be in (0, 1]",
            ));
        }
        if !(0.0..=0.5).contains(&o.slide_fade_frac) {
            return Err(TripReelError::validation("slideFadeFrac must be in [0, 0.5]"));
        }
        for (name, size) in [
            ("labelSizePx", o.label_size_px),
            ("titleSizePx", o.title_size_px),
            ("captionSizePx", o.caption_size_px),
        ] {
            if !size.is_finite() || size <= 0.0 {
                return Err(TripReelError::validation(format!(
                    "{name} must be finite and > 0"
                )));
            }
        }
        if self.progress_interval_frames == 0 {
            return Err(TripReelError::validation(
                "progressIntervalFrames must be > 0",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/config.rs"]
mod tests;
