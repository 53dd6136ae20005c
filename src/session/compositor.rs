use std::sync::Arc;

use crate::assets::icons::TransportIcons;
use crate::assets::loader::ImageSource;
use crate::encode::adapter::VideoArtifact;
use crate::encode::sink::{EncoderFactory, FormatChoice, resolve_format};
use crate::foundation::cancel::CancelToken;
use crate::foundation::error::TripReelResult;
use crate::map::surface::MapFactory;
use crate::render::text::{TextEngine, TextLayoutEngine};
use crate::session::config::ReelConfig;
use crate::session::run::{RunEnv, RunStats, execute};
use crate::timeline::plan::StagePlan;
use crate::trip::model::TripInput;

/// Turns trips into videos.
///
/// Owns the immutable [`ReelConfig`], the map and encoder factories, the image source, and the
/// font. The output format is resolved once, at construction. Each [`Compositor::generate`] call
/// allocates fresh run resources and releases all of them before returning.
pub struct Compositor {
    config: ReelConfig,
    maps: Box<dyn MapFactory>,
    encoders: Box<dyn EncoderFactory>,
    images: Arc<dyn ImageSource>,
    text: TextEngine,
    icons: TransportIcons,
    format: FormatChoice,
    last_run: Option<RunStats>,
}

impl Compositor {
    /// Validate `config`, load the font, rasterize the transport icons and resolve the format.
    pub fn new(
        config: ReelConfig,
        maps: impl MapFactory + 'static,
        encoders: impl EncoderFactory + 'static,
        images: Arc<dyn ImageSource>,
    ) -> TripReelResult<Self> {
        config.validate()?;

        let shaper = match config.font_path.as_deref() {
            Some(path) => Some(TextLayoutEngine::from_path(path)?),
            None => None,
        };
        let icons = TransportIcons::new(config.overlay.icon_size_px.round().max(1.0) as u32)?;

        let format = resolve_format(&config.format_preferences, |m| encoders.supports(m));
        match &format {
            FormatChoice::Supported(mime) => tracing::info!(mime = %mime, "output format resolved"),
            FormatChoice::FallbackDefault => tracing::warn!(
                default = %encoders.default_mime(),
                "no preferred output format supported; using encoder default"
            ),
        }

        Ok(Self {
            config,
            maps: Box::new(maps),
            encoders: Box::new(encoders),
            images,
            text: TextEngine::new(shaper),
            icons,
            format,
            last_run: None,
        })
    }

    /// The configuration this compositor was built with.
    pub fn config(&self) -> &ReelConfig {
        &self.config
    }

    /// Output format chosen at construction.
    pub fn format(&self) -> &FormatChoice {
        &self.format
    }

    /// Counters from the most recent run that reached allocation.
    pub fn last_run_stats(&self) -> Option<RunStats> {
        self.last_run
    }

    /// Build the stage plan `generate` would follow, without allocating anything.
    pub fn plan(&self, trip: &TripInput) -> TripReelResult<StagePlan> {
        StagePlan::build(trip, &self.config)
    }

    /// Render `trip` into a video.
    ///
    /// `progress` receives `(percent, status)` on every stage transition and periodically within
    /// stages; percentages never decrease and reach `100` only after the encoder finished. On any
    /// error, including cancellation through `cancel`, every allocated resource is released and
    /// no partial output is returned.
    pub fn generate(
        &mut self,
        trip: &TripInput,
        progress: &mut dyn FnMut(f64, &str),
        cancel: &CancelToken,
    ) -> TripReelResult<VideoArtifact> {
        let env = RunEnv {
            cfg: &self.config,
            maps: self.maps.as_mut(),
            encoders: self.encoders.as_mut(),
            images: Arc::clone(&self.images),
            text: &mut self.text,
            icons: &self.icons,
            format: &self.format,
        };
        let mut stats = None;
        let result = execute(env, trip, progress, cancel, &mut stats);
        if stats.is_some() {
            self.last_run = stats;
        }
        result
    }
}

impl std::fmt::Debug for Compositor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Compositor")
            .field("config", &self.config)
            .field("format", &self.format)
            .field("has_font", &self.text.has_font())
            .finish_non_exhaustive()
    }
}
