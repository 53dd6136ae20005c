use std::sync::Arc;
use std::time::{Duration, Instant};

use smallvec::SmallVec;

use crate::assets::decode::PreparedImage;
use crate::assets::icons::TransportIcons;
use crate::assets::loader::{ImageSource, ResourceLoader};
use crate::encode::adapter::{EncodingSink, VideoArtifact};
use crate::encode::sink::{EncoderFactory, FormatChoice};
use crate::foundation::cancel::CancelToken;
use crate::foundation::core::FrameIndex;
use crate::foundation::error::{TripReelError, TripReelResult};
use crate::map::driver::CameraDriver;
use crate::map::surface::{CameraView, MapFactory};
use crate::render::compositor::{Carousel, CarouselSlot, FrameCompositor};
use crate::render::text::TextEngine;
use crate::session::config::{Pacing, ReelConfig};
use crate::timeline::plan::{ShowcasePhase, Stage, StageKind, StagePlan};
use crate::timeline::progress::ProgressReporter;
use crate::trip::model::TripInput;

const FINALIZING: &str = "finalizing video\u{2026}";
const PACING_SLICE: Duration = Duration::from_millis(5);

/// Counters describing the most recent run, whatever its outcome.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Frames pushed to the encoder.
    pub frames_pushed: u64,
    /// Photo fetch+decode jobs started.
    pub photo_decodes: u64,
    /// Photo bitmaps evicted by the sliding window.
    pub photo_evictions: u64,
    /// Highest number of live bitmaps during any single showcase.
    pub peak_live_bitmaps: usize,
}

/// Everything a single run borrows from its [`crate::Compositor`].
pub(crate) struct RunEnv<'c> {
    pub(crate) cfg: &'c ReelConfig,
    pub(crate) maps: &'c mut dyn MapFactory,
    pub(crate) encoders: &'c mut dyn EncoderFactory,
    pub(crate) images: Arc<dyn ImageSource>,
    pub(crate) text: &'c mut TextEngine,
    pub(crate) icons: &'c TransportIcons,
    pub(crate) format: &'c FormatChoice,
}

/// Resources allocated by one run, released in reverse allocation order on drop.
struct RunResources<'r> {
    output: Option<FrameCompositor<'r>>,
    driver: Option<CameraDriver>,
    sink: Option<EncodingSink>,
    loader: ResourceLoader,
    peak_live: usize,
}

impl RunResources<'_> {
    fn stats(&self) -> RunStats {
        let loader = self.loader.stats();
        RunStats {
            frames_pushed: self.sink.as_ref().map_or(0, |s| s.frames_pushed()),
            photo_decodes: loader.decodes,
            photo_evictions: loader.evictions,
            peak_live_bitmaps: self.peak_live,
        }
    }
}

impl Drop for RunResources<'_> {
    fn drop(&mut self) {
        if let Some(mut sink) = self.sink.take() {
            sink.abort();
        }
        if let Some(mut driver) = self.driver.take() {
            driver.release();
        }
        drop(self.output.take());
        self.loader.clear();
        tracing::debug!("run resources released");
    }
}

/// Run one generation: plan, allocate, produce every frame, finalize, tear down.
///
/// The plan is validated before anything is allocated. `stats` receives the run counters on every
/// path that got as far as allocation.
pub(crate) fn execute(
    env: RunEnv<'_>,
    trip: &TripInput,
    progress: &mut dyn FnMut(f64, &str),
    cancel: &CancelToken,
    stats: &mut Option<RunStats>,
) -> TripReelResult<VideoArtifact> {
    let plan = StagePlan::build(trip, env.cfg)?;
    cancel.check()?;

    let cfg = env.cfg;
    tracing::info!(
        stages = plan.stages.len(),
        total_frames = plan.total_frames,
        width = cfg.canvas.width,
        height = cfg.canvas.height,
        "run started"
    );
    let started = Instant::now();
    let mut reporter = ProgressReporter::new(progress, plan.total_frames, cfg.progress_interval_frames);

    let max_dim = cfg.canvas.width.max(cfg.canvas.height);
    let mut run = RunResources {
        output: None,
        driver: None,
        sink: None,
        loader: ResourceLoader::new(env.images, max_dim),
        peak_live: 0,
    };

    let result = allocate_and_drive(
        &mut run,
        &plan,
        env.cfg,
        env.maps,
        env.encoders,
        env.text,
        env.icons,
        env.format,
        &mut reporter,
        cancel,
    );
    *stats = Some(run.stats());
    drop(run);

    match result {
        Ok(artifact) => {
            reporter.complete(FINALIZING);
            tracing::info!(
                bytes = artifact.size,
                mime = %artifact.mime,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "run finished"
            );
            Ok(artifact)
        }
        Err(e) => {
            if e.is_cancelled() {
                tracing::info!(percent = reporter.last_percent(), "run cancelled");
            } else {
                tracing::warn!(error = %e, "run failed");
            }
            Err(e)
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn allocate_and_drive<'r>(
    run: &mut RunResources<'r>,
    plan: &StagePlan,
    cfg: &'r ReelConfig,
    maps: &mut dyn MapFactory,
    encoders: &mut dyn EncoderFactory,
    text: &'r mut TextEngine,
    icons: &'r TransportIcons,
    format: &FormatChoice,
    reporter: &mut ProgressReporter<'_>,
    cancel: &CancelToken,
) -> TripReelResult<VideoArtifact> {
    run.output = Some(FrameCompositor::new(cfg, text, icons)?);
    run.driver = Some(CameraDriver::initialize(
        maps,
        cfg.canvas,
        CameraView::new(plan.initial_view, cfg.camera.stop_zoom),
        cfg.fps,
        cancel,
    )?);
    run.sink = Some(EncodingSink::start(encoders, format, cfg.canvas, cfg.fps)?);

    let RunResources {
        output: Some(output),
        driver: Some(driver),
        sink: Some(sink),
        loader,
        peak_live,
    } = run
    else {
        return Err(TripReelError::validation("run resources missing after allocation"));
    };

    let mut pacer = Pacer::new(cfg);
    for stage in &plan.stages {
        cancel.check()?;
        reporter.stage_started(stage.start.0, stage.status_text());
        tracing::info!(
            stage = stage.name(),
            start = stage.start.0,
            frames = stage.frames,
            "stage started"
        );
        begin_stage(stage, cfg, driver, loader)?;

        for local in 0..stage.frames {
            cancel.check()?;
            let idx = FrameIndex(stage.start.0 + local);
            pacer.wait(idx, cancel)?;
            let carousel = carousel_for(stage, local, loader, cancel)?;
            let frame = output.compose(stage, local, driver.surface(), &carousel)?;
            sink.push(idx, frame)?;
            driver.tick()?;
            reporter.frame_done(idx.0 + 1);
        }

        if let StageKind::Travel { .. } = stage.kind {
            driver.clear_route()?;
        }
        if let StageKind::Showcase { .. } = stage.kind {
            *peak_live = (*peak_live).max(loader.stats().peak_live);
            loader.clear();
        }
    }

    cancel.check()?;
    reporter.status(FINALIZING);
    sink.finish()
}

/// Camera and loader actions issued on a stage's first frame, before it is sampled.
fn begin_stage(
    stage: &Stage,
    cfg: &ReelConfig,
    driver: &mut CameraDriver,
    loader: &mut ResourceLoader,
) -> TripReelResult<()> {
    match &stage.kind {
        StageKind::Title { .. } | StageKind::End { .. } => {}
        StageKind::Travel { from, to, .. } => {
            driver.fit_leg(from.at, to.at, cfg.camera.leg_padding_px, stage.frames);
            driver.show_route(from.at, to.at)?;
        }
        StageKind::Arrival { stop } => {
            driver.fly_to(
                CameraView::new(stop.at, cfg.camera.stop_zoom),
                stage.frames,
                cfg.camera.arrival_ease,
            );
        }
        StageKind::Showcase {
            stop,
            photos,
            intro_frames,
            ..
        } => {
            driver.fly_to(
                CameraView::new(stop.at, cfg.camera.stop_zoom),
                (*intro_frames).max(1),
                cfg.camera.arrival_ease,
            );
            loader.clear();
            loader.reset_peak();
            if let Some(first) = photos.first() {
                loader.prefetch(&first.url);
            }
        }
    }
    Ok(())
}

/// Bitmaps for one showcase frame.
///
/// On the first frame of photo `k` the window is narrowed to `k-1..=k+1`, photo `k` is awaited
/// and `k+1` is prefetched. Neighbors are drawn only once they are ready.
fn carousel_for(
    stage: &Stage,
    local: u64,
    loader: &mut ResourceLoader,
    cancel: &CancelToken,
) -> TripReelResult<Carousel> {
    let mut carousel = Carousel::default();
    let StageKind::Showcase { photos, .. } = &stage.kind else {
        return Ok(carousel);
    };
    let Some(phase) = stage.showcase_phase(local) else {
        return Ok(carousel);
    };

    match phase {
        ShowcasePhase::Intro { .. } => {
            if let Some(img) = ready(loader, photos.first().map(|p| p.url.as_str()))? {
                carousel.push(CarouselSlot::Current, img);
            }
        }
        ShowcasePhase::Photo { index, local, .. } => {
            let url = |i: usize| photos.get(i).map(|p| p.url.as_str());
            let prev = index.checked_sub(1).and_then(url);
            let next = url(index + 1);
            let Some(current) = url(index) else {
                return Ok(carousel);
            };
            if local == 0 {
                let keep: SmallVec<[&str; 3]> =
                    [prev, Some(current), next].into_iter().flatten().collect();
                loader.retain_window(&keep);
            }
            let img = loader.load(current, cancel)?;
            if local == 0
                && let Some(next) = next
            {
                loader.prefetch(next);
            }
            if let Some(p) = ready(loader, prev)? {
                carousel.push(CarouselSlot::Previous, p);
            }
            carousel.push(CarouselSlot::Current, img);
            if let Some(n) = ready(loader, next)? {
                carousel.push(CarouselSlot::Next, n);
            }
        }
        ShowcasePhase::Outro { .. } => {
            if let Some(img) = ready(loader, photos.last().map(|p| p.url.as_str()))? {
                carousel.push(CarouselSlot::Current, img);
            }
        }
    }
    Ok(carousel)
}

fn ready(
    loader: &mut ResourceLoader,
    url: Option<&str>,
) -> TripReelResult<Option<Arc<PreparedImage>>> {
    match url {
        Some(u) => loader.try_get(u),
        None => Ok(None),
    }
}

/// Holds frame production to the wall clock under [`Pacing::Realtime`].
struct Pacer {
    origin: Option<Instant>,
    frame: Duration,
}

impl Pacer {
    fn new(cfg: &ReelConfig) -> Self {
        Self {
            origin: matches!(cfg.pacing, Pacing::Realtime).then(Instant::now),
            frame: Duration::from_secs_f64(cfg.fps.frame_duration_ms() / 1000.0),
        }
    }

    fn wait(&mut self, idx: FrameIndex, cancel: &CancelToken) -> TripReelResult<()> {
        let Some(origin) = self.origin else {
            return Ok(());
        };
        let deadline = origin + self.frame.mul_f64(idx.0 as f64);
        loop {
            cancel.check()?;
            let now = Instant::now();
            if now >= deadline {
                return Ok(());
            }
            std::thread::sleep((deadline - now).min(PACING_SLICE));
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/run.rs"]
mod tests;
