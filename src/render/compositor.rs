use std::f64::consts::TAU;
use std::sync::Arc;

use smallvec::SmallVec;

use crate::assets::decode::PreparedImage;
use crate::assets::icons::TransportIcons;
use crate::foundation::core::{Affine, Canvas, GeoPoint, Point, Rect};
use crate::foundation::error::TripReelResult;
use crate::foundation::math::{fade_in_out, window_progress};
use crate::map::surface::MapSurface;
use crate::render::frame::FrameRGBA;
use crate::render::paint::{self, RenderTarget, Rgba};
use crate::render::text::{TextEngine, TextMeasure, truncate_to_width, word_wrap};
use crate::session::config::{OverlayStyle, ReelConfig};
use crate::timeline::plan::{ShowcasePhase, Stage, StageKind};

const SLIDE_TOP: Rgba = [18, 42, 74, 255];
const SLIDE_BOTTOM: Rgba = [6, 14, 28, 255];
const TEXT_LIGHT: Rgba = [255, 255, 255, 255];
const TEXT_DARK: Rgba = [33, 33, 33, 255];
const PILL_FILL: Rgba = [255, 255, 255, 240];
const PHOTO_BORDER: Rgba = [250, 250, 250, 255];
const MARKER_RING: Rgba = [255, 255, 255, 255];
const MARKER_DOT: Rgba = [214, 55, 62, 255];

/// Which carousel position a bitmap occupies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum CarouselSlot {
    Previous,
    Current,
    Next,
}

/// Bitmaps visible in the showcase carousel for one frame, at most one per slot.
#[derive(Clone, Debug, Default)]
pub(crate) struct Carousel {
    pub(crate) items: SmallVec<[(CarouselSlot, Arc<PreparedImage>); 3]>,
}

impl Carousel {
    pub(crate) fn push(&mut self, slot: CarouselSlot, img: Arc<PreparedImage>) {
        self.items.push((slot, img));
    }

    fn get(&self, slot: CarouselSlot) -> Option<&PreparedImage> {
        self.items
            .iter()
            .find(|(s, _)| *s == slot)
            .map(|(_, img)| img.as_ref())
    }
}

/// Draws one output frame per call into the run's output surface.
///
/// Reads the map raster, projection and carousel bitmaps; never mutates them.
pub(crate) struct FrameCompositor<'r> {
    canvas: Canvas,
    frame_ms: f64,
    overlay: &'r OverlayStyle,
    text: &'r mut TextEngine,
    icons: &'r TransportIcons,
    target: RenderTarget,
    backdrop: PreparedImage,
}

impl<'r> FrameCompositor<'r> {
    /// Allocate the output surface for a run.
    pub(crate) fn new(
        cfg: &'r ReelConfig,
        text: &'r mut TextEngine,
        icons: &'r TransportIcons,
    ) -> TripReelResult<Self> {
        Ok(Self {
            canvas: cfg.canvas,
            frame_ms: cfg.fps.frame_duration_ms(),
            overlay: &cfg.overlay,
            text,
            icons,
            target: RenderTarget::new(cfg.canvas)?,
            backdrop: paint::vertical_gradient(cfg.canvas.height, SLIDE_TOP, SLIDE_BOTTOM)?,
        })
    }

    /// Label as it will be shown: truncated to the configured fraction of the canvas width.
    pub(crate) fn fit_label(&mut self, label: &str) -> String {
        let max = (self.overlay.label_max_width_frac * f64::from(self.canvas.width)) as f32;
        truncate_to_width(&mut *self.text, label, self.overlay.label_size_px, max)
    }

    /// Compose frame `local` of `stage`.
    pub(crate) fn compose(
        &mut self,
        stage: &Stage,
        local: u64,
        map: &dyn MapSurface,
        carousel: &Carousel,
    ) -> TripReelResult<&FrameRGBA> {
        let canvas = self.canvas;
        let w = f64::from(canvas.width);
        let h = f64::from(canvas.height);
        let overlay = self.overlay;
        let frame_ms = self.frame_ms;
        let elapsed_ms = local as f64 * frame_ms;

        // Labels are fitted before the context is borrowed from the target.
        let labels: SmallVec<[(String, Point, f32); 2]> = match &stage.kind {
            // The destination label is fully shown by the end of the leg and stays that way.
            StageKind::Arrival { stop } => SmallVec::from_iter([(
                self.fit_label(&stop.title),
                map.project(stop.at),
                1.0,
            )]),
            StageKind::Travel { from, to, .. } => {
                let t = travel_progress(local, stage.frames);
                SmallVec::from_iter([
                    (
                        self.fit_label(&from.title),
                        map.project(from.at),
                        overlay.origin_label_opacity,
                    ),
                    (self.fit_label(&to.title), map.project(to.at), t as f32),
                ])
            }
            _ => SmallVec::new(),
        };

        let ctx = self.target.begin();
        let text = &mut *self.text;

        match &stage.kind {
            StageKind::Title { text: title } | StageKind::End { text: title } => {
                paint::draw_gradient(ctx, &self.backdrop, canvas);
                let t = window_progress(local, stage.frames);
                let opacity = fade_in_out(t, overlay.slide_fade_frac) as f32;
                draw_centered_block(
                    ctx,
                    text,
                    title,
                    overlay.title_size_px,
                    w * 0.8,
                    Point::new(w / 2.0, h / 2.0),
                    TEXT_LIGHT,
                    opacity,
                )?;
            }
            StageKind::Arrival { .. } => {
                draw_raster(ctx, map.raster())?;
                for (label, at, opacity) in &labels {
                    draw_label(ctx, text, overlay, canvas, label, *at, *opacity)?;
                }
            }
            StageKind::Travel { from, to, mode } => {
                draw_raster(ctx, map.raster())?;
                for (label, at, opacity) in &labels {
                    draw_label(ctx, text, overlay, canvas, label, *at, *opacity)?;
                }
                let t = travel_progress(local, stage.frames);
                let at = icon_anchor(map, from.at, to.at, t, overlay, elapsed_ms);
                let icon = self.icons.get(*mode);
                let half = f64::from(icon.width) / 2.0;
                paint::draw_image(
                    ctx,
                    icon,
                    Affine::translate((at.x - half, at.y - half)),
                    1.0,
                );
            }
            StageKind::Showcase { photos, .. } => {
                draw_raster(ctx, map.raster())?;
                let phase = stage
                    .showcase_phase(local)
                    .unwrap_or(ShowcasePhase::Outro { t: 1.0 });
                let (darkness, photo_opacity, photo_elapsed_ms) = match phase {
                    ShowcasePhase::Intro { t } => (t, t, 0.0),
                    ShowcasePhase::Photo { local, .. } => (1.0, 1.0, local as f64 * frame_ms),
                    ShowcasePhase::Outro { t } => (1.0 - t, 1.0 - t, 0.0),
                };
                let alpha = (f64::from(overlay.backdrop_darkness) * darkness * 255.0).round();
                paint::fill_rect(
                    ctx,
                    Rect::new(0.0, 0.0, w, h),
                    [0, 0, 0, alpha.clamp(0.0, 255.0) as u8],
                );
                draw_carousel(
                    ctx,
                    overlay,
                    canvas,
                    carousel,
                    photo_opacity as f32,
                    photo_elapsed_ms,
                    matches!(phase, ShowcasePhase::Photo { .. }),
                );
                if let ShowcasePhase::Photo { index, .. } = phase {
                    let counter = format!("{} / {}", index + 1, photos.len());
                    let size = overlay.label_size_px;
                    let cw = f64::from(text.width(&counter, size));
                    paint::set_color(ctx, TEXT_LIGHT);
                    text.fill_line(ctx, &counter, size, w - cw - 32.0, 24.0)?;

                    if let Some(caption) = photos.get(index).and_then(|p| p.caption.as_deref()) {
                        draw_centered_block(
                            ctx,
                            text,
                            caption,
                            overlay.caption_size_px,
                            w * 0.8,
                            Point::new(w / 2.0, h * 0.86),
                            TEXT_LIGHT,
                            1.0,
                        )?;
                    }
                }
            }
        }

        Ok(self.target.finish())
    }
}

/// Linear progress of a travel leg, sampled on the same clock as the camera pan.
pub(crate) fn travel_progress(local: u64, frames: u64) -> f64 {
    if frames == 0 {
        return 1.0;
    }
    (local as f64 / frames as f64).clamp(0.0, 1.0)
}

/// Icon center: the projected straight lon/lat position plus a vertical bob.
pub(crate) fn icon_anchor(
    map: &dyn MapSurface,
    from: GeoPoint,
    to: GeoPoint,
    t: f64,
    overlay: &OverlayStyle,
    elapsed_ms: f64,
) -> Point {
    let p = map.project(from.lerp(to, t));
    let bob = if overlay.bob_period_ms > 0.0 {
        overlay.bob_amplitude_px * (TAU * elapsed_ms / overlay.bob_period_ms).sin()
    } else {
        0.0
    };
    Point::new(p.x, p.y + bob)
}

fn draw_raster(ctx: &mut vello_cpu::RenderContext, raster: &FrameRGBA) -> TripReelResult<()> {
    if raster.width == 0 || raster.height == 0 {
        return Ok(());
    }
    let img = paint::raster_image(raster)?;
    paint::draw_image(ctx, &img, Affine::IDENTITY, 1.0);
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn draw_centered_block(
    ctx: &mut vello_cpu::RenderContext,
    text: &mut TextEngine,
    body: &str,
    size_px: f32,
    max_width: f64,
    center: Point,
    color: Rgba,
    opacity: f32,
) -> TripReelResult<()> {
    if opacity <= 0.0 {
        return Ok(());
    }
    let lines = word_wrap(&mut *text, body, size_px, max_width as f32);
    if lines.is_empty() {
        return Ok(());
    }
    let line_h = f64::from(size_px) * 1.25;
    let mut y = center.y - line_h * lines.len() as f64 / 2.0;

    if opacity < 1.0 {
        ctx.push_opacity_layer(opacity);
    }
    paint::set_color(ctx, color);
    for line in &lines {
        let lw = f64::from(text.width(line, size_px));
        text.fill_line(ctx, line, size_px, center.x - lw / 2.0, y)?;
        y += line_h;
    }
    if opacity < 1.0 {
        ctx.pop_layer();
    }
    Ok(())
}

/// A stop marker with a text pill centered above it.
fn draw_label(
    ctx: &mut vello_cpu::RenderContext,
    text: &mut TextEngine,
    overlay: &OverlayStyle,
    canvas: Canvas,
    label: &str,
    at: Point,
    opacity: f32,
) -> TripReelResult<()> {
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 {
        return Ok(());
    }
    let size = overlay.label_size_px;
    let pad_x = f64::from(size) * 0.6;
    let pill_h = f64::from(size) * 1.6;
    let text_w = f64::from(text.width(label, size));
    let pill_w = text_w + 2.0 * pad_x;

    let w = f64::from(canvas.width);
    let x0 = (at.x - pill_w / 2.0).clamp(8.0, (w - 8.0 - pill_w).max(8.0));
    let y1 = at.y - 14.0;
    let y0 = y1 - pill_h;

    if opacity < 1.0 {
        ctx.push_opacity_layer(opacity);
    }
    paint::fill_shape(ctx, &kurbo::Circle::new(at, 7.0), MARKER_RING);
    paint::fill_shape(ctx, &kurbo::Circle::new(at, 4.5), MARKER_DOT);
    paint::fill_shape(
        ctx,
        &kurbo::RoundedRect::new(x0, y0, x0 + pill_w, y1, pill_h / 2.0),
        PILL_FILL,
    );
    paint::set_color(ctx, TEXT_DARK);
    text.fill_line(
        ctx,
        label,
        size,
        x0 + pad_x,
        y0 + (pill_h - f64::from(size) * 1.2) / 2.0,
    )?;
    if opacity < 1.0 {
        ctx.pop_layer();
    }
    Ok(())
}

fn draw_carousel(
    ctx: &mut vello_cpu::RenderContext,
    overlay: &OverlayStyle,
    canvas: Canvas,
    carousel: &Carousel,
    opacity: f32,
    photo_elapsed_ms: f64,
    pulse: bool,
) {
    if opacity <= 0.0 {
        return;
    }
    let w = f64::from(canvas.width);
    let h = f64::from(canvas.height);
    let center = Point::new(w / 2.0, h * 0.45);
    let box_w = w * 0.56;
    let box_h = h * 0.62;
    let tilt = overlay.neighbor_tilt_deg.to_radians();

    let neighbors = [
        (CarouselSlot::Previous, -1.0),
        (CarouselSlot::Next, 1.0),
    ];
    for (slot, side) in neighbors {
        let Some(img) = carousel.get(slot) else {
            continue;
        };
        let at = Point::new(center.x + side * w * 0.40, center.y);
        let scale = fit_scale(img, box_w, box_h) * overlay.neighbor_scale;
        let xf = photo_transform(img, at, scale, side * tilt);
        draw_photo(ctx, img, xf, overlay.neighbor_opacity * opacity);
    }

    if let Some(img) = carousel.get(CarouselSlot::Current) {
        let pulse_scale = if pulse && overlay.pulse_period_ms > 0.0 {
            1.0 + overlay.pulse_amplitude * (TAU * photo_elapsed_ms / overlay.pulse_period_ms).sin()
        } else {
            1.0
        };
        let scale = fit_scale(img, box_w, box_h) * pulse_scale;
        let xf = photo_transform(img, center, scale, 0.0);
        draw_photo(ctx, img, xf, opacity);
    }
}

fn fit_scale(img: &PreparedImage, box_w: f64, box_h: f64) -> f64 {
    let iw = f64::from(img.width.max(1));
    let ih = f64::from(img.height.max(1));
    (box_w / iw).min(box_h / ih)
}

/// Maps image pixel space to device space: centered on `at`, scaled, rotated by `angle`.
pub(crate) fn photo_transform(img: &PreparedImage, at: Point, scale: f64, angle: f64) -> Affine {
    Affine::translate(at.to_vec2())
        * Affine::rotate(angle)
        * Affine::scale(scale)
        * Affine::translate((-f64::from(img.width) / 2.0, -f64::from(img.height) / 2.0))
}

fn draw_photo(ctx: &mut vello_cpu::RenderContext, img: &PreparedImage, xf: Affine, opacity: f32) {
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 {
        return;
    }
    let border = f64::from(img.width.max(img.height)) * 0.02;
    if opacity < 1.0 {
        ctx.push_opacity_layer(opacity);
    }
    ctx.set_transform(paint::affine_to_cpu(xf));
    paint::set_color(ctx, PHOTO_BORDER);
    ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
        -border,
        -border,
        f64::from(img.width) + border,
        f64::from(img.height) + border,
    ));
    paint::draw_image(ctx, img, xf, 1.0);
    if opacity < 1.0 {
        ctx.pop_layer();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/compositor.rs"]
mod tests;
