//! Small drawing helpers over `vello_cpu::RenderContext`.
//!
//! Geometry is built with the crate's `kurbo` and converted at the call boundary.

use std::sync::Arc;

use kurbo::Shape;

use crate::assets::decode::{PreparedImage, pixmap_from_premul_bytes};
use crate::foundation::core::{Affine, BezPath, Canvas, Point, Rect};
use crate::foundation::error::TripReelResult;
use crate::render::frame::FrameRGBA;

pub(crate) type Rgba = [u8; 4];

pub(crate) fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

pub(crate) fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(vello_cpu::kurbo::Point::new(p.x, p.y)),
            PathEl::LineTo(p) => out.line_to(vello_cpu::kurbo::Point::new(p.x, p.y)),
            PathEl::QuadTo(p1, p2) => out.quad_to(
                vello_cpu::kurbo::Point::new(p1.x, p1.y),
                vello_cpu::kurbo::Point::new(p2.x, p2.y),
            ),
            PathEl::CurveTo(p1, p2, p3) => out.curve_to(
                vello_cpu::kurbo::Point::new(p1.x, p1.y),
                vello_cpu::kurbo::Point::new(p2.x, p2.y),
                vello_cpu::kurbo::Point::new(p3.x, p3.y),
            ),
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

pub(crate) fn set_color(ctx: &mut vello_cpu::RenderContext, rgba: Rgba) {
    ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
        rgba[0], rgba[1], rgba[2], rgba[3],
    ));
}

pub(crate) fn fill_rect(ctx: &mut vello_cpu::RenderContext, rect: Rect, rgba: Rgba) {
    ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
    set_color(ctx, rgba);
    ctx.fill_rect(&vello_cpu::kurbo::Rect::new(rect.x0, rect.y0, rect.x1, rect.y1));
}

/// Fill any kurbo shape in device space.
pub(crate) fn fill_shape(ctx: &mut vello_cpu::RenderContext, shape: &impl Shape, rgba: Rgba) {
    ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
    set_color(ctx, rgba);
    ctx.fill_path(&bezpath_to_cpu(&shape.to_path(0.1)));
}

/// Fill a segment `a → b` of thickness `width` as a quad.
pub(crate) fn fill_segment(
    ctx: &mut vello_cpu::RenderContext,
    a: Point,
    b: Point,
    width: f64,
    rgba: Rgba,
) {
    let d = b - a;
    let len = d.hypot();
    if len <= f64::EPSILON {
        return;
    }
    let n = kurbo::Vec2::new(-d.y / len, d.x / len) * (width * 0.5);
    let mut path = BezPath::new();
    path.move_to(a + n);
    path.line_to(b + n);
    path.line_to(b - n);
    path.line_to(a - n);
    path.close_path();
    ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
    set_color(ctx, rgba);
    ctx.fill_path(&bezpath_to_cpu(&path));
}

/// Draw `img` with its top-left at the origin of `transform`.
pub(crate) fn draw_image(
    ctx: &mut vello_cpu::RenderContext,
    img: &PreparedImage,
    transform: Affine,
    opacity: f32,
) {
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 {
        return;
    }
    ctx.set_transform(affine_to_cpu(transform));
    ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
    ctx.set_paint(img.paint());
    if opacity < 1.0 {
        ctx.push_opacity_layer(opacity);
    }
    ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
        0.0,
        0.0,
        img.width as f64,
        img.height as f64,
    ));
    if opacity < 1.0 {
        ctx.pop_layer();
    }
    ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
}

/// A `1 × height` premultiplied strip blending `top` into `bottom`, stretched across the canvas
/// when drawn with [`draw_gradient`].
pub(crate) fn vertical_gradient(height: u32, top: Rgba, bottom: Rgba) -> TripReelResult<PreparedImage> {
    let h = height.max(1);
    let mut bytes = Vec::with_capacity((h as usize) * 4);
    for y in 0..h {
        let t = if h == 1 {
            0.0
        } else {
            f64::from(y) / f64::from(h - 1)
        };
        let mut px = [0u8; 4];
        for c in 0..4 {
            px[c] = (f64::from(top[c]) + (f64::from(bottom[c]) - f64::from(top[c])) * t).round() as u8;
        }
        let a = u16::from(px[3]);
        for c in px.iter_mut().take(3) {
            *c = ((u16::from(*c) * a + 127) / 255) as u8;
        }
        bytes.extend_from_slice(&px);
    }
    PreparedImage::from_premul_bytes(&bytes, 1, h)
}

pub(crate) fn draw_gradient(ctx: &mut vello_cpu::RenderContext, strip: &PreparedImage, canvas: Canvas) {
    let sx = f64::from(canvas.width);
    let sy = f64::from(canvas.height) / f64::from(strip.height.max(1));
    draw_image(ctx, strip, Affine::scale_non_uniform(sx, sy), 1.0);
}

/// Use a finished raster as a full-canvas paint.
pub(crate) fn raster_image(frame: &FrameRGBA) -> TripReelResult<PreparedImage> {
    let pixmap = pixmap_from_premul_bytes(&frame.data, frame.width, frame.height)?;
    Ok(PreparedImage {
        width: frame.width,
        height: frame.height,
        pixmap: Arc::new(pixmap),
    })
}

/// Reusable render target: a `vello_cpu` context plus the pixmap it resolves into.
pub(crate) struct RenderTarget {
    ctx: vello_cpu::RenderContext,
    pixmap: vello_cpu::Pixmap,
    frame: FrameRGBA,
}

impl RenderTarget {
    pub(crate) fn new(canvas: Canvas) -> TripReelResult<Self> {
        let w: u16 = canvas.width.try_into().map_err(|_| {
            crate::foundation::error::TripReelError::validation("canvas width exceeds u16")
        })?;
        let h: u16 = canvas.height.try_into().map_err(|_| {
            crate::foundation::error::TripReelError::validation("canvas height exceeds u16")
        })?;
        Ok(Self {
            ctx: vello_cpu::RenderContext::new(w, h),
            pixmap: vello_cpu::Pixmap::new(w, h),
            frame: FrameRGBA::transparent(canvas),
        })
    }

    /// Start a new frame; returns the context to draw into.
    pub(crate) fn begin(&mut self) -> &mut vello_cpu::RenderContext {
        self.ctx.reset();
        self.ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx
            .set_blend_mode(vello_cpu::peniko::BlendMode::default());
        &mut self.ctx
    }

    /// Resolve everything drawn since [`RenderTarget::begin`] into the frame buffer.
    pub(crate) fn finish(&mut self) -> &FrameRGBA {
        self.ctx.flush();
        self.pixmap.data_as_u8_slice_mut().fill(0);
        self.ctx.render_to_pixmap(&mut self.pixmap);
        self.frame
            .data
            .copy_from_slice(self.pixmap.data_as_u8_slice());
        &self.frame
    }

    pub(crate) fn frame(&self) -> &FrameRGBA {
        &self.frame
    }
}
