use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use crate::foundation::error::{TripReelError, TripReelResult};

const ELLIPSIS: char = '…';
const LAYOUT_CACHE_CAP: usize = 256;

/// Width measurement for a single line of text at a pixel size.
pub trait TextMeasure {
    /// Advance width of `text` laid out on one line at `size_px`.
    fn width(&mut self, text: &str, size_px: f32) -> f32;
}

/// Metric fallback: every character advances by `advance_em × size_px`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FixedAdvance {
    /// Per-character advance as a fraction of the font size.
    pub advance_em: f32,
}

impl Default for FixedAdvance {
    fn default() -> Self {
        Self { advance_em: 0.55 }
    }
}

impl TextMeasure for FixedAdvance {
    fn width(&mut self, text: &str, size_px: f32) -> f32 {
        text.chars().count() as f32 * size_px * self.advance_em
    }
}

/// Greedy word wrap: words are appended to the current line while it still fits `max_width`.
///
/// A single word wider than `max_width` occupies a line of its own.
pub fn word_wrap(
    measure: &mut dyn TextMeasure,
    text: &str,
    size_px: f32,
    max_width: f32,
) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
            continue;
        }
        let candidate = format!("{current} {word}");
        if measure.width(&candidate, size_px) <= max_width {
            current = candidate;
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Shorten `text` character by character and append `…` until it fits `max_width`.
///
/// Text that already fits is returned unchanged. Otherwise the result is a prefix of `text`
/// (trailing whitespace trimmed) followed by `…`. When not even the ellipsis fits, the result is
/// empty.
pub fn truncate_to_width(
    measure: &mut dyn TextMeasure,
    text: &str,
    size_px: f32,
    max_width: f32,
) -> String {
    if measure.width(text, size_px) <= max_width {
        return text.to_string();
    }
    let mut boundaries: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
    while let Some(end) = boundaries.pop() {
        let mut candidate = text[..end].trim_end().to_string();
        candidate.push(ELLIPSIS);
        if measure.width(&candidate, size_px) <= max_width {
            return candidate;
        }
    }
    String::new()
}

/// Parley shaping engine bound to one registered font.
///
/// Layouts are cached per `(text, size)`; paint color is chosen at draw time, so the cache is
/// independent of styling.
pub(crate) struct TextLayoutEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<()>,
    family: String,
    font: vello_cpu::peniko::FontData,
    cache: HashMap<(String, u32), Arc<parley::Layout<()>>>,
}

impl TextLayoutEngine {
    pub(crate) fn from_font_bytes(bytes: Vec<u8>) -> TripReelResult<Self> {
        let mut font_ctx = parley::FontContext::default();
        let blob = parley::fontique::Blob::from(bytes.clone());
        let families = font_ctx.collection.register_fonts(blob, None);
        let family_id = families
            .first()
            .map(|(id, _)| *id)
            .ok_or_else(|| TripReelError::config("no font families registered from font bytes"))?;
        let family = font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| TripReelError::config("registered font family has no name"))?
            .to_string();

        let font = vello_cpu::peniko::FontData::new(vello_cpu::peniko::Blob::from(bytes), 0);
        Ok(Self {
            font_ctx,
            layout_ctx: parley::LayoutContext::new(),
            family,
            font,
            cache: HashMap::new(),
        })
    }

    pub(crate) fn from_path(path: &Path) -> TripReelResult<Self> {
        let bytes = std::fs::read(path).map_err(|e| {
            TripReelError::config(format!("failed to read font '{}': {e}", path.display()))
        })?;
        Self::from_font_bytes(bytes)
    }

    pub(crate) fn font(&self) -> &vello_cpu::peniko::FontData {
        &self.font
    }

    /// Shape `text` on a single line.
    pub(crate) fn shape(
        &mut self,
        text: &str,
        size_px: f32,
    ) -> TripReelResult<Arc<parley::Layout<()>>> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(TripReelError::validation(
                "text size_px must be finite and > 0",
            ));
        }
        let key = (text.to_string(), size_px.to_bits());
        if let Some(layout) = self.cache.get(&key) {
            return Ok(Arc::clone(layout));
        }
        if self.cache.len() >= LAYOUT_CACHE_CAP {
            self.cache.clear();
        }

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(self.family.clone())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        let mut layout: parley::Layout<()> = builder.build(text);
        layout.break_all_lines(None);

        let layout = Arc::new(layout);
        self.cache.insert(key, Arc::clone(&layout));
        Ok(layout)
    }
}

impl TextMeasure for TextLayoutEngine {
    fn width(&mut self, text: &str, size_px: f32) -> f32 {
        match self.shape(text, size_px) {
            Ok(layout) => layout.width(),
            Err(_) => FixedAdvance::default().width(text, size_px),
        }
    }
}

/// Text measurement and drawing for the compositor.
///
/// Without a font, layout falls back to [`FixedAdvance`] metrics and glyphs are not drawn, so
/// every placement rule still holds.
pub(crate) struct TextEngine {
    shaper: Option<TextLayoutEngine>,
    fallback: FixedAdvance,
}

impl TextEngine {
    pub(crate) fn new(shaper: Option<TextLayoutEngine>) -> Self {
        if shaper.is_none() {
            tracing::warn!("no font configured; text is laid out with fixed metrics and not drawn");
        }
        Self {
            shaper,
            fallback: FixedAdvance::default(),
        }
    }

    pub(crate) fn has_font(&self) -> bool {
        self.shaper.is_some()
    }

    /// Fill one line of text with its top-left corner at `(x, y)` in the current paint.
    pub(crate) fn fill_line(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        text: &str,
        size_px: f32,
        x: f64,
        y: f64,
    ) -> TripReelResult<()> {
        let Some(shaper) = self.shaper.as_mut() else {
            return Ok(());
        };
        let layout = shaper.shape(text, size_px)?;
        let font = shaper.font().clone();
        ctx.set_transform(vello_cpu::kurbo::Affine::translate((x, y)));
        for line in layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                let glyphs = run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x,
                    y: g.y,
                });
                ctx.glyph_run(&font)
                    .font_size(run.run().font_size())
                    .fill_glyphs(glyphs);
            }
        }
        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        Ok(())
    }
}

impl TextMeasure for TextEngine {
    fn width(&mut self, text: &str, size_px: f32) -> f32 {
        match self.shaper.as_mut() {
            Some(shaper) => shaper.width(text, size_px),
            None => self.fallback.width(text, size_px),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/text.rs"]
mod tests;
