use crate::assets::decode::PreparedImage;
use crate::foundation::error::{TripReelError, TripReelResult};
use crate::trip::model::TransportMode;

const AIR_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 64 64" width="64" height="64">
<circle cx="32" cy="32" r="30" fill="#1e88e5" stroke="#ffffff" stroke-width="3"/>
<path fill="#ffffff" d="M32 10 L36 26 L54 34 L54 38 L36 34 L35 46 L41 51 L41 54 L32 51 L23 54 L23 51 L29 46 L28 34 L10 38 L10 34 L28 26 Z"/>
</svg>"##;

const RAIL_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 64 64" width="64" height="64">
<circle cx="32" cy="32" r="30" fill="#43a047" stroke="#ffffff" stroke-width="3"/>
<rect x="20" y="13" width="24" height="31" rx="5" fill="#ffffff"/>
<rect x="24" y="18" width="16" height="10" rx="2" fill="#43a047"/>
<circle cx="26" cy="37" r="2.5" fill="#43a047"/>
<circle cx="38" cy="37" r="2.5" fill="#43a047"/>
<path fill="#ffffff" d="M22 46 L26 46 L22 53 L18 53 Z M42 46 L38 46 L42 53 L46 53 Z"/>
</svg>"##;

const ROAD_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 64 64" width="64" height="64">
<circle cx="32" cy="32" r="30" fill="#fb8c00" stroke="#ffffff" stroke-width="3"/>
<path fill="#ffffff" d="M13 37 L18 26 Q20 22 25 22 L39 22 Q44 22 46 26 L51 37 L51 44 L13 44 Z"/>
<path fill="#fb8c00" d="M21 34 L24 27 L40 27 L43 34 Z"/>
<circle cx="22" cy="45" r="5" fill="#ffffff" stroke="#fb8c00" stroke-width="2"/>
<circle cx="42" cy="45" r="5" fill="#ffffff" stroke="#fb8c00" stroke-width="2"/>
</svg>"##;

const SEA_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 64 64" width="64" height="64">
<circle cx="32" cy="32" r="30" fill="#00897b" stroke="#ffffff" stroke-width="3"/>
<rect x="30" y="12" width="3" height="14" fill="#ffffff"/>
<rect x="22" y="26" width="20" height="9" rx="2" fill="#ffffff"/>
<path fill="#ffffff" d="M11 37 L53 37 L46 48 L18 48 Z"/>
</svg>"##;

fn svg_for(mode: TransportMode) -> &'static str {
    match mode {
        TransportMode::Air => AIR_SVG,
        TransportMode::Rail => RAIL_SVG,
        TransportMode::Road => ROAD_SVG,
        TransportMode::Sea => SEA_SVG,
    }
}

/// Transport icons rasterized once per run at a fixed pixel size.
pub(crate) struct TransportIcons {
    air: PreparedImage,
    rail: PreparedImage,
    road: PreparedImage,
    sea: PreparedImage,
}

impl TransportIcons {
    pub(crate) fn new(size_px: u32) -> TripReelResult<Self> {
        Ok(Self {
            air: rasterize_icon(TransportMode::Air, size_px)?,
            rail: rasterize_icon(TransportMode::Rail, size_px)?,
            road: rasterize_icon(TransportMode::Road, size_px)?,
            sea: rasterize_icon(TransportMode::Sea, size_px)?,
        })
    }

    pub(crate) fn get(&self, mode: TransportMode) -> &PreparedImage {
        match mode {
            TransportMode::Air => &self.air,
            TransportMode::Rail => &self.rail,
            TransportMode::Road => &self.road,
            TransportMode::Sea => &self.sea,
        }
    }
}

/// Rasterize the icon for `mode` into a square premultiplied image of `size_px`.
pub(crate) fn rasterize_icon(mode: TransportMode, size_px: u32) -> TripReelResult<PreparedImage> {
    if size_px == 0 || size_px > 1024 {
        return Err(TripReelError::validation("icon size must be in 1..=1024"));
    }
    let tree = usvg::Tree::from_str(svg_for(mode), &usvg::Options::default())
        .map_err(|e| TripReelError::validation(format!("parse {} icon: {e}", mode.name())))?;

    let mut pixmap = resvg::tiny_skia::Pixmap::new(size_px, size_px)
        .ok_or_else(|| TripReelError::validation("failed to allocate icon pixmap"))?;
    let sx = (size_px as f32) / tree.size().width();
    let sy = (size_px as f32) / tree.size().height();
    let xform = resvg::tiny_skia::Transform::from_scale(sx, sy);
    resvg::render(&tree, xform, &mut pixmap.as_mut());

    // tiny-skia stores premultiplied RGBA8, which is what the compositor expects.
    PreparedImage::from_premul_bytes(pixmap.data(), size_px, size_px)
}

#[cfg(test)]
#[path = "../../tests/unit/assets/icons.rs"]
mod tests;
