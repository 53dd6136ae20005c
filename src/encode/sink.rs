use crate::foundation::core::{FrameIndex, Fps};
use crate::foundation::error::{TripReelError, TripReelResult};
use crate::render::frame::FrameRGBA;

/// Configuration handed to a [`VideoEncoder`] when a run starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderConfig {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Output frames-per-second.
    pub fps: Fps,
    /// Container/codec MIME type, e.g. `video/webm;codecs=vp9`.
    pub mime: String,
}

/// Streaming video encoder.
///
/// Ordering contract: `push_frame` is called in strictly increasing `FrameIndex` order between
/// one `start` and one `finish` or `abort`.
pub trait VideoEncoder: Send {
    /// Called once before any frame is pushed.
    fn start(&mut self, cfg: EncoderConfig) -> TripReelResult<()>;
    /// Encode one premultiplied RGBA frame.
    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> TripReelResult<()>;
    /// Flush and return the encoded bytes.
    fn finish(&mut self) -> TripReelResult<Vec<u8>>;
    /// Stop immediately and discard everything buffered so far.
    fn abort(&mut self);
}

/// Output format selected for a compositor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FormatChoice {
    /// The first preference the encoder reported as supported.
    Supported(String),
    /// No preference is supported; the encoder uses its own default.
    FallbackDefault,
}

impl FormatChoice {
    /// MIME type to record on the artifact.
    pub fn mime<'a>(&'a self, default: &'a str) -> &'a str {
        match self {
            Self::Supported(m) => m,
            Self::FallbackDefault => default,
        }
    }
}

/// Creates encoders and answers format support queries.
pub trait EncoderFactory {
    /// Return `true` when encoders from this factory can produce `mime`.
    fn supports(&self, mime: &str) -> bool;
    /// MIME type produced under [`FormatChoice::FallbackDefault`].
    fn default_mime(&self) -> String;
    /// Create an encoder for `format`. It is not started yet.
    fn create(&mut self, format: &FormatChoice) -> TripReelResult<Box<dyn VideoEncoder>>;
}

/// Pick the first entry of `prefs` that `probe` accepts.
pub fn resolve_format(prefs: &[String], probe: impl Fn(&str) -> bool) -> FormatChoice {
    prefs
        .iter()
        .find(|m| probe(m))
        .map(|m| FormatChoice::Supported(m.clone()))
        .unwrap_or(FormatChoice::FallbackDefault)
}

/// MIME type of [`InMemoryEncoder`] output: raw premultiplied RGBA frames back to back.
pub const RAW_RGBA_MIME: &str = "video/x-raw-rgba";

/// Encoder that keeps raw frames in memory. Useful for tests and debugging.
#[derive(Debug, Default)]
pub struct InMemoryEncoder {
    cfg: Option<EncoderConfig>,
    frames: Vec<(FrameIndex, FrameRGBA)>,
}

impl InMemoryEncoder {
    /// Create an idle encoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration captured by `start`, if any.
    pub fn config(&self) -> Option<&EncoderConfig> {
        self.cfg.as_ref()
    }

    /// Frames pushed since `start`.
    pub fn frames(&self) -> &[(FrameIndex, FrameRGBA)] {
        &self.frames
    }
}

impl VideoEncoder for InMemoryEncoder {
    fn start(&mut self, cfg: EncoderConfig) -> TripReelResult<()> {
        self.cfg = Some(cfg);
        self.frames.clear();
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> TripReelResult<()> {
        if self.cfg.is_none() {
            return Err(TripReelError::encoding("in-memory encoder not started"));
        }
        self.frames.push((idx, frame.clone()));
        Ok(())
    }

    fn finish(&mut self) -> TripReelResult<Vec<u8>> {
        if self.cfg.take().is_none() {
            return Err(TripReelError::encoding("in-memory encoder not started"));
        }
        let mut out = Vec::with_capacity(self.frames.iter().map(|(_, f)| f.data.len()).sum());
        for (_, f) in self.frames.drain(..) {
            out.extend_from_slice(&f.data);
        }
        Ok(out)
    }

    fn abort(&mut self) {
        self.cfg = None;
        self.frames.clear();
    }
}

/// Factory for [`InMemoryEncoder`]s. Supports only [`RAW_RGBA_MIME`].
#[derive(Debug, Default, Clone, Copy)]
pub struct InMemoryEncoderFactory;

impl EncoderFactory for InMemoryEncoderFactory {
    fn supports(&self, mime: &str) -> bool {
        mime == RAW_RGBA_MIME
    }

    fn default_mime(&self) -> String {
        RAW_RGBA_MIME.to_string()
    }

    fn create(&mut self, _format: &FormatChoice) -> TripReelResult<Box<dyn VideoEncoder>> {
        Ok(Box::new(InMemoryEncoder::new()))
    }
}

/// MIME type of [`StillFrameEncoder`] output.
pub const PNG_MIME: &str = "image/png";

/// Encoder that keeps a single frame and returns it as PNG.
#[derive(Debug)]
pub struct StillFrameEncoder {
    target: FrameIndex,
    started: bool,
    captured: Option<FrameRGBA>,
}

impl StillFrameEncoder {
    /// Capture frame `target`.
    pub fn new(target: FrameIndex) -> Self {
        Self {
            target,
            started: false,
            captured: None,
        }
    }
}

impl VideoEncoder for StillFrameEncoder {
    fn start(&mut self, _cfg: EncoderConfig) -> TripReelResult<()> {
        self.started = true;
        self.captured = None;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> TripReelResult<()> {
        if !self.started {
            return Err(TripReelError::encoding("still-frame encoder not started"));
        }
        if idx == self.target {
            self.captured = Some(frame.clone());
        }
        Ok(())
    }

    fn finish(&mut self) -> TripReelResult<Vec<u8>> {
        self.started = false;
        let frame = self.captured.take().ok_or_else(|| {
            TripReelError::encoding(format!("frame {} was never rendered", self.target.0))
        })?;
        frame.to_png()
    }

    fn abort(&mut self) {
        self.started = false;
        self.captured = None;
    }
}

/// Factory for [`StillFrameEncoder`]s.
#[derive(Debug, Clone, Copy)]
pub struct StillFrameEncoderFactory {
    /// Frame to capture.
    pub target: FrameIndex,
}

impl EncoderFactory for StillFrameEncoderFactory {
    fn supports(&self, mime: &str) -> bool {
        mime == PNG_MIME
    }

    fn default_mime(&self) -> String {
        PNG_MIME.to_string()
    }

    fn create(&mut self, _format: &FormatChoice) -> TripReelResult<Box<dyn VideoEncoder>> {
        Ok(Box::new(StillFrameEncoder::new(self.target)))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/sink.rs"]
mod tests;
