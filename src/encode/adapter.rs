use crate::encode::sink::{EncoderConfig, EncoderFactory, FormatChoice, VideoEncoder};
use crate::foundation::core::{Canvas, FrameIndex, Fps};
use crate::foundation::error::{TripReelError, TripReelResult};
use crate::render::frame::FrameRGBA;

/// Finished video returned by [`crate::Compositor::generate`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VideoArtifact {
    /// Encoded container bytes.
    pub bytes: Vec<u8>,
    /// MIME type of `bytes`.
    pub mime: String,
    /// Length of `bytes`.
    pub size: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SinkState {
    Active,
    Finished,
    Failed,
}

/// Run-scoped wrapper around a [`VideoEncoder`].
///
/// Enforces strictly increasing frame indices. The first encoder error marks the sink failed and
/// aborts the encoder, so no partial output ever reaches the caller. A sink dropped while still
/// active aborts its encoder.
pub(crate) struct EncodingSink {
    encoder: Box<dyn VideoEncoder>,
    mime: String,
    state: SinkState,
    last_idx: Option<FrameIndex>,
    frames: u64,
}

impl EncodingSink {
    /// Create and start an encoder for `format`.
    pub(crate) fn start(
        factory: &mut dyn EncoderFactory,
        format: &FormatChoice,
        canvas: Canvas,
        fps: Fps,
    ) -> TripReelResult<Self> {
        let mime = format.mime(&factory.default_mime()).to_string();
        let mut encoder = factory.create(format).map_err(encoding_error)?;
        let cfg = EncoderConfig {
            width: canvas.width,
            height: canvas.height,
            fps,
            mime: mime.clone(),
        };
        if let Err(e) = encoder.start(cfg) {
            encoder.abort();
            return Err(encoding_error(e));
        }
        tracing::debug!(mime = %mime, "encoder started");
        Ok(Self {
            encoder,
            mime,
            state: SinkState::Active,
            last_idx: None,
            frames: 0,
        })
    }

    pub(crate) fn push(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> TripReelResult<()> {
        if self.state != SinkState::Active {
            return Err(TripReelError::encoding("encoding sink is not active"));
        }
        if let Some(last) = self.last_idx
            && idx.0 <= last.0
        {
            self.fail();
            return Err(TripReelError::encoding(format!(
                "frame {} pushed after frame {}",
                idx.0, last.0
            )));
        }
        if let Err(e) = self.encoder.push_frame(idx, frame) {
            self.fail();
            return Err(encoding_error(e));
        }
        self.last_idx = Some(idx);
        self.frames += 1;
        Ok(())
    }

    /// Flush the encoder into a [`VideoArtifact`].
    pub(crate) fn finish(&mut self) -> TripReelResult<VideoArtifact> {
        if self.state != SinkState::Active {
            return Err(TripReelError::encoding("encoding sink is not active"));
        }
        match self.encoder.finish() {
            Ok(bytes) => {
                self.state = SinkState::Finished;
                tracing::debug!(frames = self.frames, bytes = bytes.len(), "encoder finished");
                Ok(VideoArtifact {
                    size: bytes.len(),
                    bytes,
                    mime: self.mime.clone(),
                })
            }
            Err(e) => {
                self.fail();
                Err(encoding_error(e))
            }
        }
    }

    /// Abort the encoder if it is still running. Idempotent.
    pub(crate) fn abort(&mut self) {
        if self.is_active() {
            self.fail();
        }
    }

    pub(crate) fn is_active(&self) -> bool {
        self.state == SinkState::Active
    }

    pub(crate) fn frames_pushed(&self) -> u64 {
        self.frames
    }

    fn fail(&mut self) {
        self.state = SinkState::Failed;
        self.encoder.abort();
        tracing::debug!(frames = self.frames, "encoder aborted; partial output discarded");
    }
}

impl Drop for EncodingSink {
    fn drop(&mut self) {
        self.abort();
    }
}

fn encoding_error(e: TripReelError) -> TripReelError {
    match e {
        TripReelError::Encoding(_) | TripReelError::Cancelled => e,
        other => TripReelError::encoding(other.to_string()),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/adapter.rs"]
mod tests;
