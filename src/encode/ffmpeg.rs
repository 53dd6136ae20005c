use std::io::{Read, Write as _};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::thread::JoinHandle;

use crate::encode::sink::{EncoderConfig, EncoderFactory, FormatChoice, VideoEncoder};
use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{TripReelError, TripReelResult};
use crate::render::frame::{FrameRGBA, flatten_premul_over_bg_to_opaque_rgba8};

type Drain = JoinHandle<std::io::Result<Vec<u8>>>;

const VP9_ARGS: &[&str] = &[
    "-c:v",
    "libvpx-vp9",
    "-b:v",
    "0",
    "-crf",
    "32",
    "-pix_fmt",
    "yuv420p",
    "-f",
    "webm",
];
const VP8_ARGS: &[&str] = &[
    "-c:v", "libvpx", "-b:v", "2M", "-pix_fmt", "yuv420p", "-f", "webm",
];
// Fragmented MP4 so the muxer never seeks on the stdout pipe.
const H264_ARGS: &[&str] = &[
    "-c:v",
    "libx264",
    "-pix_fmt",
    "yuv420p",
    "-movflags",
    "frag_keyframe+empty_moov",
    "-f",
    "mp4",
];

/// Encoder name and output arguments for a MIME type, or `None` when unsupported.
fn output_args(mime: &str) -> Option<(&'static str, &'static [&'static str])> {
    let base = mime.split(';').next().unwrap_or("").trim();
    let codecs = mime
        .split(';')
        .skip(1)
        .find_map(|p| p.trim().strip_prefix("codecs="))
        .map(|c| c.trim_matches('"'));
    match (base, codecs) {
        ("video/webm", Some("vp9")) => Some(("libvpx-vp9", VP9_ARGS)),
        ("video/webm", Some("vp8") | None) => Some(("libvpx", VP8_ARGS)),
        ("video/mp4", Some("avc1" | "h264") | None) => Some(("libx264", H264_ARGS)),
        _ => None,
    }
}

/// Streams raw frames into the system `ffmpeg` and collects the container from its stdout.
pub struct FfmpegEncoder {
    program: String,
    mime: String,
    bg_rgba: [u8; 4],

    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stdout_drain: Option<Drain>,
    stderr_drain: Option<Drain>,

    scratch: Vec<u8>,
    cfg: Option<EncoderConfig>,
    last_idx: Option<FrameIndex>,
}

impl FfmpegEncoder {
    /// Create an encoder producing `mime` with the `ffmpeg` binary at `program`.
    pub fn new(program: impl Into<String>, mime: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            mime: mime.into(),
            bg_rgba: [0, 0, 0, 255],
            child: None,
            stdin: None,
            stdout_drain: None,
            stderr_drain: None,
            scratch: Vec::new(),
            cfg: None,
            last_idx: None,
        }
    }

    fn kill(&mut self) {
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        if let Some(h) = self.stdout_drain.take() {
            let _ = h.join();
        }
        if let Some(h) = self.stderr_drain.take() {
            let _ = h.join();
        }
        self.cfg = None;
    }
}

impl VideoEncoder for FfmpegEncoder {
    fn start(&mut self, cfg: EncoderConfig) -> TripReelResult<()> {
        if cfg.width == 0 || cfg.height == 0 {
            return Err(TripReelError::encoding(
                "ffmpeg encoder width/height must be non-zero",
            ));
        }
        if !cfg.width.is_multiple_of(2) || !cfg.height.is_multiple_of(2) {
            return Err(TripReelError::encoding(
                "ffmpeg encoder width/height must be even (required for yuv420p output)",
            ));
        }
        let (_, codec_args) = output_args(&self.mime).ok_or_else(|| {
            TripReelError::encoding(format!("unsupported output format '{}'", self.mime))
        })?;

        let mut cmd = Command::new(&self.program);
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        // Input: raw RGBA8 frames, flattened to opaque in push_frame since ffmpeg has no premul.
        cmd.args([
            "-hide_banner",
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
            &format!("{}x{}", cfg.width, cfg.height),
        ]);
        push_input_fps(&mut cmd, cfg.fps);
        cmd.args(["-i", "pipe:0", "-an"]);
        cmd.args(codec_args);
        cmd.arg("pipe:1");

        let mut child = cmd.spawn().map_err(|e| {
            TripReelError::encoding(format!(
                "failed to spawn {} (is it installed and on PATH?): {e}",
                self.program
            ))
        })?;

        let stdin = child.stdin.take();
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let (Some(stdin), Some(stdout), Some(stderr)) = (stdin, stdout, stderr) else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(TripReelError::encoding("failed to open ffmpeg pipes"));
        };

        self.scratch = vec![0u8; (cfg.width as usize) * (cfg.height as usize) * 4];
        self.stdout_drain = Some(drain(stdout));
        self.stderr_drain = Some(drain(stderr));
        self.child = Some(child);
        self.stdin = Some(stdin);
        tracing::debug!(mime = %self.mime, width = cfg.width, height = cfg.height, "ffmpeg started");
        self.cfg = Some(cfg);
        self.last_idx = None;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> TripReelResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| TripReelError::encoding("ffmpeg encoder not started"))?;
        if let Some(last) = self.last_idx
            && idx.0 <= last.0
        {
            return Err(TripReelError::encoding(
                "ffmpeg encoder received out-of-order frame index",
            ));
        }
        self.last_idx = Some(idx);

        if frame.width != cfg.width || frame.height != cfg.height {
            return Err(TripReelError::encoding(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, cfg.width, cfg.height
            )));
        }

        flatten_premul_over_bg_to_opaque_rgba8(&mut self.scratch, &frame.data, self.bg_rgba)?;

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(TripReelError::encoding("ffmpeg encoder is already finalized"));
        };
        stdin.write_all(&self.scratch).map_err(|e| {
            TripReelError::encoding(format!("failed to write frame to ffmpeg stdin: {e}"))
        })
    }

    fn finish(&mut self) -> TripReelResult<Vec<u8>> {
        drop(self.stdin.take());
        let mut child = self
            .child
            .take()
            .ok_or_else(|| TripReelError::encoding("ffmpeg encoder not started"))?;
        self.cfg = None;

        let status = child.wait().map_err(|e| {
            TripReelError::encoding(format!("failed to wait for ffmpeg to finish: {e}"))
        })?;
        let stdout = join_drain(self.stdout_drain.take(), "stdout")?;
        let stderr = join_drain(self.stderr_drain.take(), "stderr")?;

        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr);
            return Err(TripReelError::encoding(format!(
                "ffmpeg exited with status {}: {}",
                status,
                stderr.trim()
            )));
        }
        Ok(stdout)
    }

    fn abort(&mut self) {
        if self.child.is_some() {
            tracing::debug!(mime = %self.mime, "ffmpeg aborted");
        }
        self.kill();
    }
}

impl Drop for FfmpegEncoder {
    fn drop(&mut self) {
        self.kill();
    }
}

fn drain<R: Read + Send + 'static>(mut r: R) -> Drain {
    std::thread::spawn(move || {
        let mut bytes = Vec::new();
        r.read_to_end(&mut bytes)?;
        Ok(bytes)
    })
}

fn join_drain(handle: Option<Drain>, name: &str) -> TripReelResult<Vec<u8>> {
    match handle {
        Some(h) => h
            .join()
            .map_err(|_| TripReelError::encoding(format!("ffmpeg {name} drain thread panicked")))?
            .map_err(|e| TripReelError::encoding(format!("ffmpeg {name} read failed: {e}"))),
        None => Ok(Vec::new()),
    }
}

fn push_input_fps(cmd: &mut Command, fps: Fps) {
    // Rational rate before `-i` sets the rawvideo input rate.
    cmd.args(["-r", &format!("{}/{}", fps.num, fps.den)]);
}

/// [`EncoderFactory`] backed by the system `ffmpeg`.
///
/// The encoder list is probed once at construction; an unavailable binary supports nothing.
#[derive(Clone, Debug)]
pub struct FfmpegEncoderFactory {
    program: String,
    encoders: String,
}

impl FfmpegEncoderFactory {
    /// Probe `ffmpeg` on `PATH`.
    pub fn new() -> Self {
        Self::with_program("ffmpeg")
    }

    /// Probe a specific `ffmpeg` binary.
    pub fn with_program(program: impl Into<String>) -> Self {
        let program = program.into();
        let encoders = probe_encoders(&program).unwrap_or_default();
        if encoders.is_empty() {
            tracing::warn!(program = %program, "ffmpeg encoder probe returned nothing");
        }
        Self { program, encoders }
    }

    /// Build a factory from an already captured `ffmpeg -encoders` listing.
    pub fn from_listing(program: impl Into<String>, listing: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            encoders: listing.into(),
        }
    }

    /// Return `true` when the probed `ffmpeg` lists an encoder called `name`.
    pub fn has_encoder(&self, name: &str) -> bool {
        self.encoders
            .lines()
            .filter_map(|l| l.split_whitespace().nth(1))
            .any(|n| n == name)
    }
}

impl Default for FfmpegEncoderFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl EncoderFactory for FfmpegEncoderFactory {
    fn supports(&self, mime: &str) -> bool {
        output_args(mime).is_some_and(|(encoder, _)| self.has_encoder(encoder))
    }

    fn default_mime(&self) -> String {
        "video/mp4".to_string()
    }

    fn create(&mut self, format: &FormatChoice) -> TripReelResult<Box<dyn VideoEncoder>> {
        let default = self.default_mime();
        Ok(Box::new(FfmpegEncoder::new(
            self.program.clone(),
            format.mime(&default),
        )))
    }
}

fn probe_encoders(program: &str) -> Option<String> {
    let out = Command::new(program)
        .args(["-hide_banner", "-encoders"])
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .ok()?;
    out.status
        .success()
        .then(|| String::from_utf8_lossy(&out.stdout).into_owned())
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
