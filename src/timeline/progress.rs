/// Turns frame positions into monotonic percentage updates.
///
/// Emits on every stage boundary and at least every `interval` frames inside a stage. Reported
/// values are clamped to `[0, 100]` and never decrease.
pub(crate) struct ProgressReporter<'a> {
    sink: &'a mut dyn FnMut(f64, &str),
    total_frames: u64,
    interval: u64,
    last_pct: f64,
    last_emit_frame: u64,
    status: String,
}

impl<'a> ProgressReporter<'a> {
    pub(crate) fn new(
        sink: &'a mut dyn FnMut(f64, &str),
        total_frames: u64,
        interval: u64,
    ) -> Self {
        Self {
            sink,
            total_frames: total_frames.max(1),
            interval: interval.max(1),
            last_pct: 0.0,
            last_emit_frame: 0,
            status: String::new(),
        }
    }

    fn percent(&self, frames_done: u64) -> f64 {
        (frames_done as f64 / self.total_frames as f64 * 100.0).clamp(0.0, 100.0)
    }

    fn emit(&mut self, frames_done: u64) {
        let pct = self.percent(frames_done).max(self.last_pct);
        self.last_pct = pct;
        self.last_emit_frame = frames_done;
        (self.sink)(pct, &self.status);
    }

    /// A stage starting at `frame` became active.
    pub(crate) fn stage_started(&mut self, frame: u64, status: String) {
        self.status = status;
        self.emit(frame);
    }

    /// `frames_done` frames have been pushed to the encoder.
    pub(crate) fn frame_done(&mut self, frames_done: u64) {
        if frames_done.saturating_sub(self.last_emit_frame) >= self.interval {
            self.emit(frames_done);
        }
    }

    /// Status update that does not move the frame position (e.g. encoder flush).
    pub(crate) fn status(&mut self, status: &str) {
        self.status = status.to_string();
        let pct = self.last_pct;
        (self.sink)(pct, &self.status);
    }

    /// Final `100%` report after a successful finish.
    pub(crate) fn complete(&mut self, status: &str) {
        self.status = status.to_string();
        self.last_pct = 100.0;
        (self.sink)(100.0, &self.status);
    }

    pub(crate) fn last_percent(&self) -> f64 {
        self.last_pct
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/progress.rs"]
mod tests;
