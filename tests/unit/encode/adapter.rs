use std::sync::{Arc, Mutex};

use super::*;
use crate::encode::sink::{InMemoryEncoderFactory, RAW_RGBA_MIME};

#[derive(Default)]
struct Calls {
    started: u32,
    pushed: u32,
    finished: u32,
    aborted: u32,
}

struct FlakyEncoder {
    calls: Arc<Mutex<Calls>>,
    fail_at: Option<u32>,
    fail_start: bool,
}

impl VideoEncoder for FlakyEncoder {
    fn start(&mut self, _cfg: EncoderConfig) -> TripReelResult<()> {
        self.calls.lock().unwrap().started += 1;
        if self.fail_start {
            return Err(TripReelError::validation("codec unavailable"));
        }
        Ok(())
    }

    fn push_frame(&mut self, _idx: FrameIndex, _frame: &FrameRGBA) -> TripReelResult<()> {
        let mut c = self.calls.lock().unwrap();
        if Some(c.pushed) == self.fail_at {
            return Err(TripReelError::encoding("disk full"));
        }
        c.pushed += 1;
        Ok(())
    }

    fn finish(&mut self) -> TripReelResult<Vec<u8>> {
        self.calls.lock().unwrap().finished += 1;
        Ok(vec![1, 2, 3])
    }

    fn abort(&mut self) {
        self.calls.lock().unwrap().aborted += 1;
    }
}

struct FlakyFactory {
    calls: Arc<Mutex<Calls>>,
    fail_at: Option<u32>,
    fail_start: bool,
}

impl EncoderFactory for FlakyFactory {
    fn supports(&self, mime: &str) -> bool {
        mime == "video/webm"
    }

    fn default_mime(&self) -> String {
        "video/mp4".to_string()
    }

    fn create(&mut self, _format: &FormatChoice) -> TripReelResult<Box<dyn VideoEncoder>> {
        Ok(Box::new(FlakyEncoder {
            calls: Arc::clone(&self.calls),
            fail_at: self.fail_at,
            fail_start: self.fail_start,
        }))
    }
}

fn canvas() -> Canvas {
    Canvas {
        width: 2,
        height: 2,
    }
}

fn fps() -> Fps {
    Fps::new(30, 1).unwrap()
}

fn factory(fail_at: Option<u32>, fail_start: bool) -> (FlakyFactory, Arc<Mutex<Calls>>) {
    let calls = Arc::new(Mutex::new(Calls::default()));
    (
        FlakyFactory {
            calls: Arc::clone(&calls),
            fail_at,
            fail_start,
        },
        calls,
    )
}

#[test]
fn finish_reports_mime_and_size() {
    let (mut f, calls) = factory(None, false);
    let mut sink = EncodingSink::start(
        &mut f,
        &FormatChoice::Supported("video/webm".to_string()),
        canvas(),
        fps(),
    )
    .unwrap();
    let frame = FrameRGBA::transparent(canvas());
    sink.push(FrameIndex(0), &frame).unwrap();
    sink.push(FrameIndex(1), &frame).unwrap();
    let art = sink.finish().unwrap();
    assert_eq!(art.mime, "video/webm");
    assert_eq!(art.size, 3);
    assert!(!sink.is_active());
    drop(sink);
    let c = calls.lock().unwrap();
    assert_eq!((c.started, c.pushed, c.finished, c.aborted), (1, 2, 1, 0));
}

#[test]
fn fallback_uses_factory_default_mime() {
    let mut f = InMemoryEncoderFactory;
    let mut sink =
        EncodingSink::start(&mut f, &FormatChoice::FallbackDefault, canvas(), fps()).unwrap();
    let art = sink.finish().unwrap();
    assert_eq!(art.mime, RAW_RGBA_MIME);
    assert_eq!(art.size, 0);
}

#[test]
fn push_error_aborts_once_and_blocks_finish() {
    let (mut f, calls) = factory(Some(1), false);
    let mut sink =
        EncodingSink::start(&mut f, &FormatChoice::FallbackDefault, canvas(), fps()).unwrap();
    let frame = FrameRGBA::transparent(canvas());
    sink.push(FrameIndex(0), &frame).unwrap();
    let err = sink.push(FrameIndex(1), &frame).unwrap_err();
    assert!(matches!(err, TripReelError::Encoding(_)));
    assert!(sink.finish().is_err());
    drop(sink);
    let c = calls.lock().unwrap();
    assert_eq!(c.aborted, 1);
    assert_eq!(c.finished, 0);
}

#[test]
fn out_of_order_frames_are_rejected() {
    let (mut f, _calls) = factory(None, false);
    let mut sink =
        EncodingSink::start(&mut f, &FormatChoice::FallbackDefault, canvas(), fps()).unwrap();
    let frame = FrameRGBA::transparent(canvas());
    sink.push(FrameIndex(3), &frame).unwrap();
    assert!(sink.push(FrameIndex(3), &frame).is_err());
    assert_eq!(sink.frames_pushed(), 1);
}

#[test]
fn start_failure_is_encoding_error_and_aborts() {
    let (mut f, calls) = factory(None, true);
    let err = EncodingSink::start(&mut f, &FormatChoice::FallbackDefault, canvas(), fps())
        .err()
        .expect("start fails");
    assert!(matches!(err, TripReelError::Encoding(_)));
    assert_eq!(calls.lock().unwrap().aborted, 1);
}

#[test]
fn drop_while_active_aborts() {
    let (mut f, calls) = factory(None, false);
    let sink =
        EncodingSink::start(&mut f, &FormatChoice::FallbackDefault, canvas(), fps()).unwrap();
    drop(sink);
    assert_eq!(calls.lock().unwrap().aborted, 1);
}
