use super::*;
use crate::foundation::core::Canvas;

fn prefs() -> Vec<String> {
    ["video/webm;codecs=vp9", "video/webm;codecs=vp8", "video/mp4"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn cfg(mime: &str) -> EncoderConfig {
    EncoderConfig {
        width: 2,
        height: 2,
        fps: Fps::new(30, 1).unwrap(),
        mime: mime.to_string(),
    }
}

fn frame(v: u8) -> FrameRGBA {
    let mut f = FrameRGBA::transparent(Canvas {
        width: 2,
        height: 2,
    });
    f.data.fill(v);
    f
}

#[test]
fn resolve_picks_first_supported_preference() {
    let choice = resolve_format(&prefs(), |m| m.starts_with("video/webm"));
    assert_eq!(
        choice,
        FormatChoice::Supported("video/webm;codecs=vp9".to_string())
    );
    let choice = resolve_format(&prefs(), |m| m == "video/mp4");
    assert_eq!(choice, FormatChoice::Supported("video/mp4".to_string()));
}

#[test]
fn resolve_falls_back_when_nothing_matches() {
    let choice = resolve_format(&prefs(), |_| false);
    assert_eq!(choice, FormatChoice::FallbackDefault);
    assert_eq!(choice.mime("video/webm"), "video/webm");
    assert_eq!(resolve_format(&[], |_| true), FormatChoice::FallbackDefault);
}

#[test]
fn in_memory_encoder_concatenates_frames() {
    let mut enc = InMemoryEncoder::new();
    enc.start(cfg(RAW_RGBA_MIME)).unwrap();
    enc.push_frame(FrameIndex(0), &frame(1)).unwrap();
    enc.push_frame(FrameIndex(1), &frame(2)).unwrap();
    assert_eq!(enc.frames().len(), 2);
    let bytes = enc.finish().unwrap();
    assert_eq!(bytes.len(), 32);
    assert_eq!(bytes[0], 1);
    assert_eq!(bytes[31], 2);
}

#[test]
fn in_memory_encoder_rejects_push_before_start() {
    let mut enc = InMemoryEncoder::new();
    let err = enc.push_frame(FrameIndex(0), &frame(0)).unwrap_err();
    assert!(matches!(err, TripReelError::Encoding(_)));
}

#[test]
fn still_frame_encoder_returns_png_of_target() {
    let mut enc = StillFrameEncoder::new(FrameIndex(1));
    enc.start(cfg(PNG_MIME)).unwrap();
    enc.push_frame(FrameIndex(0), &frame(10)).unwrap();
    enc.push_frame(FrameIndex(1), &frame(255)).unwrap();
    let png = enc.finish().unwrap();
    assert_eq!(&png[1..4], b"PNG");
}

#[test]
fn still_frame_encoder_fails_when_target_missing() {
    let mut enc = StillFrameEncoder::new(FrameIndex(9));
    enc.start(cfg(PNG_MIME)).unwrap();
    enc.push_frame(FrameIndex(0), &frame(10)).unwrap();
    assert!(matches!(enc.finish(), Err(TripReelError::Encoding(_))));
}
