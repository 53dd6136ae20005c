use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::*;
use crate::foundation::core::GeoPoint;
use crate::timeline::plan::Waypoint;
use crate::trip::model::Photo;

struct PngSource {
    fetches: AtomicUsize,
}

impl ImageSource for PngSource {
    fn fetch(&self, _url: &str) -> TripReelResult<Vec<u8>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let img = image::RgbaImage::from_pixel(4, 4, image::Rgba([90, 60, 30, 255]));
        let mut buf = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        Ok(buf)
    }
}

fn showcase(n: usize) -> Stage {
    Stage {
        kind: StageKind::Showcase {
            stop: Waypoint {
                id: Some("s".to_string()),
                title: "Stop".to_string(),
                at: GeoPoint::new(0.0, 0.0),
            },
            photos: (0..n)
                .map(|i| Photo {
                    id: format!("p{i}"),
                    url: format!("p{i}.png"),
                    caption: None,
                })
                .collect(),
            intro_frames: 2,
            photo_frames: 3,
            outro_frames: 2,
        },
        start: FrameIndex(0),
        frames: 4 + 3 * n as u64,
    }
}

fn slots(c: &Carousel) -> Vec<CarouselSlot> {
    c.items.iter().map(|(s, _)| *s).collect()
}

#[test]
fn carousel_window_stays_bounded_and_decodes_each_photo_once() {
    let source = Arc::new(PngSource {
        fetches: AtomicUsize::new(0),
    });
    let mut loader = ResourceLoader::new(source.clone(), 64);
    let cancel = CancelToken::new();
    let stage = showcase(6);

    loader.reset_peak();
    loader.prefetch("p0.png");
    for local in 0..stage.frames {
        let c = carousel_for(&stage, local, &mut loader, &cancel).unwrap();
        if let Some(ShowcasePhase::Photo { index, .. }) = stage.showcase_phase(local) {
            assert!(slots(&c).contains(&CarouselSlot::Current));
            if index == 0 {
                assert!(!slots(&c).contains(&CarouselSlot::Previous));
            } else {
                assert!(slots(&c).contains(&CarouselSlot::Previous));
            }
        }
        assert!(loader.stats().live <= 3);
    }

    assert!(loader.stats().peak_live <= 3);
    assert_eq!(loader.stats().decodes, 6);
    assert_eq!(source.fetches.load(Ordering::SeqCst), 6);
}

#[test]
fn non_showcase_stage_has_empty_carousel() {
    let source = Arc::new(PngSource {
        fetches: AtomicUsize::new(0),
    });
    let mut loader = ResourceLoader::new(source, 64);
    let stage = Stage {
        kind: StageKind::End {
            text: "bye".to_string(),
        },
        start: FrameIndex(0),
        frames: 3,
    };
    let c = carousel_for(&stage, 0, &mut loader, &CancelToken::new()).unwrap();
    assert!(c.items.is_empty());
    assert_eq!(loader.stats().decodes, 0);
}

#[test]
fn realtime_pacer_holds_frames_to_the_clock() {
    let mut cfg = ReelConfig::default();
    cfg.fps = crate::foundation::core::Fps::new(100, 1).unwrap();
    cfg.pacing = Pacing::Realtime;
    let mut pacer = Pacer::new(&cfg);
    let t0 = Instant::now();
    for i in 0..4 {
        pacer.wait(FrameIndex(i), &CancelToken::new()).unwrap();
    }
    assert!(t0.elapsed() >= Duration::from_millis(29));
}

#[test]
fn offline_pacer_never_waits_and_cancel_interrupts_realtime() {
    let mut pacer = Pacer::new(&ReelConfig::default());
    pacer.wait(FrameIndex(1_000_000), &CancelToken::new()).unwrap();

    let mut cfg = ReelConfig::default();
    cfg.pacing = Pacing::Realtime;
    let mut pacer = Pacer::new(&cfg);
    let cancel = CancelToken::new();
    cancel.cancel();
    assert!(pacer.wait(FrameIndex(1_000), &cancel).unwrap_err().is_cancelled());
}
