use std::io::Cursor;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::*;

struct CountingSource {
    fetches: AtomicUsize,
    fail: Option<&'static str>,
    log: Mutex<Vec<String>>,
}

impl CountingSource {
    fn new(fail: Option<&'static str>) -> Arc<Self> {
        Arc::new(Self {
            fetches: AtomicUsize::new(0),
            fail,
            log: Mutex::new(Vec::new()),
        })
    }
}

impl ImageSource for CountingSource {
    fn fetch(&self, url: &str) -> TripReelResult<Vec<u8>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.log.lock().unwrap().push(url.to_string());
        if self.fail == Some(url) {
            return Err(TripReelError::resource(format!("404 for {url}")));
        }
        let img = image::RgbaImage::from_pixel(4, 2, image::Rgba([10, 20, 30, 255]));
        let mut buf = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        Ok(buf)
    }
}

#[test]
fn load_is_idempotent_and_decodes_once() {
    let source = CountingSource::new(None);
    let mut loader = ResourceLoader::new(source.clone(), 1024);
    let cancel = CancelToken::new();

    loader.prefetch("a");
    loader.prefetch("a");
    let first = loader.load("a", &cancel).unwrap();
    let second = loader.load("a", &cancel).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!((first.width, first.height), (4, 2));
    assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
    assert_eq!(loader.stats().decodes, 1);
}

#[test]
fn failed_fetch_surfaces_as_resource_error() {
    let source = CountingSource::new(Some("broken"));
    let mut loader = ResourceLoader::new(source, 1024);
    let err = loader.load("broken", &CancelToken::new()).unwrap_err();
    assert!(matches!(err, TripReelError::ResourceLoad(_)), "{err}");
    assert!(err.to_string().contains("404"));
}

#[test]
fn sliding_window_never_holds_more_than_three() {
    let source = CountingSource::new(None);
    let mut loader = ResourceLoader::new(source, 1024);
    let cancel = CancelToken::new();
    let urls = (0..8).map(|i| format!("p{i}")).collect::<Vec<_>>();

    loader.prefetch(&urls[0]);
    loader.prefetch(&urls[1]);
    for k in 0..urls.len() {
        let lo = k.saturating_sub(1);
        let hi = (k + 1).min(urls.len() - 1);
        let keep = urls[lo..=hi].iter().map(String::as_str).collect::<Vec<_>>();
        loader.retain_window(&keep);
        if k + 1 < urls.len() {
            loader.prefetch(&urls[k + 1]);
        }
        loader.load(&urls[k], &cancel).unwrap();
        assert!(loader.stats().live <= 3);
    }

    let stats = loader.stats();
    assert!(stats.peak_live <= 3, "{stats:?}");
    assert_eq!(stats.decodes, 8);
    assert_eq!(stats.evictions, 6);

    loader.clear();
    assert_eq!(loader.stats().live, 0);
}

#[test]
fn try_get_does_not_block_and_eventually_resolves() {
    let source = CountingSource::new(None);
    let mut loader = ResourceLoader::new(source, 1024);
    assert!(loader.try_get("x").unwrap().is_none());
    loader.prefetch("x");
    let deadline = std::time::Instant::now() + Duration::from_secs(5);
    loop {
        if loader.try_get("x").unwrap().is_some() {
            break;
        }
        assert!(std::time::Instant::now() < deadline, "prefetch never resolved");
        std::thread::sleep(Duration::from_millis(1));
    }
}

#[test]
fn cancelled_wait_returns_cancelled() {
    let source = CountingSource::new(None);
    let mut loader = ResourceLoader::new(source, 1024);
    let cancel = CancelToken::new();
    cancel.cancel();
    let err = loader.load("a", &cancel).unwrap_err();
    assert!(err.is_cancelled());
}

#[test]
fn fs_source_resolves_relative_and_rejects_remote() {
    let tmp = std::env::temp_dir().join(format!(
        "tripreel_loader_test_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ));
    std::fs::create_dir_all(tmp.join("photos")).unwrap();
    std::fs::write(tmp.join("photos/a.bin"), b"abc").unwrap();

    let src = FsImageSource::new(&tmp);
    assert_eq!(src.fetch("photos/a.bin").unwrap(), b"abc");
    assert_eq!(src.fetch("./photos//a.bin").unwrap(), b"abc");
    let abs = tmp.join("photos/a.bin");
    assert_eq!(src.fetch(&format!("file://{}", abs.display())).unwrap(), b"abc");
    assert!(src.fetch("../etc/passwd").is_err());
    assert!(src.fetch("https://example.com/a.jpg").is_err());
    assert!(src.fetch("photos/missing.bin").is_err());

    std::fs::remove_dir_all(&tmp).ok();
}
