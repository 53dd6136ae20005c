use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, mpsc};
use std::time::Duration;

use crate::assets::decode::{PreparedImage, decode_image};
use crate::foundation::cancel::CancelToken;
use crate::foundation::error::{TripReelError, TripReelResult};

const WAIT_POLL: Duration = Duration::from_millis(5);

/// Fetches encoded image bytes for a photo URL.
///
/// Implementations may block; the loader only calls them from rayon workers.
pub trait ImageSource: Send + Sync {
    /// Return the encoded bytes behind `url`.
    fn fetch(&self, url: &str) -> TripReelResult<Vec<u8>>;
}

/// Filesystem-backed [`ImageSource`].
///
/// Accepts `file://` URLs, absolute paths, and paths relative to `root`. Remote schemes are
/// rejected; hosts that need HTTP supply their own source.
#[derive(Clone, Debug)]
pub struct FsImageSource {
    root: PathBuf,
}

impl FsImageSource {
    /// Resolve relative URLs against `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, url: &str) -> TripReelResult<PathBuf> {
        if let Some(path) = url.strip_prefix("file://") {
            return Ok(PathBuf::from(path));
        }
        if url.contains("://") {
            return Err(TripReelError::resource(format!(
                "unsupported URL scheme for filesystem source: '{url}'"
            )));
        }
        if Path::new(url).is_absolute() {
            return Ok(PathBuf::from(url));
        }
        Ok(self.root.join(normalize_rel_path(url)?))
    }
}

impl ImageSource for FsImageSource {
    fn fetch(&self, url: &str) -> TripReelResult<Vec<u8>> {
        let path = self.resolve(url)?;
        std::fs::read(&path).map_err(|e| {
            TripReelError::resource(format!("failed to read photo '{}': {e}", path.display()))
        })
    }
}

/// Normalize a relative photo path: `/` separators, no `.` segments, no parent traversal.
pub(crate) fn normalize_rel_path(source: &str) -> TripReelResult<String> {
    let s = source.replace('\\', "/");
    if s.is_empty() {
        return Err(TripReelError::resource("photo path must be non-empty"));
    }

    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err(TripReelError::resource("photo paths must not contain '..'"));
        }
        out.push(part);
    }

    if out.is_empty() {
        return Err(TripReelError::resource("photo path must contain a file name"));
    }
    Ok(out.join("/"))
}

/// Loader counters, for instrumentation and tests.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoaderStats {
    /// Fetch+decode jobs started.
    pub decodes: u64,
    /// Entries dropped by [`ResourceLoader::retain_window`].
    pub evictions: u64,
    /// Entries currently held (ready or pending).
    pub live: usize,
    /// Highest `live` value observed since the last [`ResourceLoader::reset_peak`].
    pub peak_live: usize,
}

enum Slot {
    Pending(mpsc::Receiver<TripReelResult<PreparedImage>>),
    Ready(Arc<PreparedImage>),
}

/// Run-scoped bitmap cache with background prefetch.
///
/// A URL is fetched and decoded at most once while it is held. The caller bounds memory by
/// calling [`ResourceLoader::retain_window`] before prefetching the next photo.
pub struct ResourceLoader {
    source: Arc<dyn ImageSource>,
    max_dim: u32,
    slots: HashMap<String, Slot>,
    stats: LoaderStats,
}

impl ResourceLoader {
    /// Create an empty loader. Decoded images are downscaled to fit `max_dim`.
    pub fn new(source: Arc<dyn ImageSource>, max_dim: u32) -> Self {
        Self {
            source,
            max_dim: max_dim.max(1),
            slots: HashMap::new(),
            stats: LoaderStats::default(),
        }
    }

    /// Start fetching and decoding `url` in the background. No-op when already held.
    pub fn prefetch(&mut self, url: &str) {
        if self.slots.contains_key(url) {
            return;
        }
        let (tx, rx) = mpsc::channel();
        let source = Arc::clone(&self.source);
        let owned = url.to_string();
        let max_dim = self.max_dim;
        rayon::spawn(move || {
            let res = source
                .fetch(&owned)
                .and_then(|bytes| decode_image(&bytes, max_dim))
                .map_err(|e| match e {
                    TripReelError::ResourceLoad(_) => e,
                    other => TripReelError::resource(format!("'{owned}': {other}")),
                });
            let _ = tx.send(res);
        });
        self.slots.insert(url.to_string(), Slot::Pending(rx));
        self.stats.decodes += 1;
        self.note_live();
        tracing::debug!(url, live = self.stats.live, "photo prefetch started");
    }

    /// Return the bitmap if it is already decoded, without blocking.
    ///
    /// A failed background load surfaces here as an error.
    pub fn try_get(&mut self, url: &str) -> TripReelResult<Option<Arc<PreparedImage>>> {
        let Some(slot) = self.slots.get_mut(url) else {
            return Ok(None);
        };
        match &mut *slot {
            Slot::Ready(img) => Ok(Some(Arc::clone(img))),
            Slot::Pending(rx) => match rx.try_recv() {
                Ok(res) => {
                    let img = Arc::new(res?);
                    *slot = Slot::Ready(Arc::clone(&img));
                    Ok(Some(img))
                }
                Err(mpsc::TryRecvError::Empty) => Ok(None),
                Err(mpsc::TryRecvError::Disconnected) => Err(TripReelError::resource(format!(
                    "loader worker for '{url}' exited without a result"
                ))),
            },
        }
    }

    /// Return the bitmap for `url`, waiting for it if necessary.
    ///
    /// The wait polls `cancel`, so a cancelled run does not stay parked on a slow fetch.
    pub fn load(&mut self, url: &str, cancel: &CancelToken) -> TripReelResult<Arc<PreparedImage>> {
        self.prefetch(url);
        loop {
            cancel.check()?;
            let Some(Slot::Pending(rx)) = self.slots.get(url) else {
                break;
            };
            match rx.recv_timeout(WAIT_POLL) {
                Ok(res) => {
                    let img = Arc::new(res?);
                    self.slots
                        .insert(url.to_string(), Slot::Ready(Arc::clone(&img)));
                    return Ok(img);
                }
                Err(mpsc::RecvTimeoutError::Timeout) => continue,
                Err(mpsc::RecvTimeoutError::Disconnected) => {
                    return Err(TripReelError::resource(format!(
                        "loader worker for '{url}' exited without a result"
                    )));
                }
            }
        }
        match self.slots.get(url) {
            Some(Slot::Ready(img)) => Ok(Arc::clone(img)),
            _ => Err(TripReelError::resource(format!(
                "photo '{url}' vanished from the loader cache"
            ))),
        }
    }

    /// Drop every entry whose URL is not in `keep`.
    pub fn retain_window(&mut self, keep: &[&str]) {
        let before = self.slots.len();
        self.slots.retain(|url, _| keep.contains(&url.as_str()));
        let evicted = before - self.slots.len();
        if evicted > 0 {
            self.stats.evictions += evicted as u64;
            tracing::debug!(evicted, "photo bitmaps evicted");
        }
        self.stats.live = self.slots.len();
    }

    /// Drop every entry. Pending workers finish and discard their result.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.stats.live = 0;
    }

    /// Reset the peak counter, e.g. at the start of a showcase stage.
    pub fn reset_peak(&mut self) {
        self.stats.peak_live = self.slots.len();
    }

    /// Current counters.
    pub fn stats(&self) -> LoaderStats {
        self.stats
    }

    fn note_live(&mut self) {
        self.stats.live = self.slots.len();
        self.stats.peak_live = self.stats.peak_live.max(self.stats.live);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/loader.rs"]
mod tests;
