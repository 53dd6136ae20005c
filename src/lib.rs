//! tripreel turns an ordered list of geotagged stops and photos into an encoded trip video.
//!
//! A [`Compositor`] expands a [`TripInput`] into a fixed [`StagePlan`], then produces every frame
//! in-process: it drives a [`MapSurface`] through scripted camera moves, draws overlays (labels,
//! a moving transport icon, a photo carousel) in lockstep with the camera, and streams the frames
//! into a [`VideoEncoder`].
//!
//! - Build a [`ReelConfig`] (or load one from JSON)
//! - Create a [`Compositor`] with map/encoder factories and an [`ImageSource`]
//! - Call [`Compositor::generate`] with a progress callback and a [`CancelToken`]
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod animation;
mod assets;
mod encode;
mod foundation;
mod map;
mod render;
mod session;
mod timeline;
mod trip;

pub use crate::animation::ease::Ease;
pub use crate::assets::decode::{PreparedImage, decode_image};
pub use crate::assets::loader::{FsImageSource, ImageSource, LoaderStats, ResourceLoader};
pub use crate::encode::adapter::VideoArtifact;
pub use crate::encode::ffmpeg::{FfmpegEncoder, FfmpegEncoderFactory, is_ffmpeg_on_path};
pub use crate::encode::sink::{
    EncoderConfig, EncoderFactory, FormatChoice, InMemoryEncoder, InMemoryEncoderFactory,
    PNG_MIME, RAW_RGBA_MIME, StillFrameEncoder, StillFrameEncoderFactory, VideoEncoder,
    resolve_format,
};
pub use crate::foundation::cancel::CancelToken;
pub use crate::foundation::core::{
    Affine, BezPath, Canvas, Fps, FrameIndex, FrameRange, GeoBounds, GeoPoint, Point, Rect, Vec2,
};
pub use crate::foundation::error::{TripReelError, TripReelResult};
pub use crate::map::flat::{FlatMapFactory, FlatMapStyle, FlatMapSurface};
pub use crate::map::surface::{CameraView, MapFactory, MapSurface};
pub use crate::render::frame::FrameRGBA;
pub use crate::render::text::{FixedAdvance, TextMeasure, truncate_to_width, word_wrap};
pub use crate::session::compositor::Compositor;
pub use crate::session::config::{CameraStyle, OverlayStyle, Pacing, ReelConfig, StageTimings};
pub use crate::session::run::RunStats;
pub use crate::timeline::plan::{ShowcasePhase, Stage, StageKind, StagePlan, Waypoint};
pub use crate::trip::model::{
    Photo, StartingLocation, Stop, StopGroup, TransportMode, TripInput, leg_key,
};
