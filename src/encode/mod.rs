pub(crate) mod adapter;
pub(crate) mod ffmpeg;
pub(crate) mod sink;
