/// Convenience result type used across tripreel.
pub type TripReelResult<T> = Result<T, TripReelError>;

/// Top-level error taxonomy surfaced by a video generation run.
///
/// Every variant aborts the run; no component retries. Teardown runs on all of them.
#[derive(thiserror::Error, Debug)]
pub enum TripReelError {
    /// Input rejected before any resource was allocated (missing coordinates, empty trip).
    #[error("configuration error: {0}")]
    Config(String),

    /// Invalid option or argument value.
    #[error("validation error: {0}")]
    Validation(String),

    /// Photo fetch or decode failed.
    #[error("resource load error: {0}")]
    ResourceLoad(String),

    /// The map surface could not be created or failed its initial paint.
    #[error("surface initialization error: {0}")]
    SurfaceInit(String),

    /// The encoder rejected start or failed mid-stream.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// The caller cancelled the run.
    #[error("run cancelled")]
    Cancelled,

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TripReelError {
    /// Build a [`TripReelError::Config`] value.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Build a [`TripReelError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`TripReelError::ResourceLoad`] value.
    pub fn resource(msg: impl Into<String>) -> Self {
        Self::ResourceLoad(msg.into())
    }

    /// Build a [`TripReelError::SurfaceInit`] value.
    pub fn surface(msg: impl Into<String>) -> Self {
        Self::SurfaceInit(msg.into())
    }

    /// Build a [`TripReelError::Encoding`] value.
    pub fn encoding(msg: impl Into<String>) -> Self {
        Self::Encoding(msg.into())
    }

    /// Return `true` for caller-initiated aborts.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
