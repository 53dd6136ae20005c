pub(crate) mod compositor;
pub(crate) mod frame;
pub(crate) mod paint;
pub(crate) mod text;
