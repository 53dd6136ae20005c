pub(crate) mod decode;
pub(crate) mod icons;
pub(crate) mod loader;
