pub(crate) mod driver;
pub(crate) mod flat;
pub(crate) mod surface;
