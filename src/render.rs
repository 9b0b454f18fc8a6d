pub(crate) mod compose;
pub(crate) mod engine;
pub(crate) mod params;
pub(crate) mod placement;
