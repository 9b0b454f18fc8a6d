pub(crate) mod displacement;
pub(crate) mod mask;
