pub(crate) mod error;
pub(crate) mod ids;
pub(crate) mod intern;
pub(crate) mod math;
