pub(crate) mod eval;
pub(crate) mod expr;
pub(crate) mod overrides;
pub(crate) mod set;
