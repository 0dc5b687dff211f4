//! Material graph document model and its normalized form.

pub mod model;
pub mod normalize;
