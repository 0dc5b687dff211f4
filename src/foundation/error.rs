/// Result alias used at the crate boundary.
pub type MaterialResult<T> = Result<T, MaterialError>;

/// Errors raised while loading, normalizing or assembling a material.
///
/// Translation diagnostics are not reported through this type; they accumulate on the
/// translator as plain strings so a single pass can surface every problem at once.
#[derive(thiserror::Error, Debug)]
pub enum MaterialError {
    /// The input graph, options or template are malformed.
    #[error("validation error: {0}")]
    Validation(String),

    /// Translation finished with compile errors.
    #[error("translation error: {0}")]
    Translation(String),

    /// A uniform expression or buffer could not be evaluated.
    #[error("evaluation error: {0}")]
    Evaluation(String),

    /// (De)serialization of a material artifact failed.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Anything else, with its source preserved.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl MaterialError {
    /// Build a [`MaterialError::Validation`].
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`MaterialError::Translation`].
    pub fn translation(msg: impl Into<String>) -> Self {
        Self::Translation(msg.into())
    }

    /// Build a [`MaterialError::Evaluation`].
    pub fn evaluation(msg: impl Into<String>) -> Self {
        Self::Evaluation(msg.into())
    }

    /// Build a [`MaterialError::Serde`].
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
