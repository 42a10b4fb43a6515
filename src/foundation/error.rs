/// Convenience result type used across figmotion.
pub type FigureResult<T> = Result<T, FigureError>;

/// Top-level error taxonomy used by figure APIs.
///
/// Only programmer and configuration mistakes surface as errors. Timing and physics edge
/// cases met during playback are resolved in place and never reach this type.
#[derive(thiserror::Error, Debug)]
pub enum FigureError {
    /// Malformed element definitions or registry lookups.
    #[error("config error: {0}")]
    Config(String),

    /// Invalid arguments such as duplicate names or mismatched transform shapes.
    #[error("validation error: {0}")]
    Validation(String),

    /// Problems constructing or starting animation steps.
    #[error("animation error: {0}")]
    Animation(String),

    /// Snapshots that cannot be applied to the current element tree.
    #[error("state error: {0}")]
    State(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FigureError {
    /// Build a [`FigureError::Config`] value.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Build a [`FigureError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`FigureError::Animation`] value.
    pub fn animation(msg: impl Into<String>) -> Self {
        Self::Animation(msg.into())
    }

    /// Build a [`FigureError::State`] value.
    pub fn state(msg: impl Into<String>) -> Self {
        Self::State(msg.into())
    }

    /// Build a [`FigureError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

impl From<serde_json::Error> for FigureError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde(err.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
