/// Result alias used across thumbkit.
pub type ThumbResult<T> = Result<T, ThumbError>;

/// Error type shared by every thumbkit operation.
///
/// Only whole-render failures reach callers through this type. Per-element text failures and
/// filter failures are logged and swallowed where they happen.
#[derive(thiserror::Error, Debug)]
pub enum ThumbError {
    /// Invalid caller input (missing source, malformed request, bad numbers).
    #[error("validation error: {0}")]
    Validation(String),

    /// An image source could not be resolved or decoded.
    #[error("failed to load: {0}")]
    Load(String),

    /// The drawing surface could not be created or rasterized.
    #[error("render error: {0}")]
    Render(String),

    /// The background-removal service failed.
    #[error("background removal error: {0}")]
    Removal(String),

    /// JSON boundary documents failed to (de)serialize.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Anything else, with its source chain preserved.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ThumbError {
    /// Build a [`ThumbError::Validation`].
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`ThumbError::Load`].
    pub fn load(msg: impl Into<String>) -> Self {
        Self::Load(msg.into())
    }

    /// Build a [`ThumbError::Render`].
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`ThumbError::Removal`].
    pub fn removal(msg: impl Into<String>) -> Self {
        Self::Removal(msg.into())
    }

    /// Build a [`ThumbError::Serde`].
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
