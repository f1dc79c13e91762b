/// Convenience result type used across coverkit.
pub type CoverResult<T> = Result<T, CoverError>;

/// Top-level error taxonomy.
///
/// Layer store and manipulation operations never produce these; they are total and treat stale
/// layer ids as no-ops. Errors only come out of loading, rendering, exporting and persistence.
#[derive(thiserror::Error, Debug)]
pub enum CoverError {
    /// Malformed document, template or configuration data.
    #[error("validation error: {0}")]
    Validation(String),

    /// An image or font source that cannot be read (missing, undecodable, cross-origin).
    #[error("resource error: {0}")]
    Resource(String),

    /// Rasterizer fault (surface sizing, encoding).
    #[error("render error: {0}")]
    Render(String),

    /// Template persistence failure, including quota exhaustion.
    #[error("storage error: {0}")]
    Storage(String),

    /// An export was requested while another one is still in flight.
    #[error("export busy: {0}")]
    Busy(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CoverError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn resource(msg: impl Into<String>) -> Self {
        Self::Resource(msg.into())
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    pub fn busy(msg: impl Into<String>) -> Self {
        Self::Busy(msg.into())
    }

    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

impl From<serde_json::Error> for CoverError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serde(e.to_string())
    }
}
