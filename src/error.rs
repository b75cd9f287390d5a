//! Crate-level error type for crawl operations.

/// Error surfaced by the crate's run entry points.
///
/// Internals propagate `anyhow::Error` with context; it is folded into
/// `Other` at the boundary with the full chain preserved.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ScrapeError {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
    /// Browser launch/session error
    #[error("browser error: {0}")]
    Browser(String),
    /// Durable-storage error
    #[error("storage error: {0}")]
    Storage(String),
    /// Other errors
    #[error("crawl error: {0}")]
    Other(String),
}

impl From<anyhow::Error> for ScrapeError {
    fn from(err: anyhow::Error) -> Self {
        // {:#} preserves the full context chain
        Self::Other(format!("{err:#}"))
    }
}

/// Convenience alias for Result with [`ScrapeError`].
pub type ScrapeResult<T> = Result<T, ScrapeError>;
