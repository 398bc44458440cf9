//! Application-wide error types.
//!
//! Library modules use specific error types via `thiserror`, while
//! CLI/main uses `anyhow` for convenient error propagation.
//!
//! - [`Error`]: Top-level application error enum
//! - Module-specific errors ([`ConfigError`], [`SettingsError`],
//!   [`CacheError`]) convert into it with `?`
//!
//! [`ConfigError`]: crate::patterns::ConfigError
//! [`SettingsError`]: crate::config::SettingsError
//! [`CacheError`]: crate::cache::CacheError

use std::path::PathBuf;

/// Application-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level application error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid pattern document
    #[error("Pattern error: {0}")]
    Patterns(#[from] crate::patterns::ConfigError),

    /// Settings could not be persisted
    #[error("Settings error: {0}")]
    Settings(#[from] crate::config::SettingsError),

    #[error("Cache error: {0}")]
    Cache(#[from] crate::cache::CacheError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Worker pool could not be started
    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// File organization error
    #[error("Organization error: {0}")]
    Organization(String),

    /// File or directory not found
    #[error("Not found: {0}")]
    NotFound(PathBuf),

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Create a not found error.
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::NotFound(path.into())
    }

    /// Create an organization error.
    pub fn organization(message: impl Into<String>) -> Self {
        Self::Organization(message.into())
    }

    /// Add context to an error.
    pub fn context(self, ctx: impl Into<String>) -> Self {
        Self::WithContext {
            context: ctx.into(),
            source: Box::new(self),
        }
    }
}

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn with_context(self, ctx: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.context(ctx))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, std::io::Error> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::Io(e).context(ctx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::ConfigError;

    #[test]
    fn test_error_display() {
        let err = Error::not_found("/samples/kick.wav");
        assert!(err.to_string().contains("/samples/kick.wav"));
    }

    #[test]
    fn test_error_with_context() {
        let err = Error::organization("destination is a file").context("while creating DRUMS/KICK");
        let msg = err.to_string();
        assert!(msg.contains("while creating DRUMS/KICK"));
        assert!(msg.contains("destination is a file"));
    }

    #[test]
    fn test_pattern_error_converts() {
        let err: Error = ConfigError::EmptyFolderStructure.into();
        assert!(matches!(err, Error::Patterns(_)));
    }

    #[test]
    fn test_result_ext() {
        let result: Result<()> = Err(Error::organization("test"));
        let with_ctx = result.with_context("additional context");
        assert!(with_ctx.unwrap_err().to_string().contains("additional context"));

        let io: std::io::Result<()> = Err(std::io::Error::other("disk full"));
        let err = io.with_context("writing report").unwrap_err();
        assert!(matches!(err, Error::WithContext { .. }));
    }
}
