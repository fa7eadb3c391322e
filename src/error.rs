//! Crate-wide error types.
//!
//! Library modules use specific error types via `thiserror`
//! ([`FetchError`], [`ResolveError`], [`ConfigError`]); this module
//! aggregates them for callers that don't care which layer failed. The CLI
//! uses `anyhow` on top.
//!
//! Note that resolving a cover never fails from the UI's point of view:
//! [`CoverArtResolver::resolve`](crate::cover::CoverArtResolver::resolve)
//! degrades every failure to "no image".

use std::path::PathBuf;

use crate::config::ConfigError;
use crate::cover::ResolveError;
use crate::fetch::FetchError;

/// Crate-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Remote fetch error
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Cover resolution error
    #[error("Cover error: {0}")]
    Resolve(#[from] ResolveError),

    /// Image encoding error
    #[error("Image error for {path}: {message}")]
    Image { path: PathBuf, message: String },

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Create an image error.
    pub fn image(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Image {
            path: path.into(),
            message: message.into(),
        }
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

impl<T> ResultExt<T> for std::result::Result<T, FetchError> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::Fetch(e).context(ctx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::image("/covers/out.png", "unsupported extension");
        let msg = err.to_string();
        assert!(msg.contains("/covers/out.png"));
        assert!(msg.contains("unsupported extension"));
    }

    #[test]
    fn test_error_with_context() {
        let err = Error::from(FetchError::Timeout("http://a/b.jpg".to_string()))
            .context("while fetching cover");
        let msg = err.to_string();
        assert!(msg.contains("while fetching cover"));
        assert!(msg.contains("http://a/b.jpg"));
    }

    #[test]
    fn test_result_ext_io() {
        let result: std::result::Result<(), std::io::Error> =
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        let with_ctx = result.with_context("reading cover");
        assert!(with_ctx.unwrap_err().to_string().contains("reading cover"));
    }

    #[test]
    fn test_resolve_error_converts() {
        let err: Error = ResolveError::Decode("bad header".to_string()).into();
        assert!(err.to_string().contains("bad header"));
    }
}
