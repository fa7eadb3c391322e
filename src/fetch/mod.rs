//! Remote cover retrieval.
//!
//! # Architecture
//!
//! - **Traits** ([`CoverFetcher`], [`PageCoverResolver`]) - the seams the
//!   resolver depends on, so tests can substitute mocks
//! - **Client** ([`HttpFetcher`]) - reqwest-backed fetcher with timeout
//! - **YouTube** ([`YouTubeCoverResolver`]) - finds the real cover for
//!   video and channel pages

mod client;
#[cfg(test)]
pub mod mocks;
mod youtube;

use async_trait::async_trait;

pub use client::HttpFetcher;
pub use youtube::YouTubeCoverResolver;

/// Errors that can occur while fetching remote data
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Invalid URL {url:?}: {message}")]
    InvalidUrl { url: String, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    #[error("Empty response from {0}")]
    EmptyBody(String),

    #[error("Failed to build HTTP client: {0}")]
    Client(String),
}

/// Downloads raw bytes from a URL.
///
/// Implement this trait to create mock implementations for testing.
#[async_trait]
pub trait CoverFetcher: Send + Sync {
    /// Fetch the body at `url`. An empty body is an error.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// Finds a better cover URL for a page, e.g. a video thumbnail.
#[async_trait]
pub trait PageCoverResolver: Send + Sync {
    /// Returns `Ok(None)` when the page isn't recognized or has no cover.
    async fn real_cover_url(&self, page_url: &str) -> Result<Option<String>, FetchError>;
}

/// Page resolver that never finds anything; feed covers are used as-is.
pub struct NoPageResolver;

#[async_trait]
impl PageCoverResolver for NoPageResolver {
    async fn real_cover_url(&self, _page_url: &str) -> Result<Option<String>, FetchError> {
        Ok(None)
    }
}
