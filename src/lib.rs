//! Podcover - cover art provider for podcast clients.
//!
//! Resolves opaque cover requests coming from a UI toolkit into decoded,
//! scaled images. Covers are served from a bounded in-memory cache, a local
//! cache file, or fetched over HTTP (with the real cover URL resolved from
//! video-hosting pages first) and persisted for next time.
//!
//! ```ignore
//! use podcover::cover::{CoverArtResolver, Size};
//!
//! let resolver = CoverArtResolver::from_config(&podcover::config::load())?;
//! let image = resolver.resolve(request_id, Size::new(100, 100)).await;
//! ```

pub mod cli;
pub mod config;
pub mod cover;
pub mod error;
pub mod fetch;
#[cfg(test)]
pub mod test_utils;

pub use error::{Error, Result};
