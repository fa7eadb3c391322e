//! Cover art resolution and caching.
//!
//! A UI asks for a cover with an opaque request id (`local|cover|page`,
//! percent-encoded) and a size. Covers come from, in order:
//!
//! 1. **Memory** - scaled images, bounded LRU
//! 2. **Cache file** - raw bytes at the request's local path
//! 3. **Remote fetch** - the page's real cover (e.g. a YouTube thumbnail) or
//!    the feed's cover URL, persisted to the cache file
//!
//! # Design Principles
//!
//! - **Non-blocking**: all I/O is async, decoding runs on the blocking pool
//! - **Graceful degradation**: a missing or broken cover is just `None`
//! - **One fetch per cover**: concurrent identical requests share work

pub mod disk;
mod flight;
mod key;
mod memory;
mod provider;
mod resolver;
mod scale;

pub use disk::CacheDir;
pub use flight::SingleFlight;
pub use key::{KeyError, RequestKey};
pub use memory::{CacheKey, FailureLog, MemoryCache};
pub use provider::{CoverArtProvider, ProvidedImage};
pub use resolver::{CoverArtResolver, ResolveError, ResolveResult, ResolverOptions};
pub use scale::{CoverImage, ScaleMode, Size, decode_and_scale, expanded_size};
