//! Cover art resolver - turns request keys into scaled images.
//!
//! Resolution order for a `(request, size)` pair:
//! 1. Memory cache (scaled images, LRU)
//! 2. Local cache file at the request's path
//! 3. Remote fetch, from the page's real cover if the page resolver knows
//!    one, otherwise from the feed's cover URL. The bytes are written to the
//!    local cache file.
//!
//! Then decode, scale, cache in memory.
//!
//! # Design
//!
//! Everything is async and safe to call from many tasks at once. Identical
//! concurrent requests share a single resolution, and identical concurrent
//! downloads share a single fetch. Decoding and scaling run on the blocking
//! pool. Dropping every waiter of a resolution cancels it.
//!
//! Failures never reach the UI as errors: [`CoverArtResolver::resolve`]
//! just returns `None`. Use [`CoverArtResolver::try_resolve`] to find out why.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use super::disk;
use super::flight::SingleFlight;
use super::key::{KeyError, RequestKey};
use super::memory::{CacheKey, FailureLog, MemoryCache};
use super::scale::{self, CoverImage, ScaleMode, Size};
use crate::config::Config;
use crate::fetch::{CoverFetcher, HttpFetcher, PageCoverResolver, YouTubeCoverResolver};

/// Why a cover could not be produced
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("invalid request: {0}")]
    InvalidRequest(#[from] KeyError),

    #[error("could not fetch {url}: {message}")]
    Fetch { url: String, message: String },

    #[error("could not decode cover: {0}")]
    Decode(String),
}

pub type ResolveResult = Result<Arc<CoverImage>, ResolveError>;

/// Raw bytes of a completed download, shared between joined waiters
type Download = Result<Arc<[u8]>, ResolveError>;

/// Resolver tuning
#[derive(Debug, Clone)]
pub struct ResolverOptions {
    /// Maximum scaled covers kept in memory
    pub max_entries: usize,
    /// Maximum pixel bytes kept in memory (0 = unlimited)
    pub max_bytes: usize,
    /// Don't re-download a failed cover within this window
    pub failure_cooldown: Duration,
    /// Write an empty cache file when a download fails
    pub persist_failures: bool,
    pub scale_mode: ScaleMode,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for ResolverOptions {
    fn from(config: &Config) -> Self {
        Self {
            max_entries: config.cache.max_entries,
            max_bytes: config.cache.max_bytes,
            failure_cooldown: config.cache.failure_cooldown(),
            persist_failures: config.cache.persist_failures,
            scale_mode: config.scaling.mode,
        }
    }
}

/// Cover art resolver with memory caching and deduplicated fetching.
///
/// Cheap to clone; clones share caches.
#[derive(Clone)]
pub struct CoverArtResolver {
    inner: Arc<Inner>,
}

struct Inner {
    fetcher: Arc<dyn CoverFetcher>,
    pages: Arc<dyn PageCoverResolver>,
    memory: MemoryCache,
    failures: FailureLog,
    resolutions: SingleFlight<CacheKey, ResolveResult>,
    downloads: SingleFlight<RequestKey, Download>,
    options: ResolverOptions,
}

impl CoverArtResolver {
    pub fn new(
        fetcher: Arc<dyn CoverFetcher>,
        pages: Arc<dyn PageCoverResolver>,
        options: ResolverOptions,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                fetcher,
                pages,
                memory: MemoryCache::new(options.max_entries, options.max_bytes),
                failures: FailureLog::new(options.failure_cooldown),
                resolutions: SingleFlight::new(),
                downloads: SingleFlight::new(),
                options,
            }),
        }
    }

    /// Create a resolver with an HTTP fetcher and YouTube page support.
    pub fn from_config(config: &Config) -> crate::Result<Self> {
        let fetcher: Arc<dyn CoverFetcher> = Arc::new(HttpFetcher::from_config(&config.network)?);
        let pages = Arc::new(YouTubeCoverResolver::new(Arc::clone(&fetcher)));
        Ok(Self::new(fetcher, pages, ResolverOptions::from(config)))
    }

    /// Resolve a request id to a scaled cover, or None.
    pub async fn resolve(&self, id: &str, size: Size) -> Option<Arc<CoverImage>> {
        match self.try_resolve(id, size).await {
            Ok(image) => Some(image),
            Err(e) => {
                tracing::debug!("No cover for {:?} at {}: {}", id, size, e);
                None
            }
        }
    }

    /// Resolve a request id, reporting why no cover could be produced.
    pub async fn try_resolve(&self, id: &str, size: Size) -> ResolveResult {
        let request = RequestKey::parse(id)?;
        self.resolve_key(request, size).await
    }

    /// Resolve an already parsed request.
    pub async fn resolve_key(&self, request: RequestKey, size: Size) -> ResolveResult {
        let key = CacheKey::new(request, size);
        if let Some(hit) = self.inner.memory.get(&key) {
            tracing::trace!("Memory cache hit for {}", key.request.local_path.display());
            return Ok(hit);
        }

        let inner = Arc::clone(&self.inner);
        let work_key = key.clone();
        self.inner
            .resolutions
            .run(key, move || inner.load(work_key))
            .await
    }

    /// Resolve in the background so a later `resolve` hits the cache.
    ///
    /// Must be called from within a tokio runtime.
    pub fn prefetch(&self, request: RequestKey, size: Size) -> JoinHandle<()> {
        let resolver = self.clone();
        tokio::spawn(async move {
            if let Err(e) = resolver.resolve_key(request, size).await {
                tracing::debug!("Prefetch failed: {}", e);
            }
        })
    }

    /// Whether a scaled cover is already in memory
    pub fn is_cached(&self, request: &RequestKey, size: Size) -> bool {
        self.inner
            .memory
            .contains(&CacheKey::new(request.clone(), size))
    }

    /// Number of scaled covers in memory
    pub fn cached_len(&self) -> usize {
        self.inner.memory.len()
    }

    /// Pixel bytes held in memory
    pub fn cached_bytes(&self) -> usize {
        self.inner.memory.bytes()
    }

    /// Drop all scaled covers from memory. Cache files are kept.
    pub fn clear_memory(&self) {
        self.inner.memory.clear();
    }

    pub fn options(&self) -> &ResolverOptions {
        &self.inner.options
    }
}

impl Inner {
    async fn load(self: Arc<Self>, key: CacheKey) -> ResolveResult {
        // A resolution that finished just before we started may have filled it
        if let Some(hit) = self.memory.get(&key) {
            return Ok(hit);
        }

        let bytes: Arc<[u8]> = match disk::read_cached(&key.request.local_path).await {
            Some(data) => {
                tracing::debug!("Using cache file {}", key.request.local_path.display());
                data.into()
            }
            None => self.download(&key.request).await?,
        };

        let size = key.size;
        let mode = self.options.scale_mode;
        let max_bytes = self.options.max_bytes;
        let image = tokio::task::spawn_blocking(move || decode_within(&bytes, size, mode, max_bytes))
            .await
            .map_err(|e| ResolveError::Decode(format!("decode task failed: {e}")))??;

        self.memory.insert(key, Arc::clone(&image));
        Ok(image)
    }

    async fn download(self: &Arc<Self>, request: &RequestKey) -> Download {
        let inner = Arc::clone(self);
        let work_request = request.clone();
        self.downloads
            .run(request.clone(), move || async move {
                inner.fetch_and_persist(work_request).await
            })
            .await
    }

    async fn fetch_and_persist(&self, request: RequestKey) -> Download {
        if self.failures.is_cooling_down(&request) {
            tracing::debug!(
                "Skipping download of {}, it failed recently",
                request.cover_url
            );
            return Err(ResolveError::Fetch {
                url: request.cover_url.clone(),
                message: "failed recently, waiting before retrying".to_string(),
            });
        }

        let url = self.cover_url_for(&request).await;
        let fetched = self.fetcher.fetch(&url).await;
        if let Err(e) = &fetched {
            tracing::error!("Error downloading cover {}: {}", url, e);
        }

        if fetched.is_ok() || self.options.persist_failures {
            let data = fetched.as_deref().unwrap_or_default();
            if let Err(e) = disk::write_cached(&request.local_path, data).await {
                tracing::warn!(
                    "Failed to write cache file {}: {}",
                    request.local_path.display(),
                    e
                );
            }
        }

        match fetched {
            Ok(data) => {
                self.failures.forget(&request);
                Ok(data.into())
            }
            Err(e) => {
                self.failures.record(request);
                Err(ResolveError::Fetch {
                    url,
                    message: e.to_string(),
                })
            }
        }
    }

    /// The page's real cover if the page resolver finds one, else the feed cover.
    ///
    /// A page resolver error deliberately falls back to the feed cover too,
    /// rather than counting as a failed download.
    async fn cover_url_for(&self, request: &RequestKey) -> String {
        if request.page_url.is_empty() {
            return request.cover_url.clone();
        }

        match self.pages.real_cover_url(&request.page_url).await {
            Ok(Some(url)) => {
                tracing::debug!("Using real cover {} for {}", url, request.page_url);
                url
            }
            Ok(None) => request.cover_url.clone(),
            Err(e) => {
                tracing::warn!(
                    "Could not look up real cover for {}: {}",
                    request.page_url,
                    e
                );
                request.cover_url.clone()
            }
        }
    }
}

/// Decode and scale, refusing scaled sizes that would blow the memory budget.
///
/// Expanding a very thin cover to cover a square box can ask for an enormous
/// buffer, so the scaled size is checked before any pixels are allocated.
fn decode_within(bytes: &[u8], target: Size, mode: ScaleMode, max_bytes: usize) -> ResolveResult {
    let decoded = scale::decode(bytes).map_err(|e| ResolveError::Decode(e.to_string()))?;
    let source = Size::new(decoded.width(), decoded.height());
    let scaled = scale::expanded_size(source, target);

    if max_bytes > 0 && scaled.rgba_bytes() > max_bytes as u64 {
        return Err(ResolveError::Decode(format!(
            "{} cover scaled to {} needs {} bytes, limit is {}",
            source,
            scaled,
            scaled.rgba_bytes(),
            max_bytes
        )));
    }

    Ok(Arc::new(scale::scale(decoded, target, mode)))
}
