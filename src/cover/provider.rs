//! Image provider for UI toolkits.
//!
//! Toolkits request images with `(id, requested size)` and expect the image
//! back together with its actual size. Most of them call providers from
//! their own worker threads, outside any async runtime, so the provider
//! keeps a runtime handle to drive the resolver.

use std::sync::Arc;

use tokio::runtime::Handle;

use super::key::RequestKey;
use super::resolver::CoverArtResolver;
use super::scale::{CoverImage, Size};

/// Result of an image request
#[derive(Debug, Clone, Default)]
pub struct ProvidedImage {
    pub image: Option<Arc<CoverImage>>,
    /// Size of the delivered image, zero when there is none
    pub size: Size,
}

impl ProvidedImage {
    fn new(image: Option<Arc<CoverImage>>) -> Self {
        let size = image.as_ref().map(|i| i.size()).unwrap_or(Size::ZERO);
        Self { image, size }
    }

    pub fn is_some(&self) -> bool {
        self.image.is_some()
    }
}

/// Toolkit-facing cover provider.
#[derive(Clone)]
pub struct CoverArtProvider {
    resolver: CoverArtResolver,
    runtime: Handle,
}

impl CoverArtProvider {
    pub fn new(resolver: CoverArtResolver, runtime: Handle) -> Self {
        Self { resolver, runtime }
    }

    pub fn resolver(&self) -> &CoverArtResolver {
        &self.resolver
    }

    /// Serve a request from async code.
    pub async fn request_image(&self, id: &str, requested: Size) -> ProvidedImage {
        ProvidedImage::new(self.resolver.resolve(id, requested).await)
    }

    /// Serve a request from a toolkit worker thread.
    ///
    /// Blocks the calling thread. Must not be called from inside the
    /// runtime's own async tasks.
    pub fn request_image_blocking(&self, id: &str, requested: Size) -> ProvidedImage {
        self.runtime.block_on(self.request_image(id, requested))
    }

    /// Start resolving a cover in the background, e.g. for items about to
    /// scroll into view. Returns false if the id is invalid.
    pub fn prefetch(&self, id: &str, size: Size) -> bool {
        match RequestKey::parse(id) {
            Ok(request) => {
                let _guard = self.runtime.enter();
                drop(self.resolver.prefetch(request, size));
                true
            }
            Err(e) => {
                tracing::debug!("Not prefetching {:?}: {}", id, e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cover::ResolverOptions;
    use crate::fetch::NoPageResolver;
    use crate::fetch::mocks::MockFetcher;
    use crate::test_utils::{key_in, png_bytes};
    use tempfile::TempDir;

    const COVER_URL: &str = "https://cdn.example.org/show.png";

    fn resolver(fetcher: Arc<MockFetcher>) -> CoverArtResolver {
        CoverArtResolver::new(fetcher, Arc::new(NoPageResolver), ResolverOptions::default())
    }

    #[tokio::test]
    async fn test_request_reports_delivered_size() {
        let temp = TempDir::new().unwrap();
        let fetcher = Arc::new(MockFetcher::new().with_response(COVER_URL, png_bytes(160, 90)));
        let provider = CoverArtProvider::new(resolver(fetcher), Handle::current());
        let key = key_in(&temp, "show", COVER_URL, "");

        let provided = provider
            .request_image(&key.encode(), Size::new(100, 100))
            .await;

        assert!(provided.is_some());
        assert_eq!(provided.size, Size::new(177, 100));
    }

    #[tokio::test]
    async fn test_missing_cover_has_zero_size() {
        let temp = TempDir::new().unwrap();
        let provider =
            CoverArtProvider::new(resolver(Arc::new(MockFetcher::new())), Handle::current());
        let key = key_in(&temp, "show", COVER_URL, "");

        let provided = provider.request_image(&key.encode(), Size::new(64, 64)).await;

        assert!(provided.image.is_none());
        assert_eq!(provided.size, Size::ZERO);
    }

    #[test]
    fn test_blocking_request_from_plain_thread() {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .unwrap();
        let temp = TempDir::new().unwrap();
        let fetcher = Arc::new(MockFetcher::new().with_response(COVER_URL, png_bytes(40, 40)));
        let provider = CoverArtProvider::new(resolver(fetcher), runtime.handle().clone());
        let id = key_in(&temp, "show", COVER_URL, "").encode();

        let worker = std::thread::spawn(move || provider.request_image_blocking(&id, Size::ZERO));
        let provided = worker.join().unwrap();

        assert_eq!(provided.size, Size::new(40, 40));
    }

    #[test]
    fn test_prefetch_rejects_invalid_id() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let fetcher = Arc::new(MockFetcher::new());
        let provider = CoverArtProvider::new(resolver(fetcher.clone()), runtime.handle().clone());

        assert!(!provider.prefetch("only|two", Size::new(10, 10)));
        assert!(!provider.prefetch("a|undefined|c", Size::new(10, 10)));
        assert_eq!(fetcher.call_count(), 0);
    }

    #[test]
    fn test_prefetch_warms_cache() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let temp = TempDir::new().unwrap();
        let fetcher = Arc::new(MockFetcher::new().with_response(COVER_URL, png_bytes(30, 30)));
        let provider = CoverArtProvider::new(resolver(fetcher.clone()), runtime.handle().clone());
        let key = key_in(&temp, "show", COVER_URL, "");

        assert!(provider.prefetch(&key.encode(), Size::new(15, 15)));

        // The blocking request joins or follows the prefetch; either way one fetch
        let provided = provider.request_image_blocking(&key.encode(), Size::new(15, 15));
        assert_eq!(provided.size, Size::new(15, 15));
        assert_eq!(fetcher.call_count(), 1);
    }
}
