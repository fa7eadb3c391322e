//! Mock fetchers for testing.
//!
//! Return canned responses and record every URL they were asked for, so
//! tests can assert on network traffic without a network.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{CoverFetcher, FetchError, PageCoverResolver};

/// Fetcher serving bytes from a URL map. Unknown URLs are `NotFound`.
#[derive(Default)]
pub struct MockFetcher {
    responses: HashMap<String, Vec<u8>>,
    delay: Option<Duration>,
    calls: Mutex<Vec<String>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` for `url`
    pub fn with_response(mut self, url: &str, body: Vec<u8>) -> Self {
        self.responses.insert(url.to_string(), body);
        self
    }

    /// Sleep before answering, to keep requests in flight
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// URLs fetched so far, in order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl CoverFetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        self.calls.lock().push(url.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.responses
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(url.to_string()))
    }
}

/// Page resolver with a fixed page → cover mapping.
#[derive(Default)]
pub struct MockPageResolver {
    covers: HashMap<String, String>,
    fail: bool,
}

impl MockPageResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cover(mut self, page_url: &str, cover_url: &str) -> Self {
        self.covers.insert(page_url.to_string(), cover_url.to_string());
        self
    }

    /// Fail every lookup with a network error
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl PageCoverResolver for MockPageResolver {
    async fn real_cover_url(&self, page_url: &str) -> Result<Option<String>, FetchError> {
        if self.fail {
            return Err(FetchError::Network("mock page lookup failed".to_string()));
        }
        Ok(self.covers.get(page_url).cloned())
    }
}
