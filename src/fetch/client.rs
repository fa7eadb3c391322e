//! HTTP client for cover images and pages.

use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use super::{CoverFetcher, FetchError};
use crate::config::NetworkConfig;

/// reqwest-backed fetcher. Every request is bounded by the client timeout.
pub struct HttpFetcher {
    http_client: reqwest::Client,
}

impl HttpFetcher {
    /// Create a fetcher with the given timeout and user agent
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, FetchError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;
        Ok(Self { http_client })
    }

    pub fn from_config(network: &NetworkConfig) -> Result<Self, FetchError> {
        Self::new(network.timeout(), &network.user_agent)
    }

    /// Download the body at `url`
    pub async fn get(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let parsed = parse_http_url(url)?;

        let response = self
            .http_client
            .get(parsed)
            .send()
            .await
            .map_err(|e| request_error(url, e))?;

        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound(url.to_string()));
        }

        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let data = response
            .bytes()
            .await
            .map_err(|e| request_error(url, e))?
            .to_vec();

        if data.is_empty() {
            return Err(FetchError::EmptyBody(url.to_string()));
        }

        tracing::debug!("Fetched {} bytes from {}", data.len(), url);
        Ok(data)
    }
}

#[async_trait]
impl CoverFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        self.get(url).await
    }
}

fn parse_http_url(url: &str) -> Result<Url, FetchError> {
    let parsed = Url::parse(url).map_err(|e| FetchError::InvalidUrl {
        url: url.to_string(),
        message: e.to_string(),
    })?;

    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(FetchError::InvalidUrl {
            url: url.to_string(),
            message: format!("unsupported scheme {other:?}"),
        }),
    }
}

fn request_error(url: &str, e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout(url.to_string())
    } else {
        FetchError::Network(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fetcher() -> HttpFetcher {
        HttpFetcher::new(Duration::from_secs(5), "podcover-test").unwrap()
    }

    #[tokio::test]
    async fn test_fetch_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/cover.png")
            .with_status(200)
            .with_header("content-type", "image/png")
            .with_body(b"png bytes")
            .create_async()
            .await;

        let url = format!("{}/cover.png", server.url());
        let data = fetcher().fetch(&url).await.unwrap();

        assert_eq!(data, b"png bytes");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_not_found() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/missing.jpg")
            .with_status(404)
            .create_async()
            .await;

        let url = format!("{}/missing.jpg", server.url());
        let result = fetcher().fetch(&url).await;
        assert!(matches!(result, Err(FetchError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_fetch_server_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/broken.jpg")
            .with_status(503)
            .create_async()
            .await;

        let url = format!("{}/broken.jpg", server.url());
        let result = fetcher().fetch(&url).await;
        assert!(matches!(result, Err(FetchError::Status { status: 503, .. })));
    }

    #[tokio::test]
    async fn test_fetch_empty_body() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/empty.jpg")
            .with_status(200)
            .create_async()
            .await;

        let url = format!("{}/empty.jpg", server.url());
        let result = fetcher().fetch(&url).await;
        assert!(matches!(result, Err(FetchError::EmptyBody(_))));
    }

    #[tokio::test]
    async fn test_rejects_non_http_urls() {
        let result = fetcher().fetch("ftp://example.com/cover.jpg").await;
        assert!(matches!(result, Err(FetchError::InvalidUrl { .. })));

        let result = fetcher().fetch("").await;
        assert!(matches!(result, Err(FetchError::InvalidUrl { .. })));
    }
}
