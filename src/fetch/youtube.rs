//! Real cover URLs for YouTube feeds.
//!
//! Podcast feeds generated from YouTube carry a generic cover. For video
//! URLs the thumbnail URL can be derived directly; for channel URLs the
//! channel page is fetched and its `og:image` is used.

use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use regex::Regex;
use url::Url;

use super::{CoverFetcher, FetchError, PageCoverResolver};

static VIDEO_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{11}$").expect("valid regex"));

static OG_IMAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?is)<meta\s[^>]*?(?:property|name)\s*=\s*["']og:image["'][^>]*?content\s*=\s*["']([^"']+)["']|<meta\s[^>]*?content\s*=\s*["']([^"']+)["'][^>]*?(?:property|name)\s*=\s*["']og:image["']"#,
    )
    .expect("valid regex")
});

static MEDIA_THUMBNAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<media:thumbnail\s[^>]*?url\s*=\s*["']([^"']+)["']"#).expect("valid regex")
});

/// What kind of YouTube page a URL points at
#[derive(Debug, Clone, PartialEq, Eq)]
enum YouTubePage {
    /// A single video, by id
    Video(String),
    /// A channel; holds the canonical channel page URL
    Channel(String),
}

/// Resolves YouTube page URLs to their real cover image.
pub struct YouTubeCoverResolver {
    fetcher: Arc<dyn CoverFetcher>,
}

impl YouTubeCoverResolver {
    /// `fetcher` is used to download channel pages
    pub fn new(fetcher: Arc<dyn CoverFetcher>) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl PageCoverResolver for YouTubeCoverResolver {
    async fn real_cover_url(&self, page_url: &str) -> Result<Option<String>, FetchError> {
        match classify(page_url) {
            Some(YouTubePage::Video(id)) => Ok(Some(thumbnail_url(&id))),
            Some(YouTubePage::Channel(channel_url)) => {
                let page = self.fetcher.fetch(&channel_url).await?;
                let cover = extract_cover(&String::from_utf8_lossy(&page));
                if cover.is_none() {
                    tracing::debug!("No cover found on channel page {}", channel_url);
                }
                Ok(cover)
            }
            None => Ok(None),
        }
    }
}

/// High quality thumbnail for a video id
fn thumbnail_url(video_id: &str) -> String {
    format!("https://i.ytimg.com/vi/{}/hqdefault.jpg", video_id)
}

fn classify(page_url: &str) -> Option<YouTubePage> {
    let url = Url::parse(page_url).ok()?;
    let host = url.host_str()?.to_ascii_lowercase();
    let host = ["www.", "m.", "music."]
        .iter()
        .find_map(|prefix| host.strip_prefix(prefix))
        .unwrap_or(host.as_str());

    let segments: Vec<&str> = url
        .path_segments()
        .map(|s| s.filter(|p| !p.is_empty()).collect())
        .unwrap_or_default();

    let query = |name: &str| {
        url.query_pairs()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.into_owned())
            .filter(|v| !v.is_empty())
    };

    match host {
        "youtu.be" => segments.first().and_then(|id| video(id)),
        "youtube.com" => match segments.as_slice() {
            ["watch"] => query("v").and_then(|id| video(&id)),
            ["shorts" | "embed" | "v" | "live", id, ..] => video(id),
            ["user", name, ..] => Some(channel(&format!("user/{name}"))),
            ["channel", id, ..] => Some(channel(&format!("channel/{id}"))),
            ["c", name, ..] => Some(channel(&format!("c/{name}"))),
            [handle, ..] if handle.starts_with('@') => Some(channel(handle)),
            ["feeds", "videos.xml"] => query("channel_id")
                .map(|id| channel(&format!("channel/{id}")))
                .or_else(|| query("user").map(|name| channel(&format!("user/{name}")))),
            ["rss", "user", name, ..] => Some(channel(&format!("user/{name}"))),
            // Old-style profile links still show up in long-lived feeds
            ["profile"] => query("user").map(|name| channel(&format!("user/{name}"))),
            _ => None,
        },
        _ => None,
    }
}

fn video(id: &str) -> Option<YouTubePage> {
    VIDEO_ID
        .is_match(id)
        .then(|| YouTubePage::Video(id.to_string()))
}

fn channel(path: &str) -> YouTubePage {
    YouTubePage::Channel(format!("https://www.youtube.com/{path}"))
}

/// Find the cover image URL in a channel page or feed
fn extract_cover(html: &str) -> Option<String> {
    let found = OG_IMAGE
        .captures(html)
        .and_then(|c| c.get(1).or_else(|| c.get(2)))
        .or_else(|| MEDIA_THUMBNAIL.captures(html).and_then(|c| c.get(1)))?;

    Some(found.as_str().replace("&amp;", "&"))
}
