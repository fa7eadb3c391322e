//! Cover resolution commands.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tokio::runtime::Runtime;

use super::cache::cache_dir;
use crate::config::Config;
use crate::cover::{CoverArtResolver, RequestKey, Size};
use crate::fetch::{HttpFetcher, PageCoverResolver, YouTubeCoverResolver};

/// Resolve a request id and optionally save the result
pub fn cmd_resolve(
    rt: &Runtime,
    config: &Config,
    id: &str,
    size: Size,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let resolver = CoverArtResolver::from_config(config)?;

    let image = rt
        .block_on(resolver.try_resolve(id, size))
        .with_context(|| format!("No cover for {id}"))?;

    println!("Resolved cover: {} (requested {})", image.size(), size);

    if let Some(path) = output {
        image
            .save(path)
            .map_err(|e| crate::Error::image(path, e.to_string()))?;
        println!("Saved to {}", path.display());
    }
    Ok(())
}

/// Print the request id for a feed
pub fn cmd_key(
    config: &Config,
    cover_url: &str,
    page_url: &str,
    local_path: Option<&Path>,
) -> anyhow::Result<()> {
    if cover_url.is_empty() && page_url.is_empty() {
        anyhow::bail!("Need a cover URL or a page URL");
    }

    let key = match local_path {
        Some(path) => RequestKey::new(path, cover_url, page_url),
        None => cache_dir(config).key_for(cover_url, page_url),
    };

    println!("{}", key.encode());
    Ok(())
}

/// Print the real cover URL behind a page
pub fn cmd_page_cover(rt: &Runtime, config: &Config, url: &str) -> anyhow::Result<()> {
    let fetcher = Arc::new(HttpFetcher::from_config(&config.network)?);
    let pages = YouTubeCoverResolver::new(fetcher);

    match rt.block_on(pages.real_cover_url(url))? {
        Some(cover) => println!("{cover}"),
        None => println!("No cover found for {url}"),
    }
    Ok(())
}
