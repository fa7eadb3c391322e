//! Local cover cache files.
//!
//! Each request key names the file its raw cover bytes live in. This module
//! reads and writes those files, and manages the default cache directory
//! that fresh keys are placed in.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use super::key::RequestKey;
use crate::error::{Result, ResultExt};

/// Read raw cover bytes from a cache file.
///
/// Returns None if the file is missing, unreadable or empty; all of these
/// mean the cover has to be fetched.
pub async fn read_cached(path: &Path) -> Option<Vec<u8>> {
    match tokio::fs::read(path).await {
        Ok(data) if data.is_empty() => {
            tracing::debug!("Cache file {:?} is empty", path);
            None
        }
        Ok(data) => Some(data),
        Err(e) if e.kind() == io::ErrorKind::NotFound => None,
        Err(e) => {
            tracing::warn!("Failed to read cache file {:?}: {}", path, e);
            None
        }
    }
}

/// Write raw cover bytes to a cache file, replacing what was there.
///
/// Parent directories are created as needed. The data goes to a uniquely
/// named temp file next to the target first, then gets renamed over it, so
/// concurrent writers of the same path never share a temp file. A path
/// without a file name is rejected before anything is written.
pub async fn write_cached(path: &Path, data: &[u8]) -> io::Result<()> {
    let Some(name) = path.file_name() else {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("cache path {:?} has no file name", path),
        ));
    };

    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."))
        .to_path_buf();
    tokio::fs::create_dir_all(&parent).await?;

    let prefix = format!(".{}.", name.to_string_lossy());
    let target = path.to_path_buf();
    let data = data.to_vec();
    tokio::task::spawn_blocking(move || -> io::Result<()> {
        let mut temp = tempfile::Builder::new()
            .prefix(&prefix)
            .suffix(".part")
            .tempfile_in(&parent)?;
        temp.write_all(&data)?;
        temp.persist(&target).map_err(|e| e.error)?;
        Ok(())
    })
    .await
    .map_err(io::Error::other)?
}

/// Directory holding cover cache files.
pub struct CacheDir {
    dir: PathBuf,
}

impl CacheDir {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The user cache directory (e.g. `~/.cache/podcover/covers`).
    pub fn default_location() -> Self {
        let dir = dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from(".cache"))
            .join("podcover")
            .join("covers");
        Self::new(dir)
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Cache file for a cover, named after the SHA-256 of its URL.
    pub fn file_for(&self, url: &str) -> PathBuf {
        let digest = Sha256::digest(url.as_bytes());
        self.dir.join(format!("{:x}", digest))
    }

    /// Build a request key for a feed, with its cache file in this directory.
    ///
    /// The file is named after the cover URL, or the page URL when the feed
    /// has no cover of its own.
    pub fn key_for(&self, cover_url: &str, page_url: &str) -> RequestKey {
        let name_source = if cover_url.is_empty() {
            page_url
        } else {
            cover_url
        };
        RequestKey::new(self.file_for(name_source), cover_url, page_url)
    }

    /// Remove all cached cover files.
    pub fn clear(&self) -> Result<usize> {
        if !self.dir.exists() {
            return Ok(0);
        }

        let mut removed = 0;
        let entries = fs::read_dir(&self.dir)
            .with_context(format!("reading cache directory {}", self.dir.display()))?;
        for entry in entries {
            let entry = entry.with_context("listing cache directory")?;
            if entry.file_type()?.is_file() {
                fs::remove_file(entry.path())
                    .with_context(format!("removing {}", entry.path().display()))?;
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Total size of cached files in bytes.
    pub fn size_bytes(&self) -> u64 {
        fs::read_dir(&self.dir)
            .map(|entries| {
                entries
                    .filter_map(|e| e.ok())
                    .filter_map(|e| e.metadata().ok())
                    .filter(|m| m.is_file())
                    .map(|m| m.len())
                    .sum()
            })
            .unwrap_or(0)
    }

    /// Number of cached files.
    pub fn file_count(&self) -> usize {
        fs::read_dir(&self.dir)
            .map(|entries| {
                entries
                    .filter_map(|e| e.ok())
                    .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
                    .count()
            })
            .unwrap_or(0)
    }
}
