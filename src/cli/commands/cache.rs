//! Cache and configuration commands.

use std::path::Path;

use crate::config::{self, Config};
use crate::cover::CacheDir;

/// The directory new cover files go to
pub(crate) fn cache_dir(config: &Config) -> CacheDir {
    match &config.cache.directory {
        Some(dir) => CacheDir::new(dir),
        None => CacheDir::default_location(),
    }
}

/// Show cache statistics, or clear the cache
pub fn cmd_cache(config: &Config, clear: bool) -> anyhow::Result<()> {
    let dir = cache_dir(config);

    if clear {
        let removed = dir.clear()?;
        println!("Removed {} cached covers from {}", removed, dir.path().display());
        return Ok(());
    }

    println!("Cache directory: {}", dir.path().display());
    println!("Cached covers:   {}", dir.file_count());
    println!("Total size:      {:.1} KiB", dir.size_bytes() as f64 / 1024.0);
    Ok(())
}

/// Show the effective config, or write a default config file
pub fn cmd_config(path: Option<&Path>, config: &Config, init: bool) -> anyhow::Result<()> {
    if init {
        let target = match path {
            Some(p) => p.to_path_buf(),
            None => config::config_path().ok_or(config::ConfigError::NoConfigDir)?,
        };
        if target.exists() {
            println!("Config file already exists at {}", target.display());
        } else {
            config::save_to(&Config::default(), &target)?;
            println!("Wrote default config to {}", target.display());
        }
        return Ok(());
    }

    if let Some(p) = path.map(Path::to_path_buf).or_else(config::config_path) {
        println!("# {}", p.display());
    }
    print!("{}", toml::to_string_pretty(config)?);
    Ok(())
}
