//! CLI command definitions and dispatch.
//!
//! Each group of subcommands lives in its own submodule:
//! - `resolve`: cover resolution, request ids and page covers
//! - `cache`: cover cache inspection and the config file

mod cache;
mod resolve;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tokio::runtime::Runtime;

use crate::config::{self, Config};
use crate::cover::Size;

pub use cache::{cmd_cache, cmd_config};
pub use resolve::{cmd_key, cmd_page_cover, cmd_resolve};

/// Podcover CLI
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file to use instead of the default location
    #[arg(long, global = true, env = "PODCOVER_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Resolve a request id to a scaled cover
    Resolve {
        /// Request id (`local|cover|page`, each field percent-encoded)
        id: String,
        /// Requested size as WIDTHxHEIGHT (0x0 = natural size)
        #[arg(short, long, default_value = "0x0")]
        size: Size,
        /// Write the scaled cover to this PNG file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Build a request id for a feed
    Key {
        /// Cover image URL from the feed
        cover_url: String,
        /// Page URL of the feed or episode
        #[arg(long, default_value = "")]
        page_url: String,
        /// Cache file path (default: named after the URL in the cache directory)
        #[arg(long)]
        local_path: Option<PathBuf>,
    },
    /// Show the real cover URL for a page, e.g. a YouTube video
    PageCover {
        /// Page URL
        url: String,
    },
    /// Show cover cache statistics
    Cache {
        /// Delete all cached cover files
        #[arg(long)]
        clear: bool,
    },
    /// Show the effective configuration
    Config {
        /// Write a config file with default values if none exists
        #[arg(long)]
        init: bool,
    },
}

/// Run the specified CLI command.
pub fn run_command(cli: &Cli) -> anyhow::Result<()> {
    let rt = Runtime::new()?;
    let config = load_config(cli);

    match &cli.command {
        Commands::Resolve { id, size, output } => {
            cmd_resolve(&rt, &config, id, *size, output.as_deref())
        }
        Commands::Key {
            cover_url,
            page_url,
            local_path,
        } => cmd_key(&config, cover_url, page_url, local_path.as_deref()),
        Commands::PageCover { url } => cmd_page_cover(&rt, &config, url),
        Commands::Cache { clear } => cmd_cache(&config, *clear),
        Commands::Config { init } => cmd_config(cli.config.as_deref(), &config, *init),
    }
}

fn load_config(cli: &Cli) -> Config {
    match &cli.config {
        Some(path) => config::load_from(path),
        None => config::load(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_resolve_with_size() {
        let cli = Cli::try_parse_from(["podcover", "resolve", "a|b|c", "--size", "100x50"]).unwrap();
        match cli.command {
            Commands::Resolve { id, size, output } => {
                assert_eq!(id, "a|b|c");
                assert_eq!(size, Size::new(100, 50));
                assert!(output.is_none());
            }
            _ => panic!("expected resolve"),
        }
    }

    #[test]
    fn test_resolve_size_defaults_to_natural() {
        let cli = Cli::try_parse_from(["podcover", "resolve", "a|b|c"]).unwrap();
        assert!(matches!(cli.command, Commands::Resolve { size: Size::ZERO, .. }));
    }

    #[test]
    fn test_bad_size_is_rejected() {
        assert!(Cli::try_parse_from(["podcover", "resolve", "a|b|c", "--size", "big"]).is_err());
    }

    #[test]
    fn test_global_config_flag() {
        let cli =
            Cli::try_parse_from(["podcover", "cache", "--config", "/tmp/podcover.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/podcover.toml")));
        assert!(matches!(cli.command, Commands::Cache { clear: false }));
    }

    #[test]
    fn test_key_uses_given_local_path() {
        let config = Config::default();
        assert!(cmd_key(&config, "", "", None).is_err());
        assert!(cmd_key(&config, "http://a/c.png", "", Some(std::path::Path::new("/tmp/c"))).is_ok());
    }
}
