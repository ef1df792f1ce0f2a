//! Command-line interface parsing for folio
//!
//! This module handles parsing of CLI arguments using clap and turns them into
//! the API and cache configuration used at startup.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use thiserror::Error;

use crate::config::{ApiConfig, CacheConfig};

/// Error types for CLI argument validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CliError {
    /// Base URL is not an http(s) URL
    #[error("Invalid base URL: '{0}'. Expected an http:// or https:// URL")]
    InvalidBaseUrl(String),

    /// `blog` was given a blank slug
    #[error("Invalid slug: a blog slug cannot be empty")]
    EmptySlug,
}

/// folio - Browse portfolio blog posts and projects from the terminal
#[derive(Parser, Debug)]
#[command(name = "folio")]
#[command(about = "Browse portfolio blog posts and projects from the terminal")]
#[command(version)]
pub struct Cli {
    /// API base URL, including the version prefix
    #[arg(long, global = true, value_name = "URL")]
    pub base_url: Option<String>,

    /// Retries after the first failed attempt
    #[arg(long, global = true, value_name = "N")]
    pub max_retries: Option<u32>,

    /// Base backoff between attempts in milliseconds (grows 1.5x per retry)
    #[arg(long, global = true, value_name = "MS")]
    pub retry_delay_ms: Option<u64>,

    /// Per-request timeout in seconds
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout_secs: Option<u64>,

    /// Directory for cached responses (defaults to the XDG cache dir)
    #[arg(long, global = true, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Skip the response cache entirely
    #[arg(long, global = true)]
    pub no_cache: bool,

    /// Keep cached responses in memory only, leaving the cache dir untouched
    #[arg(long, global = true)]
    pub no_persist: bool,

    /// Print JSON instead of formatted text
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// List blog posts
    Blogs,

    /// Show a single blog post
    Blog {
        /// Post slug, as shown in the blog list
        slug: String,
    },

    /// List projects
    Projects {
        /// Only featured projects
        #[arg(long)]
        featured: bool,
    },

    /// Inspect or clear cached responses
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum CacheAction {
    /// Remove one cached entry, or all of them
    Clear {
        /// Logical key such as `blogs` or `blog_<slug>`; omit to clear everything
        key: Option<String>,
    },

    /// Show cached entries and their age
    Status,
}

/// Configuration derived from CLI arguments for application startup
#[derive(Debug, Clone, PartialEq)]
pub struct StartupConfig {
    pub api: ApiConfig,
    pub cache: CacheConfig,
    /// Whether responses go through the cache
    pub use_cache: bool,
    /// Whether the cache is backed by files rather than memory
    pub persist_cache: bool,
    pub json: bool,
    pub verbose: bool,
    pub command: Command,
}

impl StartupConfig {
    /// Creates a StartupConfig from parsed CLI arguments.
    ///
    /// # Returns
    /// * `Ok(StartupConfig)` with defaults overridden by any given flags
    /// * `Err(CliError)` if the base URL or slug is invalid
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let mut api = ApiConfig::default();
        if let Some(base_url) = &cli.base_url {
            validate_base_url(base_url)?;
            api = api.with_base_url(base_url.as_str());
        }
        if let Some(max_retries) = cli.max_retries {
            api.max_retries = max_retries;
        }
        if let Some(ms) = cli.retry_delay_ms {
            api.retry_delay = Duration::from_millis(ms);
        }
        if let Some(secs) = cli.timeout_secs {
            api.timeout = Some(Duration::from_secs(secs));
        }

        let cache = CacheConfig {
            dir: cli.cache_dir.clone(),
            ..CacheConfig::default()
        };

        let command = match &cli.command {
            Command::Blog { slug } => {
                let slug = slug.trim();
                if slug.is_empty() {
                    return Err(CliError::EmptySlug);
                }
                Command::Blog {
                    slug: slug.to_string(),
                }
            }
            other => other.clone(),
        };

        Ok(StartupConfig {
            api,
            cache,
            use_cache: !cli.no_cache,
            persist_cache: !cli.no_persist,
            json: cli.json,
            verbose: cli.verbose,
            command,
        })
    }
}

fn validate_base_url(url: &str) -> Result<(), CliError> {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"));
    match rest {
        Some(host) if !host.trim_matches('/').is_empty() => Ok(()),
        _ => Err(CliError::InvalidBaseUrl(url.to_string())),
    }
}
