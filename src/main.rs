//! folio - Browse portfolio blog posts and projects from the terminal
//!
//! Fetches records from the portfolio API through the response cache and
//! prints them as text or JSON.

use std::process::ExitCode;
use std::sync::Arc;

use chrono::Utc;
use clap::Parser;
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use folio::api::{encode_slug, ApiClient};
use folio::cache::{CacheProvider, FileStorage, MemoryStorage, Storage, TtlCache};
use folio::cli::{CacheAction, Cli, Command, StartupConfig};
use folio::config::CacheConfig;
use folio::data::{Loaded, Portfolio, PortfolioError};
use folio::refresh::CachedFetcher;
use folio::render::{
    render_blog_detail, render_blog_list, render_project_list, Placeholder,
};

type AppCache = TtlCache<Box<dyn Storage>>;

/// Sets up stderr logging; `RUST_LOG` overrides the default filter.
fn init_logging(verbose: bool) {
    let filter = if verbose { "folio=debug,warn" } else { "folio=warn" };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Opens the on-disk cache, falling back to memory without a cache dir
fn open_cache(config: &CacheConfig, persist: bool) -> AppCache {
    if !persist {
        let storage: Box<dyn Storage> = Box::new(MemoryStorage::new());
        return TtlCache::new(storage, config);
    }

    let storage: Box<dyn Storage> = match config.dir.clone().map(FileStorage::with_dir) {
        Some(storage) => Box::new(storage),
        None => match FileStorage::new() {
            Some(storage) => Box::new(storage),
            None => {
                warn!("no cache directory available, caching in memory only");
                Box::new(MemoryStorage::new())
            }
        },
    };
    TtlCache::new(storage, config)
}

/// Prints a loaded value, or the error placeholder
///
/// Returns whether anything was loaded.
fn emit<T: Serialize>(
    result: Result<Loaded<T>, PortfolioError>,
    as_json: bool,
    render: impl FnOnce(&T) -> String,
) -> bool {
    match result {
        Ok(loaded) => {
            if loaded.from_cache {
                info!("served from cache, refreshing in background");
            }
            if as_json {
                let body = json!({
                    "success": true,
                    "fromCache": loaded.from_cache,
                    "data": loaded.value,
                });
                println!("{}", pretty(&body));
            } else {
                println!("{}", render(&loaded.value).trim_end());
            }
            true
        }
        Err(e) => {
            if as_json {
                println!("{}", pretty(&json!({ "success": false, "error": e.to_string() })));
            } else {
                println!("{}", Placeholder::Error(Some(e.to_string())).render());
            }
            eprintln!("Error: {}", e);
            false
        }
    }
}

fn pretty(value: &serde_json::Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

fn cache_status(cache: &AppCache, as_json: bool) {
    let now = Utc::now().timestamp_millis();
    let rows: Vec<_> = cache
        .keys()
        .into_iter()
        .filter_map(|key| {
            let entry = cache.entry(&key)?;
            Some((key, entry.age_ms(now), entry.is_valid(now, cache.ttl())))
        })
        .collect();

    if as_json {
        let entries: Vec<_> = rows
            .iter()
            .map(|(key, age_ms, valid)| json!({ "key": key, "ageMs": age_ms, "valid": valid }))
            .collect();
        println!("{}", pretty(&json!({ "entries": entries })));
        return;
    }

    if rows.is_empty() {
        println!("{}", Placeholder::Empty(Some("Cache is empty.".to_string())).render());
        return;
    }
    for (key, age_ms, valid) in rows {
        let state = if valid { "fresh" } else { "expired" };
        println!("{:<32} {:>6}s  {}", key, age_ms / 1000, state);
    }
}

async fn run(config: StartupConfig) -> Result<bool, Box<dyn std::error::Error>> {
    let cache = Arc::new(open_cache(&config.cache, config.persist_cache));

    if let Command::Cache { action } = &config.command {
        match action {
            CacheAction::Clear { key: Some(key) } => {
                cache.clear(key);
                println!("Cleared cache entry '{}'", key);
            }
            CacheAction::Clear { key: None } => {
                cache.clear_all();
                println!("Cleared all cache entries");
            }
            CacheAction::Status => cache_status(&cache, config.json),
        }
        return Ok(true);
    }

    let client = ApiClient::new(&config.api)?;
    let portfolio = if config.use_cache {
        let provider: Arc<dyn CacheProvider> = cache;
        Portfolio::new(client, CachedFetcher::new(provider))
    } else {
        Portfolio::uncached(client)
    };

    let ok = match &config.command {
        Command::Blogs => emit(portfolio.blogs().await, config.json, |blogs| {
            render_blog_list(blogs)
        }),
        Command::Blog { slug } => emit(
            portfolio.blog(&encode_slug(slug)).await,
            config.json,
            render_blog_detail,
        ),
        Command::Projects { featured } => {
            let result = if *featured {
                portfolio.featured_projects().await
            } else {
                portfolio.projects().await
            };
            emit(result, config.json, |projects| render_project_list(projects))
        }
        Command::Cache { .. } => true,
    };

    // Let background refreshes finish before the runtime shuts down
    portfolio.settle().await;
    Ok(ok)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match StartupConfig::from_cli(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    init_logging(config.verbose);

    match run(config).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
