//! lrcfetch - Main entry point
//!
//! Crawls a file or directory, downloads synced lyrics next to every track
//! that lacks them and reports how many were downloaded.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use bridge_desktop::ReqwestHttpClient;
use bridge_traits::LogLevel;
use clap::Parser;
use core_metadata::{LyricsService, MetadataExtractor};
use core_runtime::config::DEFAULT_LEDGER_FILE;
use core_runtime::{build_dispatch, FetchConfig, LogFormat, LoggingConfig};
use core_sync::{CrawlCoordinator, FetchOrchestrator};

/// Command-line arguments for lrcfetch
#[derive(Parser, Debug)]
#[command(name = "lrcfetch")]
#[command(about = "Download synced .lrc lyrics for a music library")]
#[command(version)]
struct Args {
    /// Directory or file path
    #[arg(short, long)]
    path: PathBuf,

    /// Genres to skip (case-insensitive substring match)
    #[arg(short = 'g', long, num_args = 1.., alias = "blacklisted_genres")]
    blacklisted_genres: Vec<String>,

    /// Log level (trace, debug, info, warning, error)
    #[arg(short, long, default_value = "info", alias = "log_level")]
    log_level: LogLevel,

    /// Log output format (pretty, compact, json)
    #[arg(long, default_value = "compact")]
    log_format: LogFormat,

    /// File recording lookups that found no lyrics
    #[arg(long, default_value = DEFAULT_LEDGER_FILE, env = "LRCFETCH_LEDGER")]
    ledger: PathBuf,

    /// Lyrics provider to try, in order (repeatable: lrclib, netease)
    #[arg(long = "provider")]
    providers: Vec<String>,

    /// Accept lyrics without timestamps
    #[arg(long)]
    allow_plain: bool,

    /// Ask for word-level timing where available
    #[arg(long)]
    enhanced: bool,

    /// HTTP request timeout in seconds
    #[arg(long, default_value_t = 30)]
    timeout: u64,
}

impl Args {
    fn fetch_config(&self) -> Result<FetchConfig> {
        let logging = LoggingConfig::default()
            .with_level(self.log_level)
            .with_format(self.log_format);

        let mut builder = FetchConfig::builder()
            .root(&self.path)
            .blacklisted_genres(self.blacklisted_genres.iter().cloned())
            .ledger_path(&self.ledger)
            .allow_plain_format(self.allow_plain)
            .enhanced(self.enhanced)
            .http_timeout(Duration::from_secs(self.timeout))
            .logging(logging);

        if !self.providers.is_empty() {
            builder = builder.providers(self.providers.iter().cloned());
        }

        builder.build().context("Invalid configuration")
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = args.fetch_config()?;

    let dispatch =
        build_dispatch(&config.logging).context("Failed to initialize logging")?;

    let http_client = Arc::new(
        ReqwestHttpClient::with_timeout(config.http_timeout)
            .context("Failed to create HTTP client")?,
    );

    let orchestrator = FetchOrchestrator::new(
        &config,
        Arc::new(MetadataExtractor::new()),
        Arc::new(LyricsService::new(http_client)),
        dispatch,
    )
    .await
    .context("Failed to initialize fetch orchestrator")?;

    let summary = CrawlCoordinator::new(orchestrator)
        .run(&config.root)
        .await
        .with_context(|| format!("Failed to crawl {}", config.root.display()))?;

    println!("Successfully downloaded {} .lrc files!", summary.fetched);

    Ok(())
}
