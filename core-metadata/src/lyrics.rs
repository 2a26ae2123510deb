//! # Lyrics Search Module
//!
//! Searches external services for synced (LRC) lyrics and saves the first
//! acceptable result next to the audio file.
//!
//! ## Features
//!
//! - Ordered provider list per request; the first provider with an
//!   acceptable result wins
//! - Synced-only by default, plain text on request
//! - Optional word-level ("enhanced") timing where the provider has it
//! - Provider failures are logged and treated as a miss for that provider
//!
//! ## Usage
//!
//! ```rust,ignore
//! use core_metadata::lyrics::{LyricsSearch, LyricsSearchRequest, LyricsService, LyricsSource};
//!
//! let service = LyricsService::new(http_client);
//!
//! let request = LyricsSearchRequest::new(
//!     "Foo Bar",
//!     vec![LyricsSource::LrcLib, LyricsSource::NetEase],
//!     "/music/song.lrc",
//! );
//!
//! if let Some(source) = service.search(&request).await? {
//!     println!("Saved lyrics from: {}", source.display_name());
//! }
//! ```

use crate::error::{MetadataError, Result};
use async_trait::async_trait;
use bridge_traits::http::HttpClient;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::providers::{LrcLibProvider, NetEaseProvider};

// =============================================================================
// Core Types
// =============================================================================

/// Lyrics source providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LyricsSource {
    /// LRCLib - Free, open-source synced lyrics
    LrcLib,
    /// NetEase Cloud Music
    NetEase,
}

impl LyricsSource {
    /// Get source name as string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LrcLib => "lrclib",
            Self::NetEase => "netease",
        }
    }

    /// Get human-readable display name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::LrcLib => "LRCLib",
            Self::NetEase => "NetEase",
        }
    }
}

impl fmt::Display for LyricsSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for LyricsSource {
    type Err = MetadataError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lrclib" => Ok(Self::LrcLib),
            "netease" => Ok(Self::NetEase),
            _ => Err(MetadataError::UnknownProvider(s.trim().to_string())),
        }
    }
}

/// What a single provider is asked for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LyricsSearchQuery {
    /// Free-form search term, usually "title artist"
    pub term: String,
    /// Accept lyrics without timestamps
    pub allow_plain_format: bool,
    /// Prefer word-level timing
    pub enhanced: bool,
}

impl LyricsSearchQuery {
    /// Synced-only, line-level query
    pub fn new(term: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            allow_plain_format: false,
            enhanced: false,
        }
    }
}

/// Lyrics fetch result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LyricsResult {
    /// Lyrics text (plain or LRC format)
    pub text: String,
    /// Whether the provider reported the lyrics as synced
    pub is_synced: bool,
    /// Source of lyrics
    pub source: LyricsSource,
}

impl LyricsResult {
    pub fn new(text: impl Into<String>, is_synced: bool, source: LyricsSource) -> Self {
        Self {
            text: text.into(),
            is_synced,
            source,
        }
    }

    /// Check if lyrics are valid LRC format
    ///
    /// At least one line has to open with a `[mm:ss` timestamp; tag lines
    /// such as `[ar:Artist]` alone do not count.
    pub fn is_valid_lrc(&self) -> bool {
        self.is_synced && self.text.lines().any(has_timestamp)
    }
}

fn has_timestamp(line: &str) -> bool {
    let Some(rest) = line.trim_start().strip_prefix('[') else {
        return false;
    };
    let Some((minutes, remainder)) = rest.split_once(':') else {
        return false;
    };
    !minutes.is_empty()
        && minutes.chars().all(|c| c.is_ascii_digit())
        && remainder.chars().next().is_some_and(|c| c.is_ascii_digit())
}

// =============================================================================
// Provider Trait
// =============================================================================

/// Trait for lyrics provider implementations
#[async_trait]
pub trait LyricsProvider: Send + Sync {
    /// Fetch lyrics for a search term
    ///
    /// # Returns
    /// * `Ok(Some(lyrics))` if lyrics found
    /// * `Ok(None)` if lyrics not found
    /// * `Err` if API error or network failure
    async fn fetch(&self, query: &LyricsSearchQuery) -> Result<Option<LyricsResult>>;

    /// Get the source identifier
    fn source(&self) -> LyricsSource;
}

// =============================================================================
// Composite Search
// =============================================================================

/// One composite search: every provider in `providers` is tried in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LyricsSearchRequest {
    /// Free-form search term
    pub query: String,
    /// Providers in priority order
    pub providers: Vec<LyricsSource>,
    /// Accept lyrics without timestamps
    pub allow_plain_format: bool,
    /// Prefer word-level timing
    pub enhanced: bool,
    /// Where the lyrics are written on success
    pub save_path: PathBuf,
}

impl LyricsSearchRequest {
    /// Synced-only, line-level request
    pub fn new(
        query: impl Into<String>,
        providers: Vec<LyricsSource>,
        save_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            query: query.into(),
            providers,
            allow_plain_format: false,
            enhanced: false,
            save_path: save_path.into(),
        }
    }

    pub fn allow_plain_format(mut self, allow: bool) -> Self {
        self.allow_plain_format = allow;
        self
    }

    pub fn enhanced(mut self, enhanced: bool) -> Self {
        self.enhanced = enhanced;
        self
    }

    fn provider_query(&self) -> LyricsSearchQuery {
        LyricsSearchQuery {
            term: self.query.clone(),
            allow_plain_format: self.allow_plain_format,
            enhanced: self.enhanced,
        }
    }
}

/// Composite lyrics search that persists its result.
#[async_trait]
pub trait LyricsSearch: Send + Sync {
    /// Search `request.providers` in order and write the first acceptable
    /// result to `request.save_path`.
    ///
    /// # Returns
    /// * `Ok(Some(source))` when lyrics were found and written
    /// * `Ok(None)` when no provider had acceptable lyrics
    /// * `Err` when the lyrics file could not be written
    async fn search(&self, request: &LyricsSearchRequest) -> Result<Option<LyricsSource>>;
}

/// Lyrics service coordinating the registered providers
pub struct LyricsService {
    providers: Vec<Box<dyn LyricsProvider>>,
}

impl LyricsService {
    /// Create a lyrics service with every built-in provider registered
    pub fn new(http_client: Arc<dyn HttpClient>) -> Self {
        let providers: Vec<Box<dyn LyricsProvider>> = vec![
            Box::new(LrcLibProvider::new(http_client.clone())),
            Box::new(NetEaseProvider::new(http_client)),
        ];

        Self { providers }
    }

    /// Create a service from explicit providers (for testing or custom sources)
    pub fn with_providers(providers: Vec<Box<dyn LyricsProvider>>) -> Self {
        Self { providers }
    }

    fn provider(&self, source: LyricsSource) -> Option<&dyn LyricsProvider> {
        self.providers
            .iter()
            .find(|provider| provider.source() == source)
            .map(|provider| provider.as_ref())
    }

    /// Whether `result` satisfies the request's format flags
    fn is_acceptable(result: &LyricsResult, request: &LyricsSearchRequest) -> bool {
        if result.text.trim().is_empty() {
            return false;
        }
        result.is_valid_lrc() || request.allow_plain_format
    }
}

#[async_trait]
impl LyricsSearch for LyricsService {
    async fn search(&self, request: &LyricsSearchRequest) -> Result<Option<LyricsSource>> {
        let query = request.provider_query();

        for source in &request.providers {
            let Some(provider) = self.provider(*source) else {
                warn!(provider = %source, "Lyrics provider not registered, skipping");
                continue;
            };

            debug!(provider = %source, query = %request.query, "Attempting to fetch lyrics");

            match provider.fetch(&query).await {
                Ok(Some(result)) if Self::is_acceptable(&result, request) => {
                    tokio::fs::write(&request.save_path, result.text.as_bytes()).await?;

                    info!(
                        provider = %source,
                        synced = result.is_synced,
                        path = %request.save_path.display(),
                        "Saved lyrics"
                    );
                    return Ok(Some(*source));
                }
                Ok(Some(_)) => {
                    debug!(provider = %source, "Only unsynced lyrics available");
                }
                Ok(None) => {
                    debug!(provider = %source, "Lyrics not found at provider");
                }
                Err(e) => {
                    warn!(provider = %source, error = %e, "Provider fetch failed");
                }
            }
        }

        Ok(None)
    }
}
