//! LRCLib API Client
//!
//! Searches the free LRCLib database (<https://lrclib.net>) with a
//! free-form query. No API key or rate limiting is required.

use async_trait::async_trait;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest};
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

use crate::error::{MetadataError, Result};
use crate::lyrics::{LyricsProvider, LyricsResult, LyricsSearchQuery, LyricsSource};

const LRCLIB_API_BASE: &str = "https://lrclib.net/api";

/// LRCLib provider - Free, open-source synced lyrics
pub struct LrcLibProvider {
    http_client: Arc<dyn HttpClient>,
    base_url: String,
}

impl LrcLibProvider {
    pub fn new(http_client: Arc<dyn HttpClient>) -> Self {
        Self::with_base_url(http_client, LRCLIB_API_BASE)
    }

    /// Point the client at a different LRCLib instance
    pub fn with_base_url(http_client: Arc<dyn HttpClient>, base_url: impl Into<String>) -> Self {
        Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn search_url(&self, term: &str) -> String {
        format!("{}/search?q={}", self.base_url, urlencoding::encode(term))
    }

    /// Pick the first synced entry, or the first plain one when allowed
    fn select(entries: Vec<LrcLibEntry>, allow_plain_format: bool) -> Option<LyricsResult> {
        let mut plain = None;

        for entry in entries {
            if entry.instrumental {
                continue;
            }
            if let Some(synced) = entry.synced_lyrics.filter(|s| !s.trim().is_empty()) {
                return Some(LyricsResult::new(synced, true, LyricsSource::LrcLib));
            }
            if plain.is_none() && allow_plain_format {
                plain = entry
                    .plain_lyrics
                    .filter(|s| !s.trim().is_empty())
                    .map(|text| LyricsResult::new(text, false, LyricsSource::LrcLib));
            }
        }

        plain
    }
}

#[async_trait]
impl LyricsProvider for LrcLibProvider {
    async fn fetch(&self, query: &LyricsSearchQuery) -> Result<Option<LyricsResult>> {
        let request = HttpRequest::new(HttpMethod::Get, self.search_url(&query.term));
        let response = self.http_client.execute(request).await?;

        if response.status == 404 {
            return Ok(None);
        }

        if !response.is_success() {
            return Err(MetadataError::LyricsFetchFailed(format!(
                "LRCLib API error: HTTP {}",
                response.status
            )));
        }

        let entries: Vec<LrcLibEntry> = response
            .json()
            .map_err(|e| MetadataError::LyricsFetchFailed(format!("Parse error: {}", e)))?;

        debug!(results = entries.len(), "LRCLib search returned");

        Ok(Self::select(entries, query.allow_plain_format))
    }

    fn source(&self) -> LyricsSource {
        LyricsSource::LrcLib
    }
}

#[derive(Debug, Deserialize)]
struct LrcLibEntry {
    #[serde(default)]
    instrumental: bool,
    #[serde(default, rename = "syncedLyrics")]
    synced_lyrics: Option<String>,
    #[serde(default, rename = "plainLyrics")]
    plain_lyrics: Option<String>,
}
