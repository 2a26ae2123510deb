//! NetEase Cloud Music Client
//!
//! Two-step lookup against the public web API: a song search, then a lyric
//! request for the best hit. When word-level timing is requested the `yrc`
//! track is converted to enhanced LRC (`<mm:ss.xx>` word stamps).

use async_trait::async_trait;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

use crate::error::{MetadataError, Result};
use crate::lyrics::{LyricsProvider, LyricsResult, LyricsSearchQuery, LyricsSource};

const NETEASE_API_BASE: &str = "https://music.163.com/api";
const NETEASE_ORIGIN: &str = "https://music.163.com";

/// Number of search hits requested; only the first is used
const SEARCH_LIMIT: &str = "5";

/// NetEase provider - Synced lyrics with optional word timing
pub struct NetEaseProvider {
    http_client: Arc<dyn HttpClient>,
    base_url: String,
}

impl NetEaseProvider {
    pub fn new(http_client: Arc<dyn HttpClient>) -> Self {
        Self::with_base_url(http_client, NETEASE_API_BASE)
    }

    pub fn with_base_url(http_client: Arc<dyn HttpClient>, base_url: impl Into<String>) -> Self {
        Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn with_headers(request: HttpRequest) -> HttpRequest {
        request
            .header("Referer", format!("{}/", NETEASE_ORIGIN))
            .header("Origin", NETEASE_ORIGIN)
    }

    fn check_status(response: &HttpResponse, step: &str) -> Result<()> {
        if response.is_success() {
            Ok(())
        } else {
            Err(MetadataError::LyricsFetchFailed(format!(
                "NetEase {} error: HTTP {}",
                step, response.status
            )))
        }
    }

    async fn search_song_id(&self, term: &str) -> Result<Option<u64>> {
        let request = Self::with_headers(
            HttpRequest::new(HttpMethod::Post, format!("{}/search/get/web", self.base_url)).form(
                &[
                    ("s", term),
                    ("type", "1"),
                    ("offset", "0"),
                    ("limit", SEARCH_LIMIT),
                ],
            ),
        );

        let response = self.http_client.execute(request).await?;
        Self::check_status(&response, "search")?;

        let search: SearchResponse = response
            .json()
            .map_err(|e| MetadataError::LyricsFetchFailed(format!("Parse error: {}", e)))?;

        Ok(search
            .result
            .and_then(|result| result.songs.into_iter().next())
            .map(|song| song.id))
    }

    async fn fetch_lyrics(&self, song_id: u64, enhanced: bool) -> Result<LyricResponse> {
        let mut url = format!(
            "{}/song/lyric?id={}&lv=1&kv=1&tv=-1",
            self.base_url, song_id
        );
        if enhanced {
            url.push_str("&yv=1");
        }

        let response = self
            .http_client
            .execute(Self::with_headers(HttpRequest::new(HttpMethod::Get, url)))
            .await?;
        Self::check_status(&response, "lyric")?;

        response
            .json()
            .map_err(|e| MetadataError::LyricsFetchFailed(format!("Parse error: {}", e)))
    }

    fn select(lyrics: LyricResponse, query: &LyricsSearchQuery) -> Option<LyricsResult> {
        if query.enhanced {
            let converted = lyrics
                .yrc
                .as_ref()
                .map(|track| yrc_to_enhanced_lrc(&track.lyric))
                .filter(|text| !text.is_empty());
            if let Some(text) = converted {
                return Some(LyricsResult::new(text, true, LyricsSource::NetEase));
            }
        }

        let text = lyrics.lrc.map(|track| track.lyric)?;
        if text.trim().is_empty() {
            return None;
        }

        let result = LyricsResult::new(text, true, LyricsSource::NetEase);
        if result.is_valid_lrc() {
            Some(result)
        } else if query.allow_plain_format {
            Some(LyricsResult::new(result.text, false, LyricsSource::NetEase))
        } else {
            None
        }
    }
}

#[async_trait]
impl LyricsProvider for NetEaseProvider {
    async fn fetch(&self, query: &LyricsSearchQuery) -> Result<Option<LyricsResult>> {
        let Some(song_id) = self.search_song_id(&query.term).await? else {
            debug!(term = %query.term, "NetEase search returned no songs");
            return Ok(None);
        };

        let lyrics = self.fetch_lyrics(song_id, query.enhanced).await?;
        Ok(Self::select(lyrics, query))
    }

    fn source(&self) -> LyricsSource {
        LyricsSource::NetEase
    }
}

/// Convert NetEase word-timed lyrics to enhanced LRC.
///
/// A `yrc` line looks like `[16210,3460](16210,670,0)Hello (16880,410,0)world`:
/// line start and duration in milliseconds, then one `(start,duration,_)`
/// group before each word. JSON credit lines (`{"t":..}`) are dropped.
pub fn yrc_to_enhanced_lrc(yrc: &str) -> String {
    yrc.lines()
        .filter_map(convert_yrc_line)
        .collect::<Vec<_>>()
        .join("\n")
}

fn convert_yrc_line(line: &str) -> Option<String> {
    let rest = line.trim().strip_prefix('[')?;
    let (header, mut rest) = rest.split_once(']')?;
    let line_start: u64 = header.split(',').next()?.trim().parse().ok()?;

    let mut out = format!("[{}]", format_timestamp(line_start));

    while let Some(after_paren) = rest.strip_prefix('(') {
        let (timing, tail) = after_paren.split_once(')')?;
        let word_start: u64 = timing.split(',').next()?.trim().parse().ok()?;
        let word_end = tail.find('(').unwrap_or(tail.len());

        out.push('<');
        out.push_str(&format_timestamp(word_start));
        out.push('>');
        out.push_str(&tail[..word_end]);

        rest = &tail[word_end..];
    }

    Some(out)
}

/// `mm:ss.xx` from milliseconds
fn format_timestamp(ms: u64) -> String {
    format!(
        "{:02}:{:02}.{:02}",
        ms / 60_000,
        (ms % 60_000) / 1000,
        (ms % 1000) / 10
    )
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    result: Option<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    #[serde(default)]
    songs: Vec<SearchSong>,
}

#[derive(Debug, Deserialize)]
struct SearchSong {
    id: u64,
}

#[derive(Debug, Deserialize)]
struct LyricResponse {
    #[serde(default)]
    lrc: Option<LyricTrack>,
    #[serde(default)]
    yrc: Option<LyricTrack>,
}

#[derive(Debug, Deserialize)]
struct LyricTrack {
    #[serde(default)]
    lyric: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::testing::FakeHttpClient;

    const SEARCH_BODY: &str =
        r#"{"result":{"songs":[{"id":42,"name":"Foo","artists":[{"name":"Bar"}]}],"songCount":1},"code":200}"#;

    const LYRIC_BODY: &str = r#"{
        "lrc": {"version": 3, "lyric": "[00:01.00]first line\n[00:04.50]second line\n"},
        "yrc": {"version": 1, "lyric": "{\"t\":0,\"c\":[{\"tx\":\"credits\"}]}\n[1000,3000](1000,500,0)first (1500,600,0)line\n"},
        "code": 200
    }"#;

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0), "00:00.00");
        assert_eq!(format_timestamp(16_210), "00:16.21");
        assert_eq!(format_timestamp(125_999), "02:05.99");
    }

    #[test]
    fn test_yrc_conversion() {
        let yrc = "{\"t\":0,\"c\":[]}\n[16210,3460](16210,670,0)Hello (16880,410,0)world\n";
        assert_eq!(
            yrc_to_enhanced_lrc(yrc),
            "[00:16.21]<00:16.21>Hello <00:16.88>world"
        );
        assert_eq!(yrc_to_enhanced_lrc("not yrc at all"), "");
    }

    #[tokio::test]
    async fn test_search_then_lyric_request() {
        let http = Arc::new(
            FakeHttpClient::new()
                .respond(200, SEARCH_BODY)
                .respond(200, LYRIC_BODY),
        );
        let provider = NetEaseProvider::new(http.clone());

        let result = provider
            .fetch(&LyricsSearchQuery::new("Foo Bar"))
            .await
            .unwrap()
            .unwrap();

        assert!(result.is_valid_lrc());
        assert!(result.text.starts_with("[00:01.00]first line"));
        assert_eq!(result.source, LyricsSource::NetEase);

        let requests = http.requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].method, HttpMethod::Post);
        assert_eq!(requests[0].url, "https://music.163.com/api/search/get/web");
        assert_eq!(
            requests[0].body.as_deref(),
            Some(&b"s=Foo%20Bar&type=1&offset=0&limit=5"[..])
        );
        assert_eq!(
            requests[0].headers.get("Referer").map(String::as_str),
            Some("https://music.163.com/")
        );
        assert_eq!(
            requests[1].url,
            "https://music.163.com/api/song/lyric?id=42&lv=1&kv=1&tv=-1"
        );
    }

    #[tokio::test]
    async fn test_enhanced_prefers_word_timing() {
        let http = Arc::new(
            FakeHttpClient::new()
                .respond(200, SEARCH_BODY)
                .respond(200, LYRIC_BODY),
        );
        let provider = NetEaseProvider::new(http.clone());

        let mut query = LyricsSearchQuery::new("Foo Bar");
        query.enhanced = true;
        let result = provider.fetch(&query).await.unwrap().unwrap();

        assert_eq!(result.text, "[00:01.00]<00:01.00>first <00:01.50>line");
        assert!(http.urls()[1].ends_with("&yv=1"));
    }

    #[tokio::test]
    async fn test_no_songs_skips_lyric_request() {
        let http = Arc::new(FakeHttpClient::new().respond(200, r#"{"result":{},"code":200}"#));
        let provider = NetEaseProvider::new(http.clone());

        assert!(provider
            .fetch(&LyricsSearchQuery::new("Nothing"))
            .await
            .unwrap()
            .is_none());
        assert_eq!(http.urls().len(), 1);
    }

    #[tokio::test]
    async fn test_unsynced_text_needs_plain_format() {
        let body = r#"{"lrc":{"lyric":"just words\nmore words"},"code":200}"#;

        let strict = NetEaseProvider::new(Arc::new(
            FakeHttpClient::new().respond(200, SEARCH_BODY).respond(200, body),
        ));
        assert!(strict
            .fetch(&LyricsSearchQuery::new("Foo Bar"))
            .await
            .unwrap()
            .is_none());

        let lenient = NetEaseProvider::new(Arc::new(
            FakeHttpClient::new().respond(200, SEARCH_BODY).respond(200, body),
        ));
        let mut query = LyricsSearchQuery::new("Foo Bar");
        query.allow_plain_format = true;
        let result = lenient.fetch(&query).await.unwrap().unwrap();
        assert!(!result.is_synced);
    }

    #[tokio::test]
    async fn test_search_http_error() {
        let provider = NetEaseProvider::new(Arc::new(FakeHttpClient::new().respond(460, "")));

        let result = provider.fetch(&LyricsSearchQuery::new("Foo Bar")).await;
        assert!(matches!(result, Err(MetadataError::LyricsFetchFailed(msg)) if msg.contains("460")));
    }
}
