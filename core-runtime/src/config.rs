//! # Run Configuration
//!
//! Configuration for one crawl over a music library.
//!
//! ## Overview
//!
//! [`FetchConfig`] is assembled with [`FetchConfigBuilder`] and validated in
//! `build()`, so a missing root or an empty provider list is reported before
//! any file is touched.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::FetchConfig;
//!
//! let config = FetchConfig::builder()
//!     .root("/music")
//!     .blacklisted_genres(["Classical", "audiobook"])
//!     .ledger_path("unsuccessful_fetches.txt")
//!     .build()?;
//! ```
//!
//! ## Error Handling
//!
//! ```should_panic
//! use core_runtime::config::FetchConfig;
//!
//! // No root path given
//! let config = FetchConfig::builder()
//!     .build()
//!     .expect("Should fail - missing root");
//! ```

use crate::error::{Error, Result};
use crate::logging::LoggingConfig;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default failure ledger, relative to the working directory
pub const DEFAULT_LEDGER_FILE: &str = "unsuccessful_fetches.txt";

/// Extension given to downloaded lyrics files
pub const DEFAULT_LYRICS_EXTENSION: &str = "lrc";

/// Provider names tried in order when none are configured
pub const DEFAULT_PROVIDERS: &[&str] = &["lrclib", "netease"];

/// Configuration for a crawl.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// File or directory to crawl
    pub root: PathBuf,

    /// Genre substrings that exclude a track, matched case-insensitively
    pub blacklisted_genres: Vec<String>,

    /// Append-only record of lookups that found nothing
    pub ledger_path: PathBuf,

    /// Lyrics provider names in priority order
    pub providers: Vec<String>,

    /// Extension of the lyrics file written next to each track
    pub lyrics_extension: String,

    /// Accept unsynced lyrics when no synced version exists
    pub allow_plain_format: bool,

    /// Ask providers for word-level timing
    pub enhanced: bool,

    /// Per-request HTTP timeout
    pub http_timeout: Duration,

    /// Logging setup
    pub logging: LoggingConfig,
}

impl FetchConfig {
    pub fn builder() -> FetchConfigBuilder {
        FetchConfigBuilder::default()
    }

    /// Path of the lyrics file that belongs to `track_path`.
    pub fn lyrics_path_for(&self, track_path: &Path) -> PathBuf {
        track_path.with_extension(&self.lyrics_extension)
    }
}

/// Builder for [`FetchConfig`].
#[derive(Debug, Default)]
pub struct FetchConfigBuilder {
    root: Option<PathBuf>,
    blacklisted_genres: Vec<String>,
    ledger_path: Option<PathBuf>,
    providers: Option<Vec<String>>,
    lyrics_extension: Option<String>,
    allow_plain_format: bool,
    enhanced: bool,
    http_timeout: Option<Duration>,
    logging: Option<LoggingConfig>,
}

impl FetchConfigBuilder {
    pub fn root(mut self, path: impl AsRef<Path>) -> Self {
        self.root = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn blacklisted_genres<I, S>(mut self, genres: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.blacklisted_genres = genres.into_iter().map(Into::into).collect();
        self
    }

    pub fn ledger_path(mut self, path: impl AsRef<Path>) -> Self {
        self.ledger_path = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn providers<I, S>(mut self, providers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.providers = Some(providers.into_iter().map(Into::into).collect());
        self
    }

    pub fn lyrics_extension(mut self, extension: impl Into<String>) -> Self {
        self.lyrics_extension = Some(extension.into());
        self
    }

    pub fn allow_plain_format(mut self, allow: bool) -> Self {
        self.allow_plain_format = allow;
        self
    }

    pub fn enhanced(mut self, enhanced: bool) -> Self {
        self.enhanced = enhanced;
        self
    }

    pub fn http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = Some(timeout);
        self
    }

    pub fn logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = Some(logging);
        self
    }

    /// Validate and build the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the root is missing, the provider list
    /// ends up empty, the lyrics extension is blank or the timeout is zero.
    pub fn build(self) -> Result<FetchConfig> {
        let root = self.root.ok_or_else(|| {
            Error::Config("A root path (file or directory) is required".to_string())
        })?;

        let blacklisted_genres = self
            .blacklisted_genres
            .into_iter()
            .filter(|genre| !genre.is_empty())
            .collect();

        let mut providers: Vec<String> = Vec::new();
        let requested = self
            .providers
            .unwrap_or_else(|| DEFAULT_PROVIDERS.iter().map(|p| p.to_string()).collect());
        for name in requested {
            let name = name.trim().to_string();
            if name.is_empty() {
                continue;
            }
            if !providers.iter().any(|p| p.eq_ignore_ascii_case(&name)) {
                providers.push(name);
            }
        }
        if providers.is_empty() {
            return Err(Error::Config(
                "At least one lyrics provider must be configured".to_string(),
            ));
        }

        let lyrics_extension = self
            .lyrics_extension
            .unwrap_or_else(|| DEFAULT_LYRICS_EXTENSION.to_string())
            .trim()
            .trim_start_matches('.')
            .to_string();
        if lyrics_extension.is_empty() {
            return Err(Error::Config(
                "Lyrics file extension must not be empty".to_string(),
            ));
        }

        let http_timeout = self.http_timeout.unwrap_or(Duration::from_secs(30));
        if http_timeout.is_zero() {
            return Err(Error::Config("HTTP timeout must be non-zero".to_string()));
        }

        Ok(FetchConfig {
            root,
            blacklisted_genres,
            ledger_path: self
                .ledger_path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LEDGER_FILE)),
            providers,
            lyrics_extension,
            allow_plain_format: self.allow_plain_format,
            enhanced: self.enhanced,
            http_timeout,
            logging: self.logging.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = FetchConfig::builder().root("/music").build().unwrap();

        assert_eq!(config.root, PathBuf::from("/music"));
        assert!(config.blacklisted_genres.is_empty());
        assert_eq!(config.ledger_path, PathBuf::from(DEFAULT_LEDGER_FILE));
        assert_eq!(config.providers, vec!["lrclib", "netease"]);
        assert_eq!(config.lyrics_extension, "lrc");
        assert!(!config.allow_plain_format);
        assert!(!config.enhanced);
        assert_eq!(config.http_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_missing_root_fails() {
        let result = FetchConfig::builder().build();
        assert!(matches!(result, Err(Error::Config(msg)) if msg.contains("root")));
    }

    #[test]
    fn test_blacklist_kept_verbatim_and_fresh_per_build() {
        let first = FetchConfig::builder()
            .root("/music")
            .blacklisted_genres([" Metal ", "", "rock"])
            .build()
            .unwrap();
        assert_eq!(first.blacklisted_genres, vec![" Metal ", "rock"]);

        let second = FetchConfig::builder().root("/music").build().unwrap();
        assert!(second.blacklisted_genres.is_empty());
    }

    #[test]
    fn test_providers_deduplicated_in_order() {
        let config = FetchConfig::builder()
            .root("/music")
            .providers(["NetEase", "lrclib", "netease", " "])
            .build()
            .unwrap();
        assert_eq!(config.providers, vec!["NetEase", "lrclib"]);
    }

    #[test]
    fn test_empty_provider_list_fails() {
        let result = FetchConfig::builder()
            .root("/music")
            .providers(Vec::<String>::new())
            .build();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_lyrics_extension_normalized() {
        let config = FetchConfig::builder()
            .root("/music")
            .lyrics_extension(".LRC")
            .build()
            .unwrap();
        assert_eq!(config.lyrics_extension, "LRC");
        assert_eq!(
            config.lyrics_path_for(Path::new("/music/a/song.mp3")),
            PathBuf::from("/music/a/song.LRC")
        );

        let blank = FetchConfig::builder()
            .root("/music")
            .lyrics_extension(".")
            .build();
        assert!(blank.is_err());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let result = FetchConfig::builder()
            .root("/music")
            .http_timeout(Duration::ZERO)
            .build();
        assert!(result.is_err());
    }
}
