//! # Fetch Orchestrator
//!
//! Decides, file by file, whether a lyrics lookup is warranted and records
//! the lookups that come back empty.
//!
//! ## Workflow
//!
//! For each file, stopping at the first step that applies:
//! 1. Read tags; a file that is not audio is skipped
//! 2. A track without a title is skipped
//! 3. Build the [`FetchKey`] (`"{title} {artist}"`)
//! 4. Skip keys already in the [`FailureLedger`]
//! 5. Skip tracks whose genre contains a blacklisted substring
//! 6. Skip tracks that already have a lyrics file next to them
//! 7. Run one composite search over the provider list, saving to the
//!    lyrics file
//! 8. On a miss, append the key to the ledger
//!
//! All logging, including that of the collaborators called from
//! [`FetchOrchestrator::evaluate`], goes to the [`Dispatch`] handed to
//! [`FetchOrchestrator::new`].
//!
//! ## Usage
//!
//! ```rust,ignore
//! let mut orchestrator = FetchOrchestrator::new(
//!     &config,
//!     Arc::new(MetadataExtractor::new()),
//!     Arc::new(LyricsService::new(http_client)),
//!     dispatch,
//! )
//! .await?;
//!
//! match orchestrator.evaluate(Path::new("/music/song.mp3")).await? {
//!     FetchOutcome::Fetched(source) => println!("Got lyrics from {}", source),
//!     other => println!("{:?}", other),
//! }
//! ```

use crate::error::{Result, SyncError};
use crate::gating::{FetchKey, GenreBlacklist};
use crate::ledger::FailureLedger;
use core_metadata::{LyricsSearch, LyricsSearchRequest, LyricsSource, TrackMetadataSource};
use core_runtime::FetchConfig;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::instrument::WithSubscriber;
use tracing::{debug, error, info, warn, Dispatch};

/// Why a file was not looked up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SkipReason {
    /// Not an audio container the extractor understands
    NotAudio,
    /// Audio without a title tag
    NoTitle,
    /// Lookup for the same key failed on an earlier run
    KnownFailure,
    /// Genre contains a blacklisted substring
    BlacklistedGenre,
    /// A lyrics file already exists
    AlreadyHasLyrics,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotAudio => "not-audio",
            Self::NoTitle => "no-title",
            Self::KnownFailure => "known-failure",
            Self::BlacklistedGenre => "blacklisted-genre",
            Self::AlreadyHasLyrics => "already-has-lyrics",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of evaluating one file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Skipped(SkipReason),
    /// Lyrics were found and saved
    Fetched(LyricsSource),
    /// No provider had lyrics; the key was added to the ledger
    NotFound,
}

pub struct FetchOrchestrator {
    metadata: Arc<dyn TrackMetadataSource>,
    lyrics: Arc<dyn LyricsSearch>,
    blacklist: GenreBlacklist,
    ledger: FailureLedger,
    providers: Vec<LyricsSource>,
    config: FetchConfig,
    dispatch: Dispatch,
}

impl FetchOrchestrator {
    /// Create an orchestrator and load the failure ledger.
    ///
    /// # Errors
    ///
    /// [`SyncError::Config`] when a configured provider name is unknown.
    pub async fn new(
        config: &FetchConfig,
        metadata: Arc<dyn TrackMetadataSource>,
        lyrics: Arc<dyn LyricsSearch>,
        dispatch: Dispatch,
    ) -> Result<Self> {
        let providers = config
            .providers
            .iter()
            .map(|name| name.parse::<LyricsSource>())
            .collect::<core_metadata::Result<Vec<_>>>()
            .map_err(|e| SyncError::Config(e.to_string()))?;

        let ledger = FailureLedger::load(&config.ledger_path)
            .with_subscriber(dispatch.clone())
            .await;

        Ok(Self {
            metadata,
            lyrics,
            blacklist: GenreBlacklist::new(&config.blacklisted_genres),
            ledger,
            providers,
            config: config.clone(),
            dispatch,
        })
    }

    /// Evaluate one file.
    ///
    /// # Errors
    ///
    /// - [`SyncError::Metadata`] when the file cannot be read
    /// - [`SyncError::Ledger`] when a miss cannot be recorded
    /// - [`SyncError::Lyrics`] when found lyrics cannot be saved
    pub async fn evaluate(&mut self, path: &Path) -> Result<FetchOutcome> {
        let dispatch = self.dispatch.clone();
        self.evaluate_inner(path).with_subscriber(dispatch).await
    }

    async fn evaluate_inner(&mut self, path: &Path) -> Result<FetchOutcome> {
        let track = match self.metadata.read_track(path).await {
            Ok(track) => track,
            Err(e) if e.is_not_audio() => {
                debug!(path = %path.display(), reason = %e, "Skipping, not an audio file");
                return Ok(FetchOutcome::Skipped(SkipReason::NotAudio));
            }
            Err(e) => return Err(e.into()),
        };

        let Some(key) = FetchKey::from_track(&track) else {
            warn!(path = %path.display(), "Skipping, track has no title");
            return Ok(FetchOutcome::Skipped(SkipReason::NoTitle));
        };

        if self.ledger.contains(&key) {
            info!(key = %key, "Skipping, no lyrics were found on an earlier run");
            return Ok(FetchOutcome::Skipped(SkipReason::KnownFailure));
        }

        if let Some(entry) = self.blacklist.matching_entry(track.genre.as_deref()) {
            info!(
                key = %key,
                genre = track.genre.as_deref().unwrap_or_default(),
                blacklisted = entry,
                "Skipping, genre is blacklisted"
            );
            return Ok(FetchOutcome::Skipped(SkipReason::BlacklistedGenre));
        }

        let lyrics_path = self.config.lyrics_path_for(path);
        if tokio::fs::try_exists(&lyrics_path).await? {
            info!(key = %key, path = %lyrics_path.display(), "Skipping, lyrics file already exists");
            return Ok(FetchOutcome::Skipped(SkipReason::AlreadyHasLyrics));
        }

        info!(
            title = track.title.as_deref().unwrap_or_default(),
            artist = track.artist.as_deref().unwrap_or_default(),
            genre = track.genre.as_deref().unwrap_or_default(),
            "Fetching lyrics"
        );

        let request = LyricsSearchRequest::new(key.as_str(), self.providers.clone(), &lyrics_path)
            .allow_plain_format(self.config.allow_plain_format)
            .enhanced(self.config.enhanced);

        let found = self
            .lyrics
            .search(&request)
            .await
            .map_err(|source| SyncError::Lyrics {
                path: lyrics_path.clone(),
                source,
            })?;

        match found {
            Some(source) => {
                info!(key = %key, provider = %source, path = %lyrics_path.display(), "Downloaded lyrics");
                Ok(FetchOutcome::Fetched(source))
            }
            None => {
                error!(key = %key, path = %path.display(), "No lyrics found");
                self.ledger.record(&key).await?;
                Ok(FetchOutcome::NotFound)
            }
        }
    }

    pub fn ledger(&self) -> &FailureLedger {
        &self.ledger
    }

    pub fn dispatch(&self) -> &Dispatch {
        &self.dispatch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use core_metadata::{MetadataError, Track};
    use mockall::mock;
    use mockall::predicate::always;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    mock! {
        pub Tags {}

        #[async_trait]
        impl TrackMetadataSource for Tags {
            async fn read_track(&self, path: &Path) -> core_metadata::Result<Track>;
        }
    }

    mock! {
        pub Search {}

        #[async_trait]
        impl LyricsSearch for Search {
            async fn search(
                &self,
                request: &LyricsSearchRequest,
            ) -> core_metadata::Result<Option<LyricsSource>>;
        }
    }

    fn tags_returning(track: Track) -> MockTags {
        let mut tags = MockTags::new();
        tags.expect_read_track()
            .returning(move |_| Ok(track.clone()));
        tags
    }

    fn config(dir: &TempDir, genres: &[&str]) -> FetchConfig {
        FetchConfig::builder()
            .root(dir.path())
            .ledger_path(dir.path().join("unsuccessful_fetches.txt"))
            .blacklisted_genres(genres.iter().copied())
            .build()
            .unwrap()
    }

    async fn orchestrator(
        config: &FetchConfig,
        tags: MockTags,
        search: MockSearch,
    ) -> FetchOrchestrator {
        FetchOrchestrator::new(config, Arc::new(tags), Arc::new(search), Dispatch::none())
            .await
            .unwrap()
    }

    fn song(dir: &TempDir) -> (PathBuf, Track) {
        let path = dir.path().join("song.mp3");
        let track = Track::untagged(&path)
            .with_title("Foo")
            .with_artist("Bar")
            .with_genre("Pop");
        (path, track)
    }

    #[tokio::test]
    async fn test_not_audio_is_skipped() {
        let dir = TempDir::new().unwrap();
        let mut tags = MockTags::new();
        tags.expect_read_track()
            .returning(|p| Err(MetadataError::UnsupportedFormat(p.display().to_string())));
        let mut search = MockSearch::new();
        search.expect_search().never();

        let mut orchestrator = orchestrator(&config(&dir, &[]), tags, search).await;
        let outcome = orchestrator
            .evaluate(&dir.path().join("notes.txt"))
            .await
            .unwrap();

        assert_eq!(outcome, FetchOutcome::Skipped(SkipReason::NotAudio));
    }

    #[tokio::test]
    async fn test_unreadable_file_is_error() {
        let dir = TempDir::new().unwrap();
        let mut tags = MockTags::new();
        tags.expect_read_track()
            .returning(|_| Err(MetadataError::ExtractionFailed("permission denied".into())));
        let mut search = MockSearch::new();
        search.expect_search().never();

        let mut orchestrator = orchestrator(&config(&dir, &[]), tags, search).await;
        let result = orchestrator.evaluate(&dir.path().join("song.mp3")).await;

        assert!(matches!(result, Err(SyncError::Metadata(_))));
    }

    #[tokio::test]
    async fn test_missing_title_is_skipped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("song.mp3");
        let tags = tags_returning(Track::untagged(&path).with_artist("Bar"));
        let mut search = MockSearch::new();
        search.expect_search().never();

        let mut orchestrator = orchestrator(&config(&dir, &[]), tags, search).await;

        assert_eq!(
            orchestrator.evaluate(&path).await.unwrap(),
            FetchOutcome::Skipped(SkipReason::NoTitle)
        );
    }

    #[tokio::test]
    async fn test_ledger_hit_is_skipped() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("unsuccessful_fetches.txt"), "Foo Bar\n").unwrap();
        let (path, track) = song(&dir);
        let mut search = MockSearch::new();
        search.expect_search().never();

        let mut orchestrator = orchestrator(&config(&dir, &[]), tags_returning(track), search).await;

        assert_eq!(
            orchestrator.evaluate(&path).await.unwrap(),
            FetchOutcome::Skipped(SkipReason::KnownFailure)
        );
    }

    #[tokio::test]
    async fn test_blacklisted_genre_is_skipped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("song.mp3");
        let tags = tags_returning(
            Track::untagged(&path)
                .with_title("Foo")
                .with_artist("Bar")
                .with_genre("Heavy Metal"),
        );
        let mut search = MockSearch::new();
        search.expect_search().never();

        let mut orchestrator = orchestrator(&config(&dir, &["metal"]), tags, search).await;

        assert_eq!(
            orchestrator.evaluate(&path).await.unwrap(),
            FetchOutcome::Skipped(SkipReason::BlacklistedGenre)
        );
    }

    #[tokio::test]
    async fn test_ledger_checked_before_genre() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("unsuccessful_fetches.txt"), "Foo Bar\n").unwrap();
        let (path, track) = song(&dir);
        let mut search = MockSearch::new();
        search.expect_search().never();

        let mut orchestrator =
            orchestrator(&config(&dir, &["pop"]), tags_returning(track), search).await;

        assert_eq!(
            orchestrator.evaluate(&path).await.unwrap(),
            FetchOutcome::Skipped(SkipReason::KnownFailure)
        );
    }

    #[tokio::test]
    async fn test_existing_lyrics_short_circuit() {
        let dir = TempDir::new().unwrap();
        let (path, track) = song(&dir);
        fs::write(dir.path().join("song.lrc"), "[00:01.00]hi").unwrap();
        let mut search = MockSearch::new();
        search.expect_search().never();

        let mut orchestrator = orchestrator(&config(&dir, &[]), tags_returning(track), search).await;

        assert_eq!(
            orchestrator.evaluate(&path).await.unwrap(),
            FetchOutcome::Skipped(SkipReason::AlreadyHasLyrics)
        );
    }

    #[tokio::test]
    async fn test_search_request_shape() {
        let dir = TempDir::new().unwrap();
        let (path, track) = song(&dir);
        let expected_save = dir.path().join("song.lrc");

        let mut search = MockSearch::new();
        search
            .expect_search()
            .withf(move |request| {
                request.query == "Foo Bar"
                    && request.providers == vec![LyricsSource::LrcLib, LyricsSource::NetEase]
                    && !request.allow_plain_format
                    && !request.enhanced
                    && request.save_path == expected_save
            })
            .times(1)
            .returning(|_| Ok(Some(LyricsSource::LrcLib)));

        let mut orchestrator = orchestrator(&config(&dir, &[]), tags_returning(track), search).await;

        assert_eq!(
            orchestrator.evaluate(&path).await.unwrap(),
            FetchOutcome::Fetched(LyricsSource::LrcLib)
        );
        assert!(orchestrator.ledger().is_empty());
    }

    #[tokio::test]
    async fn test_miss_records_key_once() {
        let dir = TempDir::new().unwrap();
        let (path, track) = song(&dir);
        let ledger_path = dir.path().join("unsuccessful_fetches.txt");

        let mut search = MockSearch::new();
        search.expect_search().with(always()).times(1).returning(|_| Ok(None));

        let mut orchestrator = orchestrator(&config(&dir, &[]), tags_returning(track), search).await;

        assert_eq!(orchestrator.evaluate(&path).await.unwrap(), FetchOutcome::NotFound);
        // Second pass hits the in-memory ledger
        assert_eq!(
            orchestrator.evaluate(&path).await.unwrap(),
            FetchOutcome::Skipped(SkipReason::KnownFailure)
        );
        assert_eq!(fs::read_to_string(&ledger_path).unwrap(), "Foo Bar\n");
    }

    #[tokio::test]
    async fn test_ledger_append_failure_is_error() {
        let dir = TempDir::new().unwrap();
        let (path, track) = song(&dir);
        let config = FetchConfig::builder()
            .root(dir.path())
            .ledger_path(dir.path().join("missing").join("ledger.txt"))
            .build()
            .unwrap();

        let mut search = MockSearch::new();
        search.expect_search().times(1).returning(|_| Ok(None));

        let mut orchestrator = orchestrator(&config, tags_returning(track), search).await;

        assert!(matches!(
            orchestrator.evaluate(&path).await,
            Err(SyncError::Ledger { .. })
        ));
        assert_eq!(
            orchestrator.evaluate(&path).await.unwrap(),
            FetchOutcome::Skipped(SkipReason::KnownFailure)
        );
    }

    #[tokio::test]
    async fn test_save_failure_is_lyrics_error() {
        let dir = TempDir::new().unwrap();
        let (path, track) = song(&dir);
        let mut search = MockSearch::new();
        search.expect_search().returning(|_| {
            Err(MetadataError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "read-only",
            )))
        });

        let mut orchestrator = orchestrator(&config(&dir, &[]), tags_returning(track), search).await;

        assert!(matches!(
            orchestrator.evaluate(&path).await,
            Err(SyncError::Lyrics { .. })
        ));
        assert!(orchestrator.ledger().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_provider_rejected() {
        let dir = TempDir::new().unwrap();
        let config = FetchConfig::builder()
            .root(dir.path())
            .providers(["lrclib", "megalobiz"])
            .build()
            .unwrap();

        let result = FetchOrchestrator::new(
            &config,
            Arc::new(MockTags::new()),
            Arc::new(MockSearch::new()),
            Dispatch::none(),
        )
        .await;

        assert!(matches!(result, Err(SyncError::Config(msg)) if msg.contains("megalobiz")));
    }

    #[tokio::test]
    async fn test_config_flags_forwarded() {
        let dir = TempDir::new().unwrap();
        let (path, track) = song(&dir);
        let config = FetchConfig::builder()
            .root(dir.path())
            .ledger_path(dir.path().join("ledger.txt"))
            .providers(["NetEase"])
            .lyrics_extension("txt")
            .allow_plain_format(true)
            .enhanced(true)
            .build()
            .unwrap();
        let expected_save = dir.path().join("song.txt");

        let mut search = MockSearch::new();
        search
            .expect_search()
            .withf(move |request| {
                request.providers == vec![LyricsSource::NetEase]
                    && request.allow_plain_format
                    && request.enhanced
                    && request.save_path == expected_save
            })
            .times(1)
            .returning(|_| Ok(Some(LyricsSource::NetEase)));

        let mut orchestrator = orchestrator(&config, tags_returning(track), search).await;

        assert_eq!(
            orchestrator.evaluate(&path).await.unwrap(),
            FetchOutcome::Fetched(LyricsSource::NetEase)
        );
    }
}
