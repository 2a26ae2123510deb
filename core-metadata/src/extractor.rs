//! Audio Tag Extraction
//!
//! Reads the handful of tags the crawler needs (title, artist, genre) from
//! an audio file using the `lofty` crate. ID3v2, Vorbis Comments, MP4 atoms,
//! APE and RIFF INFO tags are supported.
//!
//! ## Overview
//!
//! - The container is identified from content first, then from the file
//!   extension
//! - The primary tag is preferred, falling back to the first tag present
//! - Text values are trimmed and blank values are reported as absent
//! - Files that are not audio come back as
//!   [`MetadataError::UnsupportedFormat`] or [`MetadataError::CorruptedFile`],
//!   see [`MetadataError::is_not_audio`]
//!
//! ## Usage
//!
//! ```ignore
//! use core_metadata::extractor::{MetadataExtractor, TrackMetadataSource};
//! use std::path::Path;
//!
//! let extractor = MetadataExtractor::new();
//! let track = extractor.read_track(Path::new("song.mp3")).await?;
//!
//! println!("Title: {}", track.title.unwrap_or_default());
//! ```

use async_trait::async_trait;
use lofty::config::ParseOptions;
use lofty::file::TaggedFileExt;
use lofty::probe::Probe;
use lofty::tag::Accessor;
use std::path::{Path, PathBuf};
use tracing::{debug, dispatcher, Dispatch};

use crate::error::{MetadataError, Result};

/// Tags of one audio file, recomputed on every run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    /// Location of the audio file
    pub path: PathBuf,
    /// Track title
    pub title: Option<String>,
    /// Primary artist
    pub artist: Option<String>,
    /// Genre as tagged, possibly several genres in one string
    pub genre: Option<String>,
}

impl Track {
    /// A track with no tags at all.
    pub fn untagged(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            title: None,
            artist: None,
            genre: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_artist(mut self, artist: impl Into<String>) -> Self {
        self.artist = Some(artist.into());
        self
    }

    pub fn with_genre(mut self, genre: impl Into<String>) -> Self {
        self.genre = Some(genre.into());
        self
    }
}

/// Source of track metadata.
#[async_trait]
pub trait TrackMetadataSource: Send + Sync {
    /// Read the tags of the file at `path`.
    ///
    /// # Errors
    ///
    /// - [`MetadataError::UnsupportedFormat`] / [`MetadataError::CorruptedFile`]
    ///   when the file is not a readable audio container
    /// - [`MetadataError::Io`] when the file cannot be opened
    async fn read_track(&self, path: &Path) -> Result<Track>;
}

/// Audio metadata extractor backed by `lofty`.
#[derive(Debug, Clone, Copy)]
pub struct MetadataExtractor {
    parse_options: ParseOptions,
}

impl MetadataExtractor {
    /// Create a new metadata extractor with default settings
    pub fn new() -> Self {
        Self {
            // Audio properties are not needed, only tags
            parse_options: ParseOptions::new().read_properties(false),
        }
    }

    fn extract_blocking(path: &Path, parse_options: ParseOptions) -> Result<Track> {
        let probe = Probe::open(path)
            .map_err(|e| {
                MetadataError::ExtractionFailed(format!(
                    "Failed to open file {}: {}",
                    path.display(),
                    e
                ))
            })?
            .options(parse_options)
            .guess_file_type()?;

        if probe.file_type().is_none() {
            return Err(MetadataError::UnsupportedFormat(path.display().to_string()));
        }

        // The container was recognised, so any failure from here on is a
        // malformed file rather than an I/O problem.
        let tagged_file = probe.read().map_err(|e| {
            MetadataError::CorruptedFile(format!("{}: {}", path.display(), e))
        })?;

        let tag = tagged_file
            .primary_tag()
            .or_else(|| tagged_file.first_tag());

        let Some(tag) = tag else {
            debug!(path = %path.display(), "No tags found");
            return Ok(Track::untagged(path));
        };

        Ok(Track {
            path: path.to_path_buf(),
            title: tag.title().and_then(|s| Self::normalize_text(s.as_ref())),
            artist: tag.artist().and_then(|s| Self::normalize_text(s.as_ref())),
            genre: tag.genre().and_then(|s| Self::normalize_text(s.as_ref())),
        })
    }

    /// Trim surrounding whitespace and treat blank values as absent
    fn normalize_text(text: &str) -> Option<String> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }
}

impl Default for MetadataExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TrackMetadataSource for MetadataExtractor {
    async fn read_track(&self, path: &Path) -> Result<Track> {
        debug!(path = %path.display(), "Extracting metadata");

        let owned_path = path.to_path_buf();
        let parse_options = self.parse_options;
        // Blocking-pool threads start without the caller's subscriber
        let dispatch = dispatcher::get_default(Dispatch::clone);

        tokio::task::spawn_blocking(move || {
            dispatcher::with_default(&dispatch, || {
                Self::extract_blocking(&owned_path, parse_options)
            })
        })
        .await
            .map_err(|e| MetadataError::ExtractionFailed(format!("Extraction task failed: {}", e)))?
    }
}
