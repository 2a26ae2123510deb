//! # Metadata & Lyrics Module
//!
//! The two collaborators the crawl orchestrator consumes.
//!
//! ## Overview
//!
//! This module handles:
//! - Audio tag extraction (ID3, Vorbis, MP4, FLAC, RIFF) into a [`Track`]
//! - Synced lyrics search across an ordered list of providers, saving the
//!   first acceptable result to disk

pub mod error;
pub mod extractor;
pub mod lyrics;
pub mod providers;

pub use error::{MetadataError, Result};
pub use extractor::{MetadataExtractor, Track, TrackMetadataSource};
pub use lyrics::{
    LyricsProvider, LyricsResult, LyricsSearch, LyricsSearchQuery, LyricsSearchRequest,
    LyricsService, LyricsSource,
};
pub use providers::{LrcLibProvider, NetEaseProvider};
