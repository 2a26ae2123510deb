//! External Lyrics Providers
//!
//! This module contains clients for external lyrics services:
//! - LRCLib - Free, open-source synced lyrics database
//! - NetEase - NetEase Cloud Music, with optional word-level timing
//!
//! Providers only talk HTTP; deciding which result is acceptable and
//! writing it to disk is left to [`crate::lyrics::LyricsService`].

pub mod lrclib;
pub mod netease;

pub use lrclib::LrcLibProvider;
pub use netease::NetEaseProvider;
