//! Gating primitives: the fetch identity and the genre blacklist.

use core_metadata::Track;
use std::fmt;

/// Identity of a lyrics lookup: `"{title} {artist}"`.
///
/// Two tracks with the same title and artist share a key regardless of
/// where they live on disk. A missing artist contributes an empty string,
/// so `"Foo "` is the key of an untitled-artist track called "Foo".
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FetchKey(String);

impl FetchKey {
    pub fn new(title: &str, artist: Option<&str>) -> Self {
        Self(format!("{} {}", title, artist.unwrap_or_default()))
    }

    /// Key for `track`, or `None` when it has no title.
    pub fn from_track(track: &Track) -> Option<Self> {
        track
            .title
            .as_deref()
            .map(|title| Self::new(title, track.artist.as_deref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FetchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for FetchKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Case-insensitive genre substrings that exclude a track.
///
/// Entries are matched as given, surrounding whitespace included. Empty
/// entries are dropped.
#[derive(Debug, Clone, Default)]
pub struct GenreBlacklist {
    entries: Vec<String>,
}

impl GenreBlacklist {
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|entry| entry.as_ref().to_lowercase())
                .filter(|entry| !entry.is_empty())
                .collect(),
        }
    }

    /// First entry contained in `genre`, if any.
    ///
    /// A track without a genre never matches.
    pub fn matching_entry(&self, genre: Option<&str>) -> Option<&str> {
        let genre = genre?.to_lowercase();
        self.entries
            .iter()
            .find(|entry| genre.contains(entry.as_str()))
            .map(String::as_str)
    }

    pub fn matches(&self, genre: Option<&str>) -> bool {
        self.matching_entry(genre).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
