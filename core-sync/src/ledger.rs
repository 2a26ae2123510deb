//! # Failure Ledger
//!
//! Durable record of lookups that found no lyrics.
//!
//! ## Format
//!
//! Plain text, one [`FetchKey`] per line, append-only. Keys are written
//! verbatim; a title or artist containing a newline would split into two
//! lines.
//!
//! ## Recovery
//!
//! - A missing or unreadable file loads as an empty ledger
//! - Blank lines are ignored
//! - A last line without its newline (interrupted append) is kept as a key,
//!   and the next append starts on a fresh line
//!
//! There is no locking: two processes appending to the same file do not see
//! each other's keys until the next load.

use crate::error::{Result, SyncError};
use crate::gating::FetchKey;
use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

#[derive(Debug)]
pub struct FailureLedger {
    path: PathBuf,
    keys: HashSet<String>,
    needs_separator: bool,
}

impl FailureLedger {
    /// Read the ledger at `path`.
    pub async fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();

        let contents = match tokio::fs::read(&path).await {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "No failure ledger yet");
                String::new()
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Cannot read failure ledger, starting empty");
                String::new()
            }
        };

        let needs_separator = !contents.is_empty() && !contents.ends_with('\n');
        let keys: HashSet<String> = contents
            .lines()
            .map(|line| line.strip_suffix('\r').unwrap_or(line))
            .filter(|line| !line.trim().is_empty())
            .map(str::to_string)
            .collect();

        debug!(path = %path.display(), keys = keys.len(), "Loaded failure ledger");

        Self {
            path,
            keys,
            needs_separator,
        }
    }

    pub fn contains(&self, key: &FetchKey) -> bool {
        self.keys.contains(key.as_str())
    }

    /// Remember `key` and append it to the file.
    ///
    /// The key is kept in memory even when the append fails, so it is not
    /// retried for the rest of the run.
    ///
    /// # Errors
    ///
    /// [`SyncError::Ledger`] when the file cannot be opened or written.
    pub async fn record(&mut self, key: &FetchKey) -> Result<()> {
        self.keys.insert(key.as_str().to_string());

        let mut line = String::with_capacity(key.as_str().len() + 2);
        if self.needs_separator {
            line.push('\n');
        }
        line.push_str(key.as_str());
        line.push('\n');

        match self.append(line.as_bytes()).await {
            Ok(()) => {
                self.needs_separator = false;
                Ok(())
            }
            Err(source) => {
                // Unknown how much reached the disk
                self.needs_separator = true;
                Err(SyncError::Ledger {
                    path: self.path.clone(),
                    source,
                })
            }
        }
    }

    async fn append(&self, bytes: &[u8]) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(bytes).await?;
        file.flush().await
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
