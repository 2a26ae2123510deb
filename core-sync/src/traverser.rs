//! # Traverser
//!
//! Depth-first walk over a file or directory tree.
//!
//! The walk is driven by `walkdir`, which keeps pending directories on an
//! explicit stack instead of recursing, so deep trees cost heap rather than
//! call stack. Siblings are visited in file-name order. Symbolic links are
//! followed; a link back to an ancestor is reported as a traversal error.
//!
//! ## Failure policy
//!
//! - The root must be accessible: [`Traverser::new`] fails with
//!   [`SyncError::RootInaccessible`] otherwise.
//! - An entry below the root that cannot be read (unlistable directory,
//!   dangling link, link loop) is yielded as [`SyncError::Traversal`] and
//!   its subtree is skipped; the walk goes on with the remaining entries.

use crate::error::{Result, SyncError};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{dispatcher, trace, Dispatch};
use walkdir::WalkDir;

/// Iterator over every non-directory path below a root.
pub struct Traverser {
    entries: walkdir::IntoIter,
    dispatch: Dispatch,
}

impl Traverser {
    /// Start a walk at `root`.
    ///
    /// A regular file as root yields exactly that file.
    pub fn new(root: impl AsRef<Path>, dispatch: Dispatch) -> Result<Self> {
        let root = root.as_ref();
        let inaccessible = |source: io::Error| SyncError::RootInaccessible {
            path: root.to_path_buf(),
            source,
        };

        if fs::metadata(root).map_err(inaccessible)?.is_dir() {
            fs::read_dir(root).map_err(inaccessible)?;
        }

        let entries = WalkDir::new(root)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter();

        Ok(Self { entries, dispatch })
    }
}

impl Iterator for Traverser {
    type Item = Result<PathBuf>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.entries.next()? {
                Ok(entry) if entry.file_type().is_dir() => {
                    dispatcher::with_default(&self.dispatch, || {
                        trace!(path = %entry.path().display(), "Descending into directory");
                    });
                }
                Ok(entry) => return Some(Ok(entry.into_path())),
                Err(err) => {
                    let path = err.path().map(Path::to_path_buf).unwrap_or_default();
                    return Some(Err(SyncError::Traversal {
                        path,
                        source: io::Error::from(err),
                    }));
                }
            }
        }
    }
}
