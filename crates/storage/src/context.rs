// SPDX-License-Identifier: MIT
// Copyright (c) 2026 The pmatic authors

//! The context directory and its reserved locations.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Reserved metadata subdirectory, excluded from every scan.
pub const META_DIR_NAME: &str = ".pmatic";

/// Reserved trash subdirectory, excluded from every scan.
pub const TRASH_DIR_NAME: &str = ".trash_cans";

const INODE_SNAPSHOTS_DIR_NAME: &str = "inode_snapshots";
const EVENTS_DIR_NAME: &str = "events";

/// Errors constructing a [`ContextDir`]
#[derive(Debug, Error)]
pub enum ContextError {
    #[error("'{}' is not a directory", .0.display())]
    NotADirectory(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// The working tree a pipeline reads and writes.
///
/// Owns the absolute context root and derives the reserved paths under
/// it. Exclusive ownership by one pipeline at a time is assumed; there is
/// no locking.
#[derive(Debug, Clone)]
pub struct ContextDir {
    root: PathBuf,
}

impl ContextDir {
    /// Wrap a context path, which must be an existing directory.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, ContextError> {
        let path = path.as_ref();
        if !path.is_dir() {
            return Err(ContextError::NotADirectory(path.to_path_buf()));
        }
        let root = fs::canonicalize(path)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<ctx>/.pmatic`
    pub fn meta_dir(&self) -> PathBuf {
        self.root.join(META_DIR_NAME)
    }

    /// `<ctx>/.pmatic/inode_snapshots` — hardlink backups named by inode.
    pub fn inode_snapshots_dir(&self) -> PathBuf {
        self.meta_dir().join(INODE_SNAPSHOTS_DIR_NAME)
    }

    /// `<ctx>/.pmatic/events` — the event log.
    pub fn events_dir(&self) -> PathBuf {
        self.meta_dir().join(EVENTS_DIR_NAME)
    }

    /// `<ctx>/.trash_cans` — per-revert trash directories.
    pub fn trash_cans_dir(&self) -> PathBuf {
        self.root.join(TRASH_DIR_NAME)
    }
}

impl fmt::Display for ContextDir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.root.display())
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
