// SPDX-License-Identifier: MIT
// Copyright (c) 2026 The pmatic authors

//! Snapshot data model.
//!
//! A snapshot maps each path inside a context directory (relative to the
//! context root) to the filesystem state it had when a pipeline started.
//! The scanner and the hardlink store that produce and consume snapshots
//! live in `pmatic-storage`; this module only defines the records and how
//! they compare.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Every entry reachable from the context root, keyed by relative path.
///
/// `BTreeMap` keeps keys in lexicographic order, which is the processing
/// order the restore algorithm requires (parents sort before children).
pub type Snapshot = BTreeMap<String, PathRecord>;

/// Filesystem object format. Exactly one applies to any entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FileFormat {
    Dir,
    Reg,
    Lnk,
    Blk,
    Chr,
    Fifo,
    Sock,
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FileFormat::Dir => "DIR",
            FileFormat::Reg => "REG",
            FileFormat::Lnk => "LNK",
            FileFormat::Blk => "BLK",
            FileFormat::Chr => "CHR",
            FileFormat::Fifo => "FIFO",
            FileFormat::Sock => "SOCK",
        };
        write!(f, "{}", name)
    }
}

/// Captured state of one path.
///
/// Serializes as the 5-element sequence `[format, mode, size, inode,
/// symlink|null]`, which is the on-disk layout inside `started` events.
/// Fields beyond the format:
/// - mode: lowest 12 bits of `st_mode`;
/// - size: byte length for `REG` and `LNK`, otherwise 0;
/// - inode: inode number, except `DIR` and `LNK` which store 0;
/// - symlink: link target for `LNK`, otherwise null.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathRecord(FileFormat, u32, u64, u64, Option<String>);

impl PathRecord {
    pub fn new(
        format: FileFormat,
        mode: u32,
        size: u64,
        inode: u64,
        symlink: Option<String>,
    ) -> Self {
        Self(format, mode, size, inode, symlink)
    }

    pub fn format(&self) -> FileFormat {
        self.0
    }

    pub fn mode(&self) -> u32 {
        self.1
    }

    pub fn size(&self) -> u64 {
        self.2
    }

    pub fn inode(&self) -> u64 {
        self.3
    }

    pub fn symlink(&self) -> Option<&str> {
        self.4.as_deref()
    }

    /// The tuple that decides whether restoration is needed.
    ///
    /// Two records are equivalent for restoration purposes when these
    /// components match; `mode` is excluded and re-applied unconditionally.
    pub fn identity(&self) -> (FileFormat, u64, u64, Option<&str>) {
        (self.0, self.2, self.3, self.4.as_deref())
    }

    /// Entries other than directories and symlinks get a hardlink backup.
    pub fn needs_inode_backup(&self) -> bool {
        !matches!(self.0, FileFormat::Dir | FileFormat::Lnk)
    }
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;
