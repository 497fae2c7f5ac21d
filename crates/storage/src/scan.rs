// SPDX-License-Identifier: MIT
// Copyright (c) 2026 The pmatic authors

//! Context-directory scanning.
//!
//! A scan walks the tree below a start path and emits one record per
//! entry, keyed by relative path. Metadata is read without following
//! symlinks, so a dangling link scans the same as a live one.

use crate::context::{ContextDir, META_DIR_NAME, TRASH_DIR_NAME};
use pmatic_core::{FileFormat, PathRecord, Snapshot};
use std::ffi::OsStr;
use std::fs;
use std::os::unix::fs::{FileTypeExt, MetadataExt};
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// Lowest 12 bits of `st_mode`: permission bits plus setuid/setgid/sticky.
const MODE_MASK: u32 = 0o7777;

/// Errors that can occur while scanning
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("path is not valid UTF-8: {}", .0.display())]
    NonUtf8Path(PathBuf),
    #[error("unsupported filesystem object at {}", .0.display())]
    UnknownFormat(PathBuf),
}

/// Scan a context directory, pruning the reserved subdirectories.
pub fn scan(ctx: &ContextDir) -> Result<Snapshot, ScanError> {
    scan_with_exclusions(ctx.root(), &[META_DIR_NAME, TRASH_DIR_NAME])
}

/// Scan the tree below `start`, skipping `exclude` names at the top level.
///
/// Exclusions are pruned, not filtered: nothing beneath an excluded name
/// is ever visited.
pub fn scan_with_exclusions(start: &Path, exclude: &[&str]) -> Result<Snapshot, ScanError> {
    let mut snapshot = Snapshot::new();
    let walker = WalkDir::new(start)
        .min_depth(1)
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() != 1 || !exclude.iter().any(|name| entry.file_name() == OsStr::new(name))
        });
    for entry in walker {
        let entry = entry?;
        let key = relative_key(entry.path(), start)?;
        let record = stat_record(entry.path(), &entry.metadata()?)?;
        snapshot.insert(key, record);
    }
    Ok(snapshot)
}

fn relative_key(path: &Path, start: &Path) -> Result<String, ScanError> {
    // Walked entries always live under the start path
    let rel = path.strip_prefix(start).unwrap_or(path);
    rel.to_str()
        .map(str::to_string)
        .ok_or_else(|| ScanError::NonUtf8Path(path.to_path_buf()))
}

/// Build the snapshot record for one entry from its lstat metadata.
fn stat_record(path: &Path, meta: &fs::Metadata) -> Result<PathRecord, ScanError> {
    let format = decode_format(meta.file_type())
        .ok_or_else(|| ScanError::UnknownFormat(path.to_path_buf()))?;
    let mode = meta.mode() & MODE_MASK;
    let size = match format {
        FileFormat::Reg | FileFormat::Lnk => meta.size(),
        _ => 0,
    };
    let inode = match format {
        FileFormat::Dir | FileFormat::Lnk => 0,
        _ => meta.ino(),
    };
    let symlink = if format == FileFormat::Lnk {
        let target = fs::read_link(path)?;
        let target = target
            .to_str()
            .map(str::to_string)
            .ok_or_else(|| ScanError::NonUtf8Path(target.clone()))?;
        Some(target)
    } else {
        None
    };
    Ok(PathRecord::new(format, mode, size, inode, symlink))
}

/// Map a file type to the one format that applies to it.
fn decode_format(file_type: fs::FileType) -> Option<FileFormat> {
    if file_type.is_dir() {
        Some(FileFormat::Dir)
    } else if file_type.is_symlink() {
        Some(FileFormat::Lnk)
    } else if file_type.is_file() {
        Some(FileFormat::Reg)
    } else if file_type.is_block_device() {
        Some(FileFormat::Blk)
    } else if file_type.is_char_device() {
        Some(FileFormat::Chr)
    } else if file_type.is_fifo() {
        Some(FileFormat::Fifo)
    } else if file_type.is_socket() {
        Some(FileFormat::Sock)
    } else {
        None
    }
}

#[cfg(test)]
#[path = "scan_tests.rs"]
mod tests;
