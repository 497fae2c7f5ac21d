// SPDX-License-Identifier: MIT
// Copyright (c) 2026 The pmatic authors

//! Snapshot capture and restore.
//!
//! Capture scans the context directory and hardlinks every non-directory,
//! non-symlink entry into the inode store, so the captured content stays
//! on disk even after the original is deleted or renamed over. A rename
//! preserves the backup; truncation or in-place modification does not,
//! which is why capture also clears the write bits on regular files.
//!
//! Restore is two-phase: first every entry that diverged from the
//! snapshot is moved into a trash can, then every missing entry is
//! recreated (directories and symlinks from the record, everything else
//! by hardlinking back out of the inode store) and recorded modes are
//! re-applied.

use crate::context::ContextDir;
use crate::scan::{scan, ScanError};
use chrono::{DateTime, Utc};
use pmatic_core::{FileFormat, PathRecord, Snapshot};
use std::fs;
use std::io;
use std::os::unix::fs::{MetadataExt, PermissionsExt};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Write bits cleared on regular files at capture time. The remaining
/// bits (including setuid/setgid) pass through unchanged.
const READ_ONLY_MASK: u32 = 0o7555;

/// Errors that can occur in snapshot operations
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error("no inode backup {inode} for '{path}'")]
    MissingInodeBackup { inode: u64, path: String },
    #[error("symlink record for '{0}' has no target")]
    MissingSymlinkTarget(String),
    #[error("refusing to trash absolute path '{0}'")]
    AbsoluteTrashPath(String),
}

/// Capture the state of the context directory ahead of a run.
///
/// Returns the scan map; the caller persists it inside the `started`
/// event. Side effects: the inode store gains one hardlink per captured
/// file, and every regular file in the working tree goes read-only so
/// the child process trips over accidental in-place writes. The masking
/// is tamper detection for cooperative tools, not security.
pub fn create_snapshot(ctx: &ContextDir) -> Result<Snapshot, SnapshotError> {
    let snapshot = scan(ctx)?;
    let inode_dir = ctx.inode_snapshots_dir();
    fs::create_dir_all(&inode_dir)?;

    for (key, record) in &snapshot {
        let path = ctx.root().join(key);
        if record.needs_inode_backup() {
            backup_inode(&path, &inode_dir, record.inode())?;
        }
        if record.format() == FileFormat::Reg {
            let mode = record.mode() & READ_ONLY_MASK;
            fs::set_permissions(&path, fs::Permissions::from_mode(mode))?;
        }
    }
    debug!(
        context = %ctx,
        entries = snapshot.len(),
        "captured context snapshot"
    );
    Ok(snapshot)
}

/// Hardlink `path` into the inode store as `<inode_dir>/<inode>`.
///
/// A leftover link from an earlier snapshot may occupy the name; it is
/// kept when it still refers to the same inode and replaced otherwise.
fn backup_inode(path: &Path, inode_dir: &Path, inode: u64) -> Result<(), SnapshotError> {
    let backup = inode_dir.join(inode.to_string());
    if backup.symlink_metadata().is_ok() {
        if same_file(path, &backup)? {
            return Ok(());
        }
        warn!(inode, backup = %backup.display(), "replacing stale inode backup");
        fs::remove_file(&backup)?;
    }
    fs::hard_link(path, &backup)?;
    Ok(())
}

/// The OS same-file test: identical device and inode.
fn same_file(a: &Path, b: &Path) -> Result<bool, io::Error> {
    let meta_a = fs::metadata(a)?;
    let meta_b = fs::metadata(b)?;
    Ok(meta_a.dev() == meta_b.dev() && meta_a.ino() == meta_b.ino())
}

/// Restore the context directory to a previously captured snapshot.
///
/// `now` names the trash can receiving displaced entries. Both phases
/// process keys in lexicographic order, so parents are handled before
/// their children; delete-then-recreate ordering is what makes a format
/// change at one path (a file replaced by a directory, say) restorable.
pub fn restore_snapshot(
    ctx: &ContextDir,
    snapshot: &Snapshot,
    now: DateTime<Utc>,
) -> Result<(), SnapshotError> {
    let current = scan(ctx)?;
    let trash = TrashCan::new(ctx, now);

    // Phase 1: trash every entry that diverged from the snapshot.
    for (key, record) in &current {
        let keep = snapshot
            .get(key)
            .is_some_and(|want| want.identity() == record.identity());
        if keep {
            continue;
        }
        let path = ctx.root().join(key);
        // A trashed ancestor takes its children with it
        if path.symlink_metadata().is_ok() {
            trash.trash(key)?;
        }
    }

    // Phase 2: recreate what is missing, then re-apply recorded modes.
    for (key, record) in snapshot {
        let path = ctx.root().join(key);
        if path.symlink_metadata().is_err() {
            recreate(ctx, &path, key, record)?;
        }
        if record.format() != FileFormat::Lnk {
            // No symlink chmod on this platform; symlink modes are skipped
            fs::set_permissions(&path, fs::Permissions::from_mode(record.mode()))?;
        }
    }
    debug!(context = %ctx, trash = %trash.path().display(), "restored context snapshot");
    Ok(())
}

fn recreate(
    ctx: &ContextDir,
    path: &Path,
    key: &str,
    record: &PathRecord,
) -> Result<(), SnapshotError> {
    match record.format() {
        FileFormat::Dir => Ok(fs::create_dir(path)?),
        FileFormat::Lnk => {
            let target = record
                .symlink()
                .ok_or_else(|| SnapshotError::MissingSymlinkTarget(key.to_string()))?;
            Ok(std::os::unix::fs::symlink(target, path)?)
        }
        _ => {
            let backup = ctx.inode_snapshots_dir().join(record.inode().to_string());
            fs::hard_link(&backup, path).map_err(|source| {
                if source.kind() == io::ErrorKind::NotFound {
                    SnapshotError::MissingInodeBackup {
                        inode: record.inode(),
                        path: key.to_string(),
                    }
                } else {
                    SnapshotError::Io(source)
                }
            })
        }
    }
}

/// A place to move files, prior to deleting them.
///
/// Each restore gets its own can, named by the UTC timestamp of the
/// revert, under `<ctx>/.trash_cans/`. Displaced entries keep their
/// relative paths inside it.
pub struct TrashCan {
    context_root: PathBuf,
    trash_path: PathBuf,
}

impl TrashCan {
    pub fn new(ctx: &ContextDir, now: DateTime<Utc>) -> Self {
        let stamp = now.format("%Y-%m-%dT%H:%M:%S%.6f").to_string();
        Self {
            context_root: ctx.root().to_path_buf(),
            trash_path: ctx.trash_cans_dir().join(stamp),
        }
    }

    pub fn path(&self) -> &Path {
        &self.trash_path
    }

    /// Move `<ctx>/<rel_path>` to `<trash>/<rel_path>`.
    ///
    /// When the source is a directory whose destination already exists,
    /// the destination already holds its contents from earlier trashings
    /// during this restore, so the now-empty source is removed instead.
    pub fn trash(&self, rel_path: &str) -> Result<(), SnapshotError> {
        if Path::new(rel_path).is_absolute() {
            return Err(SnapshotError::AbsoluteTrashPath(rel_path.to_string()));
        }
        let source = self.context_root.join(rel_path);
        let dest = self.trash_path.join(rel_path);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        if source.is_dir() && dest.symlink_metadata().is_ok() {
            fs::remove_dir(&source)?;
        } else {
            fs::rename(&source, &dest)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;
