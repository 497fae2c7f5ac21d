// SPDX-License-Identifier: MIT
// Copyright (c) 2026 The pmatic authors

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Storage layer for pmatic: context-directory scanning, hardlink
//! snapshots, and the append-only event log.

mod context;
pub mod docs;
mod event_log;
mod scan;
mod snapshot;

pub use context::{ContextDir, ContextError, META_DIR_NAME, TRASH_DIR_NAME};
pub use docs::DocError;
pub use event_log::{EventLog, EventLogError, Failure};
pub use scan::{scan, scan_with_exclusions, ScanError};
pub use snapshot::{create_snapshot, restore_snapshot, SnapshotError, TrashCan};
