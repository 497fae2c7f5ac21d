// SPDX-License-Identifier: MIT
// Copyright (c) 2026 The pmatic authors

//! Pipeline lifecycle events and the event chain.
//!
//! Events are immutable once written. Each names its parent, forming a
//! singly-linked chain from newest to oldest; the chain root is the only
//! event with a null parent. Causal order is carried exclusively by the
//! parent links — ids are unique but not ordered.

use crate::snapshot::Snapshot;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// `file_type` tag carried by every serialized event.
pub const EVENT_FILE_TYPE: &str = "event-1";

crate::define_id! {
    /// Unique identifier of one event in the chain.
    pub struct EventId;
}

/// What happened to the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Started,
    Finished,
    Failed,
    Reverted,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventKind::Started => "started",
            EventKind::Finished => "finished",
            EventKind::Failed => "failed",
            EventKind::Reverted => "reverted",
        };
        write!(f, "{}", name)
    }
}

/// Execution status of a context directory.
///
/// A pure projection of the event chain: an empty chain is `NeverRun`,
/// otherwise the newest event's kind verbatim. Note that `Started` only
/// means a pipeline began and never recorded termination — the log cannot
/// distinguish "in flight" from "crashed mid-run".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    NeverRun,
    Started,
    Finished,
    Failed,
    Reverted,
}

impl Status {
    /// A new run is only allowed from a clean state: never run, finished,
    /// or restored by a revert. A `started` or `failed` context must be
    /// reverted first.
    pub fn is_runnable(self) -> bool {
        matches!(
            self,
            Status::NeverRun | Status::Finished | Status::Reverted
        )
    }
}

impl From<EventKind> for Status {
    fn from(kind: EventKind) -> Self {
        match kind {
            EventKind::Started => Status::Started,
            EventKind::Finished => Status::Finished,
            EventKind::Failed => Status::Failed,
            EventKind::Reverted => Status::Reverted,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::NeverRun => write!(f, "never_run"),
            Status::Started => write!(f, "started"),
            Status::Finished => write!(f, "finished"),
            Status::Failed => write!(f, "failed"),
            Status::Reverted => write!(f, "reverted"),
        }
    }
}

/// A single event in the log.
///
/// `started` events embed the snapshot captured immediately before the
/// child process launched; `failed` events may carry the child's exit
/// code or the error message that aborted the launch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(default = "default_file_type")]
    pub file_type: String,
    pub id: EventId,
    pub pipeline_name: String,
    pub what: EventKind,
    pub parent_event_id: Option<EventId>,
    pub when: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<Snapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exception: Option<String>,
}

fn default_file_type() -> String {
    EVENT_FILE_TYPE.to_string()
}

impl Event {
    pub fn new(
        id: EventId,
        pipeline_name: impl Into<String>,
        what: EventKind,
        parent_event_id: Option<EventId>,
        when: DateTime<Utc>,
    ) -> Self {
        Self {
            file_type: default_file_type(),
            id,
            pipeline_name: pipeline_name.into(),
            what,
            parent_event_id,
            when,
            snapshot: None,
            exit_code: None,
            exception: None,
        }
    }

    pub fn with_snapshot(mut self, snapshot: Snapshot) -> Self {
        self.snapshot = Some(snapshot);
        self
    }

    pub fn with_exit_code(mut self, exit_code: i32) -> Self {
        self.exit_code = Some(exit_code);
        self
    }

    pub fn with_exception(mut self, exception: impl Into<String>) -> Self {
        self.exception = Some(exception.into());
        self
    }

    pub fn has_expected_file_type(&self) -> bool {
        self.file_type == EVENT_FILE_TYPE
    }
}

/// The decoded chain, newest event first.
#[derive(Debug, Clone, Default)]
pub struct EventChain {
    events: Vec<Event>,
}

impl EventChain {
    /// Build from a newest-first event sequence.
    pub fn new(events: Vec<Event>) -> Self {
        Self { events }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// The newest event, if any.
    pub fn head(&self) -> Option<&Event> {
        self.events.first()
    }

    pub fn status(&self) -> Status {
        self.head().map_or(Status::NeverRun, |event| event.what.into())
    }

    /// Name on the newest event, or `None` for an empty chain.
    pub fn current_pipeline_name(&self) -> Option<&str> {
        self.head().map(|event| event.pipeline_name.as_str())
    }

    /// The newest `started` event, walking newest to oldest.
    pub fn newest_started(&self) -> Option<&Event> {
        self.events
            .iter()
            .find(|event| event.what == EventKind::Started)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.events.iter()
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
