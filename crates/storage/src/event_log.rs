// SPDX-License-Identifier: MIT
// Copyright (c) 2026 The pmatic authors

//! The append-only event log.
//!
//! Layout under `<ctx>/.pmatic/events/`:
//! - `db/<id>.yaml` — one immutable file per event;
//! - `new/` — staging area for atomic renames;
//! - `head` — the newest reachable event id, a plain YAML scalar.
//!
//! Posting an event commits two renames: the event file into `db/`, then
//! the updated `head`. Each rename is atomic but the pair is not — a
//! crash between them leaves an orphan event in `db/` and a consistent
//! head. The reverse cannot happen because `head` is only updated after
//! the event file lands. That ordering is the crash-recovery contract.

use crate::context::ContextDir;
use crate::docs::{self, DocError};
use crate::snapshot::{create_snapshot, restore_snapshot, SnapshotError};
use pmatic_core::{
    Clock, Event, EventChain, EventId, EventKind, IdGen, Status, SystemClock, UuidIdGen,
};
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info};

/// Errors that can occur in event log operations
#[derive(Debug, Error)]
pub enum EventLogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Doc(#[from] DocError),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    #[error("event chain is cyclic at '{0}'")]
    CyclicChain(EventId),
    #[error("event '{id}' has unsupported file_type '{file_type}'")]
    BadEventFileType { id: EventId, file_type: String },
    #[error("event log is empty, nothing to revert")]
    NothingToRevert,
    #[error("no started event to revert to")]
    NoStartedEvent,
    #[error("cannot revert: newest started event belongs to pipeline '{started}', but the current pipeline is '{current}'")]
    PipelineMismatch { started: String, current: String },
    #[error("started event '{0}' has no embedded snapshot")]
    MissingSnapshot(EventId),
}

/// What a `failed` event carries.
#[derive(Debug, Clone)]
pub enum Failure {
    /// The child exited nonzero (a signal death is the negated signal number)
    ExitCode(i32),
    /// The launch or wait itself blew up
    Exception(String),
}

/// Append-only record of pipeline lifecycle events for one context.
#[derive(Clone)]
pub struct EventLog<C: Clock = SystemClock, G: IdGen = UuidIdGen> {
    context: ContextDir,
    db_path: PathBuf,
    new_path: PathBuf,
    head_path: PathBuf,
    clock: C,
    ids: G,
}

impl EventLog {
    pub fn new(context: ContextDir) -> Self {
        Self::with_parts(context, SystemClock, UuidIdGen::new())
    }
}

impl<C: Clock, G: IdGen> EventLog<C, G> {
    /// Build a log with explicit clock and id source (used by tests).
    pub fn with_parts(context: ContextDir, clock: C, ids: G) -> Self {
        let events_path = context.events_dir();
        Self {
            db_path: events_path.join("db"),
            new_path: events_path.join("new"),
            head_path: events_path.join("head"),
            context,
            clock,
            ids,
        }
    }

    pub fn log_exists(&self) -> bool {
        self.db_path.is_dir()
    }

    /// Create the log skeleton if it is missing.
    pub fn ensure_log_exists(&self) -> Result<(), EventLogError> {
        fs::create_dir_all(&self.db_path)?;
        fs::create_dir_all(&self.new_path)?;
        Ok(())
    }

    /// Decode the chain from `head` back to the root event.
    pub fn read(&self) -> Result<EventChain, EventLogError> {
        if !self.log_exists() {
            return Ok(EventChain::empty());
        }
        let mut next = self.read_head()?;
        let mut events = Vec::new();
        let mut seen = HashSet::new();
        while let Some(id) = next {
            if !seen.insert(id.clone()) {
                return Err(EventLogError::CyclicChain(id));
            }
            let event = self.read_event(&id)?;
            next = event.parent_event_id.clone();
            events.push(event);
        }
        Ok(EventChain::new(events))
    }

    /// Status projection of the chain; `never_run` when there is no log.
    pub fn status(&self) -> Result<Status, EventLogError> {
        Ok(self.read()?.status())
    }

    pub fn current_pipeline_name(&self) -> Result<Option<String>, EventLogError> {
        Ok(self.read()?.current_pipeline_name().map(str::to_string))
    }

    fn read_head(&self) -> Result<Option<EventId>, EventLogError> {
        if !self.head_path.is_file() {
            return Ok(None);
        }
        let id: Option<String> = docs::load_yaml(&self.head_path)?;
        Ok(id.map(EventId::new))
    }

    fn read_event(&self, id: &EventId) -> Result<Event, EventLogError> {
        let event: Event = docs::load_yaml(&self.db_path.join(format!("{}.yaml", id)))?;
        if !event.has_expected_file_type() {
            return Err(EventLogError::BadEventFileType {
                id: id.clone(),
                file_type: event.file_type,
            });
        }
        Ok(event)
    }

    /// Record that a pipeline is about to launch.
    ///
    /// Captures the context snapshot and embeds it, so the run can be
    /// reverted later. The snapshot strictly precedes the child launch.
    pub fn record_started(&self, pipeline_name: &str) -> Result<(), EventLogError> {
        self.ensure_log_exists()?;
        let snapshot = create_snapshot(&self.context)?;
        let event = self
            .next_event(pipeline_name, EventKind::Started)?
            .with_snapshot(snapshot);
        self.post(event)
    }

    pub fn record_finished(&self, pipeline_name: &str) -> Result<(), EventLogError> {
        self.ensure_log_exists()?;
        let event = self.next_event(pipeline_name, EventKind::Finished)?;
        self.post(event)
    }

    pub fn record_failed(
        &self,
        pipeline_name: &str,
        failure: Failure,
    ) -> Result<(), EventLogError> {
        self.ensure_log_exists()?;
        let event = self.next_event(pipeline_name, EventKind::Failed)?;
        let event = match failure {
            Failure::ExitCode(code) => event.with_exit_code(code),
            Failure::Exception(message) => event.with_exception(message),
        };
        self.post(event)
    }

    /// Revert the newest run: restore its pre-run snapshot and jump the
    /// head back past it.
    ///
    /// The `reverted` event branches off the pre-`started` head — its
    /// parent is the `started` event's own parent — so the chain walked
    /// from the new head stays connected while the aborted run's events
    /// become unreachable orphans in `db/`.
    pub fn revert_one(&self) -> Result<(), EventLogError> {
        let chain = self.read()?;
        let current = chain
            .current_pipeline_name()
            .ok_or(EventLogError::NothingToRevert)?
            .to_string();
        let started = chain
            .newest_started()
            .ok_or(EventLogError::NoStartedEvent)?;
        if started.pipeline_name != current {
            return Err(EventLogError::PipelineMismatch {
                started: started.pipeline_name.clone(),
                current,
            });
        }
        let snapshot = started
            .snapshot
            .as_ref()
            .ok_or_else(|| EventLogError::MissingSnapshot(started.id.clone()))?;

        restore_snapshot(&self.context, snapshot, self.clock.now_utc())?;

        let event = Event::new(
            EventId::new(self.ids.next()),
            current.clone(),
            EventKind::Reverted,
            started.parent_event_id.clone(),
            self.clock.now_utc(),
        );
        info!(pipeline = %current, reverted_past = %started.id, "reverted pipeline run");
        self.post(event)
    }

    /// Build an event pointing at the current head.
    fn next_event(&self, pipeline_name: &str, what: EventKind) -> Result<Event, EventLogError> {
        Ok(Event::new(
            EventId::new(self.ids.next()),
            pipeline_name,
            what,
            self.read_head()?,
            self.clock.now_utc(),
        ))
    }

    /// Persist an event, then move the head to it.
    fn post(&self, event: Event) -> Result<(), EventLogError> {
        let file_name = format!("{}.yaml", event.id);
        docs::save_yaml(
            &self.new_path.join(&file_name),
            &self.db_path.join(&file_name),
            &event,
        )?;
        docs::save_yaml(
            &self.new_path.join("head"),
            &self.head_path,
            &event.id.as_str(),
        )?;
        debug!(id = %event.id, what = %event.what, "posted event");
        Ok(())
    }
}

#[cfg(test)]
#[path = "event_log_tests.rs"]
mod tests;
