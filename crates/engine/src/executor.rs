// SPDX-License-Identifier: MIT
// Copyright (c) 2026 The pmatic authors

//! Pipeline execution.
//!
//! The run protocol is shared across pipeline classes: record `started`
//! (which snapshots the context), launch, block on exit, then record
//! `finished` or `failed`. The class variant only contributes the argv
//! and stdio wiring. Lifecycle recording lives here, not in the variant.

use crate::deployments::DeploymentRegistry;
use crate::error::EngineError;
use crate::pipeline::{Pipeline, SingleTask};
use pmatic_core::{Clock, Dependency, DependencyKind, IdGen, ParamLayers};
use pmatic_storage::{EventLog, Failure};
use std::collections::BTreeSet;
use std::fs::File;
use std::io;
use std::os::unix::process::ExitStatusExt;
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};
use tracing::{debug, info};

/// Run a loaded pipeline under the event-log transaction.
///
/// The caller is expected to have verified dependencies and changed into
/// the context directory; relative stdio paths resolve against it.
pub fn execute<C: Clock, G: IdGen>(
    pipeline: &Pipeline,
    registry: &DeploymentRegistry,
    log: &EventLog<C, G>,
    params: &ParamLayers,
) -> Result<(), EngineError> {
    match pipeline {
        Pipeline::SingleTask {
            name,
            version,
            task,
        } => {
            // Parameters are reserved for future pipeline classes; a
            // single task consumes none.
            debug!(
                pipeline = name,
                params = params.keys().len(),
                "executing single-task pipeline"
            );
            run_single_task(name, version, task, registry, log)
        }
    }
}

fn run_single_task<C: Clock, G: IdGen>(
    name: &str,
    version: &str,
    task: &SingleTask,
    registry: &DeploymentRegistry,
    log: &EventLog<C, G>,
) -> Result<(), EngineError> {
    let dep = Dependency::new(
        task.executable.clone(),
        version,
        DependencyKind::Executable,
    );
    let Some(exe) = registry.path_of(&dep) else {
        let deps: BTreeSet<Dependency> = [dep].into_iter().collect();
        return Err(EngineError::Dependencies(registry.partition(&deps)));
    };
    let exe = exe.to_path_buf();

    log.record_started(name)?;
    info!(pipeline = name, executable = %exe.display(), "launching child process");

    match launch(&exe, task) {
        Err(source) => {
            log.record_failed(name, Failure::Exception(source.to_string()))?;
            Err(EngineError::ChildProcess(source))
        }
        Ok(status) if status.success() => {
            log.record_finished(name)?;
            info!(pipeline = name, "pipeline finished");
            Ok(())
        }
        Ok(status) => {
            let code = exit_code(status);
            log.record_failed(name, Failure::ExitCode(code))?;
            Err(EngineError::ExitCode {
                executable: exe.display().to_string(),
                code,
            })
        }
    }
}

/// Wire stdio, spawn, and block until the child exits.
///
/// Unnamed stdin is `/dev/null`; unnamed stdout/stderr pass through to
/// the caller's.
fn launch(exe: &Path, task: &SingleTask) -> io::Result<ExitStatus> {
    let mut command = Command::new(exe);
    command.args(&task.arguments);
    command.stdin(match &task.stdin {
        Some(path) => Stdio::from(File::open(path)?),
        None => Stdio::null(),
    });
    if let Some(path) = &task.stdout {
        command.stdout(Stdio::from(File::create(path)?));
    }
    if let Some(path) = &task.stderr {
        command.stderr(Stdio::from(File::create(path)?));
    }
    command.status()
}

/// A signal death reports as the negated signal number.
fn exit_code(status: ExitStatus) -> i32 {
    status
        .code()
        .or_else(|| status.signal().map(|sig| -sig))
        .unwrap_or(-1)
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
