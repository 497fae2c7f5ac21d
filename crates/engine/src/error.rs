// SPDX-License-Identifier: MIT
// Copyright (c) 2026 The pmatic authors

//! Error types for the engine

use crate::deployments::DependencyIssues;
use pmatic_core::Status;
use pmatic_storage::{ContextError, DocError, EventLogError};
use std::path::PathBuf;
use thiserror::Error;

/// Faults in the configuration surface: the pmatic base directory, the
/// deployments registry, and pipeline documents.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("'{}' is not a file", .0.display())]
    MissingPipeline(PathBuf),
    #[error("deployments registry '{}' is not a file", .0.display())]
    MissingRegistry(PathBuf),
    #[error(transparent)]
    Context(#[from] ContextError),
    #[error("missing file_type in {}", .0.display())]
    MissingFileType(PathBuf),
    #[error("bad file_type in {}: expected '{expected}', found '{found}'", .path.display())]
    BadFileType {
        path: PathBuf,
        expected: String,
        found: String,
    },
    #[error("unknown pipeline class '{class}' in {}", .path.display())]
    UnknownPipelineClass { class: String, path: PathBuf },
    #[error("unsupported {class} version '{version}' in {}", .path.display())]
    UnsupportedVersion {
        class: String,
        version: String,
        path: PathBuf,
    },
    #[error("malformed deployments entry for '{name}': {message}")]
    MalformedDeployment { name: String, message: String },
    #[error(transparent)]
    Doc(#[from] DocError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur while running or reverting a pipeline
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("{0}")]
    Dependencies(DependencyIssues),
    #[error("Cannot run, because pipeline '{pipeline}' has a status of '{status}'")]
    State { pipeline: String, status: Status },
    #[error(transparent)]
    EventLog(#[from] EventLogError),
    #[error("failed to launch child process: {0}")]
    ChildProcess(std::io::Error),
    #[error("exit code {code} from '{executable}'")]
    ExitCode { executable: String, code: i32 },
}
