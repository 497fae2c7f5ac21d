// SPDX-License-Identifier: MIT
// Copyright (c) 2026 The pmatic authors

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! pmatic-engine: dependency resolution, pipeline loading, and the
//! run/revert orchestration.

mod deployments;
mod engine;
mod error;
mod executor;
mod pipeline;

pub use deployments::{DependencyIssues, DeploymentRegistry, DEPLOYMENTS_FILE_TYPE};
pub use engine::Engine;
pub use error::{ConfigError, EngineError};
pub use pipeline::{load_pipeline, pipeline_path, Pipeline, SingleTask, SINGLE_TASK_CLASS};
