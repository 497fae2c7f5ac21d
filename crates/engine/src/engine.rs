// SPDX-License-Identifier: MIT
// Copyright (c) 2026 The pmatic authors

//! The run and revert workflows.
//!
//! `run` is a transaction over the context directory: dependency
//! verification strictly precedes the `started` event, snapshot capture
//! strictly precedes the child launch, and the child's exit strictly
//! precedes the terminal event. `revert` walks the event chain back past
//! the newest run and restores its pre-run snapshot.

use crate::deployments::DeploymentRegistry;
use crate::error::{ConfigError, EngineError};
use crate::executor;
use crate::pipeline::load_pipeline;
use pmatic_core::ParamLayers;
use pmatic_storage::{ContextDir, EventLog};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Composes the pipeline loader, dependency resolver, event log, and
/// executor for one context directory.
pub struct Engine {
    pmatic_base: PathBuf,
    context: ContextDir,
    registry: DeploymentRegistry,
    log: EventLog,
}

impl Engine {
    /// `pmatic_base` holds the deployments registry and the pipeline
    /// documents; `context_path` is the working tree to run against.
    pub fn new(
        pmatic_base: impl AsRef<Path>,
        context_path: impl AsRef<Path>,
    ) -> Result<Self, EngineError> {
        let pmatic_base = fs::canonicalize(pmatic_base.as_ref()).map_err(ConfigError::Io)?;
        let context = ContextDir::new(context_path).map_err(ConfigError::Context)?;
        let registry = DeploymentRegistry::load(&pmatic_base)?;
        let log = EventLog::new(context.clone());
        Ok(Self {
            pmatic_base,
            context,
            registry,
            log,
        })
    }

    /// Run `pipeline_name` against the context directory.
    ///
    /// Refuses while the context is dirty: a `started` or `failed` run
    /// must be reverted before another run can begin.
    pub fn run(
        &self,
        pipeline_name: &str,
        overrides: HashMap<String, String>,
    ) -> Result<(), EngineError> {
        let pipeline = load_pipeline(&self.pmatic_base, pipeline_name)?;

        self.log.ensure_log_exists()?;
        let chain = self.log.read()?;
        let status = chain.status();
        if !status.is_runnable() {
            return Err(EngineError::State {
                pipeline: chain
                    .current_pipeline_name()
                    .unwrap_or(pipeline_name)
                    .to_string(),
                status,
            });
        }

        let issues = self.registry.partition(&pipeline.dependencies());
        if !issues.is_empty() {
            return Err(EngineError::Dependencies(issues));
        }

        let mut params = ParamLayers::from_layer(HashMap::from([
            (
                "pmatic_base".to_string(),
                self.pmatic_base.display().to_string(),
            ),
            (
                "context_path".to_string(),
                self.context.root().display().to_string(),
            ),
        ]));
        params.push_layer(overrides);

        info!(pipeline = pipeline_name, context = %self.context, "running pipeline");
        std::env::set_current_dir(self.context.root()).map_err(ConfigError::Io)?;
        executor::execute(&pipeline, &self.registry, &self.log, &params)
    }

    /// Restore the context to the state before its newest run.
    pub fn revert(&self) -> Result<(), EngineError> {
        self.log.ensure_log_exists()?;
        info!(context = %self.context, "reverting context");
        self.log.revert_one()?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
