// SPDX-License-Identifier: MIT
// Copyright (c) 2026 The pmatic authors

//! Pipeline documents.
//!
//! A pipeline document's `file_type` names a class and a version,
//! `<class>-<version>`. Each class is a variant of [`Pipeline`]; loading
//! selects the variant from the tag. Only the single-task class exists
//! today — a pipeline wrapping exactly one executable.

use crate::error::ConfigError;
use pmatic_core::{Dependency, DependencyKind};
use pmatic_storage::docs;
use serde::Deserialize;
use serde_yaml::Value;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// The pipeline class wrapping a single executable.
pub const SINGLE_TASK_CLASS: &str = "single-task";

const FILE_TYPE_KEY: &str = "file_type";

/// `<pmatic_base>/pipelines/<name>.yaml`
pub fn pipeline_path(pmatic_base: &Path, name: &str) -> PathBuf {
    pmatic_base.join("pipelines").join(format!("{}.yaml", name))
}

/// One executable plus its argument list and stdio wiring.
#[derive(Debug, Clone, Deserialize)]
pub struct SingleTask {
    pub executable: String,
    #[serde(default)]
    pub arguments: Vec<String>,
    #[serde(default)]
    pub stdin: Option<String>,
    #[serde(default)]
    pub stdout: Option<String>,
    #[serde(default)]
    pub stderr: Option<String>,
}

/// A loaded pipeline, tagged by class.
#[derive(Debug, Clone)]
pub enum Pipeline {
    SingleTask {
        name: String,
        version: String,
        task: SingleTask,
    },
}

impl Pipeline {
    pub fn name(&self) -> &str {
        match self {
            Pipeline::SingleTask { name, .. } => name,
        }
    }

    /// Every dependency triple the pipeline requires.
    pub fn dependencies(&self) -> BTreeSet<Dependency> {
        match self {
            Pipeline::SingleTask { version, task, .. } => [Dependency::new(
                task.executable.clone(),
                version.clone(),
                DependencyKind::Executable,
            )]
            .into_iter()
            .collect(),
        }
    }
}

/// Load `<pmatic_base>/pipelines/<name>.yaml` and select its class.
pub fn load_pipeline(pmatic_base: &Path, name: &str) -> Result<Pipeline, ConfigError> {
    let path = pipeline_path(pmatic_base, name);
    if !path.is_file() {
        return Err(ConfigError::MissingPipeline(path));
    }
    let doc: Value = docs::load_yaml(&path)?;
    let file_type = doc
        .get(FILE_TYPE_KEY)
        .and_then(Value::as_str)
        .ok_or_else(|| ConfigError::MissingFileType(path.clone()))?;
    let Some((class, version)) = file_type.rsplit_once('-') else {
        return Err(ConfigError::BadFileType {
            path,
            expected: format!("{}-<version>", SINGLE_TASK_CLASS),
            found: file_type.to_string(),
        });
    };
    match class {
        SINGLE_TASK_CLASS => {
            if version != "1" {
                return Err(ConfigError::UnsupportedVersion {
                    class: class.to_string(),
                    version: version.to_string(),
                    path,
                });
            }
            let version = version.to_string();
            let task: SingleTask =
                serde_yaml::from_value(doc).map_err(pmatic_storage::DocError::from)?;
            Ok(Pipeline::SingleTask {
                name: name.to_string(),
                version,
                task,
            })
        }
        other => Err(ConfigError::UnknownPipelineClass {
            class: other.to_string(),
            path,
        }),
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
