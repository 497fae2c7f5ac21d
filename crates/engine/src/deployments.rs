// SPDX-License-Identifier: MIT
// Copyright (c) 2026 The pmatic authors

//! The deployment registry: where dependencies live on disk.
//!
//! Loaded once from `<pmatic_base>/deployments.yaml`, which maps each
//! dependency name to a version table of path templates. Templates may
//! reference the `pmatic_base` variable; resolution yields an absolute
//! path.

use crate::error::ConfigError;
use pmatic_core::{Dependency, DependencyKind};
use pmatic_storage::docs;
use serde_yaml::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// `file_type` tag required on the registry document.
pub const DEPLOYMENTS_FILE_TYPE: &str = "deployments-1";

const FILE_TYPE_KEY: &str = "file_type";

/// Resolves `(name, version)` pairs to absolute paths and verifies
/// dependency triples against the filesystem.
#[derive(Debug, Clone)]
pub struct DeploymentRegistry {
    registry_path: PathBuf,
    paths: BTreeMap<(String, String), PathBuf>,
}

impl DeploymentRegistry {
    /// Load and resolve the registry under `pmatic_base`.
    pub fn load(pmatic_base: &Path) -> Result<Self, ConfigError> {
        let registry_path = pmatic_base.join("deployments.yaml");
        if !registry_path.is_file() {
            return Err(ConfigError::MissingRegistry(registry_path));
        }
        let doc: Value = docs::load_yaml(&registry_path)?;
        let mapping = doc.as_mapping().ok_or_else(|| ConfigError::BadFileType {
            path: registry_path.clone(),
            expected: DEPLOYMENTS_FILE_TYPE.to_string(),
            found: "non-mapping document".to_string(),
        })?;

        let file_type = mapping
            .get(FILE_TYPE_KEY)
            .and_then(Value::as_str)
            .ok_or_else(|| ConfigError::MissingFileType(registry_path.clone()))?;
        if file_type != DEPLOYMENTS_FILE_TYPE {
            return Err(ConfigError::BadFileType {
                path: registry_path,
                expected: DEPLOYMENTS_FILE_TYPE.to_string(),
                found: file_type.to_string(),
            });
        }

        let mut paths = BTreeMap::new();
        for (name, versions) in mapping {
            let name = match name.as_str() {
                Some(FILE_TYPE_KEY) => continue,
                Some(name) => name,
                None => continue,
            };
            let versions =
                versions
                    .as_mapping()
                    .ok_or_else(|| ConfigError::MalformedDeployment {
                        name: name.to_string(),
                        message: "expected a mapping of version to path".to_string(),
                    })?;
            for (version, template) in versions {
                let version = scalar_key(version).ok_or_else(|| {
                    ConfigError::MalformedDeployment {
                        name: name.to_string(),
                        message: "version key must be a scalar".to_string(),
                    }
                })?;
                let template =
                    template
                        .as_str()
                        .ok_or_else(|| ConfigError::MalformedDeployment {
                            name: name.to_string(),
                            message: format!("path for version '{}' must be a string", version),
                        })?;
                let resolved = expand_template(template, pmatic_base)?;
                paths.insert((name.to_string(), version), resolved);
            }
        }
        debug!(registry = %registry_path.display(), entries = paths.len(), "loaded deployments");
        Ok(Self {
            registry_path,
            paths,
        })
    }

    pub fn registry_path(&self) -> &Path {
        &self.registry_path
    }

    /// `(name, version)` appears in the registry.
    pub fn is_listed(&self, dep: &Dependency) -> bool {
        self.path_of(dep).is_some()
    }

    /// Absolute path the dependency resolves to, when listed.
    pub fn path_of(&self, dep: &Dependency) -> Option<&Path> {
        self.paths
            .get(&(dep.name.clone(), dep.version.clone()))
            .map(PathBuf::as_path)
    }

    /// The resolved path exists on disk. Assumes the dependency is listed.
    pub fn exists(&self, dep: &Dependency) -> bool {
        self.path_of(dep).is_some_and(|path| path.exists())
    }

    /// The resolved path has the declared kind. Assumes listed and existing.
    pub fn has_correct_type(&self, dep: &Dependency) -> bool {
        let Some(path) = self.path_of(dep) else {
            return false;
        };
        match dep.kind {
            DependencyKind::Directory => path.is_dir(),
            DependencyKind::File => path.is_file(),
            DependencyKind::Executable => path.is_file() && is_executable(path),
            DependencyKind::Link => path.is_symlink(),
        }
    }

    /// Sort each dependency into at most one failure category.
    ///
    /// The predicates run in listed → exists → correct-type order, so the
    /// categories partition the failing dependencies.
    pub fn partition(&self, deps: &BTreeSet<Dependency>) -> DependencyIssues {
        let mut issues = DependencyIssues::new(self.registry_path.clone());
        for dep in deps {
            if !self.is_listed(dep) {
                issues.unlisted.push(dep.clone());
            } else if !self.exists(dep) {
                issues
                    .missing
                    .push(self.path_of(dep).unwrap_or(Path::new("")).to_path_buf());
            } else if !self.has_correct_type(dep) {
                issues.bad_type.push((
                    dep.kind,
                    self.path_of(dep).unwrap_or(Path::new("")).to_path_buf(),
                ));
            }
        }
        issues
    }
}

/// Expand `$pmatic_base` / `${pmatic_base}` and absolutize the result.
fn expand_template(template: &str, pmatic_base: &Path) -> Result<PathBuf, ConfigError> {
    let base = pmatic_base.to_string_lossy();
    let expanded = template
        .replace("${pmatic_base}", &base)
        .replace("$pmatic_base", &base);
    Ok(std::path::absolute(expanded)?)
}

/// String form of a YAML mapping key: `1` and `"1"` resolve identically.
fn scalar_key(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Whether some execute bit is set. Permission bits only; pipelines run
/// with the invoking user's privileges.
fn is_executable(path: &Path) -> bool {
    fs::metadata(path)
        .map(|meta| meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

/// Dependencies that failed verification, grouped by failure category.
///
/// Each group is already sorted because `partition` consumes an ordered
/// set. `Display` prints every non-empty group, one entry per line.
#[derive(Debug, Clone)]
pub struct DependencyIssues {
    registry_path: PathBuf,
    pub unlisted: Vec<Dependency>,
    pub missing: Vec<PathBuf>,
    pub bad_type: Vec<(DependencyKind, PathBuf)>,
}

impl DependencyIssues {
    fn new(registry_path: PathBuf) -> Self {
        Self {
            registry_path,
            unlisted: Vec::new(),
            missing: Vec::new(),
            bad_type: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.unlisted.is_empty() && self.missing.is_empty() && self.bad_type.is_empty()
    }
}

impl fmt::Display for DependencyIssues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut lines = Vec::new();
        if !self.unlisted.is_empty() {
            lines.push(format!(
                "The following dependencies are not listed in {}:",
                self.registry_path.display()
            ));
            lines.extend(self.unlisted.iter().map(Dependency::to_string));
        }
        if !self.missing.is_empty() {
            lines.push("The following dependencies are missing:".to_string());
            lines.extend(self.missing.iter().map(|path| format!("'{}'", path.display())));
        }
        if !self.bad_type.is_empty() {
            lines.push("The following dependencies have the wrong type:".to_string());
            lines.extend(
                self.bad_type
                    .iter()
                    .map(|(kind, path)| format!("need '{}': '{}'", kind, path.display())),
            );
        }
        write!(f, "{}", lines.join("\n"))
    }
}

#[cfg(test)]
#[path = "deployments_tests.rs"]
mod tests;
