// SPDX-License-Identifier: MIT
// Copyright (c) 2026 The pmatic authors

//! Dependency triples declared by pipelines.

use serde::{Deserialize, Serialize};
use std::fmt;

/// What kind of filesystem object a dependency must resolve to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum DependencyKind {
    Directory,
    File,
    Executable,
    Link,
}

impl fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DependencyKind::Directory => "directory",
            DependencyKind::File => "file",
            DependencyKind::Executable => "executable",
            DependencyKind::Link => "link",
        };
        write!(f, "{}", name)
    }
}

/// A `(name, version, kind)` triple identifying a required external artifact.
///
/// The derived `Ord` sorts by name, then version, then kind — the order in
/// which failure groups are reported.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Dependency {
    pub name: String,
    pub version: String,
    pub kind: DependencyKind,
}

impl Dependency {
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        kind: DependencyKind,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            kind,
        }
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "('{}', '{}', '{}')", self.name, self.version, self.kind)
    }
}

#[cfg(test)]
#[path = "dependency_tests.rs"]
mod tests;
