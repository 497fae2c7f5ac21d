// SPDX-License-Identifier: MIT
// Copyright (c) 2026 The pmatic authors

//! YAML document helpers.
//!
//! All pmatic state files (events, head pointer) and configuration
//! documents (deployments registry, pipeline definitions) are YAML
//! documents. Writes go through a staging path followed by an atomic
//! rename, so a crash mid-write never leaves a partially written
//! document at the final location.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use thiserror::Error;

/// Errors reading or writing YAML documents
#[derive(Debug, Error)]
pub enum DocError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Load a YAML document from `path`.
pub fn load_yaml<T: DeserializeOwned>(path: &Path) -> Result<T, DocError> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    Ok(serde_yaml::from_reader(reader)?)
}

/// Write `value` to `staging`, fsync, then rename over `target`.
///
/// The rename is the commit point; readers see either the old document
/// or the new one, never a torn write.
pub fn save_yaml<T: Serialize>(staging: &Path, target: &Path, value: &T) -> Result<(), DocError> {
    {
        let file = File::create(staging)?;
        let mut writer = BufWriter::new(file);
        serde_yaml::to_writer(&mut writer, value)?;
        writer.flush()?;
        let file = writer.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
    }
    fs::rename(staging, target)?;
    Ok(())
}

#[cfg(test)]
#[path = "docs_tests.rs"]
mod tests;
