// SPDX-License-Identifier: MIT
// Copyright (c) 2026 The pmatic authors

//! Layered run parameters.
//!
//! Pipelines receive their run parameters as an ordered list of string
//! maps; lookup is last-wins. Later layers (command-line overrides) shadow
//! earlier ones (engine defaults) without destroying them.

use std::collections::{BTreeSet, HashMap};

/// An ordered stack of parameter maps with last-wins lookup.
#[derive(Debug, Clone, Default)]
pub struct ParamLayers {
    layers: Vec<HashMap<String, String>>,
}

impl ParamLayers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_layer(layer: HashMap<String, String>) -> Self {
        Self {
            layers: vec![layer],
        }
    }

    /// Push a layer that shadows all existing ones.
    pub fn push_layer(&mut self, layer: HashMap<String, String>) {
        self.layers.push(layer);
    }

    /// Set a key in the topmost layer, creating one if none exists.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        if self.layers.is_empty() {
            self.layers.push(HashMap::new());
        }
        if let Some(top) = self.layers.last_mut() {
            top.insert(key.into(), value.into());
        }
    }

    /// Last-wins lookup across layers.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.layers
            .iter()
            .rev()
            .find_map(|layer| layer.get(key))
            .map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.layers.iter().any(|layer| layer.contains_key(key))
    }

    pub fn is_empty(&self) -> bool {
        self.layers.iter().all(HashMap::is_empty)
    }

    /// All keys visible through the stack, sorted.
    pub fn keys(&self) -> Vec<&str> {
        let set: BTreeSet<&str> = self
            .layers
            .iter()
            .flat_map(|layer| layer.keys().map(String::as_str))
            .collect();
        set.into_iter().collect()
    }

    /// Collapse the stack into a single effective map.
    pub fn flatten(&self) -> HashMap<String, String> {
        let mut flat = HashMap::new();
        for layer in &self.layers {
            for (key, value) in layer {
                flat.insert(key.clone(), value.clone());
            }
        }
        flat
    }
}

#[cfg(test)]
#[path = "params_tests.rs"]
mod tests;
