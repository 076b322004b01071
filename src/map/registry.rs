//! Interactivity registry: which mounted layers take part in pointer
//! resolution.
//!
//! Every layer registers itself on mount and must unregister on unmount. A
//! stale entry is a correctness bug, not just a leak: a layer that no longer
//! exists could still win topmost resolution.

use std::collections::HashMap;

use bevy::log::debug;

/// Interaction metadata for one mounted layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerInfo {
    pub interactive: bool,
}

impl Default for LayerInfo {
    fn default() -> Self {
        Self { interactive: true }
    }
}

/// Mapping from layer id to its interaction metadata
#[derive(Debug, Default)]
pub struct LayerRegistry {
    layers: HashMap<String, LayerInfo>,
}

impl LayerRegistry {
    /// Register (or re-register) a layer. The most recent registration wins.
    pub fn register(&mut self, id: impl Into<String>, info: LayerInfo) {
        let id = id.into();
        debug!("Registering layer {} (interactive: {})", id, info.interactive);
        self.layers.insert(id, info);
    }

    /// Remove a layer's entry, returning it if it was registered
    pub fn unregister(&mut self, id: &str) -> Option<LayerInfo> {
        let removed = self.layers.remove(id);
        if removed.is_some() {
            debug!("Unregistered layer {}", id);
        }
        removed
    }

    pub fn get(&self, id: &str) -> Option<&LayerInfo> {
        self.layers.get(id)
    }

    /// Unknown layers count as non-interactive
    pub fn is_interactive(&self, id: &str) -> bool {
        self.layers.get(id).is_some_and(|info| info.interactive)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.layers.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Registered layer ids, in no particular order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.layers.keys().map(String::as_str)
    }
}
