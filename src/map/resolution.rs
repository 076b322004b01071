//! Per-event memoization of topmost-layer resolution.
//!
//! The renderer delivers one native event to many listeners (the map itself
//! plus every mounted layer). Resolving once per native event keeps the
//! hit-test from running per listener and guarantees every listener sees the
//! same answer, even if the registry changes mid-dispatch.
//!
//! Entries hold the native event weakly. The cache never keeps an event
//! alive, and entries for dropped events are pruned on the next insert.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use bevy::log::trace;

use super::event::NativeEvent;

#[derive(Debug)]
struct Entry {
    event: Weak<NativeEvent>,
    /// Resolved layer id, `None` when nothing interactive was hit
    layer: Option<String>,
}

/// Resolved topmost layer per native event, keyed by event identity
#[derive(Debug, Default)]
pub struct EventResolutionCache {
    entries: HashMap<usize, Entry>,
}

impl EventResolutionCache {
    fn key(event: &Arc<NativeEvent>) -> usize {
        Arc::as_ptr(event) as usize
    }

    /// Cached resolution for this event.
    ///
    /// The outer `Option` is the cache hit; the inner one is the resolved
    /// layer (or `None` for a background hit).
    pub fn get(&self, event: &Arc<NativeEvent>) -> Option<Option<&str>> {
        self.entries
            .get(&Self::key(event))
            // A dead entry at the same address belongs to a dropped event
            .filter(|entry| entry.event.strong_count() > 0)
            .map(|entry| entry.layer.as_deref())
    }

    /// Return the cached answer for `event`, or compute it with `resolve`
    /// and remember it. Later changes to the inputs of `resolve` never alter
    /// an answer already cached.
    pub fn resolve_with(
        &mut self,
        event: &Arc<NativeEvent>,
        resolve: impl FnOnce() -> Option<String>,
    ) -> Option<String> {
        if let Some(cached) = self.get(event) {
            trace!("Resolution cache hit: {:?}", cached);
            return cached.map(str::to_string);
        }

        let layer = resolve();
        trace!("Resolved topmost layer: {:?}", layer);

        self.prune();
        self.entries.insert(
            Self::key(event),
            Entry {
                event: Arc::downgrade(event),
                layer: layer.clone(),
            },
        );
        layer
    }

    /// Drop entries whose native event no longer exists
    pub fn prune(&mut self) {
        self.entries.retain(|_, entry| entry.event.strong_count() > 0);
    }

    /// Number of entries for events that are still alive
    pub fn live_len(&self) -> usize {
        self.entries
            .values()
            .filter(|entry| entry.event.strong_count() > 0)
            .count()
    }
}
