//! Broadcast of marker clicks.
//!
//! Marker overlays don't feed the renderer's event stream, so anything that
//! must react to "a click anywhere" (a popup closing on outside click, for
//! example) subscribes here as well as listening to map events.

use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bevy::log::debug;

use super::event::MarkerClickInfo;

/// A marker click callback, compared by identity.
///
/// Cloning shares the callback, so a clone removes the same subscription.
#[derive(Clone)]
pub struct MarkerClickHandler(Arc<dyn Fn(&MarkerClickInfo) + Send + Sync>);

impl MarkerClickHandler {
    pub fn new(callback: impl Fn(&MarkerClickInfo) + Send + Sync + 'static) -> Self {
        Self(Arc::new(callback))
    }

    fn call(&self, info: &MarkerClickInfo) {
        (self.0)(info);
    }
}

impl PartialEq for MarkerClickHandler {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.0), Arc::as_ptr(&other.0))
    }
}

impl Eq for MarkerClickHandler {}

impl Hash for MarkerClickHandler {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Arc::as_ptr(&self.0) as *const ()).hash(state);
    }
}

impl fmt::Debug for MarkerClickHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MarkerClickHandler({:p})", Arc::as_ptr(&self.0) as *const ())
    }
}

/// Set of marker click subscribers.
///
/// Cheap to clone; clones share the same subscriber set, so a handler can
/// hold a clone and unsubscribe itself.
#[derive(Clone, Default)]
pub struct MarkerClickManager {
    handlers: Arc<Mutex<HashSet<MarkerClickHandler>>>,
}

impl MarkerClickManager {
    fn lock(&self) -> MutexGuard<'_, HashSet<MarkerClickHandler>> {
        self.handlers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Subscribe a handler. Returns false if it was already subscribed.
    pub fn add(&self, handler: MarkerClickHandler) -> bool {
        let added = self.lock().insert(handler);
        if added {
            debug!("Marker click handler added");
        }
        added
    }

    /// Unsubscribe a handler. Returns false if it wasn't subscribed.
    pub fn remove(&self, handler: &MarkerClickHandler) -> bool {
        let removed = self.lock().remove(handler);
        if removed {
            debug!("Marker click handler removed");
        }
        removed
    }

    /// Invoke every subscribed handler with the same payload.
    ///
    /// The subscriber set is snapshotted first: handlers added or removed
    /// during dispatch take effect from the next click.
    pub fn handle_click(&self, info: &MarkerClickInfo) {
        let snapshot: Vec<MarkerClickHandler> = self.lock().iter().cloned().collect();
        for handler in &snapshot {
            handler.call(info);
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl fmt::Debug for MarkerClickManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MarkerClickManager")
            .field("handlers", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::identity::Marker;
    use crate::map::renderer::LngLat;
    use bevy::prelude::Entity;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn click() -> MarkerClickInfo {
        MarkerClickInfo {
            map: Entity::PLACEHOLDER,
            marker: Marker::new("m1", LngLat::new(2.35, 48.85)),
            lng_lat: LngLat::new(2.35, 48.85),
            features: Vec::new(),
        }
    }

    fn counting_handler() -> (MarkerClickHandler, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = count.clone();
        let handler = MarkerClickHandler::new(move |_| {
            seen.fetch_add(1, Ordering::Relaxed);
        });
        (handler, count)
    }

    #[test]
    fn test_handler_invoked_once_per_click() {
        let manager = MarkerClickManager::default();
        let (handler, count) = counting_handler();

        manager.add(handler);
        manager.handle_click(&click());
        assert_eq!(count.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_handler_receives_payload() {
        let manager = MarkerClickManager::default();
        let seen = Arc::new(Mutex::new(None));
        let sink = seen.clone();
        manager.add(MarkerClickHandler::new(move |info| {
            *sink.lock().unwrap() = Some(info.marker.id.clone());
        }));

        manager.handle_click(&click());
        assert_eq!(seen.lock().unwrap().as_deref(), Some("m1"));
    }

    #[test]
    fn test_removed_handler_not_invoked() {
        let manager = MarkerClickManager::default();
        let (handler, count) = counting_handler();

        manager.add(handler.clone());
        assert!(manager.remove(&handler));
        manager.handle_click(&click());
        manager.handle_click(&click());

        assert_eq!(count.load(Ordering::Relaxed), 0);
        assert!(manager.is_empty());
    }

    #[test]
    fn test_duplicate_add_is_noop() {
        let manager = MarkerClickManager::default();
        let (handler, count) = counting_handler();

        assert!(manager.add(handler.clone()));
        assert!(!manager.add(handler));
        manager.handle_click(&click());

        assert_eq!(manager.len(), 1);
        assert_eq!(count.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_distinct_handlers_all_invoked() {
        let manager = MarkerClickManager::default();
        let (a, count_a) = counting_handler();
        let (b, count_b) = counting_handler();

        manager.add(a);
        manager.add(b);
        manager.handle_click(&click());

        assert_eq!(count_a.load(Ordering::Relaxed), 1);
        assert_eq!(count_b.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_handler_removing_itself_during_dispatch() {
        let manager = MarkerClickManager::default();
        let count = Arc::new(AtomicUsize::new(0));
        let slot: Arc<Mutex<Option<MarkerClickHandler>>> = Arc::new(Mutex::new(None));

        let inner_manager = manager.clone();
        let inner_slot = slot.clone();
        let seen = count.clone();
        let handler = MarkerClickHandler::new(move |_| {
            seen.fetch_add(1, Ordering::Relaxed);
            if let Some(me) = inner_slot.lock().unwrap().take() {
                inner_manager.remove(&me);
            }
        });
        *slot.lock().unwrap() = Some(handler.clone());

        manager.add(handler);
        manager.handle_click(&click());
        manager.handle_click(&click());

        assert_eq!(count.load(Ordering::Relaxed), 1);
        assert!(manager.is_empty());
    }

    #[test]
    fn test_handler_added_during_dispatch_runs_next_click() {
        let manager = MarkerClickManager::default();
        let (late, late_count) = counting_handler();

        let inner_manager = manager.clone();
        manager.add(MarkerClickHandler::new(move |_| {
            inner_manager.add(late.clone());
        }));

        manager.handle_click(&click());
        assert_eq!(late_count.load(Ordering::Relaxed), 0);

        manager.handle_click(&click());
        assert_eq!(late_count.load(Ordering::Relaxed), 1);
    }
}
