//! Pointer events and interaction payloads.

use std::sync::Arc;

use bevy::math::Vec2;
use bevy::prelude::Entity;
use chrono::{DateTime, Utc};

use crate::constants::{CLUSTER_FLAG_PROPERTY, CLUSTER_ID_PROPERTY};

use super::identity::MarkerHandle;
use super::renderer::{Feature, LngLat};

/// Kind of pointer interaction reported by the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerKind {
    Click,
    DoubleClick,
    ContextMenu,
    Move,
    Enter,
    Leave,
}

/// One physical input event as delivered by the platform.
///
/// Identity matters, not contents: the renderer fans a single native event
/// out to many listeners, and each listener holds the same `Arc`.
#[derive(Debug)]
pub struct NativeEvent {
    pub kind: PointerKind,
    pub timestamp: DateTime<Utc>,
}

impl NativeEvent {
    pub fn new(kind: PointerKind) -> Arc<Self> {
        Arc::new(Self {
            kind,
            timestamp: Utc::now(),
        })
    }
}

/// Pointer event emitted by the renderer for a concrete screen point
#[derive(Debug, Clone)]
pub struct PointerEvent {
    pub native: Arc<NativeEvent>,
    /// Screen point in renderer pixels
    pub point: Vec2,
    pub lng_lat: LngLat,
}

impl PointerEvent {
    pub fn new(native: Arc<NativeEvent>, point: Vec2, lng_lat: LngLat) -> Self {
        Self {
            native,
            point,
            lng_lat,
        }
    }

    pub fn kind(&self) -> PointerKind {
        self.native.kind
    }

    /// True if both events come from the same physical interaction
    pub fn same_native(&self, other: &PointerEvent) -> bool {
        Arc::ptr_eq(&self.native, &other.native)
    }
}

/// A pointer interaction resolved to one layer
#[derive(Debug, Clone)]
pub struct LayerClickInfo {
    /// Map root entity the interaction happened on
    pub map: Entity,
    pub event: PointerEvent,
    /// Set when the topmost feature is a renderer-generated cluster
    pub cluster_id: Option<String>,
    pub layer: String,
    pub source: String,
    pub features: Vec<Feature>,
}

impl LayerClickInfo {
    pub fn new(
        map: Entity,
        event: PointerEvent,
        layer: String,
        source: String,
        features: Vec<Feature>,
    ) -> Self {
        let cluster_id = features.first().and_then(cluster_id_of);
        Self {
            map,
            event,
            cluster_id,
            layer,
            source,
            features,
        }
    }
}

/// A click on a marker overlay.
///
/// Markers live outside the renderer's event stream, so these never arrive
/// as [`PointerEvent`]s.
#[derive(Debug, Clone)]
pub struct MarkerClickInfo {
    pub map: Entity,
    pub marker: MarkerHandle,
    pub lng_lat: LngLat,
    pub features: Vec<Feature>,
}

/// Last cross-source interaction observed by a map
#[derive(Debug, Clone)]
pub enum LayerEvent {
    Layer(LayerClickInfo),
    Marker(MarkerClickInfo),
}

impl LayerEvent {
    pub fn lng_lat(&self) -> LngLat {
        match self {
            LayerEvent::Layer(info) => info.event.lng_lat,
            LayerEvent::Marker(info) => info.lng_lat,
        }
    }
}

/// Cluster id of a feature, if the renderer marked it as a cluster
fn cluster_id_of(feature: &Feature) -> Option<String> {
    let is_cluster = feature
        .properties
        .get(CLUSTER_FLAG_PROPERTY)
        .and_then(serde_json::Value::as_bool)
        .unwrap_or(false);
    if !is_cluster {
        return None;
    }

    match feature.properties.get(CLUSTER_ID_PROPERTY)? {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::renderer::Geometry;

    fn event() -> PointerEvent {
        PointerEvent::new(
            NativeEvent::new(PointerKind::Click),
            Vec2::new(5.0, 5.0),
            LngLat::new(13.4, 52.5),
        )
    }

    fn feature() -> Feature {
        Feature::new("clusters", "pins", Geometry::Point(LngLat::new(13.4, 52.5)))
    }

    #[test]
    fn test_cluster_id_from_cluster_feature() {
        let features = vec![
            feature()
                .with_property("cluster", true)
                .with_property("cluster_id", 42),
        ];
        let info = LayerClickInfo::new(
            Entity::PLACEHOLDER,
            event(),
            "clusters".into(),
            "pins".into(),
            features,
        );
        assert_eq!(info.cluster_id.as_deref(), Some("42"));
    }

    #[test]
    fn test_no_cluster_id_for_plain_feature() {
        let features = vec![feature().with_property("cluster_id", 42)];
        let info = LayerClickInfo::new(
            Entity::PLACEHOLDER,
            event(),
            "clusters".into(),
            "pins".into(),
            features,
        );
        assert!(info.cluster_id.is_none());
    }

    #[test]
    fn test_cloned_events_share_native_identity() {
        let a = event();
        let b = a.clone();
        let c = event();
        assert!(a.same_native(&b));
        assert!(!a.same_native(&c));
        assert_eq!(a.kind(), PointerKind::Click);
    }
}
