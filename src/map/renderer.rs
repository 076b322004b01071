//! Boundary to the underlying map engine.
//!
//! The renderer owns sources, layers and tiles; this crate only needs it to
//! answer hit-testing queries and to release its resources on teardown.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use bevy::math::{Rect, Vec2};
use serde::{Deserialize, Serialize};

/// Geographic coordinate in degrees, serialized as a GeoJSON `[lng, lat]` position
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct LngLat {
    pub lng: f64,
    pub lat: f64,
}

impl LngLat {
    pub fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }
}

impl From<[f64; 2]> for LngLat {
    fn from([lng, lat]: [f64; 2]) -> Self {
        Self { lng, lat }
    }
}

impl From<LngLat> for [f64; 2] {
    fn from(lng_lat: LngLat) -> Self {
        [lng_lat.lng, lng_lat.lat]
    }
}

/// Geometry of a rendered feature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum Geometry {
    Point(LngLat),
    LineString(Vec<LngLat>),
    Polygon(Vec<Vec<LngLat>>),
}

/// A feature the renderer drew at some screen point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    /// Renderer-side feature id, if the source provides one
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    /// Layer that rendered this feature
    pub layer: String,
    /// Source the feature came from
    pub source: String,
    #[serde(default)]
    pub properties: serde_json::Map<String, serde_json::Value>,
    pub geometry: Geometry,
}

impl Feature {
    pub fn new(layer: impl Into<String>, source: impl Into<String>, geometry: Geometry) -> Self {
        Self {
            id: None,
            layer: layer.into(),
            source: source.into(),
            properties: serde_json::Map::new(),
            geometry,
        }
    }

    pub fn with_id(mut self, id: impl Into<serde_json::Value>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_property(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.properties.insert(key.to_string(), value.into());
        self
    }
}

/// The live map engine behind a [`MapContext`](super::MapContext).
///
/// Implementations must return features topmost-first: the first element is
/// the feature drawn visually in front of all others at that point.
pub trait Renderer: Send + Sync + 'static {
    /// All features rendered at a screen point, ordered topmost-first
    fn query_rendered_features(&self, point: Vec2) -> Vec<Feature>;

    /// Release every native resource held by the engine
    fn remove(&mut self);
}

/// In-process renderer with scripted hit areas.
///
/// Features are hit-tested against axis-aligned screen rectangles. Features
/// added later are drawn on top of features added earlier. Counters are
/// shared so callers can observe queries and teardown after the renderer has
/// been moved into a context.
#[derive(Debug, Default)]
pub struct HeadlessRenderer {
    /// Hit areas in draw order (bottom first)
    hit_areas: Vec<(Rect, Feature)>,
    queries: Arc<AtomicUsize>,
    removals: Arc<AtomicUsize>,
}

impl HeadlessRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draw a feature covering the given screen rectangle, on top of
    /// everything drawn so far
    pub fn with_feature(mut self, bounds: Rect, feature: Feature) -> Self {
        self.hit_areas.push((bounds, feature));
        self
    }

    /// Shared counter of `query_rendered_features` calls
    pub fn query_counter(&self) -> Arc<AtomicUsize> {
        self.queries.clone()
    }

    /// Shared counter of `remove` calls
    pub fn removal_counter(&self) -> Arc<AtomicUsize> {
        self.removals.clone()
    }
}

impl Renderer for HeadlessRenderer {
    fn query_rendered_features(&self, point: Vec2) -> Vec<Feature> {
        self.queries.fetch_add(1, Ordering::Relaxed);
        self.hit_areas
            .iter()
            .rev()
            .filter(|(bounds, _)| bounds.contains(point))
            .map(|(_, feature)| feature.clone())
            .collect()
    }

    fn remove(&mut self) {
        self.removals.fetch_add(1, Ordering::Relaxed);
        self.hit_areas.clear();
    }
}
