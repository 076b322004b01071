//! The per-map aggregate shared by everything mounted under a map root.

use bevy::prelude::*;
use serde_json::{Map, Value, json};

use crate::config::MapConfigData;
use crate::constants::{DEFAULT_MAX_ZOOM, DEFAULT_MIN_ZOOM};

use super::event::{LayerEvent, PointerEvent};
use super::marker_click::MarkerClickManager;
use super::options::{ClusterOptions, flush};
use super::registry::{LayerInfo, LayerRegistry};
use super::renderer::{Feature, Renderer};
use super::resolution::EventResolutionCache;

/// Shared state of one mounted map.
///
/// Lives as a component on the map root entity. Zoom bounds and cluster
/// options are fixed when the context is built; sources and layers below
/// read them to configure their own renderer setup. Despawning the root
/// drops the context, which tears down the renderer.
#[derive(Component)]
pub struct MapContext {
    renderer: Option<Box<dyn Renderer>>,
    cluster: Option<ClusterOptions>,
    min_zoom: f32,
    max_zoom: f32,
    layers: LayerRegistry,
    resolution: EventResolutionCache,
    /// Last map-layer or marker interaction
    pub last_layer_event: Option<LayerEvent>,
    pub marker_click_manager: MarkerClickManager,
}

impl Default for MapContext {
    fn default() -> Self {
        Self {
            renderer: None,
            cluster: None,
            min_zoom: DEFAULT_MIN_ZOOM,
            max_zoom: DEFAULT_MAX_ZOOM,
            layers: LayerRegistry::default(),
            resolution: EventResolutionCache::default(),
            last_layer_event: None,
            marker_click_manager: MarkerClickManager::default(),
        }
    }
}

impl MapContext {
    pub fn new(renderer: Box<dyn Renderer>) -> Self {
        let mut context = Self::default();
        context.attach_renderer(renderer);
        context
    }

    /// Context with zoom bounds and cluster options taken from config
    pub fn from_config(config: &MapConfigData) -> Self {
        Self::default()
            .with_zoom_bounds(config.min_zoom, config.max_zoom)
            .with_cluster(config.cluster.clone())
    }

    pub fn with_zoom_bounds(mut self, min_zoom: f32, max_zoom: f32) -> Self {
        if min_zoom > max_zoom {
            warn!(
                "Zoom bounds out of order ({} > {}), swapping",
                min_zoom, max_zoom
            );
            self.min_zoom = max_zoom;
            self.max_zoom = min_zoom;
        } else {
            self.min_zoom = min_zoom;
            self.max_zoom = max_zoom;
        }
        self
    }

    pub fn with_cluster(mut self, cluster: Option<ClusterOptions>) -> Self {
        self.cluster = cluster;
        self
    }

    /// Hand the live renderer to this context. A previously attached
    /// renderer is torn down first.
    pub fn attach_renderer(&mut self, renderer: Box<dyn Renderer>) {
        self.teardown();
        info!("Renderer attached to map context");
        self.renderer = Some(renderer);
    }

    pub fn with_renderer(mut self, renderer: Box<dyn Renderer>) -> Self {
        self.attach_renderer(renderer);
        self
    }

    pub fn renderer(&self) -> Option<&dyn Renderer> {
        self.renderer.as_deref()
    }

    pub fn has_renderer(&self) -> bool {
        self.renderer.is_some()
    }

    /// Release the renderer's native resources. Runs at most once per
    /// attached renderer; dropping the context afterwards is a no-op.
    pub fn teardown(&mut self) {
        if let Some(mut renderer) = self.renderer.take() {
            info!("Tearing down map renderer");
            renderer.remove();
        }
    }

    pub fn min_zoom(&self) -> f32 {
        self.min_zoom
    }

    pub fn max_zoom(&self) -> f32 {
        self.max_zoom
    }

    pub fn cluster(&self) -> Option<&ClusterOptions> {
        self.cluster.as_ref()
    }

    pub fn layers(&self) -> &LayerRegistry {
        &self.layers
    }

    /// Record a mounted layer's interaction metadata
    pub fn register_layer(&mut self, id: impl Into<String>, info: LayerInfo) {
        self.layers.register(id, info);
    }

    /// Forget an unmounted layer
    pub fn unregister_layer(&mut self, id: &str) -> Option<LayerInfo> {
        self.layers.unregister(id)
    }

    /// Topmost interactive layer under the event's point, or `None` for a
    /// background hit.
    ///
    /// Resolved once per native event: every listener handed the same
    /// physical interaction gets the same answer, and later registry changes
    /// don't alter it.
    pub fn event_top_most(&mut self, event: &PointerEvent) -> Option<String> {
        let Self {
            renderer,
            layers,
            resolution,
            ..
        } = self;

        resolution.resolve_with(&event.native, || {
            let Some(renderer) = renderer.as_deref() else {
                warn!("Pointer event resolved without a renderer attached");
                return None;
            };
            renderer
                .query_rendered_features(event.point)
                .into_iter()
                .find(|feature| layers.is_interactive(&feature.layer))
                .map(|feature| feature.layer)
        })
    }

    /// Features of one layer under the event's point, topmost-first
    pub fn layer_features(&self, event: &PointerEvent, layer: &str) -> Vec<Feature> {
        let Some(renderer) = self.renderer.as_deref() else {
            return Vec::new();
        };
        renderer
            .query_rendered_features(event.point)
            .into_iter()
            .filter(|feature| feature.layer == layer)
            .collect()
    }

    /// Source options a clustered source passes to the renderer, using this
    /// map's zoom bounds and cluster settings
    pub fn cluster_source_options(&self) -> Map<String, Value> {
        let mut options = match self.cluster.as_ref() {
            Some(cluster) => cluster.source_options(),
            None => {
                let mut options = Map::new();
                options.insert("cluster".to_string(), Value::Bool(false));
                options
            }
        };
        options.insert("minzoom".to_string(), json!(self.min_zoom));
        options.insert("maxzoom".to_string(), json!(self.max_zoom));
        flush(options)
    }
}

impl Drop for MapContext {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl std::fmt::Debug for MapContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapContext")
            .field("has_renderer", &self.has_renderer())
            .field("min_zoom", &self.min_zoom)
            .field("max_zoom", &self.max_zoom)
            .field("cluster", &self.cluster)
            .field("layers", &self.layers)
            .field("marker_click_manager", &self.marker_click_manager)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::event::{NativeEvent, PointerKind};
    use crate::map::renderer::{Geometry, HeadlessRenderer, LngLat};
    use std::sync::atomic::Ordering;

    fn feature(layer: &str) -> Feature {
        Feature::new(layer, "src", Geometry::Point(LngLat::new(0.0, 0.0)))
    }

    fn click_at(x: f32, y: f32) -> PointerEvent {
        PointerEvent::new(
            NativeEvent::new(PointerKind::Click),
            Vec2::new(x, y),
            LngLat::default(),
        )
    }

    /// Stack drawn bottom to top: C, A, B. Hit order is therefore B, A, C.
    fn stacked_renderer() -> HeadlessRenderer {
        let area = Rect::new(0.0, 0.0, 100.0, 100.0);
        HeadlessRenderer::new()
            .with_feature(area, feature("C"))
            .with_feature(area, feature("A"))
            .with_feature(area, feature("B"))
    }

    #[test]
    fn test_first_interactive_match_wins() {
        let mut context = MapContext::new(Box::new(stacked_renderer()));
        context.register_layer("B", LayerInfo { interactive: false });
        context.register_layer("A", LayerInfo { interactive: true });
        context.register_layer("C", LayerInfo { interactive: true });

        assert_eq!(context.event_top_most(&click_at(10.0, 10.0)).as_deref(), Some("A"));
    }

    #[test]
    fn test_no_interactive_layer_is_background() {
        let mut context = MapContext::new(Box::new(stacked_renderer()));
        context.register_layer("B", LayerInfo { interactive: false });

        assert_eq!(context.event_top_most(&click_at(10.0, 10.0)), None);
        // Unregistered layers A and C never count
        assert_eq!(context.event_top_most(&click_at(20.0, 20.0)), None);
    }

    #[test]
    fn test_same_answer_for_every_listener() {
        let renderer = stacked_renderer();
        let queries = renderer.query_counter();
        let mut context = MapContext::new(Box::new(renderer));
        context.register_layer("A", LayerInfo::default());
        context.register_layer("B", LayerInfo::default());

        let event = click_at(10.0, 10.0);
        let answers: Vec<Option<String>> = (0..8)
            .map(|_| context.event_top_most(&event.clone()))
            .collect();

        assert!(answers.iter().all(|a| a.as_deref() == Some("B")));
        assert_eq!(queries.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_resolution_is_snapshot_at_first_query() {
        let mut context = MapContext::new(Box::new(stacked_renderer()));
        context.register_layer("B", LayerInfo::default());

        let event = click_at(10.0, 10.0);
        assert_eq!(context.event_top_most(&event).as_deref(), Some("B"));

        context.register_layer("B", LayerInfo { interactive: false });
        assert_eq!(context.event_top_most(&event).as_deref(), Some("B"));

        // A new physical event sees the new registry state
        assert_eq!(context.event_top_most(&click_at(10.0, 10.0)), None);
    }

    #[test]
    fn test_unmounted_layer_cannot_win() {
        let mut context = MapContext::new(Box::new(stacked_renderer()));
        context.register_layer("B", LayerInfo::default());
        context.register_layer("A", LayerInfo::default());
        context.unregister_layer("B");

        assert_eq!(context.event_top_most(&click_at(10.0, 10.0)).as_deref(), Some("A"));
    }

    #[test]
    fn test_no_renderer_resolves_to_background() {
        let mut context = MapContext::default();
        context.register_layer("A", LayerInfo::default());
        assert_eq!(context.event_top_most(&click_at(10.0, 10.0)), None);
    }

    #[test]
    fn test_layer_features_filters_by_layer() {
        let context = MapContext::new(Box::new(stacked_renderer()));
        let features = context.layer_features(&click_at(10.0, 10.0), "A");
        assert_eq!(features.len(), 1);
        assert_eq!(features[0].layer, "A");
    }

    #[test]
    fn test_drop_tears_down_renderer_once() {
        let renderer = HeadlessRenderer::new();
        let removals = renderer.removal_counter();
        let context = MapContext::new(Box::new(renderer));

        drop(context);
        assert_eq!(removals.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_explicit_teardown_then_drop() {
        let renderer = HeadlessRenderer::new();
        let removals = renderer.removal_counter();
        let mut context = MapContext::new(Box::new(renderer));

        context.teardown();
        context.teardown();
        assert!(!context.has_renderer());
        drop(context);
        assert_eq!(removals.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_attach_replaces_and_tears_down_previous() {
        let first = HeadlessRenderer::new();
        let first_removals = first.removal_counter();
        let second = HeadlessRenderer::new();
        let second_removals = second.removal_counter();

        let mut context = MapContext::new(Box::new(first));
        context.attach_renderer(Box::new(second));
        assert_eq!(first_removals.load(Ordering::Relaxed), 1);
        assert_eq!(second_removals.load(Ordering::Relaxed), 0);

        drop(context);
        assert_eq!(second_removals.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_default_zoom_bounds() {
        let context = MapContext::default();
        assert_eq!(context.min_zoom(), 0.0);
        assert_eq!(context.max_zoom(), 24.0);
        assert!(context.cluster().is_none());
    }

    #[test]
    fn test_zoom_bounds_out_of_order_are_swapped() {
        let context = MapContext::default().with_zoom_bounds(18.0, 3.0);
        assert_eq!(context.min_zoom(), 3.0);
        assert_eq!(context.max_zoom(), 18.0);
    }

    #[test]
    fn test_cluster_source_options_follow_context() {
        let context = MapContext::default()
            .with_zoom_bounds(2.0, 16.0)
            .with_cluster(Some(ClusterOptions {
                max_zoom: Some(14.0),
                ..ClusterOptions::default()
            }));

        let options = context.cluster_source_options();
        assert_eq!(options["cluster"], json!(true));
        assert_eq!(options["clusterMinPoints"], json!(2));
        assert_eq!(options["clusterRadius"], json!(50.0));
        assert_eq!(options["clusterMaxZoom"], json!(14.0));
        assert_eq!(options["minzoom"], json!(2.0));
        assert_eq!(options["maxzoom"], json!(16.0));
        assert!(!options.contains_key("clusterProperties"));
    }

    #[test]
    fn test_unclustered_source_options() {
        let options = MapContext::default().cluster_source_options();
        assert_eq!(options["cluster"], json!(false));
        assert_eq!(options["maxzoom"], json!(24.0));
    }

    #[test]
    fn test_from_config() {
        let config = MapConfigData {
            min_zoom: 4.0,
            max_zoom: 12.0,
            ..MapConfigData::default()
        };
        let context = MapContext::from_config(&config);
        assert_eq!(context.min_zoom(), 4.0);
        assert_eq!(context.max_zoom(), 12.0);
    }
}
