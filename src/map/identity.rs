//! Scoped identity contexts.
//!
//! A source, layer or marker entity installs its identity as a component;
//! descendants find "which source/layer/marker am I nested under" by walking
//! up the `ChildOf` hierarchy to the nearest entity carrying that kind of
//! component. Each kind is looked up independently, and a value installed by
//! a child shadows its ancestor's only within the child's own subtree.
//!
//! Identity components are immutable: replacing one means removing and
//! re-inserting it, which is an unmount/remount as far as listeners go.

use std::sync::Arc;

use bevy::ecs::system::SystemParam;
use bevy::prelude::*;
use thiserror::Error;

use super::context::MapContext;
use super::renderer::LngLat;

/// Structural mistakes in the entity tree
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContextError {
    /// A map component was mounted outside of any map subtree
    #[error("Map context not found for entity {entity}")]
    MapContextNotFound { entity: Entity },
}

/// A marker overlay placed on the map
#[derive(Debug, PartialEq)]
pub struct Marker {
    pub id: String,
    pub lng_lat: LngLat,
}

impl Marker {
    pub fn new(id: impl Into<String>, lng_lat: LngLat) -> MarkerHandle {
        Arc::new(Self {
            id: id.into(),
            lng_lat,
        })
    }
}

/// Shared reference to a marker
pub type MarkerHandle = Arc<Marker>;

/// Source identity visible to the subtree under the source entity
#[derive(Component, Debug, Clone, PartialEq, Eq)]
#[component(immutable)]
pub struct SourceContext {
    id: String,
}

impl SourceContext {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

/// Layer identity visible to the subtree under the layer entity
#[derive(Component, Debug, Clone, PartialEq, Eq)]
#[component(immutable)]
pub struct LayerContext {
    id: String,
}

impl LayerContext {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

/// Marker identity visible to the subtree under the marker entity
#[derive(Component, Debug, Clone)]
#[component(immutable)]
pub struct MarkerContext {
    marker: MarkerHandle,
}

impl MarkerContext {
    pub fn new(marker: MarkerHandle) -> Self {
        Self { marker }
    }

    pub fn marker(&self) -> &MarkerHandle {
        &self.marker
    }
}

/// Whether a layer takes part in pointer resolution.
///
/// Layers without this component are interactive.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerInteractivity {
    pub interactive: bool,
}

/// Installing identity contexts on the entity being mounted
pub trait ContextCommandsExt {
    /// Install a map context; this entity becomes the root of a map subtree
    fn create_map_context(&mut self, context: MapContext) -> &mut Self;

    fn create_source_context(&mut self, id: impl Into<String>) -> SourceContext;

    fn create_layer_context(&mut self, id: impl Into<String>) -> LayerContext;

    fn create_marker_context(&mut self, marker: MarkerHandle) -> MarkerContext;
}

impl ContextCommandsExt for EntityCommands<'_> {
    fn create_map_context(&mut self, context: MapContext) -> &mut Self {
        self.insert(context)
    }

    fn create_source_context(&mut self, id: impl Into<String>) -> SourceContext {
        let context = SourceContext::new(id);
        self.insert(context.clone());
        context
    }

    fn create_layer_context(&mut self, id: impl Into<String>) -> LayerContext {
        let context = LayerContext::new(id);
        self.insert(context.clone());
        context
    }

    fn create_marker_context(&mut self, marker: MarkerHandle) -> MarkerContext {
        let context = MarkerContext::new(marker);
        self.insert(context.clone());
        context
    }
}

/// Nearest-enclosing lookup of map and identity contexts
#[derive(SystemParam)]
pub struct ContextLookup<'w, 's> {
    parents: Query<'w, 's, &'static ChildOf>,
    maps: Query<'w, 's, Entity, With<MapContext>>,
    sources: Query<'w, 's, &'static SourceContext>,
    layers: Query<'w, 's, &'static LayerContext>,
    markers: Query<'w, 's, &'static MarkerContext>,
}

impl ContextLookup<'_, '_> {
    /// The entity itself, then its parent, up to the root
    fn self_and_ancestors(&self, entity: Entity) -> impl Iterator<Item = Entity> + '_ {
        std::iter::successors(Some(entity), move |current| {
            self.parents.get(*current).ok().map(ChildOf::parent)
        })
    }

    /// Map root entity of the subtree `entity` is mounted in.
    ///
    /// Missing is a structural error: the component was mounted outside of
    /// any map.
    pub fn map_context(&self, entity: Entity) -> Result<Entity, ContextError> {
        self.self_and_ancestors(entity)
            .find(|candidate| self.maps.contains(*candidate))
            .ok_or(ContextError::MapContextNotFound { entity })
    }

    pub fn source_context(&self, entity: Entity) -> Option<&SourceContext> {
        self.self_and_ancestors(entity)
            .find_map(|candidate| self.sources.get(candidate).ok())
    }

    pub fn layer_context(&self, entity: Entity) -> Option<&LayerContext> {
        self.self_and_ancestors(entity)
            .find_map(|candidate| self.layers.get(candidate).ok())
    }

    pub fn marker_context(&self, entity: Entity) -> Option<&MarkerContext> {
        self.self_and_ancestors(entity)
            .find_map(|candidate| self.markers.get(candidate).ok())
    }
}
