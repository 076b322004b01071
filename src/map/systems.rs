//! Systems wiring the entity tree and renderer input into map contexts.

use std::collections::{HashMap, HashSet};

use bevy::ecs::error::BevyError;
use bevy::prelude::*;

use super::context::MapContext;
use super::event::{LayerClickInfo, LayerEvent, MarkerClickInfo, PointerEvent};
use super::identity::{ContextError, ContextLookup, LayerContext, LayerInteractivity};
use super::registry::LayerInfo;
use super::renderer::{Feature, LngLat};

/// Pointer input delivered by the renderer of a map
#[derive(Message, Debug, Clone)]
pub struct PointerInput {
    pub map: Entity,
    pub event: PointerEvent,
}

/// Click on a marker overlay entity
#[derive(Message, Debug, Clone)]
pub struct MarkerClickInput {
    pub marker: Entity,
    pub lng_lat: LngLat,
    pub features: Vec<Feature>,
}

/// Map-level view of a pointer event, after topmost resolution
#[derive(Message, Debug, Clone)]
pub struct MapPointerEvent {
    pub map: Entity,
    pub event: PointerEvent,
    /// Topmost interactive layer, `None` for a background hit
    pub top_most: Option<String>,
}

/// A pointer event that belongs to one mounted layer
#[derive(Message, Debug, Clone)]
pub struct LayerPointerEvent {
    /// Layer entity the event is for
    pub layer: Entity,
    pub info: LayerClickInfo,
}

/// Layers currently registered, so unmount can undo exactly what mount did
#[derive(Resource, Default, Debug)]
pub struct MountedLayers {
    layers: HashMap<Entity, MountedLayer>,
}

#[derive(Debug, Clone, PartialEq)]
struct MountedLayer {
    map: Entity,
    id: String,
    info: LayerInfo,
}

impl MountedLayers {
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn contains(&self, layer: Entity) -> bool {
        self.layers.contains_key(&layer)
    }

    /// A still-mounted layer registered under the same map and id
    fn sharing(&self, map: Entity, id: &str) -> Option<&MountedLayer> {
        self.layers
            .values()
            .find(|layer| layer.map == map && layer.id == id)
    }

    /// Drop a registration that no longer holds. The map keeps the id while
    /// another mounted layer still uses it.
    fn release(&self, layer: &MountedLayer, maps: &mut Query<&mut MapContext>) {
        // The whole map may have gone with it
        let Ok(mut context) = maps.get_mut(layer.map) else {
            return;
        };
        match self.sharing(layer.map, &layer.id) {
            Some(other) => context.register_layer(other.id.as_str(), other.info),
            None => {
                context.unregister_layer(&layer.id);
            }
        }
    }
}

/// Register mounted layers with their map, and keep registrations current
/// when a layer's id, interactivity or place in the tree changes
#[allow(clippy::too_many_arguments, clippy::type_complexity)]
pub fn register_mounted_layers(
    changed: Query<
        Entity,
        (
            With<LayerContext>,
            Or<(Changed<LayerContext>, Changed<LayerInteractivity>)>,
        ),
    >,
    reparented: Query<(), Changed<ChildOf>>,
    mut reverted: RemovedComponents<LayerInteractivity>,
    layers: Query<(&LayerContext, Option<&LayerInteractivity>)>,
    lookup: ContextLookup,
    mut maps: Query<&mut MapContext>,
    mut mounted: ResMut<MountedLayers>,
) -> Result<(), BevyError> {
    let mut pending: HashSet<Entity> = changed.iter().collect();
    pending.extend(reverted.read());
    // A move anywhere in the tree can carry mounted layers to another map
    if !reparented.is_empty() {
        pending.extend(mounted.layers.keys().copied());
    }

    for entity in pending {
        let Ok((layer, interactivity)) = layers.get(entity) else {
            continue;
        };
        let map = lookup.map_context(entity)?;
        let info = interactivity
            .map(|i| LayerInfo {
                interactive: i.interactive,
            })
            .unwrap_or_default();
        let record = MountedLayer {
            map,
            id: layer.id().to_string(),
            info,
        };
        if mounted.layers.get(&entity) == Some(&record) {
            continue;
        }

        maps.get_mut(map)
            .map_err(|_| ContextError::MapContextNotFound { entity })?
            .register_layer(layer.id(), info);

        let Some(previous) = mounted.layers.insert(entity, record) else {
            continue;
        };
        if previous.map != map || previous.id != layer.id() {
            debug!(
                "Layer entity {} re-mounted from {} to {}",
                entity,
                previous.id,
                layer.id()
            );
            mounted.release(&previous, &mut maps);
        }
    }
    Ok(())
}

/// Remove unmounted layers from their map's registry
pub fn unregister_unmounted_layers(
    mut removed: RemovedComponents<LayerContext>,
    mut maps: Query<&mut MapContext>,
    mut mounted: ResMut<MountedLayers>,
) {
    for entity in removed.read() {
        let Some(layer) = mounted.layers.remove(&entity) else {
            continue;
        };
        mounted.release(&layer, &mut maps);
    }
}

/// Fan pointer input out to the map listener and every mounted layer
pub fn dispatch_pointer_input(
    mut inputs: MessageReader<PointerInput>,
    mut maps: Query<&mut MapContext>,
    layers: Query<(Entity, &LayerContext)>,
    lookup: ContextLookup,
    mut map_events: MessageWriter<MapPointerEvent>,
    mut layer_events: MessageWriter<LayerPointerEvent>,
) -> Result<(), BevyError> {
    for input in inputs.read() {
        let mut context = maps
            .get_mut(input.map)
            .map_err(|_| ContextError::MapContextNotFound { entity: input.map })?;

        let top_most = context.event_top_most(&input.event);
        map_events.write(MapPointerEvent {
            map: input.map,
            event: input.event.clone(),
            top_most,
        });

        // Each layer listens independently; resolution is cached per native
        // event so they all agree with the map listener
        for (entity, layer) in layers.iter() {
            if lookup.map_context(entity)? != input.map {
                continue;
            }
            if context.event_top_most(&input.event).as_deref() != Some(layer.id()) {
                continue;
            }

            let features = context.layer_features(&input.event, layer.id());
            let source = lookup
                .source_context(entity)
                .map(|source| source.id().to_string())
                .or_else(|| features.first().map(|feature| feature.source.clone()))
                .unwrap_or_default();
            let info = LayerClickInfo::new(
                input.map,
                input.event.clone(),
                layer.id().to_string(),
                source,
                features,
            );

            context.last_layer_event = Some(LayerEvent::Layer(info.clone()));
            layer_events.write(LayerPointerEvent {
                layer: entity,
                info,
            });
        }
    }
    Ok(())
}

/// Broadcast marker clicks to the map's marker click subscribers
pub fn dispatch_marker_clicks(
    mut inputs: MessageReader<MarkerClickInput>,
    mut maps: Query<&mut MapContext>,
    lookup: ContextLookup,
) -> Result<(), BevyError> {
    for input in inputs.read() {
        let map = lookup.map_context(input.marker)?;
        let Some(marker) = lookup.marker_context(input.marker) else {
            warn!("Marker click on entity {} without a marker context", input.marker);
            continue;
        };
        let mut context = maps
            .get_mut(map)
            .map_err(|_| ContextError::MapContextNotFound { entity: input.marker })?;

        let info = MarkerClickInfo {
            map,
            marker: marker.marker().clone(),
            lng_lat: input.lng_lat,
            features: input.features.clone(),
        };
        debug!("Marker {} clicked", info.marker.id);

        context.last_layer_event = Some(LayerEvent::Marker(info.clone()));
        context.marker_click_manager.handle_click(&info);
    }
    Ok(())
}

/// System set for registry maintenance (input dispatch runs after this)
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct LayerRegistrySync;

pub struct MapContextPlugin;

impl Plugin for MapContextPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<MountedLayers>()
            .add_message::<PointerInput>()
            .add_message::<MarkerClickInput>()
            .add_message::<MapPointerEvent>()
            .add_message::<LayerPointerEvent>()
            .add_systems(
                Update,
                (unregister_unmounted_layers, register_mounted_layers)
                    .chain()
                    .in_set(LayerRegistrySync),
            )
            .add_systems(
                Update,
                (
                    dispatch_pointer_input.run_if(on_message::<PointerInput>),
                    dispatch_marker_clicks.run_if(on_message::<MarkerClickInput>),
                )
                    .after(LayerRegistrySync),
            );
    }
}
