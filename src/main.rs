use bevy::prelude::*;

use mapforged::config::{MapConfig, load_config, save_config};
use mapforged::map::{
    Feature, Geometry, HeadlessRenderer, LayerInteractivity, LayerPointerEvent, LngLat,
    MapPointerEvent, Marker, MarkerClickHandler, MarkerClickInput, NativeEvent, PointerEvent,
    PointerInput, PointerKind,
};
use mapforged::{ContextCommandsExt, MapContext, MapContextPlugin, get_id, logging, paths};

/// Root entity of the demo map
#[derive(Resource)]
struct DemoMap {
    map: Entity,
    marker: Entity,
}

/// Renderer with a harbor point drawn over a coastline, plus a label on top
fn demo_renderer(source: &str) -> HeadlessRenderer {
    let harbor = LngLat::new(-9.14, 38.70);
    HeadlessRenderer::new()
        .with_feature(
            Rect::new(0.0, 0.0, 400.0, 300.0),
            Feature::new(
                "coastline",
                source,
                Geometry::LineString(vec![LngLat::new(-9.5, 38.6), LngLat::new(-8.9, 38.8)]),
            ),
        )
        .with_feature(
            Rect::new(10.0, 10.0, 40.0, 40.0),
            Feature::new("harbors", source, Geometry::Point(harbor))
                .with_id(1)
                .with_property("name", "Lisbon"),
        )
        .with_feature(
            Rect::new(10.0, 10.0, 40.0, 25.0),
            Feature::new("harbor-labels", source, Geometry::Point(harbor)),
        )
}

fn spawn_demo_map(mut commands: Commands, config: Res<MapConfig>) {
    let source_id = get_id("source");
    let context = MapContext::from_config(&config.data)
        .with_renderer(Box::new(demo_renderer(&source_id)));
    context
        .marker_click_manager
        .add(MarkerClickHandler::new(|info| {
            info!("Marker {} clicked at {:?}", info.marker.id, info.lng_lat);
        }));
    info!(
        "Cluster source options: {}",
        serde_json::Value::Object(context.cluster_source_options())
    );

    let map = commands.spawn_empty().create_map_context(context).id();

    let source = {
        let mut source = commands.spawn(ChildOf(map));
        source.create_source_context(source_id);
        source.id()
    };

    commands
        .spawn(ChildOf(source))
        .create_layer_context("coastline");
    commands.spawn(ChildOf(source)).create_layer_context("harbors");
    commands
        .spawn((LayerInteractivity { interactive: false }, ChildOf(source)))
        .create_layer_context("harbor-labels");

    let marker = {
        let mut marker = commands.spawn(ChildOf(map));
        marker.create_marker_context(Marker::new(get_id("marker"), LngLat::new(-9.14, 38.70)));
        marker.id()
    };

    commands.insert_resource(DemoMap { map, marker });
}

fn log_interactions(
    mut map_events: MessageReader<MapPointerEvent>,
    mut layer_events: MessageReader<LayerPointerEvent>,
) {
    for event in map_events.read() {
        match &event.top_most {
            Some(layer) => info!(
                "{:?} at {} hit layer {}",
                event.event.kind(),
                event.event.point,
                layer
            ),
            None => info!(
                "{:?} at {} hit the background",
                event.event.kind(),
                event.event.point
            ),
        }
    }
    for event in layer_events.read() {
        info!(
            "Layer {} ({}) received {} feature(s) from source {}",
            event.info.layer,
            event.layer,
            event.info.features.len(),
            event.info.source
        );
    }
}

fn pointer(map: Entity, kind: PointerKind, x: f32, y: f32) -> PointerInput {
    PointerInput {
        map,
        event: PointerEvent::new(
            NativeEvent::new(kind),
            Vec2::new(x, y),
            LngLat::new(-9.14, 38.70),
        ),
    }
}

fn main() {
    let config_path = paths::config_file();
    let loaded = load_config(&config_path);

    // Keep the guard alive for the duration of the program
    let _log_guard = logging::setup_logging(&loaded.config.data.log_filter);
    if let Some(reason) = &loaded.reset_reason {
        warn!("Configuration reset to defaults: {}", reason);
    }
    if !config_path.exists() {
        if let Err(e) = paths::create_config_dir() {
            warn!("Failed to create config directory: {}", e);
        } else if save_config(&loaded.config).is_err() {
            warn!("Continuing without a saved config file");
        }
    }

    let mut app = App::new();
    app.insert_resource(loaded.config)
        .add_plugins(MapContextPlugin)
        .add_systems(Startup, spawn_demo_map)
        .add_systems(PostUpdate, log_interactions);

    // The first frame runs Startup, which mounts the map, then registers its layers
    app.update();

    let Some(demo) = app.world().get_resource::<DemoMap>() else {
        error!("Demo map was not spawned");
        return;
    };
    let (map, marker) = (demo.map, demo.marker);

    app.world_mut().write_message(pointer(map, PointerKind::Click, 20.0, 20.0));
    app.world_mut().write_message(pointer(map, PointerKind::Move, 200.0, 150.0));
    app.update();

    app.world_mut().write_message(MarkerClickInput {
        marker,
        lng_lat: LngLat::new(-9.14, 38.70),
        features: Vec::new(),
    });
    app.update();

    if let Some(context) = app.world().get::<MapContext>(map) {
        info!(
            "Map has {} registered layer(s); last event at {:?}",
            context.layers().len(),
            context.last_layer_event.as_ref().map(|event| event.lng_lat())
        );
    }

    app.world_mut().despawn(map);
    app.update();
    info!("Map unmounted");
}
