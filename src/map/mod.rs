//! Map context and interaction resolution.
//!
//! One [`MapContext`] lives on each map root entity and mediates access to
//! the renderer for everything mounted below it. Sources, layers and markers
//! mark their subtrees with identity components so nested entities can find
//! what they belong to without passing ids around.
//!
//! ## Module Structure
//!
//! - [`renderer`] - Renderer trait, features, and a headless renderer
//! - [`event`] - Pointer events and click payloads
//! - [`registry`] - Per-layer interactivity registry
//! - [`resolution`] - Per-event topmost-layer cache
//! - [`marker_click`] - Marker click broadcast
//! - [`context`] - The MapContext aggregate
//! - [`identity`] - Source/layer/marker contexts and scoped lookup
//! - [`options`] - Cluster options and renderer option helpers
//! - [`systems`] - Plugin systems and messages
//!
//! ## Event flow
//!
//! A layer entity mounts and registers its interactivity with the nearest
//! map. The renderer reports a [`PointerInput`]; the map resolves the
//! topmost interactive layer once for that native event, and every mounted
//! layer compares that answer with its own [`LayerContext`] to decide whether
//! the event is its own. Marker clicks bypass the renderer entirely and go
//! through the [`MarkerClickManager`].

pub mod context;
pub mod event;
pub mod identity;
pub mod marker_click;
pub mod options;
pub mod registry;
pub mod renderer;
pub mod resolution;
pub mod systems;


pub use context::MapContext;
pub use event::{LayerClickInfo, LayerEvent, MarkerClickInfo, NativeEvent, PointerEvent, PointerKind};
pub use identity::{
    ContextCommandsExt, ContextError, ContextLookup, LayerContext, LayerInteractivity, Marker,
    MarkerContext, MarkerHandle, SourceContext,
};
pub use marker_click::{MarkerClickHandler, MarkerClickManager};
pub use options::{ClusterOptions, flush};
pub use registry::{LayerInfo, LayerRegistry};
pub use renderer::{Feature, Geometry, HeadlessRenderer, LngLat, Renderer};
pub use resolution::EventResolutionCache;
pub use systems::{
    LayerPointerEvent, LayerRegistrySync, MapContextPlugin, MapPointerEvent, MarkerClickInput,
    MountedLayers, PointerInput,
};
