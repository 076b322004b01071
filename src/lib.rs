//! Map context and layer interaction resolution for Bevy map views.
//!
//! A map view is an entity tree: a map root carrying a [`MapContext`], with
//! sources, layers and markers mounted below it. The context owns the live
//! renderer, tracks which layers are interactive, and answers "which layer
//! did this click actually hit?" once per physical pointer event so every
//! listener agrees.
//!
//! ## Module Structure
//!
//! - [`map`] - Map context, identity contexts, interaction resolution and the plugin
//! - [`config`] - Persisted map configuration
//! - [`ids`] - Process-wide source/layer id generation
//! - [`logging`] - Log subscriber setup
//! - [`paths`] - Platform config and log locations

pub mod config;
pub mod constants;
pub mod ids;
pub mod logging;
pub mod map;
pub mod paths;

pub use ids::get_id;
pub use map::{
    ContextCommandsExt, ContextError, ContextLookup, LayerContext, MapContext, MapContextPlugin,
    MarkerContext, SourceContext,
};
