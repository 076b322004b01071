//! Centralized constants used across the crate.
//!
//! Defaults mirror the renderer's own defaults so a map configured without
//! explicit values behaves the same as the underlying engine.

/// Default minimum zoom level advertised by a map context
pub const DEFAULT_MIN_ZOOM: f32 = 0.0;

/// Default maximum zoom level advertised by a map context
pub const DEFAULT_MAX_ZOOM: f32 = 24.0;

/// Minimum number of points required to form a cluster
pub const DEFAULT_CLUSTER_MIN_POINTS: u32 = 2;

/// Radius of each cluster when clustering points, in screen pixels
pub const DEFAULT_CLUSTER_RADIUS: f32 = 50.0;

/// Log filter used when neither the environment nor the config provide one
pub const DEFAULT_LOG_FILTER: &str = "info,mapforged=debug";

/// Feature property set by the renderer on cluster features
pub const CLUSTER_FLAG_PROPERTY: &str = "cluster";

/// Feature property holding the renderer-assigned cluster id
pub const CLUSTER_ID_PROPERTY: &str = "cluster_id";

/// Directory name under the platform config and state directories
pub const APP_DIR_NAME: &str = "mapforged";

/// File name of the persisted map configuration
pub const CONFIG_FILE_NAME: &str = "mapforged.json";
