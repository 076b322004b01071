use std::path::{Path, PathBuf};

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_LOG_FILTER, DEFAULT_MAX_ZOOM, DEFAULT_MIN_ZOOM};
use crate::map::ClusterOptions;

fn default_min_zoom() -> f32 {
    DEFAULT_MIN_ZOOM
}

fn default_max_zoom() -> f32 {
    DEFAULT_MAX_ZOOM
}

fn default_log_filter() -> String {
    DEFAULT_LOG_FILTER.to_string()
}

/// Map configuration persisted to disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapConfigData {
    /// Minimum zoom level maps advertise to their sources
    #[serde(default = "default_min_zoom")]
    pub min_zoom: f32,

    /// Maximum zoom level maps advertise to their sources
    #[serde(default = "default_max_zoom")]
    pub max_zoom: f32,

    /// Clustering for point sources (no clustering when unset)
    #[serde(default)]
    pub cluster: Option<ClusterOptions>,

    /// Log filter used when `RUST_LOG` is not set
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

impl Default for MapConfigData {
    fn default() -> Self {
        Self {
            min_zoom: DEFAULT_MIN_ZOOM,
            max_zoom: DEFAULT_MAX_ZOOM,
            cluster: None,
            log_filter: default_log_filter(),
        }
    }
}

/// Runtime configuration resource
#[derive(Resource, Debug)]
pub struct MapConfig {
    /// The persisted configuration data
    pub data: MapConfigData,
    /// Path to the config file
    pub config_path: PathBuf,
}

/// Result of loading config from disk
#[derive(Debug)]
pub struct LoadConfigResult {
    pub config: MapConfig,
    /// Error message if config was reset to defaults due to an error
    pub reset_reason: Option<String>,
}

/// Load configuration from disk.
///
/// Never fails: unreadable or corrupted files fall back to defaults, with
/// the reason reported in `reset_reason`.
pub fn load_config(config_path: &Path) -> LoadConfigResult {
    let (data, reset_reason) = if config_path.exists() {
        match std::fs::read_to_string(config_path) {
            Ok(json) => match serde_json::from_str(&json) {
                Ok(data) => {
                    info!("Loaded config from {:?}", config_path);
                    (data, None)
                }
                Err(e) => {
                    warn!("Failed to parse config file: {}", e);
                    (
                        MapConfigData::default(),
                        Some(format!("Configuration file was corrupted: {}", e)),
                    )
                }
            },
            Err(e) => {
                warn!("Failed to read config file: {}", e);
                (
                    MapConfigData::default(),
                    Some(format!("Could not read configuration file: {}", e)),
                )
            }
        }
    } else {
        info!("No config file found, using defaults");
        (MapConfigData::default(), None)
    };

    LoadConfigResult {
        config: MapConfig {
            data,
            config_path: config_path.to_path_buf(),
        },
        reset_reason,
    }
}

/// Save configuration to disk
pub fn save_config(config: &MapConfig) -> Result<(), String> {
    let json = serde_json::to_string_pretty(&config.data).map_err(|e| {
        error!("Failed to serialize config: {}", e);
        e.to_string()
    })?;

    std::fs::write(&config.config_path, json).map_err(|e| {
        error!("Failed to save config: {}", e);
        e.to_string()
    })?;

    info!("Config saved to {:?}", config.config_path);
    Ok(())
}
