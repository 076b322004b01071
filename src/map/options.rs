//! Renderer option objects.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::constants::{DEFAULT_CLUSTER_MIN_POINTS, DEFAULT_CLUSTER_RADIUS};

/// Point clustering parameters for a data source.
///
/// Fixed when the clustered source is created; the renderer can't change
/// them afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterOptions {
    /// Minimum number of points required to form a cluster
    #[serde(default)]
    pub min_points: Option<u32>,
    /// Maximum zoom at which to perform clustering
    #[serde(default)]
    pub max_zoom: Option<f32>,
    /// Radius of each cluster when clustering points
    #[serde(default)]
    pub radius: Option<f32>,
    /// Aggregations over the clustered points, as renderer expressions
    #[serde(default)]
    pub properties: Option<Map<String, Value>>,
}

impl Default for ClusterOptions {
    fn default() -> Self {
        Self {
            min_points: Some(DEFAULT_CLUSTER_MIN_POINTS),
            max_zoom: None,
            radius: Some(DEFAULT_CLUSTER_RADIUS),
            properties: None,
        }
    }
}

impl ClusterOptions {
    /// Cluster keys of a renderer source definition, unset values omitted
    pub fn source_options(&self) -> Map<String, Value> {
        let options = json!({
            "cluster": true,
            "clusterMinPoints": self.min_points,
            "clusterMaxZoom": self.max_zoom,
            "clusterRadius": self.radius,
            "clusterProperties": self.properties,
        });

        match options {
            Value::Object(map) => flush(map),
            _ => Map::new(),
        }
    }
}

/// Removes any null values from an object
pub fn flush(obj: Map<String, Value>) -> Map<String, Value> {
    obj.into_iter().filter(|(_, value)| !value.is_null()).collect()
}
