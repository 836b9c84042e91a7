//! Request paths and response shapes of the cluster APIs the collector reads.
//!
//! Only the fields the collector uses are modelled; everything else in the
//! responses is ignored.

use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};

pub const CLUSTER_HEALTH_PATH: &str = "/_cluster/health";
pub const DATA_STREAM_PATH: &str = "/_data_stream";

/// `/{indices}/_stats/store`
pub fn store_stats_path(indices: &BTreeSet<String>) -> String {
    format!("/{}/_stats/store", join_indices(indices))
}

/// `/_cat/indices/{indices}?format=json&h=index,pri,rep`
pub fn cat_indices_path(indices: &BTreeSet<String>) -> String {
    format!(
        "/_cat/indices/{}?format=json&h=index,pri,rep",
        join_indices(indices)
    )
}

fn join_indices(indices: &BTreeSet<String>) -> String {
    indices.iter().map(String::as_str).collect::<Vec<_>>().join(",")
}

/// `GET /_cluster/health`
#[derive(Debug, Deserialize)]
pub struct ClusterHealthResponse {
    pub cluster_name: String,
}

/// `GET /_data_stream`
#[derive(Debug, Deserialize)]
pub struct DataStreamsResponse {
    #[serde(default)]
    pub data_streams: Vec<DataStream>,
}

#[derive(Debug, Deserialize)]
pub struct DataStream {
    pub name: String,
    /// Backing indices, oldest generation first.
    #[serde(default)]
    pub indices: Vec<BackingIndexRef>,
}

#[derive(Debug, Deserialize)]
pub struct BackingIndexRef {
    pub index_name: String,
}

/// `GET /{indices}/_stats/store`
#[derive(Debug, Deserialize)]
pub struct StoreStatsResponse {
    #[serde(default)]
    pub indices: HashMap<String, IndexStats>,
}

#[derive(Debug, Deserialize)]
pub struct IndexStats {
    #[serde(default)]
    pub primaries: Option<PrimaryStats>,
}

#[derive(Debug, Deserialize)]
pub struct PrimaryStats {
    #[serde(default)]
    pub store: Option<StoreStats>,
}

#[derive(Debug, Deserialize)]
pub struct StoreStats {
    #[serde(default)]
    pub size_in_bytes: Option<f64>,
}

impl IndexStats {
    pub fn primary_store_bytes(&self) -> Option<f64> {
        self.primaries
            .as_ref()
            .and_then(|p| p.store.as_ref())
            .and_then(|s| s.size_in_bytes)
    }
}

/// One row of `GET /_cat/indices?format=json&h=index,pri,rep`.
///
/// The body is decoded as a list of raw JSON values first and each row is
/// converted on its own, so one odd row cannot fail the whole response.
/// Counts stay raw: `_cat` renders numbers as strings, but some versions and
/// proxies hand back plain JSON numbers.
#[derive(Debug, Clone, Deserialize)]
pub struct CatIndexRow {
    pub index: String,
    #[serde(default)]
    pub pri: Option<serde_json::Value>,
    #[serde(default)]
    pub rep: Option<serde_json::Value>,
}
