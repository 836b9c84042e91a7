//! Prometheus gauges for one scrape.
//!
//! A fresh [`ShardSizeMetrics`] is built for every scrape, so series of
//! indices that stop qualifying vanish instead of going stale.

use crate::sizing::IndexShardSizing;
use prometheus::{Encoder, GaugeVec, Opts, Registry, TextEncoder};

pub const LABEL_NAMES: [&str; 3] = ["cluster", "data_stream", "index"];

pub const PRIMARY_STORE_SIZE_BYTES: &str = "opensearch_datastream_primary_store_size_bytes";
pub const PRIMARY_SHARDS: &str = "opensearch_datastream_primary_shards";
pub const PRIMARY_SHARD_SIZE_BYTES: &str = "opensearch_datastream_primary_shard_size_bytes";
pub const RECOMMENDED_PRIMARY_SHARDS: &str = "opensearch_datastream_recommended_primary_shards";
pub const SHARD_SIZE_OK: &str = "opensearch_datastream_shard_size_ok";

pub struct ShardSizeMetrics {
    registry: Registry,
    primary_store_size_bytes: GaugeVec,
    primary_shards: GaugeVec,
    primary_shard_size_bytes: GaugeVec,
    recommended_primary_shards: GaugeVec,
    shard_size_ok: GaugeVec,
}

impl ShardSizeMetrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();
        let gauge = |name: &str, help: &str| -> prometheus::Result<GaugeVec> {
            let vec = GaugeVec::new(Opts::new(name, help), &LABEL_NAMES)?;
            registry.register(Box::new(vec.clone()))?;
            Ok(vec)
        };

        Ok(Self {
            primary_store_size_bytes: gauge(
                PRIMARY_STORE_SIZE_BYTES,
                "Total primary store size (bytes) for the latest backing index of a data stream",
            )?,
            primary_shards: gauge(
                PRIMARY_SHARDS,
                "Number of primary shards for the latest backing index of a data stream",
            )?,
            primary_shard_size_bytes: gauge(
                PRIMARY_SHARD_SIZE_BYTES,
                "Average size of primary shards for the latest backing index of a data stream, in bytes",
            )?,
            recommended_primary_shards: gauge(
                RECOMMENDED_PRIMARY_SHARDS,
                "Recommended number of primary shards for the latest backing index of a data stream based on target shard size",
            )?,
            shard_size_ok: gauge(
                SHARD_SIZE_OK,
                "1 if avg primary shard size for latest backing index is less than or equal to target, 0 otherwise",
            )?,
            registry,
        })
    }

    /// Records five samples per index, all labelled
    /// `(cluster, data_stream, index)`.
    pub fn emit(&self, cluster: &str, indices: &[IndexShardSizing]) {
        for entry in indices {
            let labels = [cluster, entry.data_stream.as_str(), entry.index.as_str()];
            let sizing = &entry.sizing;

            self.primary_store_size_bytes
                .with_label_values(&labels)
                .set(sizing.primary_store_bytes);
            self.primary_shards
                .with_label_values(&labels)
                .set(f64::from(sizing.primary_shards));
            self.primary_shard_size_bytes
                .with_label_values(&labels)
                .set(sizing.avg_primary_shard_bytes);
            self.recommended_primary_shards
                .with_label_values(&labels)
                .set(sizing.recommended_primary_shards as f64);
            self.shard_size_ok
                .with_label_values(&labels)
                .set(if sizing.shard_size_ok { 1.0 } else { 0.0 });
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Renders the registry in the Prometheus text exposition format.
    pub fn encode(&self) -> prometheus::Result<Vec<u8>> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        Ok(buf)
    }
}
