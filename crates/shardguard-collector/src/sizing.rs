//! Correlation of the per-scrape responses and the derived sizing values.

use std::collections::HashMap;

const BYTES_PER_GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Desired average primary shard size, in bytes. Always finite and positive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetShardSize(f64);

impl TargetShardSize {
    pub fn from_bytes(bytes: f64) -> Option<Self> {
        (bytes.is_finite() && bytes > 0.0).then_some(Self(bytes))
    }

    /// `gib * 1024^3` bytes.
    pub fn from_gib(gib: f64) -> Option<Self> {
        Self::from_bytes(gib * BYTES_PER_GIB)
    }

    pub fn bytes(&self) -> f64 {
        self.0
    }

    pub fn gib(&self) -> f64 {
        self.0 / BYTES_PER_GIB
    }
}

/// Measurements of one latest backing index found in every upstream source.
#[derive(Debug, Clone, PartialEq)]
pub struct LatestIndex {
    pub index: String,
    pub data_stream: String,
    pub primary_store_bytes: f64,
    pub primary_shards: u32,
}

/// Inner join of the three per-scrape maps on index name.
///
/// Only indices that are the latest backing index of a stream, have store
/// stats, and have a positive primary shard count come out. Everything else
/// is silently absent.
pub fn join_latest_indices(
    latest: &HashMap<String, String>,
    store_bytes: &HashMap<String, f64>,
    shard_counts: &HashMap<String, u32>,
) -> Vec<LatestIndex> {
    latest
        .iter()
        .filter_map(|(index, data_stream)| {
            let primary_store_bytes = *store_bytes.get(index)?;
            let primary_shards = *shard_counts.get(index)?;
            if primary_shards == 0 || !primary_store_bytes.is_finite() || primary_store_bytes < 0.0
            {
                tracing::debug!(
                    index = %index,
                    primary_shards,
                    primary_store_bytes,
                    "Skipping index with unusable measurements"
                );
                return None;
            }
            Some(LatestIndex {
                index: index.clone(),
                data_stream: data_stream.clone(),
                primary_store_bytes,
                primary_shards,
            })
        })
        .collect()
}

/// Sizing health of one index against the target shard size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShardSizing {
    pub primary_store_bytes: f64,
    pub primary_shards: u32,
    pub avg_primary_shard_bytes: f64,
    pub recommended_primary_shards: u64,
    pub shard_size_ok: bool,
}

impl ShardSizing {
    /// Returns `None` when `primary_shards` is zero.
    pub fn derive(
        primary_store_bytes: f64,
        primary_shards: u32,
        target: TargetShardSize,
    ) -> Option<Self> {
        if primary_shards == 0 {
            return None;
        }
        let avg_primary_shard_bytes = primary_store_bytes / f64::from(primary_shards);
        // Float to int casts saturate, so a negative quotient becomes 0.
        let recommended_primary_shards = (primary_store_bytes / target.bytes()).ceil() as u64;

        Some(Self {
            primary_store_bytes,
            primary_shards,
            avg_primary_shard_bytes,
            recommended_primary_shards,
            shard_size_ok: avg_primary_shard_bytes <= target.bytes(),
        })
    }
}

/// Sizing result for the latest backing index of one data stream.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexShardSizing {
    pub data_stream: String,
    pub index: String,
    pub sizing: ShardSizing,
}

/// Joins the three maps and derives sizing for every matched index.
pub fn correlate(
    latest: &HashMap<String, String>,
    store_bytes: &HashMap<String, f64>,
    shard_counts: &HashMap<String, u32>,
    target: TargetShardSize,
) -> Vec<IndexShardSizing> {
    join_latest_indices(latest, store_bytes, shard_counts)
        .into_iter()
        .filter_map(|row| {
            let sizing = ShardSizing::derive(row.primary_store_bytes, row.primary_shards, target)?;
            Some(IndexShardSizing {
                data_stream: row.data_stream,
                index: row.index,
                sizing,
            })
        })
        .collect()
}
