//! Shard sizing collection for OpenSearch data streams.
//!
//! On every scrape the [`DataStreamCollector`] resolves the latest backing
//! index of each data stream, fetches store stats and shard counts for just
//! those indices, joins the three responses on index name, and derives the
//! sizing values exported through [`ShardSizeMetrics`].

pub mod api;
pub mod cluster;
pub mod collector;
pub mod error;
pub mod indices;
pub mod metrics;
pub mod shards;
pub mod sizing;
pub mod stats;

#[cfg(test)]
mod tests;

pub use collector::{DataStreamCollector, Scrape};
pub use metrics::ShardSizeMetrics;
pub use sizing::{IndexShardSizing, ShardSizing, TargetShardSize};
