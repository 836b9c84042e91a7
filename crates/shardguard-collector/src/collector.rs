use crate::cluster::ClusterNameCache;
use crate::indices::resolve_latest_indices;
use crate::metrics::ShardSizeMetrics;
use crate::shards::fetch_shard_counts;
use crate::sizing::{correlate, IndexShardSizing, TargetShardSize};
use crate::stats::fetch_storage_stats;
use shardguard_client::{ClusterTransport, FetchError};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

/// Result of one successful scrape.
#[derive(Debug, Clone, PartialEq)]
pub struct Scrape {
    pub cluster_name: String,
    pub indices: Vec<IndexShardSizing>,
}

/// Computes shard sizing for the latest backing index of every data stream.
///
/// Holds no per-scrape state: each call to [`DataStreamCollector::scrape`]
/// reads fresh data from the cluster. Only the cluster name is cached.
pub struct DataStreamCollector {
    transport: Arc<dyn ClusterTransport>,
    target: TargetShardSize,
    cluster_name: ClusterNameCache,
}

impl DataStreamCollector {
    pub fn new(transport: Arc<dyn ClusterTransport>, target: TargetShardSize) -> Self {
        Self {
            transport,
            target,
            cluster_name: ClusterNameCache::new(),
        }
    }

    pub fn target(&self) -> TargetShardSize {
        self.target
    }

    /// Runs one scrape against the cluster.
    ///
    /// # Errors
    ///
    /// Fails if listing data streams, fetching store stats, or fetching shard
    /// counts fails. A cluster name lookup failure only empties the label.
    pub async fn scrape(&self) -> Result<Scrape, FetchError> {
        let transport = self.transport.as_ref();
        let cluster_name = self.cluster_name.get_or_resolve(transport).await;

        let latest = resolve_latest_indices(transport)
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to fetch data streams"))?;
        if latest.is_empty() {
            return Ok(Scrape {
                cluster_name,
                indices: Vec::new(),
            });
        }

        let names: BTreeSet<String> = latest.keys().cloned().collect();
        let (store_bytes, shard_counts) = tokio::try_join!(
            async {
                fetch_storage_stats(transport, &names)
                    .await
                    .inspect_err(|e| tracing::error!(error = %e, "Failed to fetch store stats"))
            },
            async {
                fetch_shard_counts(transport, &names)
                    .await
                    .inspect_err(|e| tracing::error!(error = %e, "Failed to fetch shard counts"))
            },
        )?;

        Ok(Scrape {
            cluster_name,
            indices: correlate(&latest, &store_bytes, &shard_counts, self.target),
        })
    }

    /// Scrapes and records the result into `metrics`. An aborted scrape
    /// records nothing. Returns the number of indices recorded.
    pub async fn collect(&self, metrics: &ShardSizeMetrics) -> usize {
        let start = Instant::now();
        match self.scrape().await {
            Ok(scrape) => {
                metrics.emit(&scrape.cluster_name, &scrape.indices);
                tracing::debug!(
                    cluster = %scrape.cluster_name,
                    indices = scrape.indices.len(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Scrape complete"
                );
                scrape.indices.len()
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    timeout = e.is_timeout(),
                    "Scrape aborted, no metrics emitted"
                );
                0
            }
        }
    }
}
