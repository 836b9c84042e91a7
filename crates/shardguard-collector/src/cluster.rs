use crate::api::{ClusterHealthResponse, CLUSTER_HEALTH_PATH};
use shardguard_client::{get_json, ClusterTransport, FetchError};
use tokio::sync::OnceCell;

/// Fetches the cluster name with a single `GET /_cluster/health`.
pub async fn resolve_cluster_name(transport: &dyn ClusterTransport) -> Result<String, FetchError> {
    let health: ClusterHealthResponse = get_json(transport, CLUSTER_HEALTH_PATH).await?;
    Ok(health.cluster_name)
}

/// Process-wide cluster name, resolved on first successful lookup.
///
/// Concurrent scrapes wait on the same resolution. A failed lookup, or one
/// that returns an empty name, leaves the cache empty so the next scrape
/// tries again.
#[derive(Debug, Default)]
pub struct ClusterNameCache {
    name: OnceCell<String>,
}

impl ClusterNameCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached name, resolving it first if needed. Falls back to an
    /// empty label when the cluster cannot be reached.
    pub async fn get_or_resolve(&self, transport: &dyn ClusterTransport) -> String {
        let resolved = self
            .name
            .get_or_try_init(|| async {
                match resolve_cluster_name(transport).await {
                    Ok(name) if name.is_empty() => Err(None),
                    Ok(name) => Ok(name),
                    Err(e) => Err(Some(e)),
                }
            })
            .await;

        match resolved {
            Ok(name) => name.clone(),
            Err(Some(e)) => {
                tracing::warn!(error = %e, "Failed to resolve cluster name, using empty label");
                String::new()
            }
            Err(None) => {
                tracing::warn!("Cluster reported an empty name, will retry on next scrape");
                String::new()
            }
        }
    }

    pub fn cached(&self) -> Option<&str> {
        self.name.get().map(String::as_str)
    }
}
