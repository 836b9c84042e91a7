use crate::api::{store_stats_path, StoreStatsResponse};
use shardguard_client::{get_json, ClusterTransport, FetchError};
use std::collections::{BTreeSet, HashMap};

/// Fetches the total primary store size, in bytes, of each requested index.
///
/// An empty request makes no call. Indices missing from the response, or
/// reported without a primary store section, are left out of the result.
pub async fn fetch_storage_stats(
    transport: &dyn ClusterTransport,
    indices: &BTreeSet<String>,
) -> Result<HashMap<String, f64>, FetchError> {
    if indices.is_empty() {
        return Ok(HashMap::new());
    }

    let response: StoreStatsResponse = get_json(transport, &store_stats_path(indices)).await?;
    Ok(response
        .indices
        .into_iter()
        .filter_map(|(name, stats)| {
            let bytes = stats.primary_store_bytes();
            if bytes.is_none() {
                tracing::debug!(index = %name, "No primary store stats for index");
            }
            bytes.map(|b| (name, b))
        })
        .collect())
}
