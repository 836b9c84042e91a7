use crate::api::{DataStreamsResponse, DATA_STREAM_PATH};
use shardguard_client::{get_json, ClusterTransport, FetchError};
use std::collections::HashMap;

/// Maps the latest backing index of every data stream to the stream's name.
///
/// The last entry of a stream's `indices` list is its current write index;
/// the listing order returned by the cluster is trusted as generation order.
/// Streams without backing indices are skipped.
pub fn latest_backing_indices(response: DataStreamsResponse) -> HashMap<String, String> {
    response
        .data_streams
        .into_iter()
        .filter_map(|stream| {
            let latest = stream.indices.into_iter().last()?;
            Some((latest.index_name, stream.name))
        })
        .collect()
}

/// Lists data streams and resolves each one's latest backing index.
///
/// # Errors
///
/// Any failure of the listing call is returned as is; there is no partial
/// result.
pub async fn resolve_latest_indices(
    transport: &dyn ClusterTransport,
) -> Result<HashMap<String, String>, FetchError> {
    let response: DataStreamsResponse = get_json(transport, DATA_STREAM_PATH).await?;
    let streams = response.data_streams.len();
    let latest = latest_backing_indices(response);
    tracing::debug!(streams, indices = latest.len(), "Resolved latest backing indices");
    Ok(latest)
}
