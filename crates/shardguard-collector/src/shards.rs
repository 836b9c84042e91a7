use crate::api::{cat_indices_path, CatIndexRow};
use crate::error::ParseError;
use serde_json::Value;
use shardguard_client::{get_json, ClusterTransport, FetchError};
use std::collections::{BTreeSet, HashMap};

/// Reads the primary shard count of one `_cat/indices` row.
pub fn primary_shard_count(row: &CatIndexRow) -> Result<u32, ParseError> {
    let value = match &row.pri {
        None | Some(Value::Null) => {
            return Err(ParseError::MissingShardCount {
                index: row.index.clone(),
            })
        }
        Some(value) => value,
    };

    let parsed = match value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse::<u32>().ok(),
        _ => None,
    };

    parsed.ok_or_else(|| ParseError::InvalidShardCount {
        index: row.index.clone(),
        value: match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        },
    })
}

/// Builds the index → primary shard count map, dropping malformed rows.
pub fn parse_shard_counts(rows: Vec<Value>) -> HashMap<String, u32> {
    let mut counts = HashMap::with_capacity(rows.len());
    for raw in rows {
        let row: CatIndexRow = match serde_json::from_value(raw) {
            Ok(row) => row,
            Err(e) => {
                let e = ParseError::MalformedRow {
                    reason: e.to_string(),
                };
                tracing::warn!(error = %e, "Dropping shard count row");
                continue;
            }
        };
        match primary_shard_count(&row) {
            Ok(count) => {
                counts.insert(row.index, count);
            }
            Err(e) => {
                tracing::warn!(index = %row.index, error = %e, "Dropping shard count row");
            }
        }
    }
    counts
}

/// Fetches the primary shard count of each requested index.
///
/// An empty request makes no call. A malformed row only loses that index.
pub async fn fetch_shard_counts(
    transport: &dyn ClusterTransport,
    indices: &BTreeSet<String>,
) -> Result<HashMap<String, u32>, FetchError> {
    if indices.is_empty() {
        return Ok(HashMap::new());
    }

    let rows: Vec<Value> = get_json(transport, &cat_indices_path(indices)).await?;
    Ok(parse_shard_counts(rows))
}
