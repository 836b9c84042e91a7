/// A single malformed row in an otherwise usable upstream response.
///
/// Parse errors never abort a scrape: the row is logged and dropped.
///
/// # Examples
///
/// ```rust
/// use shardguard_collector::error::ParseError;
///
/// let err = ParseError::InvalidShardCount {
///     index: ".ds-logs-000001".to_string(),
///     value: "n/a".to_string(),
/// };
/// assert!(err.to_string().contains(".ds-logs-000001"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// The row carries no primary shard count.
    #[error("index {index}: primary shard count missing")]
    MissingShardCount { index: String },

    /// The primary shard count is not a non-negative integer.
    #[error("index {index}: invalid primary shard count {value:?}")]
    InvalidShardCount { index: String, value: String },

    /// The row is not an object with a string `index` field.
    #[error("malformed _cat/indices row: {reason}")]
    MalformedRow { reason: String },
}
