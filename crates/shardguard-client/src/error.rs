/// Errors that can occur when calling the OpenSearch cluster.
///
/// Every variant means the call produced no usable data. Callers decide
/// whether that degrades or aborts the current scrape.
///
/// # Examples
///
/// ```rust
/// use shardguard_client::error::FetchError;
///
/// let err = FetchError::Status {
///     status: 403,
///     path: "/_data_stream".to_string(),
///     body: "forbidden".to_string(),
/// };
/// assert!(err.to_string().contains("403"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The base URL and request path did not form a valid URL.
    #[error("invalid request URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Transport failure from `reqwest`, including the per-request timeout.
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The cluster answered with a non-2xx status code.
    #[error("HTTP {status} for GET {path}: {body}")]
    Status {
        status: u16,
        path: String,
        body: String,
    },

    /// The response body did not match the expected JSON shape.
    #[error("failed to decode response of GET {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// The request could not be authenticated before sending.
    #[error("request signing error: {0}")]
    Signing(String),
}

impl FetchError {
    /// True when the failure came from the per-request timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, FetchError::Transport(e) if e.is_timeout())
    }
}

/// Convenience type alias so callers can write `error::Result<T>`.
pub type Result<T> = std::result::Result<T, FetchError>;
