//! Read-only access to an OpenSearch cluster's REST API.
//!
//! [`ClusterTransport`] is the "send an authenticated GET" capability the
//! collector depends on. [`opensearch::OpenSearchClient`] implements it over
//! `reqwest`, delegating credentials to a pluggable
//! [`auth::RequestAuthenticator`] (none, basic, or AWS SigV4).

pub mod auth;
pub mod error;
pub mod opensearch;
pub mod sigv4;

pub use auth::{BasicAuth, NoAuth, RequestAuthenticator};
pub use error::FetchError;
pub use opensearch::OpenSearchClient;
pub use sigv4::SigV4Signer;

use serde::de::DeserializeOwned;

/// Issues authenticated GET requests against the cluster.
#[async_trait::async_trait]
pub trait ClusterTransport: Send + Sync {
    /// Fetches `path` (relative to the cluster base URL, starting with `/`)
    /// and returns the body of a 2xx response.
    ///
    /// # Errors
    ///
    /// Returns a [`FetchError`] on transport failure, timeout, or non-2xx status.
    async fn get(&self, path: &str) -> error::Result<String>;
}

/// Fetches `path` and decodes the body as JSON.
pub async fn get_json<T: DeserializeOwned>(
    transport: &dyn ClusterTransport,
    path: &str,
) -> error::Result<T> {
    let body = transport.get(path).await?;
    serde_json::from_str(&body).map_err(|source| FetchError::Decode {
        path: path.to_string(),
        source,
    })
}
