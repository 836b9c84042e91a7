use crate::auth::RequestAuthenticator;
use crate::error::{FetchError, Result};
use crate::ClusterTransport;
use reqwest::{Client, Url};
use std::sync::Arc;
use std::time::Duration;

/// Maximum number of bytes of an error response kept in [`FetchError::Status`].
const MAX_ERROR_BODY_CHARS: usize = 200;

/// HTTP client bound to one cluster base URL.
pub struct OpenSearchClient {
    base_url: String,
    client: Client,
    authenticator: Arc<dyn RequestAuthenticator>,
}

impl OpenSearchClient {
    /// Builds a client for `base_url` (e.g. `https://search.example.com:9200`).
    /// A trailing slash is ignored; a path prefix is kept.
    pub fn new(
        base_url: &str,
        timeout: Duration,
        authenticator: Arc<dyn RequestAuthenticator>,
    ) -> Result<Self> {
        let base_url = base_url.trim_end_matches('/').to_string();
        Url::parse(&base_url).map_err(|e| FetchError::InvalidUrl {
            url: base_url.clone(),
            reason: e.to_string(),
        })?;

        let client = Client::builder()
            .use_rustls_tls()
            .timeout(timeout)
            .build()?;

        Ok(Self {
            base_url,
            client,
            authenticator,
        })
    }

    /// Name of the configured authentication mode.
    pub fn auth_mode(&self) -> &'static str {
        self.authenticator.mode()
    }

    fn url_for(&self, path: &str) -> Result<Url> {
        let raw = format!("{}{}", self.base_url, path);
        Url::parse(&raw).map_err(|e| FetchError::InvalidUrl {
            url: raw,
            reason: e.to_string(),
        })
    }
}

#[async_trait::async_trait]
impl ClusterTransport for OpenSearchClient {
    async fn get(&self, path: &str) -> Result<String> {
        let url = self.url_for(path)?;
        let mut request = self.client.get(url).build()?;
        self.authenticator.apply(&mut request).await?;

        tracing::debug!(path, auth = self.authenticator.mode(), "GET");
        let response = self.client.execute(request).await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                path: path.to_string(),
                body: truncate_body(&body, MAX_ERROR_BODY_CHARS),
            });
        }

        Ok(body)
    }
}

/// Truncates to at most `max` bytes on a char boundary.
fn truncate_body(body: &str, max: usize) -> String {
    if body.len() <= max {
        return body.to_string();
    }
    let mut end = max;
    while end > 0 && !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}
