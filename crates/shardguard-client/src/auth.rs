use crate::error::{FetchError, Result};
use base64::Engine;
use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::Request;

/// Attaches credentials to an outbound request right before it is sent.
///
/// The client builds every request unauthenticated and hands it to the
/// configured authenticator, so new schemes never touch the fetch code.
#[async_trait::async_trait]
pub trait RequestAuthenticator: Send + Sync {
    /// Short name used in startup logs (`"no-auth"`, `"basic"`, `"iam"`).
    fn mode(&self) -> &'static str;

    /// Mutates `request` in place, typically by adding headers.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Signing`] if credentials cannot be loaded or
    /// attached.
    async fn apply(&self, request: &mut Request) -> Result<()>;
}

/// Sends requests unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAuth;

#[async_trait::async_trait]
impl RequestAuthenticator for NoAuth {
    fn mode(&self) -> &'static str {
        "no-auth"
    }

    async fn apply(&self, _request: &mut Request) -> Result<()> {
        Ok(())
    }
}

/// HTTP basic authentication.
#[derive(Clone)]
pub struct BasicAuth {
    username: String,
    password: String,
}

impl BasicAuth {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    fn header_value(&self) -> Result<HeaderValue> {
        let token = base64::engine::general_purpose::STANDARD
            .encode(format!("{}:{}", self.username, self.password));
        let mut value = HeaderValue::from_str(&format!("Basic {token}"))
            .map_err(|e| FetchError::Signing(format!("invalid basic auth header: {e}")))?;
        value.set_sensitive(true);
        Ok(value)
    }
}

impl std::fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicAuth")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[async_trait::async_trait]
impl RequestAuthenticator for BasicAuth {
    fn mode(&self) -> &'static str {
        "basic"
    }

    async fn apply(&self, request: &mut Request) -> Result<()> {
        let value = self.header_value()?;
        request.headers_mut().insert(AUTHORIZATION, value);
        Ok(())
    }
}
