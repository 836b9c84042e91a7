use crate::auth::RequestAuthenticator;
use crate::error::{FetchError, Result};
use aws_credential_types::provider::{ProvideCredentials, SharedCredentialsProvider};
use aws_credential_types::Credentials;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use reqwest::header::{HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::{Request, Url};
use sha2::{Digest, Sha256};
use std::time::{Duration, SystemTime};
use tokio::sync::Mutex;

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "AWS4-HMAC-SHA256";
const AMZ_DATE: &str = "x-amz-date";
const AMZ_SECURITY_TOKEN: &str = "x-amz-security-token";
/// SHA-256 of an empty payload. Every request this client signs is a GET
/// without a body.
const EMPTY_PAYLOAD_SHA256: &str =
    "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

/// Credentials are refetched once the cached set is this close to expiry.
const REFRESH_BEFORE_EXPIRY: Duration = Duration::from_secs(300);

/// AWS Signature Version 4 authenticator for Amazon OpenSearch Service.
///
/// Credentials come from an AWS credentials provider, normally the SDK
/// default chain (environment, shared profile, web identity, ECS, IMDS).
/// They are cached until shortly before they expire.
pub struct SigV4Signer {
    provider: SharedCredentialsProvider,
    cached: Mutex<Option<Credentials>>,
    region: String,
    service: String,
}

impl SigV4Signer {
    pub fn new(
        provider: SharedCredentialsProvider,
        region: impl Into<String>,
        service: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            cached: Mutex::new(None),
            region: region.into(),
            service: service.into(),
        }
    }

    /// Cached credentials, or a fresh set from the provider when nothing is
    /// cached yet or the cached set is about to expire.
    async fn credentials(&self) -> Result<Credentials> {
        let mut cached = self.cached.lock().await;
        if let Some(creds) = cached.as_ref() {
            if is_fresh(creds, SystemTime::now()) {
                return Ok(creds.clone());
            }
        }

        let fresh = self
            .provider
            .provide_credentials()
            .await
            .map_err(|e| FetchError::Signing(format!("failed to load AWS credentials: {e}")))?;
        tracing::debug!(expires = ?fresh.expiry(), "Loaded AWS credentials");
        *cached = Some(fresh.clone());
        Ok(fresh)
    }

    /// Signs `request` with `credentials` as if it were sent at `now`.
    pub fn sign_at(
        &self,
        request: &mut Request,
        credentials: &Credentials,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
        let date = now.format("%Y%m%d").to_string();
        let host = host_header(request.url())?;

        // Sorted by header name.
        let mut signed: Vec<(&str, String)> = vec![("host", host), (AMZ_DATE, amz_date.clone())];
        if let Some(token) = credentials.session_token() {
            signed.push((AMZ_SECURITY_TOKEN, token.to_string()));
        }

        let canonical_headers: String = signed
            .iter()
            .map(|(name, value)| format!("{}:{}\n", name, value.trim()))
            .collect();
        let signed_headers = signed
            .iter()
            .map(|(name, _)| *name)
            .collect::<Vec<_>>()
            .join(";");

        let canonical_request = format!(
            "{}\n{}\n{}\n{}\n{}\n{}",
            request.method().as_str(),
            canonical_uri(request.url().path()),
            canonical_query(request.url()),
            canonical_headers,
            signed_headers,
            EMPTY_PAYLOAD_SHA256
        );
        let hashed_canonical_request = hex::encode(Sha256::digest(canonical_request.as_bytes()));

        let credential_scope = format!("{}/{}/{}/aws4_request", date, self.region, self.service);
        let string_to_sign = format!(
            "{}\n{}\n{}\n{}",
            ALGORITHM, amz_date, credential_scope, hashed_canonical_request
        );

        let secret_date = hmac_sha256(
            format!("AWS4{}", credentials.secret_access_key()).as_bytes(),
            date.as_bytes(),
        )?;
        let secret_region = hmac_sha256(&secret_date, self.region.as_bytes())?;
        let secret_service = hmac_sha256(&secret_region, self.service.as_bytes())?;
        let secret_signing = hmac_sha256(&secret_service, b"aws4_request")?;
        let signature = hex::encode(hmac_sha256(&secret_signing, string_to_sign.as_bytes())?);

        let authorization = format!(
            "{} Credential={}/{}, SignedHeaders={}, Signature={}",
            ALGORITHM,
            credentials.access_key_id(),
            credential_scope,
            signed_headers,
            signature
        );

        let headers = request.headers_mut();
        headers.insert(HeaderName::from_static(AMZ_DATE), header_value(&amz_date)?);
        if let Some(token) = credentials.session_token() {
            let mut value = header_value(token)?;
            value.set_sensitive(true);
            headers.insert(HeaderName::from_static(AMZ_SECURITY_TOKEN), value);
        }
        let mut value = header_value(&authorization)?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);

        Ok(())
    }
}

impl std::fmt::Debug for SigV4Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigV4Signer")
            .field("region", &self.region)
            .field("service", &self.service)
            .finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
impl RequestAuthenticator for SigV4Signer {
    fn mode(&self) -> &'static str {
        "iam"
    }

    async fn apply(&self, request: &mut Request) -> Result<()> {
        let credentials = self.credentials().await?;
        self.sign_at(request, &credentials, Utc::now())
    }
}

/// Credentials without an expiry never go stale.
fn is_fresh(credentials: &Credentials, now: SystemTime) -> bool {
    match credentials.expiry() {
        Some(expiry) => expiry > now + REFRESH_BEFORE_EXPIRY,
        None => true,
    }
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value).map_err(|e| FetchError::Signing(format!("invalid header value: {e}")))
}

/// Value of the `Host` header the transport will send for `url`.
fn host_header(url: &Url) -> Result<String> {
    let host = url
        .host_str()
        .ok_or_else(|| FetchError::Signing(format!("URL has no host: {url}")))?;
    Ok(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

/// Each path segment is URI-encoded once more on top of the URL's own
/// escaping, as required for every service other than S3.
fn canonical_uri(path: &str) -> String {
    if path.is_empty() {
        return "/".to_string();
    }
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

fn canonical_query(url: &Url) -> String {
    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            (
                urlencoding::encode(&k).into_owned(),
                urlencoding::encode(&v).into_owned(),
            )
        })
        .collect();
    pairs.sort();
    pairs
        .into_iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| FetchError::Signing(format!("HMAC error: {e}")))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}
