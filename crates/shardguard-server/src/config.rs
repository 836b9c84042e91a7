use aws_config::meta::region::RegionProviderChain;
use aws_config::{BehaviorVersion, Region};
use reqwest::Url;
use shardguard_client::{BasicAuth, NoAuth, RequestAuthenticator, SigV4Signer};
use shardguard_collector::TargetShardSize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

pub const ENV_OPENSEARCH_URL: &str = "OPENSEARCH_URL";
pub const ENV_USERNAME: &str = "OPENSEARCH_USERNAME";
pub const ENV_PASSWORD: &str = "OPENSEARCH_PASSWORD";
pub const ENV_USE_IAM: &str = "OPENSEARCH_USE_IAM";
pub const ENV_AWS_REGION: &str = "OPENSEARCH_AWS_REGION";
pub const ENV_AWS_SERVICE: &str = "OPENSEARCH_AWS_SERVICE";
pub const ENV_TARGET_SHARD_SIZE_GB: &str = "TARGET_SHARD_SIZE_GB";
pub const ENV_LISTEN_ADDR: &str = "LISTEN_ADDR";
pub const ENV_TIMEOUT_SECS: &str = "OPENSEARCH_TIMEOUT_SECS";

/// Invalid startup configuration. Always fatal.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("invalid {name}={value:?}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// How requests to the cluster are authenticated.
#[derive(Debug, Clone)]
pub enum AuthConfig {
    None,
    Basic {
        username: String,
        password: String,
    },
    /// AWS SigV4 signing for Amazon OpenSearch Service. Credentials, and the
    /// region when not set here, come from the AWS SDK default chain.
    Iam {
        region: Option<String>,
        service: String,
    },
}

#[derive(Debug, Clone)]
pub struct ExporterConfig {
    pub opensearch_url: String,
    pub auth: AuthConfig,
    pub target_shard_size: TargetShardSize,
    pub listen_addr: SocketAddr,
    pub request_timeout: Duration,
}

fn default_target_shard_size_gb() -> f64 {
    30.0
}

fn default_listen_addr() -> &'static str {
    ":9108"
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_aws_service() -> String {
    "es".to_string()
}

impl ExporterConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from a variable lookup. Empty values count as
    /// unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let opensearch_url = var(ENV_OPENSEARCH_URL).ok_or(ConfigError::Missing(ENV_OPENSEARCH_URL))?;
        validate_url(&opensearch_url)?;

        let target_shard_size = match var(ENV_TARGET_SHARD_SIZE_GB) {
            Some(raw) => parse_target_shard_size(&raw)?,
            None => TargetShardSize::from_gib(default_target_shard_size_gb())
                .ok_or(ConfigError::Missing(ENV_TARGET_SHARD_SIZE_GB))?,
        };

        let listen_raw = var(ENV_LISTEN_ADDR).unwrap_or_else(|| default_listen_addr().to_string());
        let listen_addr = parse_listen_addr(&listen_raw)?;

        let timeout_secs = match var(ENV_TIMEOUT_SECS) {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => secs,
                _ => {
                    return Err(ConfigError::Invalid {
                        name: ENV_TIMEOUT_SECS,
                        value: raw,
                        reason: "must be a positive whole number of seconds".to_string(),
                    })
                }
            },
            None => default_timeout_secs(),
        };

        let use_iam = var(ENV_USE_IAM)
            .map(|v| v.trim().eq_ignore_ascii_case("true") || v.trim() == "1")
            .unwrap_or(false);

        let auth = if use_iam {
            AuthConfig::Iam {
                region: var(ENV_AWS_REGION).or_else(|| var("AWS_REGION")),
                service: var(ENV_AWS_SERVICE).unwrap_or_else(default_aws_service),
            }
        } else if let Some(username) = var(ENV_USERNAME) {
            AuthConfig::Basic {
                username,
                password: lookup(ENV_PASSWORD).unwrap_or_default(),
            }
        } else {
            AuthConfig::None
        };

        Ok(Self {
            opensearch_url,
            auth,
            target_shard_size,
            listen_addr,
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Builds the request authenticator. In IAM mode this loads the AWS SDK
    /// configuration, so the region must resolve here; credentials are only
    /// fetched when the first request is signed.
    pub async fn authenticator(&self) -> Result<Arc<dyn RequestAuthenticator>, ConfigError> {
        Ok(match &self.auth {
            AuthConfig::None => Arc::new(NoAuth),
            AuthConfig::Basic { username, password } => {
                Arc::new(BasicAuth::new(username.clone(), password.clone()))
            }
            AuthConfig::Iam { region, service } => {
                let region_provider =
                    RegionProviderChain::first_try(region.clone().map(Region::new)).or_default_provider();
                let sdk_config = aws_config::defaults(BehaviorVersion::latest())
                    .region(region_provider)
                    .load()
                    .await;
                let region = sdk_config
                    .region()
                    .ok_or(ConfigError::Missing(ENV_AWS_REGION))?
                    .to_string();
                let provider = sdk_config
                    .credentials_provider()
                    .ok_or(ConfigError::Missing("AWS credentials provider"))?;
                tracing::info!(region = %region, service = %service, "Signing requests with AWS SigV4");
                Arc::new(SigV4Signer::new(provider, region, service.clone()))
            }
        })
    }
}

fn validate_url(raw: &str) -> Result<(), ConfigError> {
    let invalid = |reason: String| ConfigError::Invalid {
        name: ENV_OPENSEARCH_URL,
        value: raw.to_string(),
        reason,
    };
    let url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid("scheme must be http or https".to_string()));
    }
    if url.host_str().is_none() {
        return Err(invalid("missing host".to_string()));
    }
    Ok(())
}

fn parse_target_shard_size(raw: &str) -> Result<TargetShardSize, ConfigError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .and_then(TargetShardSize::from_gib)
        .ok_or_else(|| ConfigError::Invalid {
            name: ENV_TARGET_SHARD_SIZE_GB,
            value: raw.to_string(),
            reason: "must be a positive number of gigabytes".to_string(),
        })
}

/// Accepts `host:port`, or `:port` for all interfaces.
fn parse_listen_addr(raw: &str) -> Result<SocketAddr, ConfigError> {
    let trimmed = raw.trim();
    let candidate = if trimmed.starts_with(':') {
        format!("0.0.0.0{trimmed}")
    } else {
        trimmed.to_string()
    };
    candidate.parse().map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
        name: ENV_LISTEN_ADDR,
        value: raw.to_string(),
        reason: e.to_string(),
    })
}
