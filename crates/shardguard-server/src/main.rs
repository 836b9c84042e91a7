use anyhow::Result;
use shardguard_client::OpenSearchClient;
use shardguard_collector::DataStreamCollector;
use shardguard_server::app;
use shardguard_server::config::{self, ExporterConfig};
use shardguard_server::state::AppState;
use std::sync::Arc;
use tokio::signal;
use tracing_subscriber::EnvFilter;

#[allow(clippy::print_stderr)]
fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  shardguard            Start the exporter (configured from the environment)");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  {:<26}Cluster base URL (required)", config::ENV_OPENSEARCH_URL);
    eprintln!("  {:<26}Basic auth user", config::ENV_USERNAME);
    eprintln!("  {:<26}Basic auth password", config::ENV_PASSWORD);
    eprintln!("  {:<26}\"true\" or \"1\" to sign requests with AWS SigV4", config::ENV_USE_IAM);
    eprintln!("  {:<26}SigV4 region (falls back to AWS_REGION, then the AWS profile)", config::ENV_AWS_REGION);
    eprintln!("  {:<26}SigV4 service name (default es)", config::ENV_AWS_SERVICE);
    eprintln!("  {:<26}Target primary shard size in GB (default 30)", config::ENV_TARGET_SHARD_SIZE_GB);
    eprintln!("  {:<26}Listen address (default :9108)", config::ENV_LISTEN_ADDR);
    eprintln!("  {:<26}Per-request timeout in seconds (default 10)", config::ENV_TIMEOUT_SECS);
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("shardguard=info".parse()?))
        .init();

    if matches!(std::env::args().nth(1).as_deref(), Some("--help" | "-h")) {
        print_usage();
        return Ok(());
    }

    let config = ExporterConfig::from_env()?;
    run_server(config).await
}

async fn run_server(config: ExporterConfig) -> Result<()> {
    let client = OpenSearchClient::new(
        &config.opensearch_url,
        config.request_timeout,
        config.authenticator().await?,
    )?;
    let auth_mode = client.auth_mode();
    let collector = DataStreamCollector::new(Arc::new(client), config.target_shard_size);

    tracing::info!(
        listen = %config.listen_addr,
        target_gb = config.target_shard_size.gib(),
        auth = auth_mode,
        "Starting OpenSearch data stream shard exporter"
    );

    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    let app = app::build_http_app(AppState::new(collector, config));

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            signal::ctrl_c().await.ok();
        })
        .await?;

    tracing::info!("Exporter stopped");
    Ok(())
}
