use crate::config::AuthConfig;
use crate::logging;
use crate::state::AppState;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::middleware;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use shardguard_collector::ShardSizeMetrics;

pub const METRICS_PATH: &str = "/metrics";

pub fn build_http_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(landing_page))
        .route(METRICS_PATH, get(metrics_handler))
        .with_state(state)
        .layer(middleware::from_fn(logging::request_logging))
}

/// Scrapes the cluster and renders the result. An aborted scrape still
/// answers 200 with an empty body so Prometheus keeps the target up.
async fn metrics_handler(State(state): State<AppState>) -> Response {
    let metrics = match ShardSizeMetrics::new() {
        Ok(metrics) => metrics,
        Err(e) => {
            tracing::error!(error = %e, "Failed to build metrics registry");
            return (StatusCode::INTERNAL_SERVER_ERROR, "failed to build metrics registry")
                .into_response();
        }
    };

    state.collector.collect(&metrics).await;

    match metrics.encode() {
        Ok(body) => ([(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)], body).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, "failed to encode metrics").into_response()
        }
    }
}

async fn landing_page(State(state): State<AppState>) -> Html<String> {
    let config = &state.config;
    let auth = match &config.auth {
        AuthConfig::None => "none".to_string(),
        AuthConfig::Basic { username, .. } => format!("basic ({})", html_escape(username)),
        AuthConfig::Iam { region, service } => format!(
            "iam ({}/{})",
            html_escape(region.as_deref().unwrap_or("default region")),
            html_escape(service)
        ),
    };
    Html(format!(
        "<html>\n<head><title>OpenSearch Data Stream Shard Exporter</title></head>\n<body>\n\
         <h1>OpenSearch Data Stream Shard Exporter</h1>\n\
         <p>Cluster: {url}</p>\n\
         <p>Target shard size: {target} GB</p>\n\
         <p>Auth: {auth}</p>\n\
         <p><a href=\"{METRICS_PATH}\">Metrics</a></p>\n\
         </body>\n</html>\n",
        url = html_escape(&config.opensearch_url),
        target = state.collector.target().gib(),
    ))
}

fn html_escape(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
