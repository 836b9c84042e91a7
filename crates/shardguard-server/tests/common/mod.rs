#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use shardguard_client::{ClusterTransport, FetchError};
use shardguard_collector::DataStreamCollector;
use shardguard_server::app;
use shardguard_server::config::ExporterConfig;
use shardguard_server::state::AppState;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tower::util::ServiceExt;

pub const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Cluster double answering fixed bodies or statuses per request path.
#[derive(Default)]
pub struct FakeCluster {
    routes: HashMap<String, Result<String, u16>>,
    hits: Mutex<Vec<String>>,
}

impl FakeCluster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_body(mut self, path: &str, body: impl Into<String>) -> Self {
        self.routes.insert(path.to_string(), Ok(body.into()));
        self
    }

    pub fn with_status(mut self, path: &str, status: u16) -> Self {
        self.routes.insert(path.to_string(), Err(status));
        self
    }

    pub fn hits(&self) -> Vec<String> {
        self.hits.lock().unwrap().clone()
    }
}

#[async_trait]
impl ClusterTransport for FakeCluster {
    async fn get(&self, path: &str) -> Result<String, FetchError> {
        self.hits.lock().unwrap().push(path.to_string());
        match self.routes.get(path) {
            Some(Ok(body)) => Ok(body.clone()),
            Some(Err(status)) => Err(FetchError::Status {
                status: *status,
                path: path.to_string(),
                body: String::new(),
            }),
            None => Err(FetchError::Status {
                status: 404,
                path: path.to_string(),
                body: String::new(),
            }),
        }
    }
}

/// Cluster with one data stream `logs-app` whose latest backing index holds
/// 100 GiB over 2 primaries.
pub fn single_stream_cluster() -> FakeCluster {
    FakeCluster::new()
        .with_body("/_cluster/health", r#"{"cluster_name": "search-prod"}"#)
        .with_body(
            "/_data_stream",
            r#"{"data_streams": [{"name": "logs-app", "indices": [
                {"index_name": ".ds-logs-app-000001"},
                {"index_name": ".ds-logs-app-000002"}
            ]}]}"#,
        )
        .with_body(
            "/.ds-logs-app-000002/_stats/store",
            format!(
                r#"{{"indices": {{".ds-logs-app-000002": {{"primaries": {{"store": {{"size_in_bytes": {}}}}}}}}}}}"#,
                100.0 * GIB
            ),
        )
        .with_body(
            "/_cat/indices/.ds-logs-app-000002?format=json&h=index,pri,rep",
            r#"[{"index": ".ds-logs-app-000002", "pri": "2", "rep": "1"}]"#,
        )
}

pub fn test_config() -> ExporterConfig {
    let vars: HashMap<&str, &str> = [("OPENSEARCH_URL", "http://opensearch.test:9200")].into();
    ExporterConfig::from_lookup(|name| vars.get(name).map(|v| v.to_string()))
        .expect("test config should load")
}

pub fn build_test_app(cluster: Arc<FakeCluster>) -> axum::Router {
    let config = test_config();
    let collector = DataStreamCollector::new(cluster, config.target_shard_size);
    app::build_http_app(AppState::new(collector, config))
}

pub struct TextResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub trace_id: Option<String>,
    pub body: String,
}

pub async fn get(app: &axum::Router, uri: &str) -> TextResponse {
    let request = Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request should build");
    let response = app.clone().oneshot(request).await.expect("router should answer");

    let header = |name: &str| {
        response
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    let status = response.status();
    let content_type = header("content-type");
    let trace_id = header("x-trace-id");
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should read");

    TextResponse {
        status,
        content_type,
        trace_id,
        body: String::from_utf8(bytes.to_vec()).expect("body should be utf-8"),
    }
}
