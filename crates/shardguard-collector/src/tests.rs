use crate::api::{cat_indices_path, store_stats_path, CLUSTER_HEALTH_PATH, DATA_STREAM_PATH};
use crate::collector::DataStreamCollector;
use crate::metrics::{ShardSizeMetrics, SHARD_SIZE_OK};
use crate::sizing::TargetShardSize;
use shardguard_client::{ClusterTransport, FetchError};
use std::collections::{BTreeSet, HashMap, VecDeque};
use std::sync::{Arc, Mutex};

const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

#[derive(Clone)]
enum Reply {
    Body(String),
    Status(u16),
}

/// In-memory cluster answering each path from a queue of scripted replies.
/// The last reply of a queue repeats; unknown paths answer 404.
#[derive(Default)]
pub(crate) struct ScriptedCluster {
    replies: Mutex<HashMap<String, VecDeque<Reply>>>,
    calls: Mutex<HashMap<String, usize>>,
}

impl ScriptedCluster {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn respond(self, path: &str, body: &str) -> Self {
        self.push(path, Reply::Body(body.to_string()))
    }

    pub(crate) fn fail(self, path: &str, status: u16) -> Self {
        self.push(path, Reply::Status(status))
    }

    fn push(self, path: &str, reply: Reply) -> Self {
        self.replies
            .lock()
            .unwrap()
            .entry(path.to_string())
            .or_default()
            .push_back(reply);
        self
    }

    pub(crate) fn calls(&self, path: &str) -> usize {
        self.calls.lock().unwrap().get(path).copied().unwrap_or(0)
    }

    pub(crate) fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }
}

#[async_trait::async_trait]
impl ClusterTransport for ScriptedCluster {
    async fn get(&self, path: &str) -> Result<String, FetchError> {
        *self.calls.lock().unwrap().entry(path.to_string()).or_default() += 1;

        let reply = {
            let mut replies = self.replies.lock().unwrap();
            match replies.get_mut(path) {
                Some(queue) if queue.len() > 1 => queue.pop_front(),
                Some(queue) => queue.front().cloned(),
                None => None,
            }
        };

        match reply {
            Some(Reply::Body(body)) => Ok(body),
            Some(Reply::Status(status)) => Err(FetchError::Status {
                status,
                path: path.to_string(),
                body: String::new(),
            }),
            None => Err(FetchError::Status {
                status: 404,
                path: path.to_string(),
                body: "no such route".to_string(),
            }),
        }
    }
}

fn names(list: &[&str]) -> BTreeSet<String> {
    list.iter().map(|s| s.to_string()).collect()
}

const DATA_STREAMS: &str = r#"{"data_streams": [
    {"name": "logs-app", "indices": [
        {"index_name": ".ds-logs-app-000001"},
        {"index_name": ".ds-logs-app-000002"},
        {"index_name": ".ds-logs-app-000003"}
    ]},
    {"name": "metrics-host", "indices": [{"index_name": ".ds-metrics-host-000001"}]},
    {"name": "new-stream", "indices": []},
    {"name": "traces", "indices": [{"index_name": ".ds-traces-000004"}]}
]}"#;

fn latest_names() -> BTreeSet<String> {
    names(&[".ds-logs-app-000003", ".ds-metrics-host-000001", ".ds-traces-000004"])
}

fn store_stats_body() -> String {
    // traces was deleted between the listing and the stats call.
    format!(
        r#"{{"indices": {{
            ".ds-logs-app-000003": {{"primaries": {{"store": {{"size_in_bytes": {}}}}}}},
            ".ds-metrics-host-000001": {{"primaries": {{"store": {{"size_in_bytes": {}}}}}}}
        }}}}"#,
        100.0 * GIB,
        45.0 * GIB
    )
}

const CAT_BODY: &str = r#"[
    {"index": ".ds-logs-app-000003", "pri": "2", "rep": "1"},
    {"index": ".ds-metrics-host-000001", "pri": "2", "rep": "1"},
    {"index": ".ds-traces-000004", "pri": "1", "rep": "1"}
]"#;

fn healthy_cluster() -> ScriptedCluster {
    ScriptedCluster::new()
        .respond(CLUSTER_HEALTH_PATH, r#"{"cluster_name": "search-prod"}"#)
        .respond(DATA_STREAM_PATH, DATA_STREAMS)
        .respond(&store_stats_path(&latest_names()), &store_stats_body())
        .respond(&cat_indices_path(&latest_names()), CAT_BODY)
}

fn collector(cluster: Arc<ScriptedCluster>) -> DataStreamCollector {
    DataStreamCollector::new(cluster, TargetShardSize::from_gib(30.0).unwrap())
}

#[tokio::test]
async fn scrape_derives_sizing_for_latest_indices_only() {
    let cluster = Arc::new(healthy_cluster());
    let mut scrape = collector(cluster.clone()).scrape().await.unwrap();
    scrape.indices.sort_by(|a, b| a.index.cmp(&b.index));

    assert_eq!(scrape.cluster_name, "search-prod");
    assert_eq!(scrape.indices.len(), 2);

    let logs = &scrape.indices[0];
    assert_eq!(logs.index, ".ds-logs-app-000003");
    assert_eq!(logs.data_stream, "logs-app");
    assert_eq!(logs.sizing.avg_primary_shard_bytes, 50.0 * GIB);
    assert_eq!(logs.sizing.recommended_primary_shards, 4);
    assert!(!logs.sizing.shard_size_ok);

    let metrics = &scrape.indices[1];
    assert_eq!(metrics.data_stream, "metrics-host");
    assert_eq!(metrics.sizing.avg_primary_shard_bytes, 22.5 * GIB);
    assert_eq!(metrics.sizing.recommended_primary_shards, 2);
    assert!(metrics.sizing.shard_size_ok);

    assert_eq!(cluster.calls(&store_stats_path(&latest_names())), 1);
    assert_eq!(cluster.calls(&cat_indices_path(&latest_names())), 1);
}

#[tokio::test]
async fn cluster_name_is_resolved_once_across_scrapes() {
    let cluster = Arc::new(healthy_cluster());
    let collector = collector(cluster.clone());

    collector.scrape().await.unwrap();
    collector.scrape().await.unwrap();

    assert_eq!(cluster.calls(CLUSTER_HEALTH_PATH), 1);
    assert_eq!(cluster.calls(DATA_STREAM_PATH), 2);
}

#[tokio::test]
async fn cluster_name_failure_still_emits_metrics_with_empty_label() {
    let cluster = Arc::new(
        ScriptedCluster::new()
            .fail(CLUSTER_HEALTH_PATH, 401)
            .respond(CLUSTER_HEALTH_PATH, r#"{"cluster_name": "search-prod"}"#)
            .respond(DATA_STREAM_PATH, DATA_STREAMS)
            .respond(&store_stats_path(&latest_names()), &store_stats_body())
            .respond(&cat_indices_path(&latest_names()), CAT_BODY),
    );
    let collector = collector(cluster.clone());

    let first = collector.scrape().await.unwrap();
    assert_eq!(first.cluster_name, "");
    assert_eq!(first.indices.len(), 2);

    let second = collector.scrape().await.unwrap();
    assert_eq!(second.cluster_name, "search-prod");
}

#[tokio::test]
async fn data_stream_failure_aborts_scrape_but_not_the_next_one() {
    let cluster = Arc::new(
        ScriptedCluster::new()
            .respond(CLUSTER_HEALTH_PATH, r#"{"cluster_name": "search-prod"}"#)
            .fail(DATA_STREAM_PATH, 503)
            .respond(DATA_STREAM_PATH, DATA_STREAMS)
            .respond(&store_stats_path(&latest_names()), &store_stats_body())
            .respond(&cat_indices_path(&latest_names()), CAT_BODY),
    );
    let collector = collector(cluster.clone());

    let first = ShardSizeMetrics::new().unwrap();
    assert_eq!(collector.collect(&first).await, 0);
    assert!(first.encode().unwrap().is_empty());
    assert_eq!(cluster.calls(&store_stats_path(&latest_names())), 0);

    let second = ShardSizeMetrics::new().unwrap();
    assert_eq!(collector.collect(&second).await, 2);
    let text = String::from_utf8(second.encode().unwrap()).unwrap();
    assert!(text.contains(SHARD_SIZE_OK));
}

#[tokio::test]
async fn store_stats_failure_aborts_scrape() {
    let cluster = Arc::new(
        ScriptedCluster::new()
            .respond(CLUSTER_HEALTH_PATH, r#"{"cluster_name": "search-prod"}"#)
            .respond(DATA_STREAM_PATH, DATA_STREAMS)
            .fail(&store_stats_path(&latest_names()), 500)
            .respond(&cat_indices_path(&latest_names()), CAT_BODY),
    );

    let err = collector(cluster).scrape().await.unwrap_err();
    assert!(matches!(err, FetchError::Status { status: 500, .. }));
}

#[tokio::test]
async fn shard_count_failure_aborts_scrape() {
    let cluster = Arc::new(
        ScriptedCluster::new()
            .respond(CLUSTER_HEALTH_PATH, r#"{"cluster_name": "search-prod"}"#)
            .respond(DATA_STREAM_PATH, DATA_STREAMS)
            .respond(&store_stats_path(&latest_names()), &store_stats_body())
            .respond(&cat_indices_path(&latest_names()), "not json"),
    );

    let err = collector(cluster).scrape().await.unwrap_err();
    assert!(matches!(err, FetchError::Decode { .. }));
}

#[tokio::test]
async fn malformed_shard_row_only_drops_that_index() {
    let cluster = Arc::new(
        ScriptedCluster::new()
            .respond(CLUSTER_HEALTH_PATH, r#"{"cluster_name": "search-prod"}"#)
            .respond(DATA_STREAM_PATH, DATA_STREAMS)
            .respond(&store_stats_path(&latest_names()), &store_stats_body())
            .respond(
                &cat_indices_path(&latest_names()),
                r#"[
                    {"index": ".ds-logs-app-000003", "pri": "two", "rep": "1"},
                    {"index": ".ds-metrics-host-000001", "pri": "2", "rep": "1"}
                ]"#,
            ),
    );

    let scrape = collector(cluster).scrape().await.unwrap();
    assert_eq!(scrape.indices.len(), 1);
    assert_eq!(scrape.indices[0].index, ".ds-metrics-host-000001");
}

#[tokio::test]
async fn shard_row_of_unexpected_type_only_drops_that_index() {
    let cluster = Arc::new(
        ScriptedCluster::new()
            .respond(CLUSTER_HEALTH_PATH, r#"{"cluster_name": "search-prod"}"#)
            .respond(DATA_STREAM_PATH, DATA_STREAMS)
            .respond(&store_stats_path(&latest_names()), &store_stats_body())
            .respond(
                &cat_indices_path(&latest_names()),
                r#"[
                    {"index": ".ds-logs-app-000003", "pri": true},
                    {"index": ".ds-metrics-host-000001", "pri": "2", "rep": "1"}
                ]"#,
            ),
    );

    let scrape = collector(cluster).scrape().await.unwrap();
    assert_eq!(scrape.indices.len(), 1);
    assert_eq!(scrape.indices[0].index, ".ds-metrics-host-000001");
}

#[tokio::test]
async fn store_entry_without_size_only_drops_that_index() {
    let stats = format!(
        r#"{{"indices": {{
            ".ds-logs-app-000003": {{"primaries": {{"store": {{}}}}}},
            ".ds-metrics-host-000001": {{"primaries": {{"store": {{"size_in_bytes": {}}}}}}}
        }}}}"#,
        45.0 * GIB
    );
    let cluster = Arc::new(
        ScriptedCluster::new()
            .respond(CLUSTER_HEALTH_PATH, r#"{"cluster_name": "search-prod"}"#)
            .respond(DATA_STREAM_PATH, DATA_STREAMS)
            .respond(&store_stats_path(&latest_names()), &stats)
            .respond(&cat_indices_path(&latest_names()), CAT_BODY),
    );

    let scrape = collector(cluster).scrape().await.unwrap();
    assert_eq!(scrape.indices.len(), 1);
    assert_eq!(scrape.indices[0].index, ".ds-metrics-host-000001");
}

#[tokio::test]
async fn no_data_streams_skips_stats_and_shard_calls() {
    let cluster = Arc::new(
        ScriptedCluster::new()
            .respond(CLUSTER_HEALTH_PATH, r#"{"cluster_name": "search-prod"}"#)
            .respond(DATA_STREAM_PATH, r#"{"data_streams": [{"name": "empty", "indices": []}]}"#),
    );

    let scrape = collector(cluster.clone()).scrape().await.unwrap();
    assert!(scrape.indices.is_empty());
    assert_eq!(cluster.total_calls(), 2);
}

#[tokio::test]
async fn concurrent_scrapes_share_one_collector() {
    let cluster = Arc::new(healthy_cluster());
    let collector = Arc::new(collector(cluster.clone()));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let collector = Arc::clone(&collector);
            tokio::spawn(async move { collector.scrape().await })
        })
        .collect();

    for handle in handles {
        let scrape = handle.await.unwrap().unwrap();
        assert_eq!(scrape.cluster_name, "search-prod");
        assert_eq!(scrape.indices.len(), 2);
    }
    assert_eq!(cluster.calls(CLUSTER_HEALTH_PATH), 1);
    assert_eq!(cluster.calls(DATA_STREAM_PATH), 8);
}
