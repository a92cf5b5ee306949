//! HTTP client for the optional remote semantic index
//!
//! Every call is best-effort: failures are logged and turned into empty
//! results so that callers never fail because the index is down. The `try_*`
//! variants expose the underlying error for callers that want to report it.

use crate::config::RemoteConfig;
use crate::{Result, ServiceError};
use ontograph_core::DocumentId;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

const PROBE_TIMEOUT: Duration = Duration::from_secs(2);
const QUERY_TIMEOUT: Duration = Duration::from_secs(5);
const STATUS_TIMEOUT: Duration = Duration::from_secs(3);
const INGEST_TIMEOUT: Duration = Duration::from_secs(10);
const BUILD_TIMEOUT: Duration = Duration::from_secs(60);

/// A ranked document as returned by `/query`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexHit {
    pub id: DocumentId,
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub ontology: Value,
}

/// One document pushed to `/ingest`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestItem<'a> {
    pub id: DocumentId,
    pub ontology: &'a Value,
}

/// Client for the remote index service.
///
/// The base URL is discovered lazily by probing the configured candidates and
/// cached until [`RemoteIndex::reset`] is called.
pub struct RemoteIndex {
    client: Client,
    candidates: Vec<String>,
    resolved: Mutex<Option<String>>,
}

impl RemoteIndex {
    /// Create a client that probes `candidates` in order
    pub fn new(candidates: Vec<String>) -> Self {
        Self {
            client: Client::new(),
            candidates: candidates
                .into_iter()
                .map(|c| c.trim_end_matches('/').to_string())
                .collect(),
            resolved: Mutex::new(None),
        }
    }

    pub fn from_config(config: &RemoteConfig) -> Self {
        Self::new(config.candidates())
    }

    /// Whether any candidate is configured at all
    pub fn is_configured(&self) -> bool {
        !self.candidates.is_empty()
    }

    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    /// Forget the cached base URL; the next call probes again
    pub fn reset(&self) {
        if let Ok(mut resolved) = self.resolved.lock() {
            *resolved = None;
        }
    }

    /// The cached base URL, if one has been resolved
    pub fn resolved_base(&self) -> Option<String> {
        self.resolved.lock().ok().and_then(|r| r.clone())
    }

    /// Resolve a working base URL: the first candidate answering `GET /status`
    /// or `POST /query` with a success status.
    #[instrument(skip(self))]
    pub async fn base_url(&self) -> Option<String> {
        if let Some(base) = self.resolved_base() {
            return Some(base);
        }

        for base in &self.candidates {
            if self.probe(base).await {
                info!("Using remote index at {}", base);
                if let Ok(mut resolved) = self.resolved.lock() {
                    *resolved = Some(base.clone());
                }
                return Some(base.clone());
            }
            debug!("Remote index candidate {} did not answer", base);
        }
        None
    }

    async fn probe(&self, base: &str) -> bool {
        let status = self
            .client
            .get(url(base, "/status"))
            .timeout(PROBE_TIMEOUT)
            .send()
            .await;
        if matches!(status, Ok(ref r) if r.status().is_success()) {
            return true;
        }

        let query = self
            .client
            .post(url(base, "/query"))
            .json(&json!({"q": "__ping__", "k": 1}))
            .timeout(PROBE_TIMEOUT)
            .send()
            .await;
        matches!(query, Ok(ref r) if r.status().is_success())
    }

    async fn resolve(&self) -> Result<String> {
        self.base_url().await.ok_or(ServiceError::RemoteUnavailable)
    }

    async fn send_json(&self, request: RequestBuilder) -> Result<Value> {
        let body = request
            .send()
            .await?
            .error_for_status()?
            .json::<Value>()
            .await?;
        Ok(body)
    }

    /// Rank documents remotely
    #[instrument(skip(self))]
    pub async fn try_query(&self, text: &str, k: usize) -> Result<Vec<IndexHit>> {
        let base = self.resolve().await?;
        let request = self
            .client
            .post(url(&base, "/query"))
            .json(&json!({"q": text, "k": k}))
            .timeout(QUERY_TIMEOUT);
        let body = self.send_json(request).await?;
        if body.is_null() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_value(body).map_err(|e| {
            debug!("Malformed /query response: {}", e);
            ServiceError::RemoteUnavailable
        })?)
    }

    /// Rank documents remotely; empty on any failure
    pub async fn query(&self, text: &str, k: usize) -> Vec<IndexHit> {
        self.try_query(text, k).await.unwrap_or_else(|e| {
            debug!("Remote query failed: {}", e);
            Vec::new()
        })
    }

    /// Remote status payload; `{}` on any failure
    #[instrument(skip(self))]
    pub async fn status(&self) -> Value {
        let result = async {
            let base = self.resolve().await?;
            let request = self.client.get(url(&base, "/status")).timeout(STATUS_TIMEOUT);
            self.send_json(request).await
        }
        .await;
        or_empty("status", result)
    }

    /// Push documents to `/ingest`
    #[instrument(skip(self, items), fields(count = items.len()))]
    pub async fn try_ingest(&self, items: &[IngestItem<'_>]) -> Result<Value> {
        let base = self.resolve().await?;
        let request = self
            .client
            .post(url(&base, "/ingest"))
            .json(items)
            .timeout(INGEST_TIMEOUT);
        self.send_json(request).await
    }

    /// Push documents to `/ingest`; `{}` on any failure
    pub async fn ingest(&self, items: &[IngestItem<'_>]) -> Value {
        or_empty("ingest", self.try_ingest(items).await)
    }

    /// Ask the service to rebuild its index
    #[instrument(skip(self))]
    pub async fn try_build(&self) -> Result<Value> {
        let base = self.resolve().await?;
        let request = self.client.post(url(&base, "/build")).timeout(BUILD_TIMEOUT);
        self.send_json(request).await
    }

    /// Ask the service to rebuild its index; `{}` on any failure
    pub async fn build(&self) -> Value {
        or_empty("build", self.try_build().await)
    }
}

fn url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

fn or_empty(call: &str, result: Result<Value>) -> Value {
    match result {
        Ok(Value::Null) => json!({}),
        Ok(body) => body,
        Err(ServiceError::RemoteUnavailable) => json!({}),
        Err(e) => {
            warn!("Remote {} failed: {}", call, e);
            json!({})
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_url_joining() {
        assert_eq!(url("http://x/", "/query"), "http://x/query");
        assert_eq!(url("http://x", "status"), "http://x/status");
    }

    #[test]
    fn test_client_creation() {
        let client = RemoteIndex::new(vec!["http://localhost:7860/".into()]);
        assert_eq!(client.candidates(), &["http://localhost:7860".to_string()]);
        assert!(client.is_configured());
        assert!(client.resolved_base().is_none());
        assert!(!RemoteIndex::new(Vec::new()).is_configured());
    }

    #[tokio::test]
    async fn test_unconfigured_client_is_a_no_op() {
        let client = RemoteIndex::new(Vec::new());
        assert!(client.query("anything", 5).await.is_empty());
        assert_eq!(client.status().await, json!({}));
        assert_eq!(client.build().await, json!({}));
        assert!(matches!(
            client.try_build().await,
            Err(ServiceError::RemoteUnavailable)
        ));
    }

    #[tokio::test]
    async fn test_resolves_first_live_candidate_and_caches_it() {
        let dead = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/status"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&dead)
            .await;

        let live = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/status"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"docs": 3})))
            .mount(&live)
            .await;

        let client = RemoteIndex::new(vec![dead.uri(), live.uri()]);
        assert_eq!(client.base_url().await, Some(live.uri()));
        assert_eq!(client.resolved_base(), Some(live.uri()));
        assert_eq!(client.status().await, json!({"docs": 3}));

        client.reset();
        assert!(client.resolved_base().is_none());
    }

    #[tokio::test]
    async fn test_query_endpoint_probe_and_results() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/query"))
            .and(body_json(json!({"q": "__ping__", "k": 1})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/query"))
            .and(body_json(json!({"q": "bob", "k": 2})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 2, "score": 0.9, "ontology": {"nodes": ["Bob"]}},
                {"id": 1, "score": 0.1}
            ])))
            .mount(&server)
            .await;

        let client = RemoteIndex::new(vec![server.uri()]);
        let hits = client.query("bob", 2).await;
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id, 2);
        assert_eq!(hits[0].ontology, json!({"nodes": ["Bob"]}));
        assert_eq!(hits[1].ontology, Value::Null);
    }

    #[tokio::test]
    async fn test_failures_degrade_to_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/status"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/query"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/build"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = RemoteIndex::new(vec![server.uri()]);
        assert!(client.query("bob", 5).await.is_empty());
        assert_eq!(client.build().await, json!({}));
        assert!(client.try_build().await.is_err());
    }

    #[tokio::test]
    async fn test_ingest_posts_documents() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/status"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;
        let ontology = json!({"nodes": ["a"]});
        Mock::given(method("POST"))
            .and(path("/ingest"))
            .and(body_json(json!([{"id": 4, "ontology": {"nodes": ["a"]}}])))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ingested": 1})))
            .expect(1)
            .mount(&server)
            .await;

        let client = RemoteIndex::new(vec![server.uri()]);
        let ack = client
            .ingest(&[IngestItem {
                id: 4,
                ontology: &ontology,
            }])
            .await;
        assert_eq!(ack, json!({"ingested": 1}));
    }
}
