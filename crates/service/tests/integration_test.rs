//! Integration tests for Ontograph
//!
//! These run the store, query pipeline, and debouncer together. The remote
//! index is always a local mock server.

mod common;

use common::{alice_and_bob, create_test_store, fill, CountingTrigger};
use ontograph_core::{QueryResponse, SearchParams, Seed};
use ontograph_service::{IngestService, RebuildDebouncer, RemoteIndex, SearchService};
use ontograph_store::{DirStore, MemoryStore, NewDocument, WritableStore};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// The Alice/Bob walkthrough against documents on disk
#[tokio::test]
async fn test_alice_and_bob_from_disk() {
    let dir = TempDir::new().unwrap();
    let store = DirStore::open(dir.path()).unwrap();
    fill(&store, alice_and_bob());
    let service = SearchService::new(Arc::new(store));

    let graph = service.graph().unwrap();
    let ids: Vec<&str> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b"]);
    assert_eq!(graph.relations.len(), 1);

    let response = service.search(&SearchParams::new("Bob")).await.unwrap();
    let QueryResponse::Search(result) = response else {
        panic!("expected a search response");
    };
    assert_eq!(result.matches.len(), 1);
    assert_eq!(result.matches[0].document_id, 2);
    assert_eq!(result.matches[0].matched_node_ids, vec!["b".to_string()]);
    assert_eq!(result.traversal.seeds, vec![Seed::Node("b".into())]);

    let highlighted: Vec<(&str, bool)> = result
        .nodes
        .iter()
        .map(|n| (n.node.id.as_str(), n.highlighted))
        .collect();
    assert_eq!(highlighted.len(), 2);
    assert!(highlighted.contains(&("a", false)));
    assert!(highlighted.contains(&("b", true)));
    assert_eq!(result.relations[0].relation, "knows");
}

#[tokio::test]
async fn test_query_string_parameters() {
    let service = SearchService::new(create_test_store());

    let params = SearchParams::from_query_pairs([("q", "Alice"), ("k", "many"), ("hops", "0")]);
    assert_eq!(params.k, 5);
    assert_eq!(params.hops, 0);

    let QueryResponse::Search(result) = service.search(&params).await.unwrap() else {
        panic!("expected a search response");
    };
    // Both documents mention Alice; with zero hops only the seed is reached
    assert_eq!(result.matches.len(), 2);
    assert_eq!(result.nodes.len(), 1);
    assert!(result.nodes[0].highlighted);
    assert_eq!(result.relations.len(), 1);

    let empty = SearchParams::from_query_pairs([("q", "   ")]);
    assert!(matches!(
        service.search(&empty).await.unwrap(),
        QueryResponse::Graph(_)
    ));
}

#[tokio::test]
async fn test_response_json_shape() {
    let service = SearchService::new(create_test_store());
    let response = service.search(&SearchParams::new("Bob")).await.unwrap();
    let body = serde_json::to_value(&response).unwrap();

    assert!(body["nodes"].is_array());
    assert!(body["relations"].is_array());
    assert_eq!(body["traversal"], json!({"seeds": ["b"], "hops": 1}));

    let hit = &body["matches"][0];
    assert_eq!(hit["id"], 2);
    assert_eq!(hit["matchedIds"], json!(["b"]));
    assert_eq!(hit["snippet"]["nodes"][0]["label"], "Bob");
    assert!(hit["score"].as_f64().unwrap() > 0.0);
}

#[test]
fn test_assembly_is_stable_across_snapshots() {
    let service = SearchService::new(create_test_store());
    assert_eq!(service.graph().unwrap(), service.graph().unwrap());
}

#[tokio::test(start_paused = true)]
async fn test_store_writes_coalesce_into_one_rebuild() {
    let trigger = Arc::new(CountingTrigger::default());
    let debouncer = RebuildDebouncer::new(trigger.clone(), Duration::from_secs(3)).unwrap();

    let mut store = MemoryStore::new();
    store.set_listener(Arc::new(debouncer.clone()));
    fill(&store, alice_and_bob());
    fill(&store, alice_and_bob());
    store.delete(1).unwrap();

    debouncer.wait_idle().await;
    assert_eq!(trigger.calls(), 1);

    store.create(NewDocument::new(json!({"nodes": ["Carol"]}))).unwrap();
    debouncer.wait_idle().await;
    assert_eq!(trigger.calls(), 2);
}

/// Upload, remote ingest, then one debounced remote build
#[tokio::test]
async fn test_ingest_flow_against_remote_index() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ready": true})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/ingest"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ingested": 1})))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/build"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"built": true})))
        .expect(1)
        .mount(&server)
        .await;

    let remote = Arc::new(RemoteIndex::new(vec![server.uri()]));
    let debouncer = RebuildDebouncer::new(remote.clone(), Duration::from_millis(500)).unwrap();
    let mut store = MemoryStore::new();
    store.set_listener(Arc::new(debouncer.clone()));
    let ingest = IngestService::new(Arc::new(store)).with_remote(remote);

    for ontology in alice_and_bob() {
        let report = ingest.ingest(NewDocument::new(ontology)).await.unwrap();
        assert_eq!(report.remote.ingest, Some(json!({"ingested": 1})));
    }

    debouncer.wait_idle().await;
    assert_eq!(debouncer.completed(), 1);
}
