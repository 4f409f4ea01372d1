use serde::{Deserialize, Serialize};
use serde_json::json;
use skit::models::DatastoreError;
use skit::services::{OpenSearchClient, OpenSearchConfig};
use wiremock::matchers::{basic_auth, body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Project {
    name: String,
    stars: u32,
}

fn client_for(server: &MockServer) -> OpenSearchClient {
    OpenSearchClient::new(OpenSearchConfig {
        urls: vec![server.uri()],
        username: "svc".to_owned(),
        password: "hunter2".to_owned(),
        ..OpenSearchConfig::default()
    })
    .unwrap()
}

fn write_ack(result: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "_index": "projects",
        "_id": "p-1",
        "_version": 1,
        "result": result
    }))
}

#[tokio::test]
async fn create_document_puts_body_under_create_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/projects/_create/p-1"))
        .and(basic_auth("svc", "hunter2"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({ "name": "skit", "stars": 3 })))
        .respond_with(write_ack("created"))
        .expect(1)
        .mount(&server)
        .await;

    let project = Project {
        name: "skit".to_owned(),
        stars: 3,
    };
    let ack = client_for(&server)
        .create_document("projects", "p-1", &project)
        .await
        .unwrap();
    assert_eq!(ack.id, "p-1");
    assert_eq!(ack.result.as_deref(), Some("created"));
}

#[tokio::test]
async fn update_document_wraps_fields_in_doc() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/projects/_update/p-1"))
        .and(body_json(json!({ "doc": { "stars": 4 } })))
        .respond_with(write_ack("updated"))
        .expect(1)
        .mount(&server)
        .await;

    let ack = client_for(&server)
        .update_document("projects", "p-1", &json!({ "stars": 4 }))
        .await
        .unwrap();
    assert_eq!(ack.result.as_deref(), Some("updated"));
}

#[tokio::test]
async fn delete_then_get_reports_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/projects/_doc/p-1"))
        .respond_with(write_ack("deleted"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/projects/_doc/p-1"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "_index": "projects",
            "_id": "p-1",
            "found": false
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.delete_document("projects", "p-1").await.unwrap();

    let err = client
        .get_document::<Project>("projects", "p-1")
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    let message = err.to_string();
    assert!(message.starts_with("[404 Not Found]"), "{}", message);
    assert!(message.contains(r#""found":false"#), "{}", message);
}

#[tokio::test]
async fn get_document_parses_source() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/projects/_doc/p-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "_index": "projects",
            "_id": "p-1",
            "_version": 2,
            "_seq_no": 5,
            "_primary_term": 1,
            "found": true,
            "_source": { "name": "skit", "stars": 4 }
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let doc = client
        .get_document::<Project>("projects", "p-1")
        .await
        .unwrap();
    assert!(doc.found);
    assert_eq!(doc.version, Some(2));
    assert_eq!(doc.source.unwrap().stars, 4);

    let raw = client.get_document_raw("projects", "p-1").await.unwrap();
    let value: serde_json::Value = serde_json::from_slice(&raw).unwrap();
    assert_eq!(value["_source"]["name"], "skit");
}

#[tokio::test]
async fn index_lifecycle_requests() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/projects"))
        .and(body_json(json!({
            "settings": { "index": { "number_of_shards": 1, "number_of_replicas": 0 } }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "acknowledged": true,
            "shards_acknowledged": true,
            "index": "projects"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/projects"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "acknowledged": true })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.create_index_with_defaults("projects").await.unwrap();
    client.delete_index("projects").await.unwrap();
}

#[tokio::test]
async fn existing_index_is_a_status_error() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/projects"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_string(r#"{"error":{"type":"resource_already_exists_exception"}}"#),
        )
        .mount(&server)
        .await;

    let err = client_for(&server)
        .create_index_with_settings("projects", &json!({}))
        .await
        .unwrap_err();
    match err {
        DatastoreError::Status { status, body } => {
            assert_eq!(status.as_u16(), 400);
            assert!(body.contains("resource_already_exists_exception"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn search_uses_query_string_and_parses_hits() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/projects/_search"))
        .and(query_param("q", "name:skit"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "took": 3,
            "timed_out": false,
            "_shards": { "total": 1, "successful": 1, "skipped": 0, "failed": 0 },
            "hits": {
                "total": { "value": 1, "relation": "eq" },
                "max_score": 0.2876821,
                "hits": [{
                    "_index": "projects",
                    "_id": "p-1",
                    "_score": 0.2876821,
                    "_source": { "name": "skit", "stars": 4 }
                }]
            }
        })))
        .mount(&server)
        .await;

    let result = client_for(&server)
        .search::<Project>("projects", "name:skit")
        .await
        .unwrap();
    assert!(!result.timed_out);
    assert_eq!(result.hits.total.as_ref().unwrap().value, 1);
    assert_eq!(result.hits.hits[0].id, "p-1");
    assert_eq!(
        result.sources().cloned().collect::<Vec<_>>(),
        vec![Project {
            name: "skit".to_owned(),
            stars: 4
        }]
    );
}

#[tokio::test]
async fn retries_on_unavailable_then_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/projects"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/projects"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "acknowledged": true })))
        .expect(1)
        .mount(&server)
        .await;

    client_for(&server).delete_index("projects").await.unwrap();
}

#[tokio::test]
async fn gives_up_after_max_retries() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/projects"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .expect(3)
        .mount(&server)
        .await;

    let client = OpenSearchClient::new(OpenSearchConfig {
        urls: vec![server.uri()],
        max_retries: 2,
        ..OpenSearchConfig::default()
    })
    .unwrap();

    let err = client.delete_index("projects").await.unwrap_err();
    assert_eq!(err.status().map(|s| s.as_u16()), Some(502));
    assert_eq!(err.to_string(), "[502 Bad Gateway] bad gateway");
}

#[tokio::test]
async fn other_errors_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/projects"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let err = client_for(&server).delete_index("projects").await.unwrap_err();
    assert_eq!(err.status().map(|s| s.as_u16()), Some(500));
}

#[tokio::test]
async fn unreachable_node_fails_over_to_the_next() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/projects"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "acknowledged": true })))
        .expect(1)
        .mount(&server)
        .await;

    let client = OpenSearchClient::new(OpenSearchConfig {
        urls: vec!["http://127.0.0.1:1".to_owned(), server.uri()],
        ..OpenSearchConfig::default()
    })
    .unwrap();

    client.delete_index("projects").await.unwrap();
}
