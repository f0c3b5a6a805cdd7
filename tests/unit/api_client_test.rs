//! HTTP-level tests for the API client's history endpoints, against a mock server.

use rstest::rstest;
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use skillforge::api::{ApiClient, HistoryApi};
use skillforge::types::errors::ApiError;
use skillforge::types::history::RouteType;

async fn setup() -> (MockServer, ApiClient) {
    let server = MockServer::start().await;
    let client = ApiClient::with_base_url(format!("{}/api", server.uri()));
    (server, client)
}

#[tokio::test]
async fn test_fetch_page_sends_limit_offset_and_token() {
    let (server, client) = setup().await;
    client.set_bearer_token(Some("tok-123".to_string()));

    Mock::given(method("GET"))
        .and(path("/api/user/history"))
        .and(query_param("limit", "3"))
        .and(query_param("offset", "6"))
        .and(header("authorization", "Bearer tok-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": [
                {
                    "id": "65f1c2",
                    "routeType": "summarizer",
                    "inputData": "report.pdf",
                    "outputData": "Short summary",
                    "metadata": {"tone": "neutral", "contentLength": 5120},
                    "createdAt": "2024-05-01T10:00:00Z"
                },
                {
                    "id": 42,
                    "routeType": "code-quiz",
                    "inputData": "rust",
                    "outputData": "{}",
                    "createdAt": 1714557600000i64
                }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let entries = client.fetch_page(3, 6).await.unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].route_type, RouteType::Summarizer);
    assert_eq!(entries[0].metadata["contentLength"].to_string(), "5120");
    assert_eq!(entries[1].id, "42");
    assert!(entries[1].metadata.is_empty());
}

#[tokio::test]
async fn test_fetch_page_success_false_is_server_error() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/user/history"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "error": "Failed to fetch history"
        })))
        .mount(&server)
        .await;

    let err = client.fetch_page(3, 0).await.unwrap_err();
    assert_eq!(
        err,
        ApiError::Server {
            status: 200,
            message: "Failed to fetch history".to_string()
        }
    );
}

#[tokio::test]
async fn test_fetch_page_unauthorized() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/user/history"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": "Invalid token"})))
        .mount(&server)
        .await;

    assert_eq!(client.fetch_page(3, 0).await.unwrap_err(), ApiError::Unauthorized);
}

#[tokio::test]
async fn test_fetch_page_malformed_body_is_decode_error() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/user/history"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    assert!(matches!(client.fetch_page(3, 0).await, Err(ApiError::Decode(_))));
}

#[tokio::test]
async fn test_server_failure_carries_message() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/user/history"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"message": "database down"})))
        .mount(&server)
        .await;

    assert_eq!(
        client.fetch_page(3, 0).await.unwrap_err(),
        ApiError::Server {
            status: 500,
            message: "database down".to_string()
        }
    );
}

#[tokio::test]
async fn test_unreachable_server_is_network_error() {
    let client = ApiClient::with_base_url("http://127.0.0.1:9/api");
    assert!(matches!(client.fetch_page(3, 0).await, Err(ApiError::Network(_))));
}

#[tokio::test]
async fn test_delete_one_hits_item_path() {
    let (server, client) = setup().await;
    Mock::given(method("DELETE"))
        .and(path("/api/user/history/65f1c2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;

    client.delete_one("65f1c2").await.unwrap();
}

#[tokio::test]
async fn test_delete_one_missing_is_not_found() {
    let (server, client) = setup().await;
    Mock::given(method("DELETE"))
        .and(path("/api/user/history/nope"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"error": "History item not found"})),
        )
        .mount(&server)
        .await;

    assert_eq!(
        client.delete_one("nope").await.unwrap_err(),
        ApiError::NotFound("History item not found".to_string())
    );
}

#[tokio::test]
async fn test_clear_all_accepts_empty_body() {
    let (server, client) = setup().await;
    Mock::given(method("DELETE"))
        .and(path("/api/user/history"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client.clear_all().await.unwrap();
}

#[rstest]
#[case::slash("a/b", "/api/user/history/a%2Fb")]
#[case::query("x?y=1", "/api/user/history/x%3Fy=1")]
#[case::percent("%2e", "/api/user/history/%252e")]
#[case::hash("a#b", "/api/user/history/a%23b")]
#[tokio::test]
async fn test_delete_one_encodes_id_as_single_segment(#[case] id: &str, #[case] expected: &str) {
    let (server, client) = setup().await;
    Mock::given(method("DELETE"))
        .and(path(expected))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;

    client.delete_one(id).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].url.path(), expected);
    assert_eq!(requests[0].url.query(), None);
}

#[rstest]
#[case::current(".")]
#[case::parent("..")]
#[case::empty("")]
#[tokio::test]
async fn test_delete_one_refuses_dot_segment_ids(#[case] id: &str) {
    let (server, client) = setup().await;

    assert!(matches!(client.delete_one(id).await, Err(ApiError::NotFound(_))));
    // Nothing reaches the server, least of all the clear-all route.
    assert!(server.received_requests().await.unwrap().is_empty());
}
