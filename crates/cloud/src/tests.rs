use chrono::{DateTime, Utc};
use serde_json::json;
use shirt_tracker_core::photo::ImageBlob;
use shirt_tracker_core::{CloudPayload, ModeSnapshot, Tab};
use wiremock::matchers::{body_partial_json, header, headers, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::{CloudConfig, CloudError, SupabaseClient};

const SHARE_TOKEN: &str = "0f8fad5b-d9cb-469f-a165-70867728950e";

fn client_for(server: &MockServer, signed_in: bool) -> SupabaseClient {
    let mut config = CloudConfig::new(server.uri(), "anon-key");
    if signed_in {
        config = config.with_session("user-1", "user-jwt");
    }
    SupabaseClient::new(config).unwrap()
}

fn state_row() -> serde_json::Value {
    json!([{
        "user_id": "user-1",
        "updated_at": "2024-05-01T12:00:00+00:00",
        "data": {
            "tabs": [{"id": "t1", "name": "Shirts"}],
            "activeTabId": "t1",
            "publicShareId": SHARE_TOKEN,
            "version": "2.0.5"
        }
    }])
}

#[tokio::test]
async fn test_upsert_sends_merge_headers_and_row() {
    let server = MockServer::start().await;
    let client = client_for(&server, true);

    Mock::given(method("POST"))
        .and(path("/rest/v1/shirt_state"))
        .and(query_param("on_conflict", "user_id"))
        .and(header("apikey", "anon-key"))
        .and(header("Authorization", "Bearer user-jwt"))
        .and(headers("Prefer", vec!["resolution=merge-duplicates", "return=minimal"]))
        .and(body_partial_json(json!([{"user_id": "user-1", "data": {"activeTabId": "t1"}}])))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let tab = Tab { id: "t1".into(), name: "Shirts".into() };
    let payload = CloudPayload::new(ModeSnapshot {
        tabs: vec![tab],
        active_tab_id: Some("t1".into()),
        ..ModeSnapshot::default()
    });
    client.upsert_state("user-1", &payload, Utc::now()).await.unwrap();
}

#[tokio::test]
async fn test_fetch_state_parses_row() {
    let server = MockServer::start().await;
    let client = client_for(&server, true);

    Mock::given(method("GET"))
        .and(path("/rest/v1/shirt_state"))
        .and(query_param("select", "data,updated_at,user_id"))
        .and(query_param("user_id", "eq.user-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(state_row()))
        .mount(&server)
        .await;

    let row = client.fetch_state("user-1").await.unwrap().unwrap();
    assert_eq!(row.user_id, "user-1");
    assert_eq!(row.data.inventory.tabs.len(), 1);
    assert_eq!(row.updated_at, "2024-05-01T12:00:00Z".parse::<DateTime<Utc>>().unwrap());
}

#[tokio::test]
async fn test_fetch_state_empty_is_none() {
    let server = MockServer::start().await;
    let client = client_for(&server, true);

    Mock::given(method("GET"))
        .and(path("/rest/v1/shirt_state"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    assert!(client.fetch_state("user-1").await.unwrap().is_none());
    assert!(client.fetch_updated_at("user-1").await.unwrap().is_none());
}

#[tokio::test]
async fn test_fetch_shared_filters_by_token_without_session() {
    let server = MockServer::start().await;
    let client = client_for(&server, false);

    Mock::given(method("GET"))
        .and(path("/rest/v1/shirt_state"))
        .and(query_param("data->>publicShareId", format!("eq.{SHARE_TOKEN}").as_str()))
        .and(query_param("order", "updated_at.desc"))
        .and(query_param("limit", "1"))
        .and(header("Authorization", "Bearer anon-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(state_row()))
        .mount(&server)
        .await;

    let row = client.fetch_shared(SHARE_TOKEN).await.unwrap().unwrap();
    assert_eq!(row.data.public_share_id.as_deref(), Some(SHARE_TOKEN));
}

#[tokio::test]
async fn test_invalid_share_token_never_hits_network() {
    let server = MockServer::start().await;
    let client = client_for(&server, false);

    Mock::given(method("GET")).respond_with(ResponseTemplate::new(200)).expect(0).mount(&server).await;

    let err = client.fetch_shared("not-a-token").await.unwrap_err();
    assert!(matches!(err, CloudError::InvalidShareToken(_)));
}

#[tokio::test]
async fn test_upload_object_upserts() {
    let server = MockServer::start().await;
    let client = client_for(&server, true);

    Mock::given(method("POST"))
        .and(path("/storage/v1/object/shirt-photos/user-1/p1.jpg"))
        .and(header("x-upsert", "true"))
        .and(header("Content-Type", "image/jpeg"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Key": "shirt-photos/user-1/p1.jpg"})))
        .expect(1)
        .mount(&server)
        .await;

    let blob = ImageBlob { content_type: "image/jpeg".into(), bytes: vec![0xFF, 0xD8] };
    client.upload_object("user-1/p1.jpg", &blob).await.unwrap();
}

#[tokio::test]
async fn test_photo_url_signed_when_signed_in() {
    let server = MockServer::start().await;
    let client = client_for(&server, true);

    Mock::given(method("POST"))
        .and(path("/storage/v1/object/sign/shirt-photos/user-1/p1.jpg"))
        .and(body_partial_json(json!({"expiresIn": 3600})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "signedURL": "/object/sign/shirt-photos/user-1/p1.jpg?token=abc"
        })))
        .mount(&server)
        .await;

    let url = client.photo_url("user-1/p1.jpg").await.unwrap();
    assert_eq!(url, format!("{}/storage/v1/object/sign/shirt-photos/user-1/p1.jpg?token=abc", server.uri()));
}

#[tokio::test]
async fn test_photo_url_public_for_viewers() {
    let server = MockServer::start().await;
    let client = client_for(&server, false);
    let url = client.photo_url("user-1/p1.jpg").await.unwrap();
    assert_eq!(url, format!("{}/storage/v1/object/public/shirt-photos/user-1/p1.jpg", server.uri()));
}

#[tokio::test]
async fn test_retry_on_503_then_success() {
    let server = MockServer::start().await;
    let client = client_for(&server, true);

    Mock::given(method("GET"))
        .and(path("/rest/v1/shirt_state"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"updated_at": "2024-05-01T12:00:00Z"}])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/shirt_state"))
        .respond_with(ResponseTemplate::new(503).set_body_string("Service Unavailable"))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    let at = client.fetch_updated_at("user-1").await.unwrap();
    assert!(at.is_some());
}

#[tokio::test]
async fn test_no_retry_on_401() {
    let server = MockServer::start().await;
    let client = client_for(&server, true);

    Mock::given(method("GET"))
        .and(path("/rest/v1/shirt_state"))
        .respond_with(ResponseTemplate::new(401).set_body_string("JWT expired"))
        .expect(1)
        .mount(&server)
        .await;

    let err = client.fetch_state("user-1").await.unwrap_err();
    assert!(!err.is_transient());
    assert!(err.to_string().contains("401"));
}

#[tokio::test]
async fn test_all_retries_exhausted() {
    let server = MockServer::start().await;
    let client = client_for(&server, true);

    Mock::given(method("GET"))
        .and(path("/rest/v1/shirt_state"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .expect(4)
        .mount(&server)
        .await;

    let err = client.fetch_state("user-1").await.unwrap_err();
    assert!(matches!(err, CloudError::RetriesExhausted(_)));
}

#[tokio::test]
async fn test_backup_state_table_with_service_role() {
    let server = MockServer::start().await;
    let mut config = CloudConfig::new(server.uri(), "anon-key");
    config.service_role_key = Some("service-key".into());
    let client = SupabaseClient::new(config.service_role().unwrap()).unwrap();

    Mock::given(method("POST"))
        .and(path("/storage/v1/bucket"))
        .and(header("Authorization", "Bearer service-key"))
        .and(body_partial_json(json!({"name": "shirt-tracker-backups", "public": false})))
        .respond_with(ResponseTemplate::new(409).set_body_string("Duplicate"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/shirt_state"))
        .and(query_param("select", "*"))
        .and(header("apikey", "service-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"user_id": "user-1", "data": {}},
            {"user_id": "user-2", "data": {}}
        ])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/storage/v1/object/shirt-tracker-backups/backups/2024-05-01T01-00-00-000Z.json"))
        .and(query_param("upsert", "true"))
        .and(body_partial_json(json!({"generatedAt": "2024-05-01T01:00:00.000Z", "rowCount": 2})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let now = "2024-05-01T01:00:00Z".parse::<DateTime<Utc>>().unwrap();
    let (object_path, rows) = client.backup_state_table(now).await.unwrap();
    assert_eq!(object_path, "backups/2024-05-01T01-00-00-000Z.json");
    assert_eq!(rows, 2);
}

#[tokio::test]
async fn test_backup_stops_when_bucket_creation_fails() {
    let server = MockServer::start().await;
    let client = client_for(&server, false);

    Mock::given(method("POST"))
        .and(path("/storage/v1/bucket"))
        .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
        .mount(&server)
        .await;

    let err = client.backup_state_table(Utc::now()).await.unwrap_err();
    assert!(matches!(err, CloudError::HttpStatus { code: 403, .. }));
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
}
