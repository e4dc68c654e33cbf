//! HTTP contract tests for `RestRemoteStore` against a mock server.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use serde_json::json;
use std::time::Duration;
use studylog_core::remote_store::{NewRecord, RecordId, RemoteStore, RemoteStoreError, SortOrder};
use studylog_rest::RestRemoteStore;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TABLE_PATH: &str = "/rest/v1/study_record";

fn store_for(server: &MockServer) -> RestRemoteStore {
    RestRemoteStore::new(server.uri().parse().unwrap(), "anon-key")
}

#[tokio::test]
async fn list_requests_descending_order_with_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(TABLE_PATH))
        .and(query_param("select", "*"))
        .and(query_param("order", "id.desc"))
        .and(header("apikey", "anon-key"))
        .and(header("authorization", "Bearer anon-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 2, "title": "History", "time": 1.5, "created_at": "2025-01-01T10:00:00+00:00"},
            {"id": 1, "title": "Algebra", "time": 2}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let records = store_for(&server).list(SortOrder::Descending).await.unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].id, RecordId::new(2));
    assert!(records[0].created_at.is_some());
    assert_eq!(records[1].title, "Algebra");
    assert!((records[1].time - 2.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn list_ascending_uses_asc_order() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(TABLE_PATH))
        .and(query_param("order", "id.asc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let records = store_for(&server).list(SortOrder::Ascending).await.unwrap();
    assert!(records.is_empty());
}

#[tokio::test]
async fn insert_posts_single_row_and_returns_representation() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TABLE_PATH))
        .and(header("prefer", "return=representation"))
        .and(body_json(json!([{"title": "Algebra", "time": 2.0}])))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!([{"id": 7, "title": "Algebra", "time": 2.0}])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let created = store_for(&server)
        .insert(NewRecord::new("Algebra", 2.0))
        .await
        .unwrap();

    assert_eq!(created.id, RecordId::new(7));
    assert_eq!(created.title, "Algebra");
}

#[tokio::test]
async fn insert_without_returned_rows_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TABLE_PATH))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([])))
        .mount(&server)
        .await;

    let error = store_for(&server)
        .insert(NewRecord::new("Algebra", 2.0))
        .await
        .unwrap_err();

    assert!(matches!(error, RemoteStoreError::Decode(_)));
}

#[tokio::test]
async fn delete_filters_by_id() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path(TABLE_PATH))
        .and(query_param("id", "eq.42"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    store_for(&server)
        .delete_by_id(RecordId::new(42))
        .await
        .unwrap();
}

#[tokio::test]
async fn error_status_surfaces_message_verbatim() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(TABLE_PATH))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({"message": "Invalid API key", "hint": null})),
        )
        .mount(&server)
        .await;

    let error = store_for(&server)
        .list(SortOrder::Descending)
        .await
        .unwrap_err();

    assert_eq!(
        error,
        RemoteStoreError::Api {
            status: 401,
            message: "Invalid API key".to_string()
        }
    );
    assert_eq!(error.to_string(), "Invalid API key");
}

#[tokio::test]
async fn slow_responses_time_out_as_network_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(TABLE_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([]))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let error = store_for(&server)
        .with_timeout(Duration::from_millis(50))
        .list(SortOrder::Descending)
        .await
        .unwrap_err();

    assert!(matches!(error, RemoteStoreError::Network(_)));
}

#[tokio::test]
async fn malformed_body_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(TABLE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let error = store_for(&server)
        .list(SortOrder::Descending)
        .await
        .unwrap_err();

    assert!(matches!(error, RemoteStoreError::Decode(_)));
}
