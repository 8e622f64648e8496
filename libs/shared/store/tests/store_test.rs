use assert_matches::assert_matches;
use serde_json::json;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_store::{DocumentStore, Filter, MemoryStore, RestDocumentStore, StoreError};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn doc(id: Uuid, status: &str, amount: i64) -> serde_json::Value {
    json!({
        "id": id.to_string(),
        "status": status,
        "amount": amount,
    })
}

// ==============================================================================
// MEMORY BACKEND
// ==============================================================================

#[tokio::test]
async fn memory_store_round_trips_documents() {
    let store = MemoryStore::new();
    let id = Uuid::new_v4();

    store.insert("appointments", doc(id, "pending", 5000)).await.unwrap();

    let fetched = store.get("appointments", id).await.unwrap().unwrap();
    assert_eq!(fetched.get("status"), Some(&json!("pending")));

    let updated = store
        .update("appointments", id, json!({ "status": "confirmed" }))
        .await
        .unwrap();
    assert_eq!(updated.get("status"), Some(&json!("confirmed")));
    assert_eq!(updated.get("amount"), Some(&json!(5000)), "merge is shallow");

    assert!(store.delete("appointments", id).await.unwrap());
    assert!(store.get("appointments", id).await.unwrap().is_none());
    assert!(!store.delete("appointments", id).await.unwrap());
}

#[tokio::test]
async fn memory_store_rejects_documents_without_ids() {
    let store = MemoryStore::new();
    assert_matches!(
        store.insert("appointments", json!({ "status": "pending" })).await,
        Err(StoreError::Decode(_))
    );
}

#[tokio::test]
async fn memory_store_filters_with_eq_ne_and_ranges() {
    let store = MemoryStore::new();
    for (status, amount) in [("pending", 100), ("cancelled", 200), ("completed", 300)] {
        store
            .insert("appointments", doc(Uuid::new_v4(), status, amount))
            .await
            .unwrap();
    }

    let pending = store
        .count("appointments", &Filter::new().eq("status", "pending"))
        .await
        .unwrap();
    assert_eq!(pending, 1);

    let open = store
        .count(
            "appointments",
            &Filter::new()
                .ne("status", "cancelled")
                .ne("status", "completed"),
        )
        .await
        .unwrap();
    assert_eq!(open, 1);

    let expensive = store
        .list("appointments", &Filter::new().gte("amount", 200))
        .await
        .unwrap();
    assert_eq!(expensive.len(), 2);

    let cheap = store
        .list("appointments", &Filter::new().lte("amount", 100))
        .await
        .unwrap();
    assert_eq!(cheap.len(), 1);
}

#[tokio::test]
async fn memory_store_string_ranges_compare_lexicographically() {
    // RFC3339 timestamps at second precision order correctly as strings.
    let store = MemoryStore::new();
    for (id, at) in [
        (Uuid::new_v4(), "2025-03-14T09:00:00Z"),
        (Uuid::new_v4(), "2025-03-15T09:00:00Z"),
    ] {
        store
            .insert("events", json!({ "id": id.to_string(), "at": at }))
            .await
            .unwrap();
    }

    let recent = store
        .list("events", &Filter::new().gte("at", "2025-03-15T00:00:00Z"))
        .await
        .unwrap();
    assert_eq!(recent.len(), 1);
}

#[tokio::test]
async fn memory_store_update_many_counts_matches() {
    let store = MemoryStore::new();
    let receiver = Uuid::new_v4();
    for _ in 0..3 {
        store
            .insert(
                "notifications",
                json!({
                    "id": Uuid::new_v4().to_string(),
                    "receiver_id": receiver.to_string(),
                    "is_read": false,
                }),
            )
            .await
            .unwrap();
    }

    let touched = store
        .update_many(
            "notifications",
            &Filter::new().eq("receiver_id", receiver),
            json!({ "is_read": true }),
        )
        .await
        .unwrap();
    assert_eq!(touched, 3);

    let unread = store
        .count("notifications", &Filter::new().eq("is_read", false))
        .await
        .unwrap();
    assert_eq!(unread, 0);
}

// ==============================================================================
// REST BACKEND
// ==============================================================================

fn rest_config(base_url: String) -> AppConfig {
    AppConfig {
        store_url: base_url,
        store_api_key: "test-key".to_string(),
        jwt_secret: String::new(),
        mail_api_url: String::new(),
        mail_api_key: String::new(),
        mail_from_address: String::new(),
        image_store_url: String::new(),
        image_store_api_key: String::new(),
    }
}

#[tokio::test]
async fn rest_store_gets_by_id_with_the_service_key() {
    let server = MockServer::start().await;
    let id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .and(query_param("id", format!("eq.{}", id)))
        .and(header("apikey", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([doc(id, "n/a", 0)])))
        .mount(&server)
        .await;

    let store = RestDocumentStore::new(&rest_config(server.uri()));
    let fetched = store.get("doctors", id).await.unwrap();
    assert!(fetched.is_some());

    let missing = store.get("doctors", Uuid::new_v4()).await;
    // Unmatched request: wiremock answers 404, surfaced as a request error.
    assert_matches!(missing, Err(StoreError::Request(_)));
}

#[tokio::test]
async fn rest_store_lists_with_filter_query() {
    let server = MockServer::start().await;
    let doctor_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("doctor_id", format!("eq.{}", doctor_id)))
        .and(query_param("status", "neq.cancelled"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([doc(Uuid::new_v4(), "pending", 5000)])),
        )
        .mount(&server)
        .await;

    let store = RestDocumentStore::new(&rest_config(server.uri()));
    let rows = store
        .list(
            "appointments",
            &Filter::new()
                .eq("doctor_id", doctor_id)
                .ne("status", "cancelled"),
        )
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
}

#[tokio::test]
async fn rest_store_insert_returns_the_representation() {
    let server = MockServer::start().await;
    let id = Uuid::new_v4();

    Mock::given(method("POST"))
        .and(path("/rest/v1/reviews"))
        .and(header("Prefer", "return=representation"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([doc(id, "n/a", 0)])))
        .mount(&server)
        .await;

    let store = RestDocumentStore::new(&rest_config(server.uri()));
    let created = store.insert("reviews", doc(id, "n/a", 0)).await.unwrap();
    assert_eq!(created.get("id"), Some(&json!(id.to_string())));
}

#[tokio::test]
async fn rest_store_surfaces_server_errors() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let store = RestDocumentStore::new(&rest_config(server.uri()));
    assert_matches!(
        store.list("doctors", &Filter::new()).await,
        Err(StoreError::Request(_))
    );
}
