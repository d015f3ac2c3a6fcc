use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use contact_api::{contact_path, ApiError, ContactBackend, HttpBackend, CONTACTS_PATH};
use contact_protocol::{ContactPayload, ProtocolError, TagSet};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
struct Store {
    rows: BTreeMap<u64, Value>,
    next_id: u64,
    failing: bool,
}

type Shared = Arc<Mutex<Store>>;

async fn list(State(store): State<Shared>) -> Result<Json<Value>, StatusCode> {
    let store = store.lock().unwrap();
    if store.failing {
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }
    let mut rows: Vec<Value> = store.rows.values().cloned().collect();
    rows.push(json!({ "full_name": "row without id" }));
    Ok(Json(Value::Array(rows)))
}

async fn create(
    State(store): State<Shared>,
    Json(mut body): Json<Value>,
) -> Result<Json<Value>, StatusCode> {
    let mut store = store.lock().unwrap();
    if store.failing {
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }
    store.next_id += 1;
    let id = store.next_id;
    body["id"] = json!(id);
    store.rows.insert(id, body.clone());
    Ok(Json(body))
}

async fn update(
    State(store): State<Shared>,
    Path(id): Path<u64>,
    Json(mut body): Json<Value>,
) -> Result<Json<Value>, StatusCode> {
    let mut store = store.lock().unwrap();
    if !store.rows.contains_key(&id) {
        return Err(StatusCode::NOT_FOUND);
    }
    body["id"] = json!(id);
    store.rows.insert(id, body.clone());
    Ok(Json(body))
}

async fn remove(State(store): State<Shared>, Path(id): Path<u64>) -> StatusCode {
    match store.lock().unwrap().rows.remove(&id) {
        Some(_) => StatusCode::NO_CONTENT,
        None => StatusCode::NOT_FOUND,
    }
}

/// Answers 200 with a record that has no id.
async fn without_id() -> Json<Value> {
    Json(json!({ "full_name": "x" }))
}

async fn spawn_server() -> (String, Shared) {
    let store: Shared = Arc::default();
    let app = Router::new()
        .route(CONTACTS_PATH, get(list).post(create))
        .route("/api/contacts/:id", put(update).delete(remove))
        .route("/broken/contacts", post(without_id))
        .route("/broken/contacts/:id", put(without_id))
        .with_state(store.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), store)
}

fn payload(name: &str, tags: &str) -> ContactPayload {
    ContactPayload {
        email: format!("{}@example.com", name.to_lowercase()),
        tags: TagSet::parse(tags),
        ..ContactPayload::new(name)
    }
}

#[tokio::test]
async fn create_update_delete_round_trip() {
    let (base, _store) = spawn_server().await;
    let backend = HttpBackend::new(&base, Duration::from_secs(5)).unwrap();

    let ann = backend
        .create_contact(CONTACTS_PATH, &payload("Ann", "work,vip"))
        .await
        .unwrap();
    assert_eq!(ann.id, 1);
    assert_eq!(ann.tags, TagSet::parse("vip,work"));
    assert_eq!(ann.field_text("email"), "ann@example.com");

    let path = contact_path(CONTACTS_PATH, ann.id);
    let renamed = backend
        .update_contact(&path, &payload("Annie", "work"))
        .await
        .unwrap();
    assert_eq!(renamed.full_name, "Annie");
    assert_eq!(renamed.tags, TagSet::parse("work"));

    let listed = backend.fetch_contacts().await.unwrap();
    assert_eq!(listed.len(), 1, "row without id is skipped");
    assert_eq!(listed[0].full_name, "Annie");

    backend.delete_contact(&path).await.unwrap();
    assert!(backend.fetch_contacts().await.unwrap().is_empty());
}

#[tokio::test]
async fn non_success_status_is_reported() {
    let (base, store) = spawn_server().await;
    let backend = HttpBackend::new(&base, Duration::from_secs(5)).unwrap();

    let err = backend
        .delete_contact(&contact_path(CONTACTS_PATH, 42))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "404 (Not Found)");

    store.lock().unwrap().failing = true;
    let err = backend
        .create_contact(CONTACTS_PATH, &payload("Bob", ""))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Status { status: 500, .. }));
    assert!(store.lock().unwrap().rows.is_empty());
}

#[tokio::test]
async fn unreachable_backend_is_a_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let backend = HttpBackend::new(&format!("http://{addr}"), Duration::from_secs(2)).unwrap();
    let err = backend.fetch_contacts().await.unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)));
}

#[tokio::test]
async fn success_without_id_is_a_malformed_record() {
    let (base, store) = spawn_server().await;
    let backend = HttpBackend::new(&base, Duration::from_secs(5)).unwrap();

    let err = backend
        .create_contact("/broken/contacts", &payload("Ann", ""))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ApiError::Protocol(ProtocolError::MalformedRecord(_))
    ));

    let err = backend
        .update_contact(&contact_path("/broken/contacts", 1), &payload("Ann", ""))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ApiError::Protocol(ProtocolError::MalformedRecord(_))
    ));
    assert!(store.lock().unwrap().rows.is_empty());
}
