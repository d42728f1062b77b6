//! HTTP tests for the /files endpoints

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use blob_store_server::config::StorageProvider;
use blob_store_server::hasher::Hasher;
use blob_store_server::routes::files::{MessageResponse, UploadResponse};
use blob_store_server::storage::{BlobBackend, MemoryBackend};
use blob_store_server::{app, AppState, Config, ContentStore};

const HELLO_SHA1: &str = "aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d";
const EMPTY_SHA1: &str = "da39a3ee5e6b4b0d3255bfef95601890afd80709";

fn memory_app(max_upload_bytes: usize) -> (Router, Arc<MemoryBackend>) {
    let backend = Arc::new(MemoryBackend::new());
    let store = ContentStore::new(backend.clone(), Hasher::default());

    let mut config = Config::default();
    config.storage.provider = StorageProvider::Memory;
    config.max_upload_bytes = max_upload_bytes;

    (app(AppState::new(config, store)), backend)
}

fn file_form(name: &str, data: &[u8]) -> MultipartForm {
    MultipartForm::new().add_part("file", Part::bytes(data.to_vec()).file_name(name))
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_hello_round_trip() {
    let (router, backend) = memory_app(1024 * 1024);
    let server = TestServer::new(router).unwrap();

    // Upload
    let response = server.post("/files").multipart(file_form("hello.txt", b"hello")).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let upload: UploadResponse = response.json();
    assert_eq!(upload.file_hash, HELLO_SHA1);

    // Upload again: same hash, no second write
    let response = server.post("/files").multipart(file_form("hello.txt", b"hello")).await;
    let again: UploadResponse = response.json();
    assert_eq!(again.file_hash, HELLO_SHA1);
    assert_eq!(backend.writes(), 1);

    // Download
    let response = server.get(&format!("/files/{}", HELLO_SHA1)).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.as_bytes().as_ref(), b"hello");
    assert_eq!(
        response.header(header::CONTENT_TYPE).to_str().unwrap(),
        "text/plain"
    );
    assert_eq!(
        response.header(header::ETAG).to_str().unwrap(),
        format!("\"{}\"", HELLO_SHA1)
    );

    // Delete
    let response = server.delete(&format!("/files/{}", HELLO_SHA1)).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let message: MessageResponse = response.json();
    assert_eq!(message.message, "deleted");

    // Gone
    let response = server.delete(&format!("/files/{}", HELLO_SHA1)).await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    let response = server.get(&format!("/files/{}", HELLO_SHA1)).await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    assert!(backend.is_empty());
}

#[tokio::test]
async fn test_empty_file() {
    let (router, _) = memory_app(1024 * 1024);
    let server = TestServer::new(router).unwrap();

    let response = server.post("/files").multipart(file_form("empty.bin", b"")).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let upload: UploadResponse = response.json();
    assert_eq!(upload.file_hash, EMPTY_SHA1);

    let response = server.get(&format!("/files/{}", EMPTY_SHA1)).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert!(response.as_bytes().is_empty());
}

#[tokio::test]
async fn test_missing_file_part() {
    let (router, backend) = memory_app(1024 * 1024);
    let server = TestServer::new(router).unwrap();

    let form = MultipartForm::new().add_text("comment", "no file here");
    let response = server.post("/files").multipart(form).await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let body: Value = response.json();
    assert_eq!(body["error"], "bad_request");
    assert_eq!(backend.writes(), 0);
}

#[tokio::test]
async fn test_file_without_name() {
    let (router, backend) = memory_app(1024 * 1024);
    let server = TestServer::new(router).unwrap();

    let form = MultipartForm::new().add_part("file", Part::bytes(b"data".to_vec()));
    let response = server.post("/files").multipart(form).await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(backend.writes(), 0);
}

#[tokio::test]
async fn test_upload_over_limit() {
    let (router, backend) = memory_app(64);
    let server = TestServer::new(router).unwrap();

    let response = server
        .post("/files")
        .multipart(file_form("big.bin", &vec![7u8; 4096]))
        .await;
    assert_eq!(response.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(backend.writes(), 0);
}

#[tokio::test]
async fn test_non_multipart_upload_rejected() {
    let (router, _) = memory_app(1024 * 1024);

    let req = Request::builder()
        .method("POST")
        .uri("/files")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"file": "hello"}"#))
        .unwrap();

    let response = router.oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_hash() {
    let (router, _) = memory_app(1024 * 1024);

    let response = router
        .clone()
        .oneshot(request("GET", &format!("/files/{}", HELLO_SHA1)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"], "not_found");

    let response = router
        .clone()
        .oneshot(request("DELETE", "/files/not-a-hash"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = router
        .oneshot(request("GET", &format!("/files/{}/meta", HELLO_SHA1)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_metadata() {
    let (router, _) = memory_app(1024 * 1024);
    let server = TestServer::new(router).unwrap();

    server
        .post("/files")
        .multipart(file_form("notes/hello.txt", b"hello"))
        .await;

    let response = server.get(&format!("/files/{}/meta", HELLO_SHA1)).await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let record: Value = response.json();
    assert_eq!(record["hash"], HELLO_SHA1);
    assert_eq!(record["fileName"], "hello.txt");
    assert_eq!(record["size"], 5);
    assert_eq!(
        record["location"],
        format!("aa/{}/hello.txt", &HELLO_SHA1[2..])
    );
}

#[tokio::test]
async fn test_corruption_is_not_not_found() {
    let (router, backend) = memory_app(1024 * 1024);
    let server = TestServer::new(router).unwrap();

    server.post("/files").multipart(file_form("hello.txt", b"hello")).await;

    let location = backend.locations().pop().unwrap();
    backend.delete(&location).await.unwrap();

    let response = server.get(&format!("/files/{}", HELLO_SHA1)).await;
    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(body["error"], "storage_corruption");
}

#[tokio::test]
async fn test_health() {
    let (router, _) = memory_app(1024 * 1024);

    let response = router.oneshot(request("GET", "/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["backend"], "memory");
    assert_eq!(body["algorithm"], "sha1");
    assert_eq!(body["records"], 0);
}

#[tokio::test]
async fn test_local_storage_from_config() {
    let temp_dir = TempDir::new().unwrap();

    let mut config = Config::default();
    config.storage.provider = StorageProvider::Local;
    config.storage.root = temp_dir.path().join("uploads");

    let state = AppState::from_config(config).await.unwrap();
    let server = TestServer::new(app(state)).unwrap();

    let response = server.post("/files").multipart(file_form("hello.txt", b"hello")).await;
    let upload: UploadResponse = response.json();
    assert_eq!(upload.file_hash, HELLO_SHA1);

    let on_disk = temp_dir
        .path()
        .join("uploads")
        .join("aa")
        .join(&HELLO_SHA1[2..])
        .join("hello.txt");
    assert_eq!(std::fs::read(&on_disk).unwrap(), b"hello");

    let response = server.delete(&format!("/files/{}", HELLO_SHA1)).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert!(!on_disk.exists());
}
