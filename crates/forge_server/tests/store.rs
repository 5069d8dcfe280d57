use axum::Router;
use forge_core::AUTH_KEY_HEADER;
use forge_core::hash::hash_bytes;
use forge_fs::FileSystemStorage;
use forge_server::prelude::*;
use reqwest::{Client, StatusCode};
use tempfile::TempDir;

const SECRET: &str = "test-secret";

async fn spawn(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
    format!("http://{addr}")
}

async fn spawn_store(config: BlobStoreConfig) -> (String, TempDir) {
    let dir = TempDir::new().unwrap();
    let app = BlobStoreServer::new(config).build(
        FileSystemStorage::new(dir.path()),
        SharedSecretAuth::new(SECRET),
    );
    (spawn(app).await, dir)
}

async fn put(url: &str, key: Option<&str>, body: &'static [u8]) -> reqwest::Response {
    let mut request = Client::new()
        .put(url)
        .header("Content-Type", "application/octet-stream")
        .body(body);
    if let Some(key) = key {
        request = request.header(AUTH_KEY_HEADER, key);
    }
    request.send().await.unwrap()
}

#[tokio::test]
async fn put_then_probe_and_fetch() {
    let (base, dir) = spawn_store(BlobStoreConfig::default()).await;
    let hash = hash_bytes(b"hello");
    let url = format!("{base}/{hash}");
    let client = Client::new();

    assert_eq!(client.head(&url).send().await.unwrap().status(), StatusCode::NOT_FOUND);

    let created = put(&url, Some(SECRET), b"hello").await;
    assert_eq!(created.status(), StatusCode::CREATED);

    assert_eq!(client.head(&url).send().await.unwrap().status(), StatusCode::OK);
    let fetched = client.get(&url).send().await.unwrap();
    assert_eq!(fetched.status(), StatusCode::OK);
    assert_eq!(fetched.bytes().await.unwrap(), "hello");
    assert!(dir.path().join(&hash).is_file());
}

#[tokio::test]
async fn repeated_put_keeps_existing_blob() {
    let (base, _dir) = spawn_store(BlobStoreConfig::default()).await;
    let url = format!("{base}/{}", hash_bytes(b"hello"));

    put(&url, Some(SECRET), b"hello").await;
    let again = put(&url, Some(SECRET), b"hello").await;

    assert_eq!(again.status(), StatusCode::OK);
}

#[tokio::test]
async fn writes_need_the_shared_secret() {
    let (base, _dir) = spawn_store(BlobStoreConfig::default()).await;
    let url = format!("{base}/{}", hash_bytes(b"hello"));

    let missing = put(&url, None, b"hello").await;
    assert_eq!(missing.status(), StatusCode::FORBIDDEN);

    let wrong = put(&url, Some("nope"), b"hello").await;
    assert_eq!(wrong.status(), StatusCode::FORBIDDEN);
    assert_eq!(wrong.text().await.unwrap(), "Forbidden");

    let probe = Client::new().head(&url).send().await.unwrap();
    assert_eq!(probe.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn mismatched_content_is_never_stored() {
    let (base, dir) = spawn_store(BlobStoreConfig::default()).await;
    let hash = hash_bytes(b"hello");
    let url = format!("{base}/{hash}");

    let response = put(&url, Some(SECRET), b"not hello").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(response.text().await.unwrap().contains("Integrity check failed"));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    let probe = Client::new().head(&url).send().await.unwrap();
    assert_eq!(probe.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_keys_are_bad_requests() {
    let (base, _dir) = spawn_store(BlobStoreConfig::default()).await;

    let probe = Client::new()
        .head(format!("{base}/NOT-A-HASH"))
        .send()
        .await
        .unwrap();
    assert_eq!(probe.status(), StatusCode::BAD_REQUEST);

    let write = put(&format!("{base}/abc"), Some(SECRET), b"x").await;
    assert_eq!(write.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn missing_blob_is_not_found() {
    let (base, _dir) = spawn_store(BlobStoreConfig::default()).await;

    let response = Client::new()
        .get(format!("{base}/0123456789abcdef"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response.text().await.unwrap(), "Object Not Found");
}

#[tokio::test]
async fn other_methods_are_not_allowed() {
    let (base, _dir) = spawn_store(BlobStoreConfig::default()).await;

    let response = Client::new()
        .delete(format!("{base}/0123456789abcdef"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn oversized_uploads_are_refused() {
    let (base, _dir) = spawn_store(BlobStoreConfig {
        max_upload_size: Some(4),
    })
    .await;
    let url = format!("{base}/{}", hash_bytes(b"hello"));

    let response = put(&url, Some(SECRET), b"hello").await;

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn health_check() {
    let (base, _dir) = spawn_store(BlobStoreConfig::default()).await;

    let response = Client::new().get(format!("{base}/health")).send().await.unwrap();

    assert_eq!(response.text().await.unwrap(), "OK");
}
