//! Integration tests for the storage gateway and the S3 client.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use media_share::config::Config;
use media_share::storage::{ObjectStore, S3Client, StorageGateway, UploadFile};
use media_share::ShareError;
use wiremock::matchers::{header, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MIB: u64 = 1024 * 1024;

/// Object store kept in memory, counting calls.
#[derive(Default)]
struct RecordingStore {
    objects: Mutex<HashMap<String, (Vec<u8>, String)>>,
    puts: AtomicUsize,
    delay: Option<Duration>,
}

#[async_trait]
impl ObjectStore for RecordingStore {
    async fn put(&self, key: &str, data: &[u8], content_type: &str) -> anyhow::Result<()> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), (data.to_vec(), content_type.to_string()));
        Ok(())
    }

    async fn get(&self, key: &str) -> anyhow::Result<Option<(Vec<u8>, String)>> {
        Ok(self.objects.lock().unwrap().get(key).cloned())
    }

    fn public_url(&self, key: &str) -> String {
        format!("https://cdn.example.com/{key}")
    }
}

fn gateway(store: Arc<RecordingStore>) -> StorageGateway {
    StorageGateway::new(store, "media/", 5 * MIB, Duration::from_secs(5))
}

fn image(size: usize) -> UploadFile {
    UploadFile {
        file_name: "Holiday.PNG".to_string(),
        content_type: "image/png".to_string(),
        bytes: vec![7; size],
    }
}

fn test_config(endpoint: &str) -> Config {
    Config {
        database_path: PathBuf::from("unused.sqlite"),
        s3_bucket: "test-bucket".to_string(),
        s3_region: "us-east-1".to_string(),
        s3_endpoint: Some(endpoint.to_string()),
        s3_prefix: "media/".to_string(),
        public_base_url: None,
        max_upload_bytes: 5 * MIB,
        request_timeout: Duration::from_secs(5),
        feed_limit: 100,
        session_ttl: Duration::from_secs(3600),
        web_host: "127.0.0.1".to_string(),
        web_port: 0,
    }
}

#[tokio::test]
async fn test_upload_stores_under_owner_path() {
    let store = Arc::new(RecordingStore::default());
    let stored = gateway(Arc::clone(&store)).upload(&image(1024), "u1").await.unwrap();

    assert!(stored.path.starts_with("u1/"));
    assert!(stored.path.ends_with(".png"));
    assert_eq!(stored.public_url, format!("https://cdn.example.com/media/{}", stored.path));

    let objects = store.objects.lock().unwrap();
    let (bytes, content_type) = objects.get(&format!("media/{}", stored.path)).unwrap();
    assert_eq!(bytes.len(), 1024);
    assert_eq!(content_type, "image/png");
}

#[tokio::test]
async fn test_oversized_file_never_reaches_store() {
    let store = Arc::new(RecordingStore::default());
    let size = usize::try_from(5 * MIB).unwrap() + 1;

    let result = gateway(Arc::clone(&store)).upload(&image(size), "u1").await;
    assert!(matches!(result, Err(ShareError::Validation(msg)) if msg.contains("5MB")));
    assert_eq!(store.puts.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_exactly_max_size_is_accepted() {
    let store = Arc::new(RecordingStore::default());
    let size = usize::try_from(5 * MIB).unwrap();
    assert!(gateway(store).upload(&image(size), "u1").await.is_ok());
}

#[tokio::test]
async fn test_non_image_and_missing_owner_are_rejected() {
    let store = Arc::new(RecordingStore::default());
    let gateway = gateway(Arc::clone(&store));

    let mut pdf = image(10);
    pdf.content_type = "application/pdf".to_string();
    assert!(matches!(gateway.upload(&pdf, "u1").await, Err(ShareError::Validation(_))));

    assert!(matches!(gateway.upload(&image(10), "  ").await, Err(ShareError::Validation(_))));
    assert_eq!(store.puts.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_svg_is_rejected_and_content_type_normalized() {
    let store = Arc::new(RecordingStore::default());
    let gateway = gateway(Arc::clone(&store));

    let mut svg = image(10);
    svg.file_name = "logo.svg".to_string();
    svg.content_type = "image/svg+xml".to_string();
    assert!(matches!(gateway.upload(&svg, "u1").await, Err(ShareError::Validation(_))));
    assert_eq!(store.puts.load(Ordering::SeqCst), 0);

    let mut jpeg = image(10);
    jpeg.content_type = "Image/JPG".to_string();
    let stored = gateway.upload(&jpeg, "u1").await.unwrap();
    let objects = store.objects.lock().unwrap();
    assert_eq!(objects[&format!("media/{}", stored.path)].1, "image/jpeg");
}

#[tokio::test]
async fn test_fetch_refuses_keys_outside_prefix() {
    let store = Arc::new(RecordingStore::default());
    store
        .put("private/secret.png", b"secret", "image/png")
        .await
        .unwrap();
    let gateway = gateway(Arc::clone(&store));

    assert!(!gateway.owns_key("private/secret.png"));
    assert!(!gateway.owns_key("media/../private/secret.png"));
    assert!(gateway.owns_key("media/u1/abc.png"));
    assert_eq!(gateway.fetch("private/secret.png").await.unwrap(), None);
}

#[tokio::test]
async fn test_slow_store_times_out_as_connectivity() {
    let store = Arc::new(RecordingStore {
        delay: Some(Duration::from_millis(500)),
        ..RecordingStore::default()
    });
    let gateway = StorageGateway::new(store, "media/", 5 * MIB, Duration::from_millis(50));

    let result = gateway.upload(&image(10), "u1").await;
    assert!(matches!(result, Err(ShareError::Connectivity(_))));
}

#[tokio::test]
async fn test_s3_client_put_and_public_url() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path_regex(r"^/test-bucket/media/u1/[a-z0-9]{12}\.png$"))
        .and(header("content-type", "image/png"))
        .respond_with(ResponseTemplate::new(200).insert_header("ETag", "\"abc\""))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = test_config(&mock_server.uri());
    let client = S3Client::with_credentials(&config, "test-access", "test-secret").unwrap();
    assert!(client.is_public());
    assert_eq!(client.bucket_name(), "test-bucket");

    let gateway = StorageGateway::new(
        Arc::new(client),
        config.s3_prefix.clone(),
        config.max_upload_bytes,
        config.request_timeout,
    );
    let stored = gateway.upload(&image(64), "u1").await.unwrap();

    assert_eq!(
        stored.public_url,
        format!("{}/test-bucket/media/{}", mock_server.uri(), stored.path)
    );
}

#[tokio::test]
async fn test_s3_client_rejected_put_is_write_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&mock_server)
        .await;

    let config = test_config(&mock_server.uri());
    let client = S3Client::with_credentials(&config, "test-access", "test-secret").unwrap();
    let gateway = StorageGateway::new(Arc::new(client), "media/", 5 * MIB, Duration::from_secs(5));

    let result = gateway.upload(&image(64), "u1").await;
    assert!(matches!(result, Err(ShareError::Write(_))));
}

#[tokio::test]
async fn test_s3_client_missing_object_is_none() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/test-bucket/media/u1/missing.png"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let config = test_config(&mock_server.uri());
    let client = S3Client::with_credentials(&config, "test-access", "test-secret").unwrap();
    let gateway = StorageGateway::new(Arc::new(client), "media/", 5 * MIB, Duration::from_secs(5));

    assert_eq!(gateway.fetch("media/u1/missing.png").await.unwrap(), None);
}

#[test]
fn test_public_url_variants() {
    let mut config = test_config("http://minio:9000");
    let private = S3Client::with_credentials(&config, "a", "b").unwrap();
    assert!(!private.is_public());
    assert_eq!(private.public_url("media/u1/x.png"), "/files/media/u1/x.png");

    config.public_base_url = Some("https://cdn.example.com".to_string());
    let cdn = S3Client::with_credentials(&config, "a", "b").unwrap();
    assert_eq!(cdn.public_url("media/u1/x.png"), "https://cdn.example.com/media/u1/x.png");

    config.s3_endpoint = None;
    config.public_base_url = None;
    let aws = S3Client::with_credentials(&config, "a", "b").unwrap();
    assert_eq!(
        aws.public_url("media/u1/x.png"),
        "https://test-bucket.s3.amazonaws.com/media/u1/x.png"
    );
}
