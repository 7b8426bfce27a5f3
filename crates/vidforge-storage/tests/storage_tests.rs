//! Storage integration tests.
//!
//! Require S3-compatible credentials in the environment. Run with:
//! `cargo test -p vidforge-storage -- --ignored`

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use vidforge_models::ProviderKind;
use vidforge_storage::{MediaStore, ObjectStoreClient};

#[tokio::test]
#[ignore = "requires S3 credentials"]
async fn test_upload_download_roundtrip() {
    dotenvy::dotenv().ok();
    let client = ObjectStoreClient::from_env().await.expect("client");

    let key = format!("test/{}.bin", uuid_like());
    client
        .upload_bytes(b"hello vidforge".to_vec(), &key, "application/octet-stream")
        .await
        .expect("upload");

    assert!(client.exists(&key).await.expect("exists"));
    let bytes = client.download_bytes(&key).await.expect("download");
    assert_eq!(bytes, b"hello vidforge");

    client.delete_object(&key).await.expect("delete");
}

#[tokio::test]
#[ignore = "requires S3 credentials"]
async fn test_json_record_roundtrip() {
    dotenvy::dotenv().ok();
    let client = ObjectStoreClient::from_env().await.expect("client");

    let key = format!("test/{}.json", uuid_like());
    let value = json!({ "kind": "probe", "n": 42 });
    client.put_json(&key, &value).await.expect("put_json");

    let loaded: serde_json::Value = client.get_json(&key).await.expect("get_json");
    assert_eq!(loaded, value);

    client.delete_object(&key).await.expect("delete");
}

#[tokio::test]
#[ignore = "requires S3 credentials"]
async fn test_store_rehosts_provider_output() {
    dotenvy::dotenv().ok();

    // Provider CDN stands in as a mock server.
    let cdn = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/out.mp4"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"fake mp4 bytes".to_vec()))
        .mount(&cdn)
        .await;

    let store = MediaStore::from_env().await.expect("store");
    let media = store
        .store(
            "test-user",
            "a cat surfing at sunset",
            ProviderKind::Kling,
            &format!("{}/out.mp4", cdn.uri()),
            None,
        )
        .await
        .expect("store");

    assert_eq!(media.owner_user_id, "test-user");
    assert_eq!(media.size_bytes, 14);
    assert!(media.url.ends_with(&format!("{}.mp4", media.id)));

    let loaded = store.get("test-user", &media.id).await.expect("get");
    assert_eq!(loaded.id, media.id);
}

#[tokio::test]
async fn test_store_source_fetch_failure_is_error() {
    // 404 from the provider CDN must not produce a partial record.
    let cdn = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gone.mp4"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&cdn)
        .await;

    // Client construction needs no credentials until a request is made,
    // but MediaStore::from_env does. Skip when env is absent.
    if std::env::var("STORAGE_ENDPOINT_URL").is_err() {
        return;
    }
    let store = MediaStore::from_env().await.expect("store");
    let err = store
        .store(
            "test-user",
            "a cat",
            ProviderKind::Luma,
            &format!("{}/gone.mp4", cdn.uri()),
            None,
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        vidforge_storage::StorageError::SourceFetchFailed(_)
    ));
}

fn uuid_like() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    format!("{:x}", nanos)
}
