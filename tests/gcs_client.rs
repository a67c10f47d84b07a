use gpu_worker::contract::{
    BucketHandle, CredentialMode, RemoteObject, ResolvedCredential, StorageConnector,
};
use gpu_worker::error::StoreError;
use gpu_worker::gcs::{GcsBucket, GcsConnector};
use mockito::Matcher;

fn bucket_at(url: &str) -> GcsBucket {
    GcsBucket::with_token(reqwest::Client::new(), url, "models", "test-token".to_string())
}

#[tokio::test]
async fn test_list_follows_page_tokens() {
    let mut server = mockito::Server::new_async().await;
    let first = server
        .mock("GET", "/storage/v1/b/models/o")
        .match_header("authorization", "Bearer test-token")
        .match_query(Matcher::Regex("^fields=[^&]*$".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"items":[{"name":"models/a.bin","size":"4"},{"name":"models/sub/"}],"nextPageToken":"p2"}"#,
        )
        .create_async()
        .await;
    let second = server
        .mock("GET", "/storage/v1/b/models/o")
        .match_query(Matcher::UrlEncoded("pageToken".into(), "p2".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"items":[{"name":"models/sub/b.bin","size":"2"}]}"#)
        .create_async()
        .await;

    let objects = bucket_at(&server.url()).list().await.unwrap();

    assert_eq!(
        objects,
        vec![
            RemoteObject::new("models/a.bin", 4),
            RemoteObject::new("models/sub/", 0),
            RemoteObject::new("models/sub/b.bin", 2),
        ]
    );
    first.assert_async().await;
    second.assert_async().await;
}

#[tokio::test]
async fn test_list_of_missing_bucket_is_not_found() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/storage/v1/b/models/o")
        .match_query(Matcher::Any)
        .with_status(404)
        .with_body(r#"{"error":{"code":404,"message":"The specified bucket does not exist."}}"#)
        .create_async()
        .await;

    let err = bucket_at(&server.url()).list().await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)), "{err:?}");
}

#[tokio::test]
async fn test_expired_token_is_unauthorized() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/storage/v1/b/models/o")
        .match_query(Matcher::Any)
        .with_status(401)
        .create_async()
        .await;

    let err = bucket_at(&server.url()).list().await.unwrap_err();
    assert!(matches!(err, StoreError::Unauthorized(_)), "{err:?}");
}

#[tokio::test]
async fn test_fetch_downloads_media_with_encoded_name() {
    let mut server = mockito::Server::new_async().await;
    let download = server
        .mock(
            "GET",
            Matcher::Regex(r"^/storage/v1/b/models/o/models%2Fsub%2Fb\.bin".into()),
        )
        .match_query(Matcher::UrlEncoded("alt".into(), "media".into()))
        .match_header("authorization", "Bearer test-token")
        .with_status(200)
        .with_body([0x01u8, 0x02])
        .create_async()
        .await;

    let bytes = bucket_at(&server.url())
        .fetch("models/sub/b.bin")
        .await
        .unwrap();

    assert_eq!(bytes, vec![0x01, 0x02]);
    download.assert_async().await;
}

#[tokio::test]
async fn test_fetch_server_error_is_transport() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", Matcher::Regex(r"^/storage/v1/b/models/o/".into()))
        .match_query(Matcher::Any)
        .with_status(503)
        .create_async()
        .await;

    let err = bucket_at(&server.url()).fetch("a.bin").await.unwrap_err();
    assert!(matches!(err, StoreError::Transport(_)), "{err:?}");
}

#[tokio::test]
async fn test_connect_rejects_malformed_key() {
    let connector = GcsConnector::default();
    let err = connector
        .connect(&ResolvedCredential::Inline("{}".into()), "models")
        .await
        .err()
        .expect("connect should fail");
    assert!(matches!(err, StoreError::Unauthorized(_)), "{err:?}");
}

#[tokio::test]
async fn test_connect_in_file_mode_reads_key_path() {
    let connector = GcsConnector::default().with_credential_mode(CredentialMode::File);
    assert_eq!(connector.credential_mode(), CredentialMode::File);

    let missing = std::env::temp_dir().join("gpu-worker-no-such-key.json");
    let err = connector
        .connect(&ResolvedCredential::File(missing), "models")
        .await
        .err()
        .expect("connect should fail");
    match err {
        StoreError::Unauthorized(msg) => assert!(msg.contains("cannot read key file")),
        other => panic!("unexpected error {other:?}"),
    }
}
