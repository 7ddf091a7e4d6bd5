use api_client::{ApiClientError, MediaKind, UploadClient, UploadFile, UploadSettings};
use httpmock::MockServer;
use mocks::{expect_upload, expect_upload_failure, CLOUD_NAME, UPLOAD_PRESET};

fn client(server: &MockServer) -> UploadClient {
    UploadClient::new(UploadSettings {
        base_url: server.base_url(),
        cloud_name: CLOUD_NAME.to_string(),
        upload_preset: UPLOAD_PRESET.to_string(),
        folder: Some("media_archive".to_string()),
    })
}

#[tokio::test]
async fn test_video_upload_routes_to_video_endpoint() {
    let server = MockServer::start_async().await;
    let mock = expect_upload(&server, "video", "https://cdn.example.com/clip.mp4").await;
    let file = UploadFile::new("clip.mp4", "video/mp4", vec![0u8; 2 * 1024 * 1024]);

    let uploaded = client(&server).upload(&file).await.unwrap();
    mock.assert_async().await;
    assert_eq!(uploaded.kind, MediaKind::Video);
    assert_eq!(uploaded.url, "https://cdn.example.com/clip.mp4");
}

#[tokio::test]
async fn test_non_video_defaults_to_image() {
    let server = MockServer::start_async().await;
    let mock = expect_upload(&server, "image", "https://cdn.example.com/a.png").await;
    let file = UploadFile::new("a.png", "image/png", b"png".to_vec());
    let uploaded = client(&server).upload(&file).await.unwrap();
    mock.assert_async().await;
    assert_eq!(uploaded.kind, MediaKind::Image);
}

#[tokio::test]
async fn test_rejected_upload() {
    let server = MockServer::start_async().await;
    expect_upload_failure(&server, "image", 400).await;
    let file = UploadFile::new("a.png", "image/png", b"png".to_vec());
    let err = client(&server).upload(&file).await.unwrap_err();
    match err {
        ApiClientError::UploadRejected { status, body } => {
            assert_eq!(status, 400);
            assert!(body.contains("Upload preset not found"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_transport_failure_is_network_error() {
    let upload = UploadClient::new(UploadSettings {
        base_url: "http://127.0.0.1:1".to_string(),
        cloud_name: CLOUD_NAME.to_string(),
        upload_preset: UPLOAD_PRESET.to_string(),
        folder: None,
    });
    let file = UploadFile::new("a.png", "image/png", b"png".to_vec());
    assert!(matches!(upload.upload(&file).await, Err(ApiClientError::Network(_))));
}
