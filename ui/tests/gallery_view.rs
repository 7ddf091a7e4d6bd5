use api_client::{ApiClient, MediaKind, StoreSettings, UploadClient, UploadSettings};
use gallery::{CollectionFilter, MoveRequest};
use httpmock::MockServer;
use mocks::{
    collection_document, expect_create, expect_list_collections, expect_list_failure, expect_list_media,
    expect_update, media_document, CLOUD_NAME, ID_TOKEN, OWNER_ID, PROJECT_ID, UPLOAD_PRESET,
};
use ui::{settle, Backend, FetchState, GalleryMessage, GalleryView, Program, ToastKind};

fn backend(server: &MockServer) -> Backend {
    let store = StoreSettings {
        base_url: server.base_url(),
        project_id: PROJECT_ID.to_string(),
    };
    Backend {
        store: ApiClient::new(&store, ID_TOKEN.to_string()),
        uploads: UploadClient::new(UploadSettings {
            base_url: server.base_url(),
            cloud_name: CLOUD_NAME.to_string(),
            upload_preset: UPLOAD_PRESET.to_string(),
            folder: None,
        }),
        owner_id: OWNER_ID.to_string(),
    }
}

async fn seed(server: &MockServer) {
    expect_list_media(
        server,
        vec![
            media_document("m1", OWNER_ID, "https://cdn/1.jpg", "image", None, "2024-01-01T00:00:00Z"),
            media_document("m2", OWNER_ID, "https://cdn/2.jpg", "image", Some("A"), "2024-01-02T00:00:00Z"),
            media_document("m3", OWNER_ID, "https://cdn/3.mp4", "video", Some("A"), "2024-01-03T00:00:00Z"),
        ],
    )
    .await;
    expect_list_collections(
        server,
        vec![
            collection_document("A", OWNER_ID, "Holidays", "2024-01-01T00:00:00Z"),
            collection_document("B", OWNER_ID, "Work", "2024-01-02T00:00:00Z"),
        ],
    )
    .await;
}

async fn mounted(server: &MockServer, kind: Option<MediaKind>) -> GalleryView {
    let (mut view, cmd) = GalleryView::new(backend(server), kind, None);
    settle(&mut view, cmd).await;
    view
}

async fn send(view: &mut GalleryView, message: GalleryMessage) {
    let cmd = view.update(message);
    settle(view, cmd).await;
}

#[tokio::test]
async fn test_mount_loads_media_and_counts() {
    let server = MockServer::start_async().await;
    seed(&server).await;
    let mut view = mounted(&server, None).await;

    assert_eq!(view.state(), &FetchState::Ready);
    assert_eq!(view.items().len(), 3);
    assert_eq!(view.collections().len(), 2);
    assert_eq!(view.counts()["A"].images, 1);
    assert_eq!(view.counts()["A"].videos, 1);
    assert!(!view.counts().contains_key("B"));

    send(&mut view, GalleryMessage::SetCollectionFilter(CollectionFilter::Uncategorized)).await;
    let ids: Vec<_> = view.visible_items().into_iter().map(|i| i.id).collect();
    assert_eq!(ids, vec!["m1"]);
}

#[tokio::test]
async fn test_kind_filter_excludes_videos() {
    let server = MockServer::start_async().await;
    seed(&server).await;
    let view = mounted(&server, Some(MediaKind::Image)).await;
    assert!(view.visible_items().iter().all(|i| i.kind == MediaKind::Image));
    assert_eq!(view.visible_items().len(), 2);
}

#[tokio::test]
async fn test_collections_failure_keeps_media() {
    let server = MockServer::start_async().await;
    expect_list_media(
        &server,
        vec![media_document("m1", OWNER_ID, "https://cdn/1.jpg", "image", None, "2024-01-01T00:00:00Z")],
    )
    .await;
    expect_list_failure(&server, "collections", 500).await;
    let view = mounted(&server, None).await;

    assert_eq!(view.state(), &FetchState::Ready);
    assert_eq!(view.items().len(), 1);
    assert_eq!(view.toasts()[0].title, "Failed to load collections");
}

#[tokio::test]
async fn test_media_failure_sets_errored() {
    let server = MockServer::start_async().await;
    expect_list_failure(&server, "media", 403).await;
    expect_list_collections(&server, vec![]).await;
    let view = mounted(&server, None).await;

    assert!(matches!(view.state(), FetchState::Errored(_)));
    assert_eq!(view.toasts()[0].kind, ToastKind::Error);
}

#[tokio::test]
async fn test_failed_move_leaves_snapshot_untouched() {
    let server = MockServer::start_async().await;
    seed(&server).await;
    let update = expect_update(&server, "m2", 500).await;
    let mut view = mounted(&server, None).await;
    let before = view.items().to_vec();

    send(
        &mut view,
        GalleryMessage::RequestMove(MoveRequest {
            media_id: "m2".into(),
            target: Some("B".into()),
        }),
    )
    .await;

    update.assert_async().await;
    assert_eq!(view.items(), before.as_slice());
    let toast = view.toasts().last().unwrap();
    assert_eq!(toast.kind, ToastKind::Error);
    assert_eq!(toast.title, "Move Failed");
}

#[tokio::test]
async fn test_move_patches_item_and_recounts() {
    let server = MockServer::start_async().await;
    seed(&server).await;
    expect_update(&server, "m1", 200).await;
    let mut view = mounted(&server, None).await;

    send(
        &mut view,
        GalleryMessage::RequestMove(MoveRequest {
            media_id: "m1".into(),
            target: Some("B".into()),
        }),
    )
    .await;

    let moved = view.items().iter().find(|i| i.id == "m1").unwrap();
    assert_eq!(moved.collection_id.as_deref(), Some("B"));
    assert_eq!(view.counts()["B"].images, 1);
    let toast = view.toasts().last().unwrap();
    assert_eq!(toast.title, "Media moved");
    assert_eq!(toast.description, "Moved to Work");
}

#[tokio::test]
async fn test_drag_and_drop_uses_move_path() {
    let server = MockServer::start_async().await;
    seed(&server).await;
    let update = expect_update(&server, "m3", 200).await;
    let mut view = mounted(&server, None).await;

    send(&mut view, GalleryMessage::DragStart("m3".into())).await;
    assert_eq!(view.dragging(), Some("m3"));
    send(&mut view, GalleryMessage::DropOn(None)).await;
    send(&mut view, GalleryMessage::DragEnd).await;

    update.assert_async().await;
    assert_eq!(view.dragging(), None);
    let item = view.items().iter().find(|i| i.id == "m3").unwrap();
    assert_eq!(item.collection_id, None);
    assert_eq!(view.counts()["A"].videos, 0);
}

#[tokio::test]
async fn test_failed_drop_keeps_snapshot_and_drag_end_clears() {
    let server = MockServer::start_async().await;
    seed(&server).await;
    let update = expect_update(&server, "m2", 500).await;
    let mut view = mounted(&server, None).await;
    let before = view.items().to_vec();

    send(&mut view, GalleryMessage::DragStart("m2".into())).await;
    send(&mut view, GalleryMessage::DropOn(Some("B".into()))).await;
    update.assert_async().await;
    assert_eq!(view.dragging(), Some("m2"));

    send(&mut view, GalleryMessage::DragEnd).await;
    assert_eq!(view.dragging(), None);
    assert_eq!(view.items(), before.as_slice());
    assert_eq!(view.counts()["A"].images, 1);
    assert!(!view.counts().contains_key("B"));
    let toast = view.toasts().last().unwrap();
    assert_eq!(toast.kind, ToastKind::Error);
    assert_eq!(toast.title, "Move Failed");
}

#[tokio::test]
async fn test_blank_collection_name_is_rejected_locally() {
    let server = MockServer::start_async().await;
    seed(&server).await;
    let create = expect_create(&server, "collections", "C").await;
    let mut view = mounted(&server, None).await;

    send(&mut view, GalleryMessage::OpenCreateCollection).await;
    send(&mut view, GalleryMessage::CollectionNameChanged("   ".into())).await;
    send(&mut view, GalleryMessage::SubmitCreateCollection).await;

    create.assert_hits_async(0).await;
    assert!(view.create_dialog().open);
    assert_eq!(
        view.create_dialog().error.as_deref(),
        Some("Collection name must not be empty")
    );
}

#[tokio::test]
async fn test_create_collection_relists() {
    let server = MockServer::start_async().await;
    expect_list_media(&server, vec![]).await;
    let listing = expect_list_collections(&server, vec![]).await;
    let create = expect_create(&server, "collections", "C").await;
    let mut view = mounted(&server, None).await;

    send(&mut view, GalleryMessage::OpenCreateCollection).await;
    send(&mut view, GalleryMessage::CollectionNameChanged("  Trips ".into())).await;
    send(&mut view, GalleryMessage::SubmitCreateCollection).await;

    create.assert_async().await;
    listing.assert_hits_async(2).await;
    assert!(!view.create_dialog().open);
    assert_eq!(view.toasts().last().unwrap().description, "\"Trips\" is ready");
}

#[tokio::test]
async fn test_preview_survives_refresh() {
    let server = MockServer::start_async().await;
    seed(&server).await;
    let mut view = mounted(&server, None).await;

    send(&mut view, GalleryMessage::Preview("m2".into())).await;
    send(&mut view, GalleryMessage::RefreshSignal(1)).await;

    assert_eq!(view.state(), &FetchState::Ready);
    assert_eq!(view.preview_id(), Some("m2"));
    assert_eq!(view.previewed_item().map(|i| i.media_url.as_str()), Some("https://cdn/2.jpg"));
}
