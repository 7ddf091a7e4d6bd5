//! Per-screen gallery controller.
//!
//! Owns the media and collection snapshot for one mounted screen. Every
//! mutation goes to the store first; the snapshot is patched only after the
//! remote call succeeded.

use crate::command::{Command, Program};
use crate::dashboard::SidebarContext;
use crate::dialogs::CreateCollectionDialog;
use crate::toast::{Toast, Toasts};
use crate::Backend;
use api_client::{ApiClientError, Collection, MediaItem, MediaKind};
use gallery::{CollectionFilter, DragCarrier, KindCounts, MoveRequest};
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchState {
    Loading,
    Ready,
    Errored(String),
}

#[derive(Debug)]
pub enum GalleryMessage {
    Load,
    Loaded(
        Result<Vec<MediaItem>, ApiClientError>,
        Result<Vec<Collection>, ApiClientError>,
    ),
    RefreshSignal(u64),
    SetCollectionFilter(CollectionFilter),
    SetKind(Option<MediaKind>),
    Preview(String),
    ClosePreview,
    RequestMove(MoveRequest),
    MoveCompleted(MoveRequest, Result<(), ApiClientError>),
    DragStart(String),
    DropOn(Option<String>),
    DragEnd,
    OpenCreateCollection,
    CollectionNameChanged(String),
    SubmitCreateCollection,
    CancelCreateCollection,
    CollectionCreated(Result<String, ApiClientError>),
    CollectionsLoaded(Result<Vec<Collection>, ApiClientError>),
    MediaRemoved(String),
    DismissToast(usize),
}

pub struct GalleryView {
    backend: Backend,
    state: FetchState,
    items: Vec<MediaItem>,
    collections: Vec<Collection>,
    counts: BTreeMap<String, KindCounts>,
    filter: CollectionFilter,
    kind: Option<MediaKind>,
    preview: Option<String>,
    drag: DragCarrier,
    create_dialog: CreateCollectionDialog,
    refresh_signal: u64,
    toasts: Toasts,
}

impl GalleryView {
    /// Mount the view. The returned command performs the first fetch.
    pub fn new(
        backend: Backend,
        kind: Option<MediaKind>,
        error_log: Option<PathBuf>,
    ) -> (Self, Command<GalleryMessage>) {
        let view = Self {
            backend,
            state: FetchState::Loading,
            items: Vec::new(),
            collections: Vec::new(),
            counts: BTreeMap::new(),
            filter: CollectionFilter::All,
            kind,
            preview: None,
            drag: DragCarrier::new(),
            create_dialog: CreateCollectionDialog::default(),
            refresh_signal: 0,
            toasts: Toasts::new(error_log),
        };
        (view, Command::perform(async {}, |_| GalleryMessage::Load))
    }

    pub fn state(&self) -> &FetchState {
        &self.state
    }

    pub fn items(&self) -> &[MediaItem] {
        &self.items
    }

    pub fn collections(&self) -> &[Collection] {
        &self.collections
    }

    pub fn counts(&self) -> &BTreeMap<String, KindCounts> {
        &self.counts
    }

    pub fn filter(&self) -> &CollectionFilter {
        &self.filter
    }

    pub fn kind(&self) -> Option<MediaKind> {
        self.kind
    }

    /// The listing after the collection filter and then the kind filter.
    pub fn visible_items(&self) -> Vec<MediaItem> {
        gallery::visible_items(&self.items, &self.filter, self.kind)
    }

    pub fn preview_id(&self) -> Option<&str> {
        self.preview.as_deref()
    }

    pub fn previewed_item(&self) -> Option<&MediaItem> {
        let id = self.preview.as_deref()?;
        self.items.iter().find(|i| i.id == id)
    }

    pub fn dragging(&self) -> Option<&str> {
        self.drag.source()
    }

    pub fn create_dialog(&self) -> &CreateCollectionDialog {
        &self.create_dialog
    }

    /// Grid width for the current sidebar state.
    pub fn grid_columns(&self, sidebar: SidebarContext) -> usize {
        if sidebar.collapsed {
            4
        } else {
            3
        }
    }

    pub fn collection_name(&self, collection_id: Option<&str>) -> String {
        gallery::collection_display_name(&self.collections, collection_id)
    }

    pub fn toasts(&self) -> &[Toast] {
        self.toasts.items()
    }

    pub fn take_toasts(&mut self) -> Vec<Toast> {
        self.toasts.take()
    }

    fn load(&mut self) -> Command<GalleryMessage> {
        self.state = FetchState::Loading;
        let store = self.backend.store.clone();
        let owner = self.backend.owner_id.clone();
        Command::perform(
            async move { tokio::join!(store.list_media(&owner), store.list_collections(&owner)) },
            |(media, collections)| GalleryMessage::Loaded(media, collections),
        )
    }

    fn set_items(&mut self, items: Vec<MediaItem>) {
        self.counts = gallery::derive_counts(&items);
        self.items = items;
    }

    fn request_move(&mut self, request: MoveRequest) -> Command<GalleryMessage> {
        let store = self.backend.store.clone();
        Command::perform(
            async move {
                let result = store
                    .update_media_collection_ref(&request.media_id, request.target.as_deref())
                    .await;
                (request, result)
            },
            |(request, result)| GalleryMessage::MoveCompleted(request, result),
        )
    }

    fn list_collections(&self) -> Command<GalleryMessage> {
        let store = self.backend.store.clone();
        let owner = self.backend.owner_id.clone();
        Command::perform(
            async move { store.list_collections(&owner).await },
            GalleryMessage::CollectionsLoaded,
        )
    }
}

impl Program for GalleryView {
    type Message = GalleryMessage;

    fn update(&mut self, message: GalleryMessage) -> Command<GalleryMessage> {
        match message {
            GalleryMessage::Load => return self.load(),
            GalleryMessage::Loaded(media, collections) => {
                match collections {
                    Ok(collections) => self.collections = collections,
                    Err(err) => self
                        .toasts
                        .error("Failed to load collections", err.to_string()),
                }
                match media {
                    Ok(items) => {
                        tracing::debug!(count = items.len(), "media loaded");
                        self.set_items(items);
                        self.state = FetchState::Ready;
                    }
                    Err(err) => {
                        self.state = FetchState::Errored(err.to_string());
                        self.toasts.error("Failed to load media", err.to_string());
                    }
                }
            }
            GalleryMessage::RefreshSignal(signal) => {
                if signal != self.refresh_signal {
                    self.refresh_signal = signal;
                    return self.load();
                }
            }
            GalleryMessage::SetCollectionFilter(filter) => {
                self.filter = filter;
            }
            GalleryMessage::SetKind(kind) => {
                self.kind = kind;
            }
            GalleryMessage::Preview(id) => {
                self.preview = Some(id);
            }
            GalleryMessage::ClosePreview => {
                self.preview = None;
            }
            GalleryMessage::RequestMove(request) => return self.request_move(request),
            GalleryMessage::MoveCompleted(request, result) => match result {
                Ok(()) => {
                    self.set_items(gallery::apply_move(
                        &self.items,
                        &request.media_id,
                        request.target.as_deref(),
                    ));
                    let destination = self.collection_name(request.target.as_deref());
                    tracing::info!(media_id = %request.media_id, %destination, "media moved");
                    self.toasts
                        .success("Media moved", format!("Moved to {}", destination));
                }
                Err(err) => {
                    self.toasts.error("Move Failed", err.to_string());
                }
            },
            GalleryMessage::DragStart(media_id) => {
                self.drag.start(media_id);
            }
            GalleryMessage::DropOn(target) => {
                if let Some(request) = self.drag.drop_on(target.as_deref()) {
                    return self.request_move(request);
                }
            }
            GalleryMessage::DragEnd => {
                self.drag.end();
            }
            GalleryMessage::OpenCreateCollection => {
                self.create_dialog.show();
            }
            GalleryMessage::CollectionNameChanged(name) => {
                self.create_dialog.name = name;
            }
            GalleryMessage::SubmitCreateCollection => {
                let name = match gallery::validate_collection_name(&self.create_dialog.name) {
                    Ok(name) => name,
                    Err(err) => {
                        self.create_dialog.error = Some(err.to_string());
                        self.toasts.error("Invalid collection name", err.to_string());
                        return Command::none();
                    }
                };
                self.create_dialog.error = None;
                self.create_dialog.submitting = true;
                let store = self.backend.store.clone();
                let owner = self.backend.owner_id.clone();
                return Command::perform(
                    async move { store.create_collection(&owner, &name).await },
                    GalleryMessage::CollectionCreated,
                );
            }
            GalleryMessage::CancelCreateCollection => {
                self.create_dialog.close();
            }
            GalleryMessage::CollectionCreated(result) => match result {
                Ok(id) => {
                    tracing::info!(collection_id = %id, "collection created");
                    let name = self.create_dialog.name.trim().to_string();
                    self.create_dialog.close();
                    self.toasts
                        .success("Collection created", format!("\"{}\" is ready", name));
                    return self.list_collections();
                }
                Err(err) => {
                    self.create_dialog.submitting = false;
                    self.create_dialog.error = Some(err.to_string());
                    self.toasts
                        .error("Failed to create collection", err.to_string());
                }
            },
            GalleryMessage::CollectionsLoaded(result) => match result {
                Ok(collections) => self.collections = collections,
                Err(err) => self
                    .toasts
                    .error("Failed to load collections", err.to_string()),
            },
            GalleryMessage::MediaRemoved(media_id) => {
                self.set_items(gallery::apply_delete(&self.items, &media_id));
                if self.preview.as_deref() == Some(media_id.as_str()) {
                    self.preview = None;
                }
            }
            GalleryMessage::DismissToast(index) => {
                self.toasts.dismiss(index);
            }
        }
        Command::none()
    }
}
