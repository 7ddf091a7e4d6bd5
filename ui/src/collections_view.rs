use crate::command::{Command, Program};
use crate::gallery_view::{GalleryMessage, GalleryView};
use crate::toast::Toast;
use crate::Backend;
use api_client::{MediaItem, MediaKind};
use chrono::{DateTime, Utc};
use gallery::{CollectionFilter, KindCounts, MoveRequest};
use std::path::PathBuf;

/// One row of the collections overview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionSummary {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub counts: KindCounts,
}

impl CollectionSummary {
    pub fn created_label(&self) -> String {
        self.created_at.format("%b %d, %Y").to_string()
    }
}

#[derive(Debug)]
pub enum CollectionsMessage {
    Gallery(GalleryMessage),
    Open(String),
    Back,
    SetKind(Option<MediaKind>),
    RemoveFromCollection(String),
}

/// Collections overview with drill-down into a single collection.
pub struct CollectionsView {
    gallery: GalleryView,
    open: Option<String>,
}

impl CollectionsView {
    pub fn new(backend: Backend, error_log: Option<PathBuf>) -> (Self, Command<CollectionsMessage>) {
        let (gallery, cmd) = GalleryView::new(backend, None, error_log);
        (
            Self { gallery, open: None },
            cmd.map(CollectionsMessage::Gallery),
        )
    }

    pub fn gallery(&self) -> &GalleryView {
        &self.gallery
    }

    pub fn open_collection(&self) -> Option<&str> {
        self.open.as_deref()
    }

    pub fn summaries(&self) -> Vec<CollectionSummary> {
        let counts = self.gallery.counts();
        self.gallery
            .collections()
            .iter()
            .map(|c| CollectionSummary {
                id: c.id.clone(),
                name: c.name.clone(),
                created_at: c.created_at,
                counts: gallery::counts_for(counts, &c.id),
            })
            .collect()
    }

    /// Items of the drilled-in collection, or nothing on the overview.
    pub fn open_items(&self) -> Vec<MediaItem> {
        if self.open.is_none() {
            return Vec::new();
        }
        self.gallery.visible_items()
    }

    pub fn take_toasts(&mut self) -> Vec<Toast> {
        self.gallery.take_toasts()
    }

    fn forward(&mut self, message: GalleryMessage) -> Command<CollectionsMessage> {
        self.gallery.update(message).map(CollectionsMessage::Gallery)
    }
}

impl Program for CollectionsView {
    type Message = CollectionsMessage;

    fn update(&mut self, message: CollectionsMessage) -> Command<CollectionsMessage> {
        match message {
            CollectionsMessage::Gallery(message) => self.forward(message),
            CollectionsMessage::Open(id) => {
                self.open = Some(id.clone());
                let filter = self.forward(GalleryMessage::SetCollectionFilter(
                    CollectionFilter::Collection(id),
                ));
                let kind = self.forward(GalleryMessage::SetKind(None));
                Command::batch(vec![filter, kind])
            }
            CollectionsMessage::Back => {
                self.open = None;
                self.forward(GalleryMessage::SetCollectionFilter(CollectionFilter::All))
            }
            CollectionsMessage::SetKind(kind) => self.forward(GalleryMessage::SetKind(kind)),
            CollectionsMessage::RemoveFromCollection(media_id) => {
                self.forward(GalleryMessage::RequestMove(MoveRequest {
                    media_id,
                    target: None,
                }))
            }
        }
    }
}
