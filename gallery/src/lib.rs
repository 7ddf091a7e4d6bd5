//! Collection association rules for MediaVault.
//!
//! Everything here is synchronous and works on an in-memory snapshot of
//! the owner's media items. Each item belongs to at most one collection.
//! Per-collection counts are always derived from the snapshot and never
//! stored.

mod drag;

pub use drag::{DragCarrier, MoveRequest};

use api_client::{Collection, MediaItem, MediaKind, ValidationError};
use std::collections::BTreeMap;

pub const UNCATEGORIZED_SELECTOR: &str = "uncategorized";
pub const UNCATEGORIZED_LABEL: &str = "Uncategorized";
pub const UNKNOWN_COLLECTION_LABEL: &str = "Unknown Collection";

/// Which collection membership a listing is restricted to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CollectionFilter {
    #[default]
    All,
    Uncategorized,
    Collection(String),
}

impl CollectionFilter {
    /// `None` selects everything, `"uncategorized"` selects items without a
    /// collection and anything else is taken as a collection id.
    pub fn from_selector(selector: Option<&str>) -> Self {
        match selector {
            None => CollectionFilter::All,
            Some(UNCATEGORIZED_SELECTOR) => CollectionFilter::Uncategorized,
            Some(id) => CollectionFilter::Collection(id.to_string()),
        }
    }

    pub fn matches(&self, item: &MediaItem) -> bool {
        match self {
            CollectionFilter::All => true,
            CollectionFilter::Uncategorized => item.collection_id.is_none(),
            CollectionFilter::Collection(id) => item.collection_id.as_deref() == Some(id.as_str()),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KindCounts {
    pub images: usize,
    pub videos: usize,
}

impl KindCounts {
    pub fn total(&self) -> usize {
        self.images + self.videos
    }

    fn record(&mut self, kind: MediaKind) {
        match kind {
            MediaKind::Image => self.images += 1,
            MediaKind::Video => self.videos += 1,
        }
    }
}

pub fn filter_by_kind(items: &[MediaItem], kind: Option<MediaKind>) -> Vec<MediaItem> {
    match kind {
        None => items.to_vec(),
        Some(kind) => items.iter().filter(|i| i.kind == kind).cloned().collect(),
    }
}

pub fn filter_by_collection(items: &[MediaItem], filter: &CollectionFilter) -> Vec<MediaItem> {
    items.iter().filter(|i| filter.matches(i)).cloned().collect()
}

/// Collection filter first, then kind.
pub fn visible_items(
    items: &[MediaItem],
    filter: &CollectionFilter,
    kind: Option<MediaKind>,
) -> Vec<MediaItem> {
    items
        .iter()
        .filter(|i| filter.matches(i))
        .filter(|i| kind.map_or(true, |k| i.kind == k))
        .cloned()
        .collect()
}

/// Image and video counts per collection id in a single pass.
/// Uncategorized items have no bucket.
#[cfg_attr(feature = "trace-spans", tracing::instrument(skip(items)))]
pub fn derive_counts(items: &[MediaItem]) -> BTreeMap<String, KindCounts> {
    let mut counts: BTreeMap<String, KindCounts> = BTreeMap::new();
    for item in items {
        if let Some(collection_id) = &item.collection_id {
            counts.entry(collection_id.clone()).or_default().record(item.kind);
        }
    }
    counts
}

/// Counts for one collection, `0/0` when nothing is filed under it.
pub fn counts_for(counts: &BTreeMap<String, KindCounts>, collection_id: &str) -> KindCounts {
    counts.get(collection_id).copied().unwrap_or_default()
}

/// Local mirror of a successful remote move. Only the matching item changes.
#[cfg_attr(feature = "trace-spans", tracing::instrument(skip(items)))]
pub fn apply_move(items: &[MediaItem], media_id: &str, collection_id: Option<&str>) -> Vec<MediaItem> {
    items
        .iter()
        .map(|item| {
            if item.id == media_id {
                MediaItem {
                    collection_id: collection_id.map(str::to_string),
                    ..item.clone()
                }
            } else {
                item.clone()
            }
        })
        .collect()
}

/// Local mirror of a successful remote delete.
#[cfg_attr(feature = "trace-spans", tracing::instrument(skip(items)))]
pub fn apply_delete(items: &[MediaItem], media_id: &str) -> Vec<MediaItem> {
    items.iter().filter(|i| i.id != media_id).cloned().collect()
}

/// Trimmed collection name, rejecting names that are empty after trimming.
pub fn validate_collection_name(name: &str) -> Result<String, ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyCollectionName);
    }
    Ok(trimmed.to_string())
}

pub fn collection_display_name(collections: &[Collection], collection_id: Option<&str>) -> String {
    match collection_id {
        None => UNCATEGORIZED_LABEL.to_string(),
        Some(id) => collections
            .iter()
            .find(|c| c.id == id)
            .map(|c| c.name.clone())
            .unwrap_or_else(|| UNKNOWN_COLLECTION_LABEL.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn item(id: &str, kind: MediaKind, collection: Option<&str>) -> MediaItem {
        MediaItem {
            id: id.to_string(),
            owner_id: "owner".to_string(),
            media_url: format!("https://media.example/{}", id),
            kind,
            collection_id: collection.map(str::to_string),
            created_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
        }
    }

    fn sample() -> Vec<MediaItem> {
        vec![
            item("1", MediaKind::Image, None),
            item("2", MediaKind::Image, Some("A")),
            item("3", MediaKind::Video, Some("A")),
            item("4", MediaKind::Video, Some("B")),
            item("5", MediaKind::Image, None),
        ]
    }

    #[test]
    fn test_selector_parsing() {
        assert_eq!(CollectionFilter::from_selector(None), CollectionFilter::All);
        assert_eq!(
            CollectionFilter::from_selector(Some("uncategorized")),
            CollectionFilter::Uncategorized
        );
        assert_eq!(
            CollectionFilter::from_selector(Some("A")),
            CollectionFilter::Collection("A".into())
        );
    }

    #[test]
    fn test_three_item_example() {
        let items = vec![
            item("1", MediaKind::Image, None),
            item("2", MediaKind::Image, Some("A")),
            item("3", MediaKind::Video, Some("A")),
        ];
        let counts = derive_counts(&items);
        assert_eq!(counts.len(), 1);
        assert_eq!(counts["A"].total(), 2);
        assert_eq!(filter_by_collection(&items, &CollectionFilter::All).len(), 3);
        assert_eq!(
            filter_by_collection(&items, &CollectionFilter::Uncategorized).len(),
            1
        );
    }

    #[test]
    fn test_counts_cover_every_categorized_item_once() {
        let items = sample();
        let counts = derive_counts(&items);
        let bucketed: usize = counts.values().map(KindCounts::total).sum();
        let categorized = items.iter().filter(|i| i.collection_id.is_some()).count();
        assert_eq!(bucketed, categorized);
        assert_eq!(counts["A"], KindCounts { images: 1, videos: 1 });
        assert_eq!(counts["B"], KindCounts { images: 0, videos: 1 });
        assert_eq!(counts_for(&counts, "C"), KindCounts::default());
    }

    #[test]
    fn test_uncategorized_is_complement_of_buckets() {
        let items = sample();
        let counts = derive_counts(&items);
        for i in filter_by_collection(&items, &CollectionFilter::Uncategorized) {
            assert!(i.collection_id.is_none());
        }
        let outside = items
            .iter()
            .filter(|i| i.collection_id.as_ref().map_or(true, |c| !counts.contains_key(c)))
            .count();
        assert_eq!(
            filter_by_collection(&items, &CollectionFilter::Uncategorized).len(),
            outside
        );
    }

    #[test]
    fn test_kind_and_collection_filters_commute() {
        let items = sample();
        let filter = CollectionFilter::Collection("A".into());
        let a = filter_by_kind(&filter_by_collection(&items, &filter), Some(MediaKind::Video));
        let b = filter_by_collection(&filter_by_kind(&items, Some(MediaKind::Video)), &filter);
        assert_eq!(a, b);
        assert_eq!(visible_items(&items, &filter, Some(MediaKind::Video)), a);
        assert_eq!(filter_by_kind(&items, None), items);
    }

    #[test]
    fn test_move_round_trip() {
        let items = sample();
        let moved = apply_move(&items, "1", Some("B"));
        assert_eq!(moved[0].collection_id.as_deref(), Some("B"));
        assert_eq!(derive_counts(&moved)["B"].total(), 2);
        let restored = apply_move(&moved, "1", None);
        assert_eq!(restored, items);
    }

    #[test]
    fn test_move_unknown_id_changes_nothing() {
        let items = sample();
        assert_eq!(apply_move(&items, "missing", Some("A")), items);
    }

    #[test]
    fn test_delete_drops_only_target() {
        let items = sample();
        let left = apply_delete(&items, "3");
        assert_eq!(left.len(), 4);
        assert!(left.iter().all(|i| i.id != "3"));
        assert_eq!(derive_counts(&left)["A"], KindCounts { images: 1, videos: 0 });
    }

    #[test]
    fn test_collection_name_validation() {
        assert_eq!(
            validate_collection_name("  "),
            Err(ValidationError::EmptyCollectionName)
        );
        assert_eq!(validate_collection_name("  Trips ").unwrap(), "Trips");
    }

    #[test]
    fn test_display_names() {
        let collections = vec![Collection {
            id: "A".into(),
            owner_id: "owner".into(),
            name: "Holidays".into(),
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }];
        assert_eq!(collection_display_name(&collections, None), "Uncategorized");
        assert_eq!(collection_display_name(&collections, Some("A")), "Holidays");
        assert_eq!(
            collection_display_name(&collections, Some("Z")),
            "Unknown Collection"
        );
    }
}
