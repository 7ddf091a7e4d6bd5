//! API client module for the MediaVault document store and media host.

mod document;
mod error;
mod upload;

pub use error::{ApiClientError, ValidationError};
pub use upload::{UploadClient, UploadFile, UploadSettings, UploadedMedia, DEFAULT_UPLOAD_BASE_URL};

use chrono::{DateTime, Utc};
use document::{string_value, nullable_value, Document, RunQueryRow};
use reqwest::header::AUTHORIZATION;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_STORE_BASE_URL: &str = "https://firestore.googleapis.com";

const MEDIA_COLLECTION: &str = "media";
const COLLECTIONS_COLLECTION: &str = "collections";

/// Coarse media classification, fixed when the item is uploaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// `video/*` is a video, everything else is treated as an image.
    pub fn from_mime(mime_type: &str) -> Self {
        if mime_type.starts_with("video/") {
            MediaKind::Video
        } else {
            MediaKind::Image
        }
    }

    /// Whether a file with this MIME type belongs to this kind's upload tab.
    pub fn accepts_mime(&self, mime_type: &str) -> bool {
        match self {
            MediaKind::Image => mime_type.starts_with("image/"),
            MediaKind::Video => mime_type.starts_with("video/"),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaKind {
    type Err = ApiClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "image" => Ok(MediaKind::Image),
            "video" => Ok(MediaKind::Video),
            other => Err(ApiClientError::RemoteRead(format!(
                "unknown resource type: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaItem {
    pub id: String,
    #[serde(rename = "userId")]
    pub owner_id: String,
    pub media_url: String,
    #[serde(rename = "resourceType")]
    pub kind: MediaKind,
    pub collection_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    pub id: String,
    #[serde(rename = "userId")]
    pub owner_id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Where the document store lives and which project it serves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreSettings {
    pub base_url: String,
    pub project_id: String,
}

impl StoreSettings {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_STORE_BASE_URL.to_string(),
            project_id: project_id.into(),
        }
    }
}

/// Stateless transport over the document store. Every call is a single
/// request/response with no retry and no caching.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    id_token: String,
    base_url: String,
    project_id: String,
}

impl ApiClient {
    pub fn new(settings: &StoreSettings, id_token: String) -> Self {
        ApiClient {
            client: reqwest::Client::new(),
            id_token,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            project_id: settings.project_id.clone(),
        }
    }

    pub fn set_id_token(&mut self, token: String) {
        self.id_token = token;
    }

    fn documents_url(&self) -> String {
        format!(
            "{}/v1/projects/{}/databases/(default)/documents",
            self.base_url, self.project_id
        )
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.id_token)
    }

    #[cfg_attr(feature = "trace-spans", tracing::instrument(skip(self)))]
    pub async fn create_media_record(
        &self,
        owner_id: &str,
        media_url: &str,
        kind: MediaKind,
        collection_id: Option<&str>,
    ) -> Result<String, ApiClientError> {
        let body = json!({
            "fields": {
                "userId": string_value(owner_id),
                "mediaUrl": string_value(media_url),
                "resourceType": string_value(kind.as_str()),
                "collectionId": nullable_value(collection_id),
            }
        });
        self.create_document(MEDIA_COLLECTION, body).await
    }

    #[cfg_attr(feature = "trace-spans", tracing::instrument(skip(self)))]
    pub async fn create_collection(&self, owner_id: &str, name: &str) -> Result<String, ApiClientError> {
        let body = json!({
            "fields": {
                "userId": string_value(owner_id),
                "name": string_value(name),
            }
        });
        self.create_document(COLLECTIONS_COLLECTION, body).await
    }

    #[cfg_attr(feature = "trace-spans", tracing::instrument(skip(self)))]
    pub async fn list_media(&self, owner_id: &str) -> Result<Vec<MediaItem>, ApiClientError> {
        let documents = self.query_by_owner(MEDIA_COLLECTION, owner_id).await?;
        let mut items = documents
            .into_iter()
            .map(MediaItem::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(items)
    }

    #[cfg_attr(feature = "trace-spans", tracing::instrument(skip(self)))]
    pub async fn list_collections(&self, owner_id: &str) -> Result<Vec<Collection>, ApiClientError> {
        let documents = self.query_by_owner(COLLECTIONS_COLLECTION, owner_id).await?;
        let mut collections = documents
            .into_iter()
            .map(Collection::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        collections.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(collections)
    }

    /// Replace the collection reference of one media record. No version
    /// precondition is sent, so concurrent writers race and the last one wins.
    #[cfg_attr(feature = "trace-spans", tracing::instrument(skip(self)))]
    pub async fn update_media_collection_ref(
        &self,
        media_id: &str,
        collection_id: Option<&str>,
    ) -> Result<(), ApiClientError> {
        let url = format!(
            "{}/{}/{}?updateMask.fieldPaths=collectionId",
            self.documents_url(),
            MEDIA_COLLECTION,
            media_id
        );
        tracing::debug!(%url, "updating collection reference");
        let body = json!({
            "fields": { "collectionId": nullable_value(collection_id) }
        });

        let response = self
            .client
            .patch(&url)
            .header(AUTHORIZATION, self.bearer())
            .json(&body)
            .send()
            .await
            .map_err(|e| ApiClientError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ApiClientError::RemoteWrite(error_text(response).await));
        }
        Ok(())
    }

    /// Remove a media record. The hosted object behind its URL is left alone.
    #[cfg_attr(feature = "trace-spans", tracing::instrument(skip(self)))]
    pub async fn delete_media_record(&self, media_id: &str) -> Result<(), ApiClientError> {
        let url = format!("{}/{}/{}", self.documents_url(), MEDIA_COLLECTION, media_id);
        tracing::debug!(%url, "deleting media record");

        let response = self
            .client
            .delete(&url)
            .header(AUTHORIZATION, self.bearer())
            .send()
            .await
            .map_err(|e| ApiClientError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ApiClientError::RemoteWrite(error_text(response).await));
        }
        Ok(())
    }

    async fn create_document(
        &self,
        collection: &str,
        body: serde_json::Value,
    ) -> Result<String, ApiClientError> {
        let url = format!("{}/{}", self.documents_url(), collection);
        tracing::debug!(%url, "creating document");

        let response = self
            .client
            .post(&url)
            .header(AUTHORIZATION, self.bearer())
            .json(&body)
            .send()
            .await
            .map_err(|e| ApiClientError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ApiClientError::RemoteWrite(error_text(response).await));
        }

        let document = response
            .json::<Document>()
            .await
            .map_err(|e| ApiClientError::RemoteWrite(format!("malformed create response: {}", e)))?;
        document
            .id()
            .map(str::to_string)
            .map_err(|e| ApiClientError::RemoteWrite(e.to_string()))
    }

    async fn query_by_owner(
        &self,
        collection: &str,
        owner_id: &str,
    ) -> Result<Vec<Document>, ApiClientError> {
        let url = format!("{}:runQuery", self.documents_url());
        tracing::debug!(%url, collection, "querying documents");
        let body = json!({
            "structuredQuery": {
                "from": [{ "collectionId": collection }],
                "where": {
                    "fieldFilter": {
                        "field": { "fieldPath": "userId" },
                        "op": "EQUAL",
                        "value": string_value(owner_id),
                    }
                }
            }
        });

        let response = self
            .client
            .post(&url)
            .header(AUTHORIZATION, self.bearer())
            .json(&body)
            .send()
            .await
            .map_err(|e| ApiClientError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ApiClientError::RemoteRead(error_text(response).await));
        }

        let rows = response
            .json::<Vec<RunQueryRow>>()
            .await
            .map_err(|e| ApiClientError::RemoteRead(e.to_string()))?;
        Ok(rows.into_iter().filter_map(|row| row.document).collect())
    }
}

async fn error_text(response: reqwest::Response) -> String {
    let status = response.status();
    let text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    format!("{}: {}", status, text)
}

impl TryFrom<Document> for MediaItem {
    type Error = ApiClientError;

    fn try_from(document: Document) -> Result<Self, Self::Error> {
        Ok(MediaItem {
            id: document.id()?.to_string(),
            owner_id: document.string("userId")?,
            media_url: document.string("mediaUrl")?,
            kind: document.string("resourceType")?.parse()?,
            collection_id: document.nullable_string("collectionId")?,
            created_at: document.created_at()?,
        })
    }
}

impl TryFrom<Document> for Collection {
    type Error = ApiClientError;

    fn try_from(document: Document) -> Result<Self, Self::Error> {
        Ok(Collection {
            id: document.id()?.to_string(),
            owner_id: document.string("userId")?,
            name: document.string("name")?,
            created_at: document.created_at()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_mime() {
        assert_eq!(MediaKind::from_mime("video/mp4"), MediaKind::Video);
        assert_eq!(MediaKind::from_mime("image/png"), MediaKind::Image);
        assert_eq!(MediaKind::from_mime("application/octet-stream"), MediaKind::Image);
        assert!(MediaKind::Video.accepts_mime("video/webm"));
        assert!(!MediaKind::Image.accepts_mime("video/webm"));
    }

    #[test]
    fn test_parse_media_document() {
        let json = r#"{
            "name": "projects/p/databases/(default)/documents/media/abc123",
            "fields": {
                "userId": {"stringValue": "u1"},
                "mediaUrl": {"stringValue": "https://cdn.example.com/a.jpg"},
                "resourceType": {"stringValue": "image"},
                "collectionId": {"nullValue": null}
            },
            "createTime": "2024-03-01T10:00:00.123456Z",
            "updateTime": "2024-03-01T10:00:00.123456Z"
        }"#;
        let document: Document = serde_json::from_str(json).unwrap();
        let item = MediaItem::try_from(document).unwrap();
        assert_eq!(item.id, "abc123");
        assert_eq!(item.owner_id, "u1");
        assert_eq!(item.kind, MediaKind::Image);
        assert!(item.collection_id.is_none());
    }

    #[test]
    fn test_prefers_created_at_field() {
        let json = r#"{
            "name": "projects/p/databases/(default)/documents/collections/c1",
            "fields": {
                "userId": {"stringValue": "u1"},
                "name": {"stringValue": "Trips"},
                "createdAt": {"timestampValue": "2023-01-01T00:00:00Z"}
            },
            "createTime": "2024-03-01T10:00:00Z"
        }"#;
        let document: Document = serde_json::from_str(json).unwrap();
        let collection = Collection::try_from(document).unwrap();
        assert_eq!(collection.created_at.to_rfc3339(), "2023-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_malformed_document_is_read_error() {
        let json = r#"{
            "name": "projects/p/databases/(default)/documents/media/x",
            "fields": {
                "userId": {"stringValue": "u1"},
                "resourceType": {"stringValue": "image"}
            },
            "createTime": "2024-03-01T10:00:00Z"
        }"#;
        let document: Document = serde_json::from_str(json).unwrap();
        let err = MediaItem::try_from(document).unwrap_err();
        assert!(matches!(err, ApiClientError::RemoteRead(_)));
    }

    #[test]
    fn test_unknown_kind_is_read_error() {
        let json = r#"{
            "name": "projects/p/databases/(default)/documents/media/x",
            "fields": {
                "userId": {"stringValue": "u1"},
                "mediaUrl": {"stringValue": "u"},
                "resourceType": {"stringValue": "audio"}
            },
            "createTime": "2024-03-01T10:00:00Z"
        }"#;
        let document: Document = serde_json::from_str(json).unwrap();
        assert!(matches!(
            MediaItem::try_from(document),
            Err(ApiClientError::RemoteRead(_))
        ));
    }
}
