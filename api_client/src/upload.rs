//! Binary upload to the external media host.

use crate::{ApiClientError, MediaKind, ValidationError};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::path::Path;

pub const DEFAULT_UPLOAD_BASE_URL: &str = "https://api.cloudinary.com";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSettings {
    pub base_url: String,
    pub cloud_name: String,
    pub upload_preset: String,
    pub folder: Option<String>,
}

/// A file selected for upload, with the MIME type its source declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(file_name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    pub async fn from_path(path: &Path, mime_type: &str) -> Result<Self, std::io::Error> {
        let file_name = path
            .file_name()
            .and_then(|f| f.to_str())
            .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::InvalidInput, "Invalid file name"))?
            .to_string();
        let bytes = tokio::fs::read(path).await?;
        Ok(Self::new(file_name, mime_type, bytes))
    }

    pub fn kind(&self) -> MediaKind {
        MediaKind::from_mime(&self.mime_type)
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedMedia {
    pub url: String,
    pub kind: MediaKind,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
}

#[derive(Debug, Clone)]
pub struct UploadClient {
    client: reqwest::Client,
    settings: UploadSettings,
}

impl UploadClient {
    pub fn new(settings: UploadSettings) -> Self {
        Self {
            client: reqwest::Client::new(),
            settings,
        }
    }

    /// Upload one file and return its hosted URL. The object stays hosted even
    /// if the caller later fails to record it.
    #[cfg_attr(feature = "trace-spans", tracing::instrument(skip(self, file), fields(file = %file.file_name)))]
    pub async fn upload(&self, file: &UploadFile) -> Result<UploadedMedia, ApiClientError> {
        let kind = file.kind();
        let url = format!(
            "{}/v1_1/{}/{}/upload",
            self.settings.base_url.trim_end_matches('/'),
            self.settings.cloud_name,
            kind
        );

        let part = Part::bytes(file.bytes.clone())
            .file_name(file.file_name.clone())
            .mime_str(&file.mime_type)
            .map_err(|_| ValidationError::InvalidMimeType(file.mime_type.clone()))?;
        let mut form = Form::new()
            .part("file", part)
            .text("upload_preset", self.settings.upload_preset.clone());
        if let Some(folder) = &self.settings.folder {
            form = form.text("folder", folder.clone());
        }

        tracing::debug!(%url, size = file.size(), "uploading media");
        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ApiClientError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ApiClientError::UploadRejected {
                status: status.as_u16(),
                body,
            });
        }

        let uploaded = response
            .json::<UploadResponse>()
            .await
            .map_err(|e| ApiClientError::RemoteRead(format!("malformed upload response: {}", e)))?;
        Ok(UploadedMedia {
            url: uploaded.secure_url,
            kind,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    #[tokio::test]
    async fn test_from_path_reads_bytes() {
        let mut file = Builder::new().suffix(".mp4").tempfile().unwrap();
        write!(file, "frames").unwrap();
        let upload = UploadFile::from_path(file.path(), "video/mp4").await.unwrap();
        assert_eq!(upload.bytes, b"frames");
        assert_eq!(upload.kind(), MediaKind::Video);
        assert!(upload.file_name.ends_with(".mp4"));
    }
}
