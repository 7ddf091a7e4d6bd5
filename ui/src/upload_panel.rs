//! Sequential multi-file upload.
//!
//! Each file is uploaded to the media host and then recorded in the store
//! before the next one starts.

use crate::command::{Command, Program};
use crate::toast::{Toast, Toasts};
use crate::Backend;
use api_client::{ApiClientError, MediaKind, UploadFile, ValidationError};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UploadSummary {
    pub succeeded: usize,
    pub failed: usize,
}

#[derive(Debug)]
pub enum UploadMessage {
    SetKind(MediaKind),
    SetTargetCollection(Option<String>),
    FilesSelected(Vec<UploadFile>),
    Start,
    FileFinished(usize, Result<String, ApiClientError>),
    DismissToast(usize),
}

pub fn format_file_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = 1024.0 * 1024.0;
    let size = bytes as f64;
    if size < KB {
        format!("{} B", bytes)
    } else if size < MB {
        format!("{:.1} KB", size / KB)
    } else {
        format!("{:.1} MB", size / MB)
    }
}

pub struct UploadPanel {
    backend: Backend,
    kind: MediaKind,
    target_collection: Option<String>,
    files: Vec<UploadFile>,
    uploading: bool,
    progress: u8,
    summary: UploadSummary,
    refresh_requested: bool,
    toasts: Toasts,
}

impl UploadPanel {
    pub fn new(backend: Backend, error_log: Option<PathBuf>) -> Self {
        Self {
            backend,
            kind: MediaKind::Image,
            target_collection: None,
            files: Vec::new(),
            uploading: false,
            progress: 0,
            summary: UploadSummary::default(),
            refresh_requested: false,
            toasts: Toasts::new(error_log),
        }
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn target_collection(&self) -> Option<&str> {
        self.target_collection.as_deref()
    }

    pub fn files(&self) -> &[UploadFile] {
        &self.files
    }

    pub fn is_uploading(&self) -> bool {
        self.uploading
    }

    /// Percentage of the current batch that has finished.
    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn summary(&self) -> UploadSummary {
        self.summary
    }

    /// e.g. `2 files (1.5 MB)`
    pub fn selection_label(&self) -> String {
        let total: u64 = self.files.iter().map(UploadFile::size).sum();
        let noun = if self.files.len() == 1 { "file" } else { "files" };
        format!("{} {} ({})", self.files.len(), noun, format_file_size(total))
    }

    /// True once after a batch with at least one success.
    pub fn take_refresh_request(&mut self) -> bool {
        std::mem::take(&mut self.refresh_requested)
    }

    pub fn toasts(&self) -> &[Toast] {
        self.toasts.items()
    }

    pub fn take_toasts(&mut self) -> Vec<Toast> {
        self.toasts.take()
    }

    /// Start the next accepted file at or after `index`. Files outside the
    /// selected kind are counted as failures without leaving this loop.
    fn start_file(&mut self, mut index: usize) -> Command<UploadMessage> {
        let file = loop {
            let Some(file) = self.files.get(index).cloned() else {
                self.finish();
                return Command::none();
            };
            if self.kind.accepts_mime(&file.mime_type) {
                break file;
            }
            tracing::warn!(file = %file.file_name, kind = %self.kind, "file rejected by upload filter");
            let err = ApiClientError::Validation(ValidationError::InvalidMimeType(file.mime_type));
            self.record_result(index, Err(err));
            index += 1;
        };

        let backend = self.backend.clone();
        let collection = self.target_collection.clone();
        Command::perform(
            async move {
                let uploaded = backend.uploads.upload(&file).await?;
                backend
                    .store
                    .create_media_record(
                        &backend.owner_id,
                        &uploaded.url,
                        uploaded.kind,
                        collection.as_deref(),
                    )
                    .await
                    .map_err(|e| {
                        tracing::warn!(url = %uploaded.url, "hosted media left without a record");
                        e
                    })
            },
            move |result| UploadMessage::FileFinished(index, result),
        )
    }

    fn record_result(&mut self, index: usize, result: Result<String, ApiClientError>) {
        match result {
            Ok(id) => {
                tracing::info!(media_id = %id, "media uploaded");
                self.summary.succeeded += 1;
            }
            Err(err) => {
                let name = self
                    .files
                    .get(index)
                    .map(|f| f.file_name.as_str())
                    .unwrap_or_default();
                tracing::error!(file = %name, error = %err, "upload failed");
                self.summary.failed += 1;
            }
        }
        let total = self.files.len().max(1);
        self.progress = (((index + 1) as f64 / total as f64) * 100.0).round() as u8;
    }

    fn finish(&mut self) {
        self.uploading = false;
        let UploadSummary { succeeded, failed } = self.summary;
        tracing::info!(succeeded, failed, "upload batch finished");
        if succeeded > 0 {
            self.refresh_requested = true;
        }
        if failed == 0 {
            self.toasts.success(
                "Upload complete",
                format!("{} file(s) uploaded successfully", succeeded),
            );
        } else {
            self.toasts.error(
                "Upload finished with errors",
                format!("{} uploaded, {} failed", succeeded, failed),
            );
        }
        // A batch with no success keeps its selection for a retry.
        if succeeded > 0 {
            self.files.clear();
        }
    }
}

impl Program for UploadPanel {
    type Message = UploadMessage;

    fn update(&mut self, message: UploadMessage) -> Command<UploadMessage> {
        match message {
            UploadMessage::SetKind(_)
            | UploadMessage::SetTargetCollection(_)
            | UploadMessage::FilesSelected(_)
                if self.uploading =>
            {
                tracing::debug!("selection is locked while a batch is uploading");
            }
            UploadMessage::SetKind(kind) => {
                self.kind = kind;
            }
            UploadMessage::SetTargetCollection(collection) => {
                self.target_collection = collection;
            }
            UploadMessage::FilesSelected(files) => {
                self.files = files;
            }
            UploadMessage::Start => {
                if self.uploading {
                    return Command::none();
                }
                if self.files.is_empty() {
                    self.toasts
                        .error("No files selected", "Please select files to upload");
                    return Command::none();
                }
                self.uploading = true;
                self.progress = 0;
                self.summary = UploadSummary::default();
                return self.start_file(0);
            }
            UploadMessage::FileFinished(index, result) => {
                if !self.uploading {
                    return Command::none();
                }
                self.record_result(index, result);
                return self.start_file(index + 1);
            }
            UploadMessage::DismissToast(index) => {
                self.toasts.dismiss(index);
            }
        }
        Command::none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(512), "512 B");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(2 * 1024 * 1024), "2.0 MB");
    }
}
