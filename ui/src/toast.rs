use std::fmt;
use std::io::Write;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
}

/// A short user-visible notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub kind: ToastKind,
    pub title: String,
    pub description: String,
}

impl Toast {
    pub fn success(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            kind: ToastKind::Success,
            title: title.into(),
            description: description.into(),
        }
    }

    pub fn error(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            kind: ToastKind::Error,
            title: title.into(),
            description: description.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.kind == ToastKind::Error
    }
}

impl fmt::Display for Toast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.description.is_empty() {
            write!(f, "{}", self.title)
        } else {
            write!(f, "{}: {}", self.title, self.description)
        }
    }
}

/// Pending toasts of one controller. Error toasts are also appended to the
/// error log file when one is configured.
#[derive(Debug, Clone, Default)]
pub struct Toasts {
    items: Vec<Toast>,
    error_log: Option<PathBuf>,
}

impl Toasts {
    pub fn new(error_log: Option<PathBuf>) -> Self {
        Self {
            items: Vec::new(),
            error_log,
        }
    }

    pub fn push(&mut self, toast: Toast) {
        match toast.kind {
            ToastKind::Success => tracing::info!(%toast, "toast"),
            ToastKind::Error => {
                tracing::error!(%toast, "toast");
                self.log_error(&toast.to_string());
            }
        }
        self.items.push(toast);
    }

    pub fn success(&mut self, title: impl Into<String>, description: impl Into<String>) {
        self.push(Toast::success(title, description));
    }

    pub fn error(&mut self, title: impl Into<String>, description: impl Into<String>) {
        self.push(Toast::error(title, description));
    }

    /// Take over toasts a child already logged.
    pub fn absorb(&mut self, toasts: Vec<Toast>) {
        self.items.extend(toasts);
    }

    pub fn items(&self) -> &[Toast] {
        &self.items
    }

    pub fn last(&self) -> Option<&Toast> {
        self.items.last()
    }

    pub fn error_count(&self) -> usize {
        self.items.iter().filter(|t| t.is_error()).count()
    }

    pub fn dismiss(&mut self, index: usize) {
        if index < self.items.len() {
            self.items.remove(index);
        }
    }

    pub fn take(&mut self) -> Vec<Toast> {
        std::mem::take(&mut self.items)
    }

    fn log_error(&self, msg: &str) {
        let Some(path) = &self.error_log else {
            return;
        };
        if let Ok(mut file) = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
        {
            let _ = writeln!(file, "{}", msg);
        }
    }
}
