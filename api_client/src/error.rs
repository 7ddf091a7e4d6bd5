use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiClientError {
    #[error("Network Error: {0}")]
    Network(String),
    #[error("Remote Read Error: {0}")]
    RemoteRead(String),
    #[error("Remote Write Error: {0}")]
    RemoteWrite(String),
    #[error("Upload Rejected ({status}): {body}")]
    UploadRejected { status: u16, body: String },
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Client-side input problems. These block submission and never reach the network.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please enter both email and password")]
    MissingCredentials,
    #[error("Password must be at least {min} characters")]
    PasswordTooShort { min: usize },
    #[error("Passwords do not match")]
    PasswordMismatch,
    #[error("Collection name must not be empty")]
    EmptyCollectionName,
    #[error("Invalid MIME type: {0}")]
    InvalidMimeType(String),
}
