//! Error types for mailroom.

use std::time::Duration;

/// Top-level error type for the intake service.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Mailbox error: {0}")]
    Mailbox(#[from] MailboxError),

    #[error("Record store error: {0}")]
    RecordStore(#[from] RecordStoreError),

    #[error("AI error: {0}")]
    Ai(#[from] AiError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),
}

/// Configuration-related errors. Fatal at startup, never handled per-message.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Mailbox collaborator errors.
#[derive(Debug, thiserror::Error)]
pub enum MailboxError {
    #[error("Mailbox authentication failed: {0}")]
    AuthFailed(String),

    #[error("Failed to fetch message {id}: {reason}")]
    FetchFailed { id: String, reason: String },

    #[error("Attachment download failed for message {id}: {reason}")]
    DownloadFailed { id: String, reason: String },

    #[error("Failed to mark message {id} as processed: {reason}")]
    MarkFailed { id: String, reason: String },

    #[error("Mailbox rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    #[error("Mailbox request failed: {0}")]
    RequestFailed(String),
}

/// Record store (persistence collaborator) errors.
#[derive(Debug, thiserror::Error)]
pub enum RecordStoreError {
    #[error("Record create failed: {0}")]
    CreateFailed(String),

    #[error("Record query failed: {0}")]
    QueryFailed(String),

    #[error("Invalid response from record store: {0}")]
    InvalidResponse(String),

    #[error("Record store rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    #[error("Record store authentication failed")]
    AuthFailed,
}

/// AI collaborator errors (vision and relationship detection; field
/// extraction never fails by contract).
#[derive(Debug, thiserror::Error)]
pub enum AiError {
    #[error("AI request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response from AI collaborator: {0}")]
    InvalidResponse(String),

    #[error("AI collaborator rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Geocoding collaborator errors.
#[derive(Debug, thiserror::Error)]
pub enum GeocodeError {
    #[error("Geocoding request failed: {0}")]
    RequestFailed(String),

    #[error("Geocoding disabled (no API key configured)")]
    Disabled,
}

/// Object-storage upload errors.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Upload failed for {filename}: {reason}")]
    Failed { filename: String, reason: String },

    #[error("Storage authentication failed: {0}")]
    AuthFailed(String),
}

/// Per-message pipeline errors, caught at the batch isolation boundary.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Mailbox error: {0}")]
    Mailbox(#[from] MailboxError),

    #[error("Record store error: {0}")]
    RecordStore(#[from] RecordStoreError),

    #[error("AI error: {0}")]
    Ai(#[from] AiError),

    #[error("Geocoding error: {0}")]
    Geocode(#[from] GeocodeError),

    #[error("Upload error: {0}")]
    Upload(#[from] UploadError),

    #[error("Normalization task failed: {0}")]
    Normalize(String),
}

/// Result type alias for the intake service.
pub type Result<T> = std::result::Result<T, Error>;
