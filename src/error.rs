use thiserror::Error;

/// Errors surfaced by the notification services.
///
/// The HTTP layer maps each kind to a response status: validation failures
/// are client errors, configuration and storage failures are server errors.
#[derive(Debug, Error)]
pub enum NotificationError {
    /// Malformed input, rejected before any state change.
    #[error("{0}")]
    Validation(String),

    /// The server is missing configuration required for the operation.
    #[error("{0}")]
    Configuration(String),

    /// The underlying storage medium failed; the operation had no effect.
    #[error("storage error: {0}")]
    Storage(#[source] anyhow::Error),
}
