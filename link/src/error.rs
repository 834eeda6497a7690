//! Error types for folio-link.

use thiserror::Error;

/// Errors surfaced by the backend client.
///
/// Remote failures keep the backend's message verbatim so call sites (and
/// the data-bound handles) can show it unmodified. Use
/// [`message`](FolioError::message) for that text rather than the `Display`
/// form, which adds context.
#[derive(Error, Debug)]
pub enum FolioError {
    /// Client construction or configuration problems.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Any failure reported while talking to the backend's REST surface,
    /// transport failures included.
    #[error("Backend error on '{table}': {message}")]
    Backend {
        table: String,
        /// Backend error code (e.g. `42P01` for a missing relation), when
        /// the response carried one.
        code: Option<String>,
        message: String,
    },

    /// A single-row lookup matched nothing.
    #[error("No row in '{table}' with id '{id}'")]
    RowNotFound { table: String, id: String },

    /// A single-row lookup matched more than one row.
    #[error("Expected one row in '{table}' with id '{id}', found {count}")]
    RowConflict {
        table: String,
        id: String,
        count: usize,
    },

    /// Change feed transport or protocol failure.
    #[error("Change feed error: {0}")]
    Feed(String),

    /// A response body could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),

    /// The form relay rejected or failed to deliver a submission.
    #[error("Relay error: {0}")]
    Relay(String),
}

impl FolioError {
    /// The raw, user-facing message.
    ///
    /// For remote failures this is the backend's text exactly as received;
    /// for local failures it is the failure description without the
    /// `Display` prefix.
    pub fn message(&self) -> String {
        match self {
            FolioError::Configuration(msg)
            | FolioError::Feed(msg)
            | FolioError::Decode(msg)
            | FolioError::Relay(msg) => msg.clone(),
            FolioError::Backend { message, .. } => message.clone(),
            FolioError::RowNotFound { .. } | FolioError::RowConflict { .. } => self.to_string(),
        }
    }

    /// The backend's error code, when this is a backend failure that
    /// carried one.
    pub fn backend_code(&self) -> Option<&str> {
        match self {
            FolioError::Backend { code, .. } => code.as_deref(),
            _ => None,
        }
    }
}

/// Result type for folio-link operations
pub type Result<T> = std::result::Result<T, FolioError>;
