//! Error types for the folio CLI.
//!
//! Link-layer failures are rendered from their raw backend message so the
//! terminal output matches what the backend actually said.

use folio_link::FolioError;
use std::fmt;

/// Result type for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// Errors that can occur in the CLI.
#[derive(Debug)]
pub enum CliError {
    /// Error from the folio-link library.
    Link(FolioError),

    /// Invalid flag combination or argument value.
    Usage(String),

    /// Terminal/file I/O error.
    Io(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Link(e) => write!(f, "{}", e.message()),
            CliError::Usage(msg) => write!(f, "Usage error: {}", msg),
            CliError::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for CliError {}

impl From<FolioError> for CliError {
    fn from(err: FolioError) -> Self {
        CliError::Link(err)
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CliError::Usage("unknown table".into());
        assert_eq!(err.to_string(), "Usage error: unknown table");

        let err = CliError::from(FolioError::Feed("socket closed".into()));
        assert_eq!(err.to_string(), "socket closed");
    }
}
