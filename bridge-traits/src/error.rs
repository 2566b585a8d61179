use std::path::PathBuf;
use thiserror::Error;

/// Failure reported by a host capability.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// The host cannot provide the capability right now (no clipboard
    /// owner, no display for a dialog).
    #[error("Host capability unavailable: {0}")]
    NotAvailable(String),

    #[error("Host operation failed: {0}")]
    OperationFailed(String),

    #[error("Destination has no file name: {}", .0.display())]
    NoFileName(PathBuf),

    #[error("Metadata document {} is malformed: {reason}", .path.display())]
    MalformedMetadata { path: PathBuf, reason: String },

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl BridgeError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_names_the_path() {
        let err = BridgeError::io(
            "/exports/clip.json",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(err.to_string(), "I/O error on /exports/clip.json: denied");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_no_file_name_message() {
        let err = BridgeError::NoFileName(PathBuf::from("/exports/"));
        assert_eq!(err.to_string(), "Destination has no file name: /exports/");
    }
}
