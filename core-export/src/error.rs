use bridge_traits::error::BridgeError;
use core_metadata::MetadataError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("No metadata available for this item")]
    MissingSourceData,

    #[error("Metadata source unavailable: {0}")]
    SourceUnavailable(BridgeError),

    #[error("Invalid destination path: {0}")]
    InvalidDestinationPath(String),

    #[error("Failed to write file: {0}")]
    Write(BridgeError),

    #[error("Cannot save empty content")]
    EmptyContent,

    #[error("Could not save file directly, content copied to clipboard instead ({0})")]
    SavedToClipboard(BridgeError),

    #[error("Invalid state transition from {from} to {to}: {reason}")]
    InvalidStateTransition {
        from: String,
        to: String,
        reason: String,
    },

    #[error("Metadata error: {0}")]
    Metadata(MetadataError),
}

impl ExportError {
    /// True when the content reached the clipboard instead of the file.
    pub fn is_clipboard_fallback(&self) -> bool {
        matches!(self, ExportError::SavedToClipboard(_))
    }
}

impl From<MetadataError> for ExportError {
    fn from(error: MetadataError) -> Self {
        match error {
            MetadataError::MissingSourceData => ExportError::MissingSourceData,
            other => ExportError::Metadata(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, ExportError>;
