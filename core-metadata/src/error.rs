use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("No metadata received from source")]
    MissingSourceData,

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, MetadataError>;
