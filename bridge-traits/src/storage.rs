//! Storage Abstractions
//!
//! Write primitives used to persist an export: the file writer for the normal
//! path and the clipboard used as the single fallback when writing fails.

use async_trait::async_trait;
use bytes::Bytes;
use std::path::PathBuf;

use crate::error::Result;

/// A single file write issued by the export pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteRequest {
    /// File name component of the destination (used by hosts that write into a
    /// sandboxed directory and only honour the name).
    pub file_name: String,
    /// Serialized export content.
    pub content: Bytes,
    /// Full destination path, already normalized by the core.
    pub destination: PathBuf,
    /// Whether an existing file at `destination` may be replaced.
    pub overwrite: bool,
}

impl WriteRequest {
    pub fn new(
        file_name: impl Into<String>,
        content: impl Into<Bytes>,
        destination: impl Into<PathBuf>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content: content.into(),
            destination: destination.into(),
            overwrite: true,
        }
    }

    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }
}

/// File write capability
///
/// Implementations must not leave a partially written file at the
/// destination when the write fails.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::{FileWriter, WriteRequest};
///
/// async fn save(writer: &dyn FileWriter, json: String) -> Result<()> {
///     let request = WriteRequest::new("video.json", json, "/tmp/video.json");
///     writer.write_file(request).await
/// }
/// ```
#[async_trait]
pub trait FileWriter: Send + Sync {
    /// Write `request.content` to `request.destination`.
    async fn write_file(&self, request: WriteRequest) -> Result<()>;
}

/// Clipboard capability
///
/// Only used as the fallback after a failed write, so a host without a
/// clipboard simply does not provide one.
#[async_trait]
pub trait Clipboard: Send + Sync {
    /// Replace the clipboard contents with `content`.
    async fn copy_text(&self, content: &str) -> Result<()>;
}
