//! File writer implementation using Tokio

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    storage::{FileWriter, WriteRequest},
};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

/// Directory exports land in when the caller gives no location.
///
/// Prefers the user's download directory, then their home directory, then the
/// system temp directory.
pub fn default_export_directory() -> PathBuf {
    dirs::download_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(std::env::temp_dir)
}

/// Tokio-based file writer
///
/// Content is written to a hidden staging file next to the destination and
/// renamed into place once fully flushed, so a failed write never leaves a
/// truncated export behind.
#[derive(Debug, Clone, Default)]
pub struct TokioFileWriter {
    create_parents: bool,
}

impl TokioFileWriter {
    /// Create a writer that creates missing parent directories.
    pub fn new() -> Self {
        Self {
            create_parents: true,
        }
    }

    /// Create a writer that fails when the destination directory is missing.
    pub fn without_parent_creation() -> Self {
        Self {
            create_parents: false,
        }
    }

    fn staging_path(destination: &Path) -> Result<PathBuf> {
        let file_name = destination
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| BridgeError::NoFileName(destination.to_path_buf()))?;

        Ok(destination.with_file_name(format!(".{}.partial", file_name)))
    }

    async fn write_staged(staging: &Path, content: &[u8]) -> Result<()> {
        let io_error = |e| BridgeError::io(staging, e);

        let mut file = fs::File::create(staging).await.map_err(io_error)?;
        file.write_all(content).await.map_err(io_error)?;
        file.flush().await.map_err(io_error)?;
        file.sync_all().await.map_err(io_error)?;
        Ok(())
    }
}

#[async_trait]
impl FileWriter for TokioFileWriter {
    async fn write_file(&self, request: WriteRequest) -> Result<()> {
        let destination = request.destination.as_path();

        if !request.overwrite
            && fs::try_exists(destination)
                .await
                .map_err(|e| BridgeError::io(destination, e))?
        {
            return Err(BridgeError::OperationFailed(format!(
                "Refusing to replace existing file: {}",
                destination.display()
            )));
        }

        if let Some(parent) = destination.parent() {
            if self.create_parents && !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .await
                    .map_err(|e| BridgeError::io(parent, e))?;
            }
        }

        let staging = Self::staging_path(destination)?;

        if let Err(err) = Self::write_staged(&staging, &request.content).await {
            fs::remove_file(&staging).await.ok();
            return Err(err);
        }

        if let Err(err) = fs::rename(&staging, destination).await {
            warn!(path = ?destination, error = %err, "Failed to move staged export into place");
            fs::remove_file(&staging).await.ok();
            return Err(BridgeError::io(destination, err));
        }

        debug!(
            path = ?destination,
            name = %request.file_name,
            size = request.content.len(),
            "Wrote export file"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_staging_path_is_hidden_sibling() {
        let staging = TokioFileWriter::staging_path(Path::new("/tmp/out/video.json")).unwrap();
        assert_eq!(staging, PathBuf::from("/tmp/out/.video.json.partial"));
    }

    #[test]
    fn test_staging_path_requires_file_name() {
        assert!(matches!(
            TokioFileWriter::staging_path(Path::new("/")),
            Err(BridgeError::NoFileName(_))
        ));
    }
}
