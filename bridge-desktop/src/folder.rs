//! Reveal a directory in the platform file manager

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    host::FolderOpener,
};
use std::path::Path;
use tokio::process::Command;
use tracing::debug;

#[cfg(target_os = "windows")]
const OPENER: &str = "explorer";
#[cfg(target_os = "macos")]
const OPENER: &str = "open";
#[cfg(not(any(target_os = "windows", target_os = "macos")))]
const OPENER: &str = "xdg-open";

/// Opens folders with `explorer`, `open` or `xdg-open`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemFolderOpener;

impl SystemFolderOpener {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl FolderOpener for SystemFolderOpener {
    async fn open_folder(&self, directory: &Path) -> Result<()> {
        if !tokio::fs::try_exists(directory)
            .await
            .map_err(|e| BridgeError::io(directory, e))?
        {
            return Err(BridgeError::OperationFailed(format!(
                "Folder does not exist: {}",
                directory.display()
            )));
        }

        let status = Command::new(OPENER)
            .arg(directory)
            .status()
            .await
            .map_err(|e| BridgeError::io(directory, e))?;

        // explorer.exe reports 1 even when the window opened
        if !status.success() && !cfg!(target_os = "windows") {
            return Err(BridgeError::OperationFailed(format!(
                "{} exited with {}",
                OPENER, status
            )));
        }

        debug!(path = ?directory, opener = OPENER, "Opened folder");
        Ok(())
    }
}
