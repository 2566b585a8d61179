//! Native save dialog via `rfd`

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    host::{FileFilter, SaveDialog},
};
use std::path::PathBuf;

/// Save dialog using the platform's native file chooser.
#[derive(Debug, Clone, Default)]
pub struct DialogSaveLocation {
    start_dir: Option<PathBuf>,
}

impl DialogSaveLocation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the dialog in `dir` instead of the platform default.
    pub fn with_start_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            start_dir: Some(dir.into()),
        }
    }
}

#[async_trait]
impl SaveDialog for DialogSaveLocation {
    async fn prompt_save_location(
        &self,
        suggested_name: &str,
        filters: &[FileFilter],
    ) -> Result<Option<PathBuf>> {
        let name = suggested_name.to_string();
        let filters = filters.to_vec();
        let start_dir = self.start_dir.clone();

        // The dialog handle may hold a non-Send window handle, so it is built
        // and driven entirely on the blocking pool.
        tokio::task::spawn_blocking(move || {
            let mut dialog = rfd::FileDialog::new().set_file_name(name);
            if let Some(dir) = start_dir {
                dialog = dialog.set_directory(dir);
            }
            for filter in &filters {
                dialog = dialog.add_filter(filter.name.clone(), &filter.extensions);
            }
            dialog.save_file()
        })
        .await
        .map_err(|e| BridgeError::OperationFailed(format!("Save dialog task failed: {}", e)))
    }
}
