//! Metadata source backed by `.info.json` files.
//!
//! Downloaders in the yt-dlp family can write the extractor output next to the
//! media file. This source reads those files so the export core can run
//! without network access.

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    source::MetadataSource,
};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Reads raw metadata from a JSON file named by the locator.
#[derive(Debug, Clone, Default)]
pub struct InfoJsonSource {
    base_dir: Option<PathBuf>,
}

impl InfoJsonSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative locators against `base_dir`.
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: Some(base_dir.into()),
        }
    }

    fn resolve(&self, locator: &str) -> PathBuf {
        let path = Path::new(locator);
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }
}

#[async_trait]
impl MetadataSource for InfoJsonSource {
    async fn fetch_metadata(&self, locator: &str) -> Result<Value> {
        let path = self.resolve(locator);
        let data = fs::read(&path)
            .await
            .map_err(|e| BridgeError::io(&path, e))?;

        let value: Value =
            serde_json::from_slice(&data).map_err(|e| BridgeError::MalformedMetadata {
                path: path.clone(),
                reason: e.to_string(),
            })?;

        debug!(path = ?path, size = data.len(), "Loaded info.json metadata");
        Ok(value)
    }
}
