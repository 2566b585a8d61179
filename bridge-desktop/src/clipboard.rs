//! System clipboard via `arboard`

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    storage::Clipboard,
};
use tracing::debug;

/// Clipboard backed by the OS clipboard.
///
/// `arboard` handles are blocking and not guaranteed to be `Send`, so each
/// copy opens a fresh handle on the blocking pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClipboard;

impl SystemClipboard {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Clipboard for SystemClipboard {
    async fn copy_text(&self, content: &str) -> Result<()> {
        let text = content.to_string();
        let size = text.len();

        tokio::task::spawn_blocking(move || -> Result<()> {
            let mut clipboard = arboard::Clipboard::new()
                .map_err(|e| BridgeError::NotAvailable(format!("Clipboard unavailable: {}", e)))?;
            clipboard
                .set_text(text)
                .map_err(|e| BridgeError::OperationFailed(format!("Clipboard write failed: {}", e)))
        })
        .await
        .map_err(|e| BridgeError::OperationFailed(format!("Clipboard task failed: {}", e)))??;

        debug!(size, "Copied export to clipboard");
        Ok(())
    }
}
