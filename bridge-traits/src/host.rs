//! Host Surface Abstractions
//!
//! Interactions that belong to the host's user interface: choosing a save
//! location, showing notifications and revealing a folder. The core only
//! calls these; how they look is up to the host.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// File type filter offered by a save dialog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFilter {
    /// Display name, e.g. "JSON Files"
    pub name: String,
    /// Extensions without the leading dot
    pub extensions: Vec<String>,
}

impl FileFilter {
    pub fn new(name: impl Into<String>, extensions: &[&str]) -> Self {
        Self {
            name: name.into(),
            extensions: extensions.iter().map(|ext| ext.to_string()).collect(),
        }
    }
}

/// Save location prompt
///
/// # Example
///
/// ```ignore
/// use bridge_traits::host::{FileFilter, SaveDialog};
///
/// async fn pick(dialog: &dyn SaveDialog) -> Option<std::path::PathBuf> {
///     let filters = [FileFilter::new("JSON Files", &["json"])];
///     dialog.prompt_save_location("video.json", &filters).await.ok().flatten()
/// }
/// ```
#[async_trait]
pub trait SaveDialog: Send + Sync {
    /// Ask the user where to save `suggested_name`.
    ///
    /// Returns `Ok(None)` when the user dismisses the dialog.
    async fn prompt_save_location(
        &self,
        suggested_name: &str,
        filters: &[FileFilter],
    ) -> Result<Option<PathBuf>>;
}

/// Notification severity as understood by host toast implementations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationSeverity {
    Info,
    Success,
    Warning,
    Error,
}

impl NotificationSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationSeverity::Info => "info",
            NotificationSeverity::Success => "success",
            NotificationSeverity::Warning => "warning",
            NotificationSeverity::Error => "error",
        }
    }
}

impl fmt::Display for NotificationSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user-facing notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub message: String,
    pub severity: NotificationSeverity,
    /// How long the host should keep the notification visible.
    pub duration_ms: u64,
}

impl Notification {
    /// Default display time for notifications that don't specify one.
    pub const DEFAULT_DURATION_MS: u64 = 3000;

    pub fn new(
        title: impl Into<String>,
        message: impl Into<String>,
        severity: NotificationSeverity,
    ) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            severity,
            duration_ms: Self::DEFAULT_DURATION_MS,
        }
    }

    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(title, message, NotificationSeverity::Info)
    }

    pub fn success(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(title, message, NotificationSeverity::Success)
    }

    pub fn warning(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(title, message, NotificationSeverity::Warning)
    }

    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(title, message, NotificationSeverity::Error)
    }

    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }
}

/// Notification sink
///
/// Fire-and-forget: the core never inspects whether a notification was shown,
/// so implementations must not block and should swallow their own failures.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Reveals a directory in the host's file manager.
#[async_trait]
pub trait FolderOpener: Send + Sync {
    async fn open_folder(&self, directory: &Path) -> Result<()>;
}
