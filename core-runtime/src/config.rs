//! # Exporter Configuration
//!
//! Builder-based configuration holding every host capability and setting the
//! export core needs.
//!
//! ## Overview
//!
//! [`ExporterConfigBuilder`] collects bridge implementations and plain
//! settings, then [`build()`](ExporterConfigBuilder::build) fills in defaults
//! and validates the result. Missing capabilities fail fast with an
//! actionable [`Error::CapabilityMissing`].
//!
//! ## Required Dependencies
//!
//! - `MetadataSource` - where raw metadata comes from
//!
//! ## Dependencies with Desktop Defaults
//!
//! With the `desktop-shims` feature these fall back to `bridge-desktop`
//! adapters; without it they must be injected:
//!
//! - `FileWriter` - `TokioFileWriter`
//! - `Notifier` - `TracingNotifier`
//! - `FolderOpener` - `SystemFolderOpener`
//!
//! ## Optional Dependencies
//!
//! - `Clipboard` - write-failure fallback (desktop default with `clipboard`)
//! - `SaveDialog` - answers `browse` (desktop default with `native-dialogs`)
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::ExporterConfig;
//! use std::sync::Arc;
//!
//! let config = ExporterConfig::builder()
//!     .metadata_source(Arc::new(MySource))
//!     .export_dir("/home/me/Downloads")
//!     .channel_capacity(64)
//!     .build()?;
//! ```

use crate::error::{Error, Result};
use crate::events::DEFAULT_CHANNEL_CAPACITY;
use bridge_traits::{
    Clipboard, Clock, FileWriter, FolderOpener, MetadataSource, Notifier, SaveDialog,
    SystemClock,
};
use std::path::PathBuf;
use std::sync::Arc;

/// Output format used when a `convert` command does not name one.
pub const DEFAULT_FORMAT: &str = "json";

/// Upper bound for the progress channel buffer.
const MAX_CHANNEL_CAPACITY: usize = 10_000;

/// Configuration for the export core.
///
/// Use [`ExporterConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct ExporterConfig {
    /// Where raw metadata is fetched from
    pub metadata_source: Arc<dyn MetadataSource>,

    /// Persists serialized exports
    pub file_writer: Arc<dyn FileWriter>,

    /// Surfaces user-facing notifications
    pub notifier: Arc<dyn Notifier>,

    /// Reveals the destination folder on `open-folder`
    pub folder_opener: Arc<dyn FolderOpener>,

    /// Fallback target when a write fails
    pub clipboard: Option<Arc<dyn Clipboard>>,

    /// Answers `browse` commands
    pub save_dialog: Option<Arc<dyn SaveDialog>>,

    /// Time source for text-format timestamps
    pub clock: Arc<dyn Clock>,

    /// Directory used for default destination paths
    pub export_dir: PathBuf,

    /// Format used when a command does not specify one
    pub default_format: String,

    /// Buffer size of the progress channel
    pub channel_capacity: usize,
}

impl std::fmt::Debug for ExporterConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExporterConfig")
            .field("metadata_source", &"MetadataSource { ... }")
            .field("file_writer", &"FileWriter { ... }")
            .field("notifier", &"Notifier { ... }")
            .field("folder_opener", &"FolderOpener { ... }")
            .field("clipboard", &self.clipboard.as_ref().map(|_| "Clipboard { ... }"))
            .field(
                "save_dialog",
                &self.save_dialog.as_ref().map(|_| "SaveDialog { ... }"),
            )
            .field("export_dir", &self.export_dir)
            .field("default_format", &self.default_format)
            .field("channel_capacity", &self.channel_capacity)
            .finish()
    }
}

impl ExporterConfig {
    /// Creates a new builder for constructing an `ExporterConfig`.
    pub fn builder() -> ExporterConfigBuilder {
        ExporterConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - Channel capacity is > 0 and <= 10,000
    /// - Export directory is not empty
    /// - Default format is a non-empty alphanumeric name
    pub fn validate(&self) -> Result<()> {
        if self.channel_capacity == 0 {
            return Err(Error::Config(
                "Channel capacity must be greater than 0".to_string(),
            ));
        }

        if self.channel_capacity > MAX_CHANNEL_CAPACITY {
            return Err(Error::Config(format!(
                "Channel capacity exceeds maximum of {}",
                MAX_CHANNEL_CAPACITY
            )));
        }

        if self.export_dir.as_os_str().is_empty() {
            return Err(Error::Config("Export directory cannot be empty".to_string()));
        }

        if self.default_format.is_empty()
            || !self
                .default_format
                .chars()
                .all(|c| c.is_ascii_alphanumeric())
        {
            return Err(Error::Config(format!(
                "Invalid default format '{}'",
                self.default_format
            )));
        }

        Ok(())
    }
}

// ============================================================================
// Desktop defaults
// ============================================================================

#[cfg(feature = "desktop-shims")]
fn provide_default_file_writer() -> Result<Arc<dyn FileWriter>> {
    Ok(Arc::new(bridge_desktop::TokioFileWriter::new()))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_file_writer() -> Result<Arc<dyn FileWriter>> {
    Err(Error::missing(
        "FileWriter",
        "FileWriter implementation is required to persist exports. \
         Desktop: enable the 'desktop-shims' feature to use TokioFileWriter. \
         Other hosts: inject a writer backed by the platform storage API.",
    ))
}

#[cfg(feature = "desktop-shims")]
fn provide_default_notifier() -> Result<Arc<dyn Notifier>> {
    Ok(Arc::new(bridge_desktop::TracingNotifier::new()))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_notifier() -> Result<Arc<dyn Notifier>> {
    Err(Error::missing(
        "Notifier",
        "Notifier implementation is required to report export outcomes. \
         Desktop: enable the 'desktop-shims' feature to use TracingNotifier.",
    ))
}

#[cfg(feature = "desktop-shims")]
fn provide_default_folder_opener() -> Result<Arc<dyn FolderOpener>> {
    Ok(Arc::new(bridge_desktop::SystemFolderOpener::new()))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_folder_opener() -> Result<Arc<dyn FolderOpener>> {
    Err(Error::missing(
        "FolderOpener",
        "FolderOpener implementation is required for open-folder commands. \
         Desktop: enable the 'desktop-shims' feature to use SystemFolderOpener.",
    ))
}

#[cfg(feature = "clipboard")]
fn provide_default_clipboard() -> Option<Arc<dyn Clipboard>> {
    Some(Arc::new(bridge_desktop::SystemClipboard::new()))
}

#[cfg(not(feature = "clipboard"))]
fn provide_default_clipboard() -> Option<Arc<dyn Clipboard>> {
    None
}

#[cfg(feature = "native-dialogs")]
fn provide_default_save_dialog(export_dir: &std::path::Path) -> Option<Arc<dyn SaveDialog>> {
    Some(Arc::new(bridge_desktop::DialogSaveLocation::with_start_dir(export_dir)))
}

#[cfg(not(feature = "native-dialogs"))]
fn provide_default_save_dialog(_export_dir: &std::path::Path) -> Option<Arc<dyn SaveDialog>> {
    None
}

#[cfg(feature = "desktop-shims")]
fn provide_default_export_dir() -> Result<PathBuf> {
    Ok(bridge_desktop::default_export_directory())
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_export_dir() -> Result<PathBuf> {
    Err(Error::Config(
        "Export directory is required. Use .export_dir() to set it.".to_string(),
    ))
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for constructing [`ExporterConfig`] instances.
#[derive(Default)]
pub struct ExporterConfigBuilder {
    metadata_source: Option<Arc<dyn MetadataSource>>,
    file_writer: Option<Arc<dyn FileWriter>>,
    notifier: Option<Arc<dyn Notifier>>,
    folder_opener: Option<Arc<dyn FolderOpener>>,
    clipboard: Option<Arc<dyn Clipboard>>,
    save_dialog: Option<Arc<dyn SaveDialog>>,
    clock: Option<Arc<dyn Clock>>,
    export_dir: Option<PathBuf>,
    default_format: Option<String>,
    channel_capacity: Option<usize>,
    without_clipboard: bool,
    without_save_dialog: bool,
}

impl std::fmt::Debug for ExporterConfigBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExporterConfigBuilder")
            .field("metadata_source", &self.metadata_source.is_some())
            .field("file_writer", &self.file_writer.is_some())
            .field("notifier", &self.notifier.is_some())
            .field("folder_opener", &self.folder_opener.is_some())
            .field("clipboard", &self.clipboard.is_some())
            .field("save_dialog", &self.save_dialog.is_some())
            .field("export_dir", &self.export_dir)
            .field("default_format", &self.default_format)
            .field("channel_capacity", &self.channel_capacity)
            .finish()
    }
}

impl ExporterConfigBuilder {
    /// Sets the metadata source (required).
    pub fn metadata_source(mut self, source: Arc<dyn MetadataSource>) -> Self {
        self.metadata_source = Some(source);
        self
    }

    /// Sets the file writer.
    pub fn file_writer(mut self, writer: Arc<dyn FileWriter>) -> Self {
        self.file_writer = Some(writer);
        self
    }

    /// Sets the notifier.
    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Sets the folder opener.
    pub fn folder_opener(mut self, opener: Arc<dyn FolderOpener>) -> Self {
        self.folder_opener = Some(opener);
        self
    }

    /// Sets the clipboard used as write-failure fallback.
    pub fn clipboard(mut self, clipboard: Arc<dyn Clipboard>) -> Self {
        self.clipboard = Some(clipboard);
        self
    }

    /// Disables the clipboard fallback, including the desktop default.
    pub fn without_clipboard(mut self) -> Self {
        self.clipboard = None;
        self.without_clipboard = true;
        self
    }

    /// Sets the save dialog that answers `browse`.
    pub fn save_dialog(mut self, dialog: Arc<dyn SaveDialog>) -> Self {
        self.save_dialog = Some(dialog);
        self
    }

    /// Disables the save dialog, including the desktop default.
    pub fn without_save_dialog(mut self) -> Self {
        self.save_dialog = None;
        self.without_save_dialog = true;
        self
    }

    /// Sets the clock. Default: [`SystemClock`].
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Sets the directory used for default destination paths.
    pub fn export_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.export_dir = Some(dir.into());
        self
    }

    /// Sets the format used when a command names none. Default: `json`.
    pub fn default_format(mut self, format: impl Into<String>) -> Self {
        self.default_format = Some(format.into());
        self
    }

    /// Sets the progress channel buffer size. Default: 100.
    pub fn channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = Some(capacity);
        self
    }

    /// Builds the final `ExporterConfig` instance.
    ///
    /// # Returns
    ///
    /// Returns an error if:
    /// - No `MetadataSource` was provided
    /// - A capability without a desktop default is missing
    /// - Configuration values are invalid
    pub fn build(self) -> Result<ExporterConfig> {
        let metadata_source = self.metadata_source.ok_or_else(|| {
            Error::missing(
                "MetadataSource",
                "MetadataSource implementation is required. Use .metadata_source() to set it.",
            )
        })?;

        let file_writer = match self.file_writer {
            Some(writer) => writer,
            None => provide_default_file_writer()?,
        };

        let notifier = match self.notifier {
            Some(notifier) => notifier,
            None => provide_default_notifier()?,
        };

        let folder_opener = match self.folder_opener {
            Some(opener) => opener,
            None => provide_default_folder_opener()?,
        };

        let export_dir = match self.export_dir {
            Some(dir) => dir,
            None => provide_default_export_dir()?,
        };

        let clipboard = match (self.clipboard, self.without_clipboard) {
            (Some(clipboard), _) => Some(clipboard),
            (None, true) => None,
            (None, false) => provide_default_clipboard(),
        };

        let save_dialog = match (self.save_dialog, self.without_save_dialog) {
            (Some(dialog), _) => Some(dialog),
            (None, true) => None,
            (None, false) => provide_default_save_dialog(&export_dir),
        };

        let config = ExporterConfig {
            metadata_source,
            file_writer,
            notifier,
            folder_opener,
            clipboard,
            save_dialog,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            export_dir,
            default_format: self
                .default_format
                .unwrap_or_else(|| DEFAULT_FORMAT.to_string())
                .to_ascii_lowercase(),
            channel_capacity: self.channel_capacity.unwrap_or(DEFAULT_CHANNEL_CAPACITY),
        };

        config.validate()?;

        Ok(config)
    }
}
