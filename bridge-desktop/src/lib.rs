//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! - `FileWriter` using `tokio::fs` with staged writes
//! - `MetadataSource` reading `.info.json` files
//! - `Clipboard` using `arboard`
//! - `SaveDialog` using `rfd`
//! - `Notifier` routed through `tracing`
//! - `FolderOpener` spawning the platform file manager
//!
//! ## Feature Flags
//!
//! - `clipboard`: OS clipboard integration (default)
//! - `native-dialogs`: native save dialog (pulls in the platform GUI toolkit)
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{InfoJsonSource, TokioFileWriter};
//! use bridge_traits::{FileWriter, MetadataSource};
//!
//! #[tokio::main]
//! async fn main() {
//!     let source = InfoJsonSource::new();
//!     let writer = TokioFileWriter::new();
//!
//!     // Use in exporter configuration
//! }
//! ```

mod filesystem;
mod folder;
mod notifier;
mod source;

#[cfg(feature = "clipboard")]
mod clipboard;
#[cfg(feature = "native-dialogs")]
mod dialog;

pub use filesystem::{default_export_directory, TokioFileWriter};
pub use folder::SystemFolderOpener;
pub use notifier::TracingNotifier;
pub use source::InfoJsonSource;

#[cfg(feature = "clipboard")]
pub use clipboard::SystemClipboard;
#[cfg(feature = "native-dialogs")]
pub use dialog::DialogSaveLocation;
