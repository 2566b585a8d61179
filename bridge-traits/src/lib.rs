//! # Host Bridge Traits
//!
//! Capability traits the export core consumes but never implements itself.
//!
//! ## Overview
//!
//! This crate defines the contract between the metadata export core and the
//! host it runs in (a desktop shell, a browser extension backend, a test
//! harness). Each trait is one narrow capability; the core only depends on the
//! behaviour documented here.
//!
//! ## Traits
//!
//! ### Metadata
//! - [`MetadataSource`](source::MetadataSource) - Raw provider metadata lookup
//!
//! ### Persistence
//! - [`FileWriter`](storage::FileWriter) - Write an export to its destination
//! - [`Clipboard`](storage::Clipboard) - Fallback target when a write fails
//!
//! ### Host Surface
//! - [`SaveDialog`](host::SaveDialog) - Ask the user for a destination path
//! - [`Notifier`](host::Notifier) - Fire-and-forget user notifications
//! - [`FolderOpener`](host::FolderOpener) - Reveal the export directory
//!
//! ### Utilities
//! - [`Clock`](time::Clock) - Time source for deterministic output
//! - [`LoggerSink`](time::LoggerSink) - Forward structured logs to host logging
//!
//! ## Fail-Fast Strategy
//!
//! Required capabilities are checked when the configuration is built, not when
//! a job first needs them:
//!
//! ```ignore
//! let writer = config.file_writer
//!     .ok_or_else(|| Error::CapabilityMissing {
//!         capability: "FileWriter".to_string(),
//!         message: "No file writer provided. \
//!                  Desktop: enable the 'desktop-shims' feature.".to_string(),
//!     })?;
//! ```
//!
//! ## Error Handling
//!
//! Every fallible operation returns [`BridgeError`](error::BridgeError).
//! Implementations convert platform errors into it and keep the message
//! actionable (include the path or locator involved).
//!
//! ## Thread Safety
//!
//! All traits require `Send + Sync`; the core shares them across tokio tasks
//! behind `Arc`.

pub mod error;
pub mod host;
pub mod source;
pub mod storage;
pub mod time;

pub use error::BridgeError;

// Re-export commonly used types
pub use host::{FileFilter, FolderOpener, Notification, NotificationSeverity, Notifier, SaveDialog};
pub use source::MetadataSource;
pub use storage::{Clipboard, FileWriter, WriteRequest};
pub use time::{Clock, ConsoleLogger, FixedClock, LogEntry, LogLevel, LoggerSink, SystemClock};
