//! # Core Runtime Module
//!
//! Foundational runtime infrastructure for the metadata exporter:
//! - Logging and tracing bootstrap
//! - Exporter configuration and capability wiring
//! - The progress channel shared by jobs and observers
//!
//! ## Overview
//!
//! Every other core crate depends on this one. It establishes the logging
//! conventions, decides which host capabilities are injected, and defines the
//! envelope protocol used to drive and observe export jobs.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use config::{ExporterConfig, ExporterConfigBuilder};
pub use error::{Error, Result};
pub use events::{Action, Envelope, JobToken, PanelState, ProgressChannel, ProgressEvent};
