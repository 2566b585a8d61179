//! Workspace placeholder crate.
//!
//! This crate exists to expose shared feature flags that map to the individual
//! workspace crates (e.g., `core-service`, `core-metadata`). Host applications
//! can depend on `metadata-exporter` and enable the documented features without
//! needing to wire each crate individually.
//!
//! - `desktop-shims` (default): export service with desktop bridge adapters
//! - `clipboard` (default): arboard-backed clipboard fallback
//! - `native-dialogs`: rfd-backed save dialog for `browse`
//! - `formats`: only the pure normalize/select/serialize layer

#[cfg(feature = "desktop-shims")]
pub use core_service as service;

#[cfg(feature = "formats")]
pub use core_metadata as metadata;
