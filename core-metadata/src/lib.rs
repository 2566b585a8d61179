//! # Metadata Module
//!
//! Turns raw extractor output into exportable documents.
//!
//! ## Overview
//!
//! This module handles:
//! - Normalizing platform-specific metadata into a canonical record
//! - The per-platform field catalog
//! - Projecting a record onto a user's field selection
//! - Rendering records as JSON or plain text
//!
//! ```text
//! raw JSON ──normalize──> CanonicalRecord ──project──> CanonicalRecord ──serialize──> String
//! ```

pub mod catalog;
pub mod error;
pub mod fields;
pub mod normalizer;
pub mod record;
pub mod selector;
pub mod serializer;

pub use catalog::{available_fields, fields_for, resolve_platform_key, FieldCatalog};
pub use error::{MetadataError, Result};
pub use fields::CanonicalField;
pub use normalizer::MetadataNormalizer;
pub use record::{CanonicalRecord, FieldValue, Presence};
pub use selector::FieldSelector;
pub use serializer::{ExportFormat, Serializer};
