//! # Export Job State Machine
//!
//! Lifecycle of a single export with validated state transitions.
//!
//! ## State Machine
//!
//! ```text
//! Idle → FetchingMetadata → Normalizing → Filtering → Serializing → Writing → Succeeded
//!   │            │               │            │             │           │
//!   └────────────┴───────────────┴────────────┴─────────────┴───────────┴──→ Failed
//! ```
//!
//! `Idle → Normalizing` is allowed when the job has no source locator and
//! carries previously supplied metadata instead.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use core_export::{ExportJob, ExportState};
//! use core_metadata::ExportFormat;
//! use core_runtime::events::JobToken;
//!
//! let mut job = ExportJob::new(JobToken::new("panel-1"), ExportFormat::Json, "/tmp/clip.json")
//!     .with_source("https://example.com/watch?v=1")
//!     .with_selected_fields(["title", "views"]);
//!
//! job.transition(ExportState::FetchingMetadata)?;
//! ```

use crate::error::{ExportError, Result};
use chrono::Utc;
use core_metadata::{fields_for, resolve_platform_key, CanonicalField, ExportFormat};
use core_runtime::events::{clamp_percent, JobToken};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

// ============================================================================
// State
// ============================================================================

/// Where an export job is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExportState {
    Idle,
    FetchingMetadata,
    Normalizing,
    Filtering,
    Serializing,
    Writing,
    Succeeded,
    Failed,
}

impl ExportState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ExportState::Succeeded | ExportState::Failed)
    }

    /// Started but not finished.
    pub fn is_active(&self) -> bool {
        !self.is_terminal() && *self != ExportState::Idle
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExportState::Idle => "idle",
            ExportState::FetchingMetadata => "fetching-metadata",
            ExportState::Normalizing => "normalizing",
            ExportState::Filtering => "filtering",
            ExportState::Serializing => "serializing",
            ExportState::Writing => "writing",
            ExportState::Succeeded => "succeeded",
            ExportState::Failed => "failed",
        }
    }
}

impl fmt::Display for ExportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Progress
// ============================================================================

/// Monotonic progress of one job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobProgress {
    /// Progress percentage (0-100), never decreasing
    pub percent: u8,
    /// Label of the last checkpoint
    pub phase: String,
}

impl JobProgress {
    pub fn new() -> Self {
        Self {
            percent: 0,
            phase: "Idle".to_string(),
        }
    }

    /// Records a checkpoint and returns the percentage to publish.
    ///
    /// Values are clamped to 0-100; a checkpoint below the current value
    /// keeps the current value.
    pub fn advance(&mut self, percent: f64, phase: &str) -> u8 {
        let requested = clamp_percent(percent);
        if requested >= self.percent {
            self.percent = requested;
        }
        self.phase = phase.to_string();
        self.percent
    }
}

impl Default for JobProgress {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Job
// ============================================================================

/// A single export request and its lifecycle state.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportJob {
    /// Panel/job token the job reports to
    pub token: JobToken,
    /// Where to fetch metadata from; `None` reuses `supplied_metadata`
    pub source_locator: Option<String>,
    /// Raw platform identifier (extractor key)
    pub platform: Option<String>,
    /// Canonical field names to export
    pub selected_fields: Vec<String>,
    pub format: ExportFormat,
    /// Destination path as requested, before normalization
    pub destination: String,
    /// Metadata supplied with the download, used without a locator
    pub supplied_metadata: Option<Value>,
    /// Name used for the fallback title
    pub display_name: Option<String>,
    pub state: ExportState,
    pub progress: JobProgress,
    pub error_message: Option<String>,
    pub created_at: i64,
    pub completed_at: Option<i64>,
}

impl ExportJob {
    /// Creates a job in `Idle` state.
    pub fn new(token: JobToken, format: ExportFormat, destination: impl Into<String>) -> Self {
        Self {
            token,
            source_locator: None,
            platform: None,
            selected_fields: Vec::new(),
            format,
            destination: destination.into(),
            supplied_metadata: None,
            display_name: None,
            state: ExportState::Idle,
            progress: JobProgress::new(),
            error_message: None,
            created_at: Utc::now().timestamp(),
            completed_at: None,
        }
    }

    pub fn with_source(mut self, locator: impl Into<String>) -> Self {
        let locator = locator.into();
        self.source_locator = (!locator.trim().is_empty()).then_some(locator);
        self
    }

    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = Some(platform.into());
        self
    }

    pub fn with_selected_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selected_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_supplied_metadata(mut self, metadata: Value) -> Self {
        self.supplied_metadata = Some(metadata);
        self
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Uses `extractor` as the platform when the job was built without one.
    pub fn adopt_extractor_platform(&mut self, extractor: &str) {
        let extractor = extractor.trim();
        if self.platform.is_none() && !extractor.is_empty() {
            self.platform = Some(extractor.to_string());
        }
    }

    /// Normalized catalog key for this job's platform, if one was given.
    pub fn platform_key(&self) -> Option<String> {
        self.platform.as_deref().map(resolve_platform_key)
    }

    /// Catalog fields offered for this job's platform.
    pub fn available_fields(&self) -> &'static [CanonicalField] {
        fields_for(&self.platform_key().unwrap_or_default())
    }

    /// Moves the job to `to`, rejecting illegal transitions.
    pub fn transition(&mut self, to: ExportState) -> Result<()> {
        self.validate_transition(to)?;
        self.state = to;
        if to.is_terminal() {
            self.completed_at = Some(Utc::now().timestamp());
        }
        Ok(())
    }

    /// Marks the job succeeded.
    pub fn succeed(&mut self) -> Result<()> {
        self.transition(ExportState::Succeeded)?;
        self.progress.advance(100.0, "Export complete");
        Ok(())
    }

    /// Marks the job failed with `message`.
    pub fn fail(&mut self, message: impl Into<String>) -> Result<()> {
        self.transition(ExportState::Failed)?;
        self.error_message = Some(message.into());
        self.progress.phase = "Failed".to_string();
        Ok(())
    }

    fn validate_transition(&self, to: ExportState) -> Result<()> {
        use ExportState::*;

        let valid = match (self.state, to) {
            (Idle, FetchingMetadata) => {
                if self.source_locator.is_none() {
                    return Err(self.rejected(to, "Fetching requires a source locator"));
                }
                true
            }
            (Idle, Normalizing) => {
                if self.source_locator.is_some() {
                    return Err(self.rejected(to, "Jobs with a source locator must fetch first"));
                }
                true
            }
            (FetchingMetadata, Normalizing) => true,
            (Normalizing, Filtering) => true,
            (Filtering, Serializing) => true,
            (Serializing, Writing) => true,
            (Writing, Succeeded) => true,

            // Terminal states cannot transition
            (Succeeded, _) | (Failed, _) => false,

            (_, Failed) => true,

            _ => false,
        };

        if !valid {
            return Err(self.rejected(
                to,
                &format!("Cannot transition from {} to {}", self.state, to),
            ));
        }

        Ok(())
    }

    fn rejected(&self, to: ExportState, reason: &str) -> ExportError {
        ExportError::InvalidStateTransition {
            from: self.state.as_str().to_string(),
            to: to.as_str().to_string(),
            reason: reason.to_string(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
