//! # Export Pipeline
//!
//! Drives one [`ExportJob`] through normalize → filter → serialize → persist.
//!
//! ## Workflow
//!
//! 1. Clean up the destination path
//! 2. Fetch raw metadata from the source (or reuse supplied metadata)
//! 3. Normalize into a canonical record
//! 4. Project onto the selected fields
//! 5. Serialize in the requested format
//! 6. Write the file, copying to the clipboard if the write fails
//!
//! Progress checkpoints (10, 30, 35, 50, 70, 85, 100) are published on the
//! [`ProgressChannel`] under the job's token and never go backwards. Every
//! failure ends the job in `Failed` and produces exactly one notification.

use crate::destination::{normalize_destination, Destination};
use crate::error::{ExportError, Result};
use crate::job::{ExportJob, ExportState};
use bridge_traits::{
    BridgeError, Clipboard, FileWriter, MetadataSource, Notification, Notifier, WriteRequest,
};
use core_metadata::{
    CanonicalField, ExportFormat, FieldSelector, FieldValue, MetadataNormalizer, Serializer,
};
use core_runtime::events::{Action, JobToken, ProgressChannel};
use core_runtime::logging::strip_path;
use core_runtime::ExporterConfig;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// Title of the notification shown when the content went to the clipboard.
pub const FALLBACK_TITLE: &str = "Save Failed - Content Copied";
/// Message of the notification shown when the content went to the clipboard.
pub const FALLBACK_MESSAGE: &str =
    "Could not save file directly, content copied to clipboard instead";
/// Display time of the clipboard fallback notification.
pub const FALLBACK_DURATION_MS: u64 = 5000;

/// What a successful export produced.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportReport {
    pub token: JobToken,
    pub save_path: String,
    pub format: ExportFormat,
    pub platform_key: Option<String>,
    /// Fields written, in canonical order
    pub fields: Vec<CanonicalField>,
    /// Size of the written content
    pub bytes: usize,
}

/// Final job state together with the result of the run.
#[derive(Debug)]
pub struct JobOutcome {
    pub job: ExportJob,
    pub result: Result<ExportReport>,
}

impl JobOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Runs export jobs against the configured capabilities.
#[derive(Clone)]
pub struct ExportPipeline {
    source: Arc<dyn MetadataSource>,
    writer: Arc<dyn FileWriter>,
    clipboard: Option<Arc<dyn Clipboard>>,
    notifier: Arc<dyn Notifier>,
    channel: ProgressChannel,
    normalizer: MetadataNormalizer,
    serializer: Serializer,
}

impl fmt::Debug for ExportPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExportPipeline")
            .field("clipboard", &self.clipboard.is_some())
            .field("channel", &self.channel)
            .finish_non_exhaustive()
    }
}

impl ExportPipeline {
    pub fn new(config: &ExporterConfig, channel: ProgressChannel) -> Self {
        Self {
            source: Arc::clone(&config.metadata_source),
            writer: Arc::clone(&config.file_writer),
            clipboard: config.clipboard.clone(),
            notifier: Arc::clone(&config.notifier),
            channel,
            normalizer: MetadataNormalizer::new(),
            serializer: Serializer::new(Arc::clone(&config.clock)),
        }
    }

    pub fn channel(&self) -> &ProgressChannel {
        &self.channel
    }

    /// Runs `job` to a terminal state.
    #[instrument(name = "export_job", skip_all, fields(job = %job.token, format = %job.format))]
    pub async fn run(&self, mut job: ExportJob) -> JobOutcome {
        debug!(destination = %strip_path(&job.destination), fields = job.selected_fields.len(), "Starting export");

        let result = self.execute(&mut job).await;

        match &result {
            Ok(report) => info!(
                file = %strip_path(&report.save_path),
                bytes = report.bytes,
                "Export completed"
            ),
            Err(err) => self.report_failure(&mut job, err),
        }

        JobOutcome { job, result }
    }

    async fn execute(&self, job: &mut ExportJob) -> Result<ExportReport> {
        self.checkpoint(job, 10.0, "Starting export");

        let destination = normalize_destination(&job.destination, job.format)?;
        debug!(file = %strip_path(&destination.path), "Destination resolved");

        let raw = self.obtain_metadata(job).await?;

        job.transition(ExportState::Normalizing)?;
        let record = self.normalizer.normalize(&raw)?;
        if let Some(extractor) = record
            .get(CanonicalField::ExtractorName)
            .and_then(FieldValue::as_text)
        {
            job.adopt_extractor_platform(extractor);
        }
        self.checkpoint(job, 50.0, "Metadata normalized");

        job.transition(ExportState::Filtering)?;
        self.log_catalog_coverage(job);
        let mut selector = FieldSelector::new();
        if let Some(name) = &job.display_name {
            selector = selector.with_display_name(name.clone());
        }
        let projected = selector.project(&record, &job.selected_fields);

        job.transition(ExportState::Serializing)?;
        let content = self.serializer.serialize(&projected, job.format)?;
        if content.trim().is_empty() {
            return Err(ExportError::EmptyContent);
        }
        self.checkpoint(job, 70.0, "Metadata serialized");

        job.transition(ExportState::Writing)?;
        self.checkpoint(job, 85.0, "Writing file");
        let bytes = content.len();
        self.persist(&destination, content).await?;

        job.succeed()?;
        self.channel
            .update_progress(&job.token, job.progress.percent, &job.progress.phase);

        let label = job.format.label();
        self.channel.send(
            &job.token,
            Action::ShowSuccessPopup {
                save_path: destination.path.clone(),
                format: label.to_string(),
            },
        );
        self.notifier.notify(Notification::success(
            "Metadata Exported",
            format!("Saved {} metadata to {}", label, destination.path),
        ));

        Ok(ExportReport {
            token: job.token.clone(),
            save_path: destination.path,
            format: job.format,
            platform_key: job.platform_key(),
            fields: projected.fields().collect(),
            bytes,
        })
    }

    async fn obtain_metadata(&self, job: &mut ExportJob) -> Result<Value> {
        if let Some(locator) = job.source_locator.clone() {
            job.transition(ExportState::FetchingMetadata)?;
            self.checkpoint(job, 30.0, "Fetching metadata");

            let raw = self
                .source
                .fetch_metadata(&locator)
                .await
                .map_err(ExportError::SourceUnavailable)?;

            self.checkpoint(job, 35.0, "Metadata received");
            return Ok(raw);
        }

        match job.supplied_metadata.clone() {
            Some(raw) => {
                debug!("No source locator, using supplied metadata");
                self.checkpoint(job, 35.0, "Using supplied metadata");
                Ok(raw)
            }
            None => Err(ExportError::MissingSourceData),
        }
    }

    async fn persist(&self, destination: &Destination, content: String) -> Result<()> {
        let request = WriteRequest::new(
            destination.file_name.clone(),
            content.clone(),
            destination.as_path_buf(),
        );

        match self.writer.write_file(request).await {
            Ok(()) => Ok(()),
            Err(write_error) => Err(self.fall_back_to_clipboard(&content, write_error).await),
        }
    }

    async fn fall_back_to_clipboard(&self, content: &str, write_error: BridgeError) -> ExportError {
        let Some(clipboard) = &self.clipboard else {
            return ExportError::Write(write_error);
        };

        warn!(error = %write_error, "Write failed, copying content to clipboard");
        match clipboard.copy_text(content).await {
            Ok(()) => ExportError::SavedToClipboard(write_error),
            Err(clipboard_error) => {
                warn!(error = %clipboard_error, "Clipboard fallback failed");
                ExportError::Write(write_error)
            }
        }
    }

    fn checkpoint(&self, job: &mut ExportJob, percent: f64, phase: &str) {
        let published = job.progress.advance(percent, phase);
        self.channel.update_progress(&job.token, published, phase);
    }

    fn log_catalog_coverage(&self, job: &ExportJob) {
        let available = job.available_fields();
        let outside: Vec<&str> = job
            .selected_fields
            .iter()
            .filter_map(|name| CanonicalField::from_name(name))
            .filter(|field| !available.contains(field))
            .map(CanonicalField::name)
            .collect();

        debug!(
            platform = job.platform_key().as_deref().unwrap_or("default"),
            available = available.len(),
            selected = job.selected_fields.len(),
            "Filtering fields"
        );
        if !outside.is_empty() {
            debug!(fields = ?outside, "Selected fields not offered for this platform");
        }
    }

    fn report_failure(&self, job: &mut ExportJob, err: &ExportError) {
        if !job.state.is_terminal() {
            if let Err(transition_error) = job.fail(err.to_string()) {
                warn!(error = %transition_error, "Could not mark job failed");
            }
        }

        let notification = if err.is_clipboard_fallback() {
            warn!(error = %err, "Export saved to clipboard instead of file");
            Notification::warning(FALLBACK_TITLE, FALLBACK_MESSAGE)
                .with_duration_ms(FALLBACK_DURATION_MS)
        } else {
            error!(error = %err, state = %job.state, "Export failed");
            Notification::error("Export Failed", err.to_string())
        };

        self.notifier.notify(notification);
    }
}
