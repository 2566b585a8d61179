//! # Export Sessions
//!
//! An [`ExportSession`] is the core side of one export panel. It owns a job
//! token, listens on the [`ProgressChannel`] for that token's commands and
//! answers them:
//!
//! | Command | Response |
//! |---------|----------|
//! | `convert` | runs an [`ExportJob`] bracketed by disable/enable-convert-button |
//! | `browse` | asks the [`SaveDialog`](bridge_traits::SaveDialog) and publishes `update-save-path` |
//! | `open-folder` | opens the directory containing the given path |
//! | `show-no-metadata-notification` | notifies the user |
//! | `cancel` | stops listening |
//!
//! Only one export may run per token at a time; a `convert` received while
//! one is running is logged and dropped. Sessions for different tokens run
//! independently and share only the [`ActiveJobs`] registry.

use bridge_traits::Notification;
use core_export::{ExportJob, ExportPipeline};
use core_metadata::ExportFormat;
use core_runtime::events::{Action, JobToken, ProgressChannel, RecvError};
use core_runtime::ExporterConfig;
use serde_json::Value;
use std::collections::HashSet;
use std::path::{Path, MAIN_SEPARATOR};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Base name used when the download has no usable name.
pub const DEFAULT_BASE_NAME: &str = "metadata";

// ============================================================================
// Download Context
// ============================================================================

/// What the session knows about the item being exported.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DownloadContext {
    /// Locator passed to the metadata source
    pub source_locator: Option<String>,
    /// Directory the item was downloaded to
    pub location: Option<String>,
    /// File name of the downloaded item
    pub name: String,
    /// Extractor identifier, e.g. `youtube:tab`
    pub extractor_key: Option<String>,
    /// Metadata captured at download time
    pub metadata: Option<Value>,
}

impl DownloadContext {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_source(mut self, locator: impl Into<String>) -> Self {
        self.source_locator = Some(locator.into());
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_extractor(mut self, extractor_key: impl Into<String>) -> Self {
        self.extractor_key = Some(extractor_key.into());
        self
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Download name without its last extension, or [`DEFAULT_BASE_NAME`].
    pub fn base_name(&self) -> &str {
        let name = self.name.trim();
        let stem = match name.rfind('.') {
            Some(index) if index > 0 && !name[index + 1..].contains(['/', '\\']) => &name[..index],
            _ => name,
        };

        if stem.is_empty() {
            DEFAULT_BASE_NAME
        } else {
            stem
        }
    }

    /// Destination used when a `convert` names no path.
    ///
    /// The download location (or `fallback_dir`) joined with the base name
    /// and the format's extension.
    pub fn default_path(&self, fallback_dir: &Path, format: ExportFormat) -> String {
        let mut directory = match self.location.as_deref().map(str::trim) {
            Some(location) if !location.is_empty() => location.to_string(),
            _ => fallback_dir.to_string_lossy().into_owned(),
        };

        if !directory.is_empty() && !directory.ends_with(['/', '\\']) {
            directory.push(MAIN_SEPARATOR);
        }

        format!("{}{}.{}", directory, self.base_name(), format.extension())
    }
}

/// Everything up to and including the last path separator.
pub fn containing_directory(path: &str) -> &str {
    match path.rfind(['/', '\\']) {
        Some(index) => &path[..=index],
        None => "",
    }
}

// ============================================================================
// Active Job Registry
// ============================================================================

/// Tokens with an export in flight.
#[derive(Debug, Clone, Default)]
pub struct ActiveJobs {
    tokens: Arc<Mutex<HashSet<JobToken>>>,
}

impl ActiveJobs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `token` active, or returns `None` if it already is.
    ///
    /// The token is released when the returned guard is dropped.
    pub fn try_claim(&self, token: &JobToken) -> Option<ActiveJobGuard> {
        if !self.lock().insert(token.clone()) {
            return None;
        }

        Some(ActiveJobGuard {
            token: token.clone(),
            registry: self.clone(),
        })
    }

    pub fn is_active(&self, token: &JobToken) -> bool {
        self.lock().contains(token)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn release(&self, token: &JobToken) {
        self.lock().remove(token);
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<JobToken>> {
        self.tokens
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Releases its token from [`ActiveJobs`] on drop.
#[derive(Debug)]
pub struct ActiveJobGuard {
    token: JobToken,
    registry: ActiveJobs,
}

impl ActiveJobGuard {
    pub fn token(&self) -> &JobToken {
        &self.token
    }
}

impl Drop for ActiveJobGuard {
    fn drop(&mut self) {
        self.registry.release(&self.token);
    }
}

// ============================================================================
// Session
// ============================================================================

/// Handle to a running session.
#[derive(Debug)]
pub struct SessionHandle {
    token: JobToken,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl SessionHandle {
    pub fn token(&self) -> &JobToken {
        &self.token
    }

    /// Stops the session. A running export still finishes.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Waits for the session loop to exit.
    pub async fn join(self) {
        if let Err(err) = self.task.await {
            warn!(job = %self.token, error = %err, "Session task ended abnormally");
        }
    }
}

/// Listens for one token's commands and runs its exports.
pub struct ExportSession {
    token: JobToken,
    context: Arc<DownloadContext>,
    config: ExporterConfig,
    pipeline: ExportPipeline,
    channel: ProgressChannel,
    active: ActiveJobs,
    cancel: CancellationToken,
}

impl std::fmt::Debug for ExportSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportSession")
            .field("token", &self.token)
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

impl ExportSession {
    pub fn new(
        token: JobToken,
        context: DownloadContext,
        config: ExporterConfig,
        channel: ProgressChannel,
        active: ActiveJobs,
    ) -> Self {
        let pipeline = ExportPipeline::new(&config, channel.clone());
        Self {
            token,
            context: Arc::new(context),
            config,
            pipeline,
            channel,
            active,
            cancel: CancellationToken::new(),
        }
    }

    pub fn token(&self) -> &JobToken {
        &self.token
    }

    /// Destination a `convert` without a path writes to.
    pub fn default_path(&self, format: ExportFormat) -> String {
        self.context.default_path(&self.config.export_dir, format)
    }

    /// Subscribes to the channel and runs the session on the current runtime.
    ///
    /// Commands published after this returns are seen by the session.
    pub fn spawn(self) -> SessionHandle {
        let stream = self
            .channel
            .stream()
            .for_job(self.token.clone())
            .commands()
            .deduplicate();

        let token = self.token.clone();
        let cancel = self.cancel.clone();
        let task = tokio::spawn(self.run(stream));

        SessionHandle {
            token,
            cancel,
            task,
        }
    }

    #[instrument(name = "export_session", skip_all, fields(job = %self.token))]
    async fn run(self, mut stream: core_runtime::events::EnvelopeStream) {
        info!("Export session started");

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    debug!("Session cancelled");
                    break;
                }
                received = stream.recv() => match received {
                    Ok(envelope) => {
                        if !self.handle(envelope.action).await {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Session fell behind the channel, commands dropped");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }

        info!("Export session ended");
    }

    /// Handles one command. Returns false when the session should stop.
    async fn handle(&self, action: Action) -> bool {
        debug!(action = action.name(), "Command received");

        match action {
            Action::Convert {
                format,
                save_path,
                selected_fields,
            } => {
                self.start_convert(format, save_path, selected_fields);
            }
            Action::Browse { format } => self.browse(format).await,
            Action::OpenFolder { save_path } => self.open_folder(&save_path).await,
            Action::ShowNoMetadataNotification => {
                self.config.notifier.notify(Notification::error(
                    "No Metadata Available",
                    "No metadata found for this video.",
                ));
            }
            Action::Cancel => {
                self.cancel.cancel();
                return false;
            }
            other => debug!(action = other.name(), "Ignoring non-command action"),
        }

        true
    }

    fn resolve_format(&self, requested: Option<String>) -> ExportFormat {
        let name = requested
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| self.config.default_format.clone());
        ExportFormat::from_name_lenient(&name)
    }

    fn start_convert(
        &self,
        format: Option<String>,
        save_path: Option<String>,
        selected_fields: Vec<String>,
    ) {
        let Some(guard) = self.active.try_claim(&self.token) else {
            warn!("Export already running, ignoring convert");
            return;
        };

        let format = self.resolve_format(format);
        let destination = save_path
            .filter(|path| !path.trim().is_empty())
            .unwrap_or_else(|| self.default_path(format));

        let job = self.build_job(format, destination, selected_fields);
        let pipeline = self.pipeline.clone();
        let channel = self.channel.clone();
        let token = self.token.clone();

        tokio::spawn(async move {
            channel.send(&token, Action::DisableConvertButton);
            let outcome = pipeline.run(job).await;
            drop(guard);
            channel.send(&token, Action::EnableConvertButton);
            if !outcome.is_success() {
                debug!(state = %outcome.job.state, "Convert finished without a file");
            }
        });
    }

    fn build_job(
        &self,
        format: ExportFormat,
        destination: String,
        selected_fields: Vec<String>,
    ) -> ExportJob {
        let context = &self.context;
        let mut job = ExportJob::new(self.token.clone(), format, destination)
            .with_selected_fields(selected_fields)
            .with_display_name(context.base_name());

        if let Some(locator) = &context.source_locator {
            job = job.with_source(locator.clone());
        }
        if let Some(metadata) = &context.metadata {
            job = job.with_supplied_metadata(metadata.clone());
        }
        if let Some(extractor) = &context.extractor_key {
            job = job.with_platform(extractor.clone());
        }

        job
    }

    async fn browse(&self, format: Option<String>) {
        let format = self.resolve_format(format);

        let Some(dialog) = &self.config.save_dialog else {
            debug!("No save dialog configured");
            self.config.notifier.notify(Notification::info(
                "Save Dialog Unavailable",
                "Enter the destination path manually",
            ));
            return;
        };

        let suggested = format!("{}.{}", self.context.base_name(), format.extension());
        let filters = [format.file_filter()];

        match dialog.prompt_save_location(&suggested, &filters).await {
            Ok(Some(path)) => {
                let path = path.to_string_lossy().into_owned();
                debug!(path = %path, "Save location chosen");
                self.channel.send(
                    &self.token,
                    Action::UpdateSavePath { path: path.clone() },
                );
                self.config.notifier.notify(Notification::info(
                    "Location Selected",
                    format!("Save location: {}", containing_directory(&path)),
                ));
            }
            Ok(None) => debug!("Save dialog dismissed"),
            Err(err) => warn!(error = %err, "Save dialog failed"),
        }
    }

    async fn open_folder(&self, save_path: &str) {
        let directory = containing_directory(save_path.trim());
        let result = if directory.is_empty() {
            Err(format!("No directory in path: {}", save_path))
        } else {
            self.config
                .folder_opener
                .open_folder(Path::new(directory))
                .await
                .map_err(|err| err.to_string())
        };

        if let Err(err) = result {
            warn!(error = %err, "Could not open folder");
            self.config
                .notifier
                .notify(Notification::error("Error", "Could not open folder"));
        }
    }
}
