//! Service façade handed to host applications.

use crate::error::{Result, ServiceError};
use crate::session::{ActiveJobs, DownloadContext, ExportSession, SessionHandle};
use core_export::{ExportJob, ExportPipeline, ExportReport};
use core_runtime::events::{Action, JobToken, ProgressChannel};
use core_runtime::ExporterConfig;
use tracing::info;

/// Shares one configuration, channel and active-job registry between
/// every session of a host.
#[derive(Debug, Clone)]
pub struct ExportService {
    config: ExporterConfig,
    channel: ProgressChannel,
    active: ActiveJobs,
}

impl ExportService {
    pub fn new(config: ExporterConfig) -> Result<Self> {
        config.validate()?;
        let channel = ProgressChannel::new(config.channel_capacity);

        Ok(Self {
            config,
            channel,
            active: ActiveJobs::new(),
        })
    }

    pub fn config(&self) -> &ExporterConfig {
        &self.config
    }

    /// The channel observers publish commands on and read updates from.
    pub fn channel(&self) -> ProgressChannel {
        self.channel.clone()
    }

    pub fn active_jobs(&self) -> &ActiveJobs {
        &self.active
    }

    /// Starts a session for `context` under a freshly generated token.
    pub fn open_session(&self, context: DownloadContext) -> SessionHandle {
        self.open_session_with_token(JobToken::generate(), context)
    }

    /// Starts a session for `context` under `token`.
    pub fn open_session_with_token(
        &self,
        token: JobToken,
        context: DownloadContext,
    ) -> SessionHandle {
        info!(job = %token, name = %context.name, "Opening export session");
        ExportSession::new(
            token,
            context,
            self.config.clone(),
            self.channel.clone(),
            self.active.clone(),
        )
        .spawn()
    }

    /// Runs a single export without a session.
    ///
    /// Fails with [`ServiceError::JobAlreadyActive`] if an export for the
    /// same token is already running.
    pub async fn export(&self, job: ExportJob) -> Result<ExportReport> {
        let token = job.token.clone();
        let guard = self
            .active
            .try_claim(&token)
            .ok_or_else(|| ServiceError::JobAlreadyActive(token.clone()))?;

        let pipeline = ExportPipeline::new(&self.config, self.channel.clone());
        self.channel.send(&token, Action::DisableConvertButton);
        let outcome = pipeline.run(job).await;
        drop(guard);
        self.channel.send(&token, Action::EnableConvertButton);

        Ok(outcome.result?)
    }
}
