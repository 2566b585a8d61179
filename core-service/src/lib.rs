//! Core service façade and bootstrap helpers.
//!
//! This crate wires host-provided bridge implementations (metadata source,
//! file writer, clipboard, save dialog, notifier) into export sessions that
//! answer panel commands over the shared progress channel. Desktop apps
//! typically enable the `desktop-shims` feature (which depends on
//! `bridge-desktop`) and start from [`bootstrap_desktop`].

pub mod error;
pub mod service;
pub mod session;

pub use error::{Result, ServiceError};
pub use service::ExportService;
pub use session::{
    containing_directory, ActiveJobGuard, ActiveJobs, DownloadContext, ExportSession,
    SessionHandle,
};

pub use core_export::{ExportError, ExportJob, ExportReport, ExportState};
pub use core_metadata::ExportFormat;
pub use core_runtime::events::{Action, Envelope, JobToken, PanelState, ProgressChannel};
pub use core_runtime::{ExporterConfig, ExporterConfigBuilder};

/// Convenience bootstrapper for desktop hosts.
///
/// Reads metadata from `.info.json` files and uses the desktop adapters for
/// every other capability.
///
/// ```no_run
/// # #[cfg(feature = "desktop-shims")]
/// # async fn example() -> core_service::Result<()> {
/// use core_service::{bootstrap_desktop, DownloadContext};
///
/// let service = bootstrap_desktop()?;
/// let session = service.open_session(
///     DownloadContext::new("clip.mp4").with_source("/home/ana/Videos/clip.info.json"),
/// );
/// # Ok(())
/// # }
/// ```
#[cfg(feature = "desktop-shims")]
pub fn bootstrap_desktop() -> Result<ExportService> {
    use std::sync::Arc;

    let config = ExporterConfig::builder()
        .metadata_source(Arc::new(bridge_desktop::InfoJsonSource::new()))
        .build()?;
    ExportService::new(config)
}

#[cfg(all(test, feature = "clipboard"))]
mod tests {
    use super::*;

    #[test]
    fn test_default_features_enable_clipboard_fallback() {
        let service = bootstrap_desktop().unwrap();
        assert!(service.config().clipboard.is_some());
    }
}
