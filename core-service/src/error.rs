use core_runtime::events::JobToken;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Export already running for job {0}")]
    JobAlreadyActive(JobToken),

    #[error("Runtime error: {0}")]
    Runtime(#[from] core_runtime::Error),

    #[error("Export error: {0}")]
    Export(#[from] core_export::ExportError),
}

pub type Result<T> = std::result::Result<T, ServiceError>;
