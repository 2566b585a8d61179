//! # Core Export
//!
//! The export job lifecycle: a validated state machine per job, destination
//! path cleanup, and the pipeline that takes a job from raw metadata to a
//! written file while reporting progress.

pub mod destination;
pub mod error;
pub mod job;
pub mod pipeline;

pub use destination::{collapse_duplicated_stem, normalize_destination, Destination};
pub use error::{ExportError, Result};
pub use job::{ExportJob, ExportState, JobProgress};
pub use pipeline::{ExportPipeline, ExportReport, JobOutcome};
