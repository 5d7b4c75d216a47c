//! The sync core: strategy expansion and the change-detection pipeline
//!
//! # Modules
//!
//! - [`task`]: acquisition tasks, the unit of image work
//! - [`strategy`]: expanding configured components into ordered task lists
//! - [`discovery`]: command-derived image discovery
//! - [`pipeline`]: the end-to-end changed-version-triggers-sync-triggers-commit
//!   sequence
//! - [`error`]: the per-stage failure taxonomy

pub mod discovery;
pub mod error;
pub mod pipeline;
pub mod strategy;
pub mod task;

pub use error::{Stage, SyncError};
pub use pipeline::{SyncOutcome, SyncPipeline};
pub use task::AcquisitionTask;
