use thiserror::Error;

use crate::image::EngineError;
use crate::source::error::SourceError;
use crate::store::StoreError;
use crate::submit::SubmitError;
use crate::sync::discovery::DiscoveryError;
use crate::transform::TransformError;

/// Where in the run a failure occurred.
///
/// Everything up to and including `Acquire` leaves the persisted version and
/// the change request untouched; only `Commit` can fail after external side
/// effects have happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Configure,
    Resolve,
    Compare,
    Transform,
    Acquire,
    Commit,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Configure => "configure",
            Self::Resolve => "resolve",
            Self::Compare => "compare",
            Self::Transform => "transform",
            Self::Acquire => "acquire",
            Self::Commit => "commit",
        };
        f.write_str(name)
    }
}

/// A failed pipeline run, carrying enough context (stage, key, attempted
/// version) to reconstruct the failure without re-running.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("invalid configuration for {key}: {reason}")]
    Config { key: String, reason: String },

    #[error("version source failure for {key}: {source}")]
    Resolve {
        key: String,
        #[source]
        source: SourceError,
    },

    #[error("version store read failure for {key}: {source}")]
    Compare {
        key: String,
        #[source]
        source: StoreError,
    },

    #[error("transform failure for {key} at {version}: {source}")]
    Transform {
        key: String,
        version: String,
        #[source]
        source: TransformError,
    },

    #[error("image discovery failed for {key} at {version}: {source}")]
    Discovery {
        key: String,
        version: String,
        #[source]
        source: DiscoveryError,
    },

    #[error("acquisition of {task} failed for {key} at {version}: {source}")]
    Acquisition {
        key: String,
        version: String,
        task: String,
        #[source]
        source: EngineError,
    },

    /// Acquisition already completed; the run must be re-invoked (safe, the
    /// acquisition is idempotent) so the record and change request catch up.
    #[error(
        "commit failed for {key} at {version} after successful acquisition, \
         operator attention required: {source}"
    )]
    Commit {
        key: String,
        version: String,
        #[source]
        source: CommitError,
    },
}

/// What went wrong inside the commit stage
#[derive(Debug, Error)]
pub enum CommitError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Submit(#[from] SubmitError),
}

impl SyncError {
    pub fn stage(&self) -> Stage {
        match self {
            Self::Config { .. } => Stage::Configure,
            Self::Resolve { .. } => Stage::Resolve,
            Self::Compare { .. } => Stage::Compare,
            Self::Transform { .. } => Stage::Transform,
            Self::Discovery { .. } | Self::Acquisition { .. } => Stage::Acquire,
            Self::Commit { .. } => Stage::Commit,
        }
    }
}
