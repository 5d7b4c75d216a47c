//! Image engine trait for registry-facing operations

#[cfg(test)]
use mockall::automock;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{operation} of {reference} failed: {detail}")]
    OperationFailed {
        operation: &'static str,
        reference: String,
        detail: String,
    },

    #[error("{operation} of {reference} timed out after {seconds}s")]
    Timeout {
        operation: &'static str,
        reference: String,
        seconds: u64,
    },

    #[error("failed to run container engine: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Trait for the container-engine operations the pipeline drives.
///
/// All operations are idempotent at the registry level: re-pulling or
/// re-pushing an unchanged image is a safe no-op, which is what makes a
/// whole-run retry safe.
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait ImageEngine: Send + Sync {
    /// Pull `image:tag` from its source registry
    async fn pull(&self, image: &str, tag: &str) -> Result<(), EngineError>;

    /// Tag an already-present `source_ref` as `target_repo:tag`
    async fn retag(&self, source_ref: &str, target_repo: &str, tag: &str)
    -> Result<(), EngineError>;

    /// Push `repo:tag` to its registry
    async fn push(&self, repo: &str, tag: &str) -> Result<(), EngineError>;

    /// Build an image from recipe text and tag it `target_ref`
    async fn build(&self, recipe: &str, target_ref: &str) -> Result<(), EngineError>;
}
