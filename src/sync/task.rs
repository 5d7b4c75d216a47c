//! Acquisition tasks: the unit of image work a strategy expands into

use crate::image::{EngineError, ImageEngine};

/// One unit of registry work produced by expanding a strategy against a
/// resolved version. Tasks are executed in order and are idempotent at the
/// registry level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcquisitionTask {
    /// Pull `source:tag`, re-tag as `target_repo:tag`, push
    Mirror {
        source: String,
        tag: String,
        target_repo: String,
    },
    /// Build `recipe` as `target_repo:tag`, push
    Build {
        recipe: String,
        tag: String,
        target_repo: String,
    },
}

impl AcquisitionTask {
    /// The fully-qualified target reference this task produces
    pub fn target_ref(&self) -> String {
        match self {
            Self::Mirror { target_repo, tag, .. } | Self::Build { target_repo, tag, .. } => {
                format!("{target_repo}:{tag}")
            }
        }
    }

    /// Short human-readable description for failure attribution
    pub fn describe(&self) -> String {
        match self {
            Self::Mirror { source, tag, .. } => format!("mirror {source}:{tag}"),
            Self::Build { .. } => format!("build {}", self.target_ref()),
        }
    }

    /// Execute this task against the image engine.
    pub async fn run(&self, engine: &dyn ImageEngine) -> Result<(), EngineError> {
        match self {
            Self::Mirror {
                source,
                tag,
                target_repo,
            } => {
                engine.pull(source, tag).await?;
                engine
                    .retag(&format!("{source}:{tag}"), target_repo, tag)
                    .await?;
                engine.push(target_repo, tag).await
            }
            Self::Build {
                recipe,
                tag,
                target_repo,
            } => {
                engine.build(recipe, &self.target_ref()).await?;
                engine.push(target_repo, tag).await
            }
        }
    }
}
