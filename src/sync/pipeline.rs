//! The end-to-end sync pipeline
//!
//! One run per invocation:
//! `Resolve -> Compare -> Transform -> Acquire -> Commit`.
//!
//! The version record is written if and only if every acquisition task of
//! the run succeeded, and the change submitter is invoked exactly once per
//! successful run. A failed task leaves the record and the change request
//! untouched, so re-invoking the whole run is the retry mechanism (safe,
//! because acquisition is idempotent at the registry level).

use tracing::info;

use crate::config::SyncConfig;
use crate::image::ImageEngine;
use crate::source::VersionSource;
use crate::store::VersionStore;
use crate::submit::ChangeSubmitter;
use crate::sync::error::SyncError;
use crate::sync::strategy;
use crate::sync::task::AcquisitionTask;
use crate::transform::{TransformOutcome, TransformRule};

/// Outcome of one pipeline run, never partially populated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Nothing found upstream, or the resolved version is already recorded
    NoChange,
    /// The transform rule deliberately skipped this version; it is not
    /// recorded and will be re-evaluated on the next run
    Skipped { version: String },
    /// All tasks succeeded and the new record was committed
    Synced {
        old_version: Option<String>,
        new_version: String,
        change_request: Option<String>,
    },
}

/// Orchestrates one sync unit against its collaborators.
pub struct SyncPipeline<'a> {
    source: &'a dyn VersionSource,
    store: &'a VersionStore,
    engine: &'a dyn ImageEngine,
    submitter: &'a dyn ChangeSubmitter,
}

impl<'a> SyncPipeline<'a> {
    pub fn new(
        source: &'a dyn VersionSource,
        store: &'a VersionStore,
        engine: &'a dyn ImageEngine,
        submitter: &'a dyn ChangeSubmitter,
    ) -> Self {
        Self {
            source,
            store,
            engine,
            submitter,
        }
    }

    /// Run the pipeline once for `config`.
    pub async fn run(&self, config: &SyncConfig) -> Result<SyncOutcome, SyncError> {
        let key = &config.key;

        if config.components.is_empty() {
            return Err(SyncError::Config {
                key: key.clone(),
                reason: "at least one component is required".to_string(),
            });
        }

        // Resolve
        let resolved = self
            .source
            .latest(&config.subject)
            .await
            .map_err(|source| SyncError::Resolve {
                key: key.clone(),
                source,
            })?;
        let Some(resolved) = resolved else {
            info!("No version found upstream for {}", key);
            return Ok(SyncOutcome::NoChange);
        };
        info!("Latest version for {}: {}", key, resolved);

        // Compare
        let stored = self.store.read(key).map_err(|source| SyncError::Compare {
            key: key.clone(),
            source,
        })?;
        if stored.as_deref() == Some(resolved.as_str()) {
            info!("No version change for {}, skipping sync", key);
            return Ok(SyncOutcome::NoChange);
        }

        // Transform
        let rule =
            TransformRule::parse(&config.transform).map_err(|source| SyncError::Transform {
                key: key.clone(),
                version: resolved.clone(),
                source,
            })?;
        let effective = match rule.apply(&resolved) {
            TransformOutcome::Version(version) => version,
            TransformOutcome::Skip => {
                info!("Version {} skipped by transform rule", resolved);
                return Ok(SyncOutcome::Skipped { version: resolved });
            }
        };
        if effective != resolved {
            info!("Version transformed: {} -> {}", resolved, effective);
        }

        // Acquire: expand every component first, then execute sequentially,
        // stopping at the first failure
        let mut tasks: Vec<AcquisitionTask> = Vec::new();
        for component in &config.components {
            tasks.extend(
                strategy::expand_component(key, component, &effective, &config.target).await?,
            );
        }
        info!(
            "Executing {} acquisition task(s) for {} at {}",
            tasks.len(),
            key,
            effective
        );
        for task in &tasks {
            task.run(self.engine)
                .await
                .map_err(|source| SyncError::Acquisition {
                    key: key.clone(),
                    version: effective.clone(),
                    task: task.describe(),
                    source,
                })?;
        }

        // Commit: the resolved (pre-transform) version is the record, so the
        // same upstream version never re-triggers a run
        self.store
            .write(key, &resolved)
            .map_err(|source| SyncError::Commit {
                key: key.clone(),
                version: resolved.clone(),
                source: source.into(),
            })?;
        let change_request = self
            .submitter
            .submit(key, stored.as_deref(), &resolved, &config.base_branch)
            .await
            .map_err(|source| SyncError::Commit {
                key: key.clone(),
                version: resolved.clone(),
                source: source.into(),
            })?;

        info!("Sync of {} to {} committed", key, resolved);
        Ok(SyncOutcome::Synced {
            old_version: stored,
            new_version: resolved,
            change_request,
        })
    }
}
