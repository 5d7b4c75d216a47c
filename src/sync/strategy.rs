//! Expansion of configured components into acquisition tasks

use regex::Regex;

use crate::config::{ComponentSpec, RegistryTarget, VERSION_PLACEHOLDER};
use crate::image::ImageRef;
use crate::sync::discovery;
use crate::sync::error::SyncError;
use crate::sync::task::AcquisitionTask;

/// Expand one component into its ordered task list for `version`.
///
/// `version` is the transformed version; it becomes the tag of every task
/// and replaces the `{VERSION}` placeholder in recipes and commands.
pub async fn expand_component(
    key: &str,
    spec: &ComponentSpec,
    version: &str,
    target: &RegistryTarget,
) -> Result<Vec<AcquisitionTask>, SyncError> {
    match spec {
        ComponentSpec::Image { images } => Ok(mirror_tasks(images, version, target)),
        ComponentSpec::Dockerfile {
            dockerfile,
            image_name,
        } => {
            let task = build_task(key, dockerfile, image_name.as_deref(), version, target)?;
            Ok(vec![task])
        }
        ComponentSpec::Command { command } => {
            let command = command.replace(VERSION_PLACEHOLDER, version);
            let candidates =
                discovery::discover_images(&command)
                    .await
                    .map_err(|source| SyncError::Discovery {
                        key: key.to_string(),
                        version: version.to_string(),
                        source,
                    })?;
            Ok(candidates
                .iter()
                .map(|candidate| {
                    let parsed = ImageRef::parse(candidate);
                    AcquisitionTask::Mirror {
                        target_repo: target.repo_for(&parsed.repository),
                        // Candidates without an explicit tag fall back to the
                        // resolved version
                        tag: parsed.tag.unwrap_or_else(|| version.to_string()),
                        source: parsed.repository,
                    }
                })
                .collect())
        }
    }
}

fn mirror_tasks(
    sources: &[String],
    version: &str,
    target: &RegistryTarget,
) -> Vec<AcquisitionTask> {
    sources
        .iter()
        .map(|source| AcquisitionTask::Mirror {
            source: source.clone(),
            tag: version.to_string(),
            target_repo: target.repo_for(source),
        })
        .collect()
}

fn build_task(
    key: &str,
    recipe: &str,
    image_name: Option<&str>,
    version: &str,
    target: &RegistryTarget,
) -> Result<AcquisitionTask, SyncError> {
    let name = match image_name {
        Some(name) => name.to_string(),
        None => derive_build_target(recipe).ok_or_else(|| SyncError::Config {
            key: key.to_string(),
            reason: "could not extract image name from the recipe's FROM line, \
                     provide an explicit image_name"
                .to_string(),
        })?,
    };

    Ok(AcquisitionTask::Build {
        recipe: recipe.replace(VERSION_PLACEHOLDER, version),
        tag: version.to_string(),
        target_repo: format!("{}/{}/{}", target.registry, target.namespace, name),
    })
}

/// Derive the target image name from the recipe's first `FROM` line: the
/// last path segment of the base image reference.
pub fn derive_build_target(recipe: &str) -> Option<String> {
    let from_line = Regex::new(r"(?i)FROM\s+([^\s:]+)").expect("valid FROM pattern");
    let base_image = from_line.captures(recipe)?.get(1)?.as_str();
    Some(ImageRef::parse(base_image).basename().to_string())
}
