use serde::Deserialize;

// =============================================================================
// Operation timeouts
// =============================================================================

/// Timeout for version source metadata queries in seconds
pub const METADATA_TIMEOUT_SECS: u64 = 30;

/// Timeout for image transfer operations (pull/push/build) in seconds
pub const TRANSFER_TIMEOUT_SECS: u64 = 30 * 60;

/// Timeout for discovery command execution in seconds
pub const DISCOVERY_TIMEOUT_SECS: u64 = 5 * 60;

/// Directory holding one version file per tracking key
pub const DEFAULT_STATE_DIR: &str = "release-versions";

/// Placeholder substituted with the resolved version in build recipes and
/// discovery commands
pub const VERSION_PLACEHOLDER: &str = "{VERSION}";

/// Which "latest version" strategy a sync unit uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Most recent published GitHub release
    Release,
    /// First entry of the GitHub tag listing
    Tag,
    /// Version-aware maximum over all Docker Hub tags
    #[serde(alias = "dockerhub")]
    Registry,
}

/// Target registry and namespace that mirrored images are pushed under
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RegistryTarget {
    pub registry: String,
    pub namespace: String,
}

impl RegistryTarget {
    /// Target repository for an image, keyed by the source's basename.
    ///
    /// `minio/minio` under `registry.example.com` / `mirror` becomes
    /// `registry.example.com/mirror/minio`.
    pub fn repo_for(&self, source_image: &str) -> String {
        let basename = source_image.rsplit('/').next().unwrap_or(source_image);
        format!("{}/{}/{}", self.registry, self.namespace, basename)
    }
}

/// One image-acquisition component of a sync unit.
///
/// Field names follow the JSON documents the workflow configs already use.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ComponentSpec {
    /// Pull, re-tag and push a fixed list of source images
    Image { images: Vec<String> },
    /// Build an image from a recipe with a `{VERSION}` placeholder
    Dockerfile {
        dockerfile: String,
        #[serde(default)]
        image_name: Option<String>,
    },
    /// Run a command and mirror every `image:` reference in its output
    Command { command: String },
}

/// Declarative description of one sync unit, immutable for a run.
#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    /// Tracking key the persisted version record is stored under
    #[serde(rename = "version_key")]
    pub key: String,
    /// What the version source is queried for (`owner/repo` or image path)
    #[serde(rename = "source_repo")]
    pub subject: String,
    #[serde(rename = "sync_type", default = "default_source_kind")]
    pub source: SourceKind,
    /// Literal prefix filter for registry tag listings
    #[serde(default)]
    pub tag_prefix: Option<String>,
    /// Transform rule applied to the resolved version, `"none"` for identity
    #[serde(default = "default_transform")]
    pub transform: String,
    pub components: Vec<ComponentSpec>,
    #[serde(flatten)]
    pub target: RegistryTarget,
    #[serde(default = "default_base_branch")]
    pub base_branch: String,
}

fn default_source_kind() -> SourceKind {
    SourceKind::Release
}

fn default_transform() -> String {
    "none".to_string()
}

fn default_base_branch() -> String {
    "master".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn repo_for_takes_last_path_segment_of_source() {
        let target = RegistryTarget {
            registry: "registry.example.com".to_string(),
            namespace: "mirror".to_string(),
        };
        assert_eq!(
            target.repo_for("minio/minio"),
            "registry.example.com/mirror/minio"
        );
        assert_eq!(
            target.repo_for("ghcr.io/linuxserver/jellyfin"),
            "registry.example.com/mirror/jellyfin"
        );
        assert_eq!(target.repo_for("redis"), "registry.example.com/mirror/redis");
    }

    #[test]
    fn multi_component_config_parses_all_component_types() {
        let config = serde_json::from_value::<SyncConfig>(json!({
            "version_key": "kubernetes/dashboard",
            "source_repo": "kubernetes/dashboard",
            "sync_type": "release",
            "registry": "registry.example.com",
            "namespace": "mirror",
            "components": [
                {"type": "image", "images": ["kubernetesui/dashboard-web"]},
                {"type": "dockerfile", "dockerfile": "FROM a/b:{VERSION}", "image_name": "custom"},
                {"type": "command", "command": "helm template chart --version {VERSION}"}
            ]
        }))
        .unwrap();

        assert_eq!(config.key, "kubernetes/dashboard");
        assert_eq!(config.source, SourceKind::Release);
        assert_eq!(config.components.len(), 3);
        assert_eq!(config.base_branch, "master");
        assert_eq!(config.transform, "none");
        assert!(matches!(
            &config.components[1],
            ComponentSpec::Dockerfile { image_name: Some(name), .. } if name == "custom"
        ));
    }

    #[test]
    fn dockerfile_component_without_image_name_defaults_to_none() {
        let spec = serde_json::from_value::<ComponentSpec>(json!({
            "type": "dockerfile",
            "dockerfile": "FROM lscr.io/linuxserver/jellyfin:{VERSION}"
        }))
        .unwrap();

        assert!(matches!(
            spec,
            ComponentSpec::Dockerfile { image_name: None, .. }
        ));
    }
}
