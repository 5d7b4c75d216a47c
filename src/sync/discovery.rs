//! Command-derived image discovery
//!
//! Runs an external command (e.g. `helm template`) and extracts every
//! `image:` reference from its line-oriented output. The command surface is
//! an explicit process boundary: the command string comes from the sync
//! configuration, nothing is interpolated beyond the version placeholder.

use std::collections::BTreeSet;
use std::process::Stdio;
use std::time::Duration;

use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info};

use crate::config::DISCOVERY_TIMEOUT_SECS;

/// Marker scanned for in command output lines
const IMAGE_MARKER: &str = "image:";

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("failed to run discovery command: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("discovery command exited with {status}: {stderr}")]
    CommandFailed { status: String, stderr: String },

    #[error("discovery command timed out after {seconds}s")]
    Timeout { seconds: u64 },
}

/// Run `command` through the shell and extract image references.
///
/// Any line containing `image:` contributes the trimmed text after its last
/// marker occurrence. The result is deduplicated and sorted so task ordering
/// is deterministic across runs.
pub async fn discover_images(command: &str) -> Result<Vec<String>, DiscoveryError> {
    info!("Executing discovery command: {}", command);

    let child = Command::new("sh")
        .arg("-c")
        .arg(command)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()?;

    let output = tokio::time::timeout(
        Duration::from_secs(DISCOVERY_TIMEOUT_SECS),
        child.wait_with_output(),
    )
    .await
    .map_err(|_| DiscoveryError::Timeout {
        seconds: DISCOVERY_TIMEOUT_SECS,
    })??;

    if !output.status.success() {
        return Err(DiscoveryError::CommandFailed {
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let images = extract_images(&stdout);
    debug!("Discovered {} image reference(s)", images.len());
    Ok(images)
}

/// Extract the deduplicated, sorted image set from command output.
pub fn extract_images(output: &str) -> Vec<String> {
    let mut images = BTreeSet::new();
    for line in output.lines() {
        if let Some((_, reference)) = line.rsplit_once(IMAGE_MARKER) {
            let reference = reference.trim();
            if !reference.is_empty() {
                images.insert(reference.to_string());
            }
        }
    }
    images.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_dedups_and_sorts() {
        let output = "  image: b:1\n image: a:1\nimage: a:1\n";
        assert_eq!(extract_images(output), vec!["a:1", "b:1"]);
    }

    #[test]
    fn extract_ignores_lines_without_marker_and_empty_references() {
        let output = "kind: Deployment\nimage:\n  image: quay.io/app:2.0\n";
        assert_eq!(extract_images(output), vec!["quay.io/app:2.0"]);
    }

    #[test]
    fn extract_takes_text_after_last_marker() {
        let output = "preimage: image: nested/app:1\n";
        assert_eq!(extract_images(output), vec!["nested/app:1"]);
    }

    #[tokio::test]
    async fn discover_runs_command_through_the_shell() {
        let images = discover_images("printf 'image: b:1\\nimage: a:1\\n'")
            .await
            .unwrap();
        assert_eq!(images, vec!["a:1", "b:1"]);
    }

    #[tokio::test]
    async fn discover_fails_on_nonzero_exit() {
        let result = discover_images("exit 3").await;
        assert!(matches!(result, Err(DiscoveryError::CommandFailed { .. })));
    }
}
