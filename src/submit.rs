//! Change-request submission for version bumps
//!
//! After a fully successful acquisition the pipeline calls the submitter
//! exactly once. The submitter stages the version-file mutation on a branch
//! and opens and merges a change request for it; a `None` return means the
//! resulting diff was empty, which is a valid outcome rather than an error.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::{DEFAULT_STATE_DIR, METADATA_TIMEOUT_SECS};

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("unexpected status {status} from {url}")]
    Status {
        status: reqwest::StatusCode,
        url: String,
    },

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Trait for committing a version bump as a reviewable change request
#[async_trait::async_trait]
pub trait ChangeSubmitter: Send + Sync {
    /// Submit the bump of `key` from `old_version` to `new_version`.
    ///
    /// # Returns
    /// * `Ok(Some(reference))` - change request created and merged
    /// * `Ok(None)` - the diff was empty, nothing to submit
    async fn submit(
        &self,
        key: &str,
        old_version: Option<&str>,
        new_version: &str,
        base_branch: &str,
    ) -> Result<Option<String>, SubmitError>;
}

/// Default base URL for GitHub API
const DEFAULT_BASE_URL: &str = "https://api.github.com";

#[derive(Debug, Deserialize)]
struct ContentsResponse {
    content: String,
    sha: String,
}

#[derive(Debug, Deserialize)]
struct RefResponse {
    object: RefObject,
}

#[derive(Debug, Deserialize)]
struct RefObject {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct PullResponse {
    number: u64,
    html_url: String,
}

/// Submitter that records the bump in the tracking repository via the GitHub
/// contents and pulls APIs: branch off the base, update the version file,
/// open a pull request, merge it.
pub struct GitHubSubmitter {
    client: reqwest::Client,
    base_url: String,
    repo: String,
    token: String,
    state_dir: String,
}

impl GitHubSubmitter {
    /// Creates a submitter for `repo` (full name, e.g. `pohvii/homelab`)
    pub fn new(repo: impl Into<String>, token: impl Into<String>) -> Self {
        Self::with_base_url(DEFAULT_BASE_URL, repo, token)
    }

    pub fn with_base_url(
        base_url: &str,
        repo: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent("release-sync")
                .timeout(std::time::Duration::from_secs(METADATA_TIMEOUT_SECS))
                .build()
                .expect("Failed to create HTTP client"),
            base_url: base_url.to_string(),
            repo: repo.into(),
            token: token.into(),
            state_dir: DEFAULT_STATE_DIR.to_string(),
        }
    }

    /// Use a different version-file directory in the tracking repository.
    ///
    /// Must match the directory the local [`crate::store::VersionStore`]
    /// writes to, or the two records diverge.
    pub fn with_state_dir(mut self, state_dir: impl Into<String>) -> Self {
        self.state_dir = state_dir.into();
        self
    }

    fn request(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("Accept", "application/vnd.github+json")
            .header("Authorization", format!("Bearer {}", self.token))
    }

    fn version_file_path(&self, key: &str) -> String {
        format!("{}/{}.txt", self.state_dir, key.replace('/', "_"))
    }

    /// Current content and blob sha of the version file on the base branch,
    /// or `None` when the file does not exist yet.
    async fn current_file(
        &self,
        path: &str,
        base_branch: &str,
    ) -> Result<Option<(String, String)>, SubmitError> {
        let url = format!(
            "{}/repos/{}/contents/{}?ref={}",
            self.base_url, self.repo, path, base_branch
        );
        let response = self.request(self.client.get(&url)).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(SubmitError::Status { status, url });
        }

        let contents: ContentsResponse = response
            .json()
            .await
            .map_err(|e| SubmitError::InvalidResponse(e.to_string()))?;

        // The API wraps base64 content across lines
        let compact: String = contents
            .content
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        let decoded = BASE64
            .decode(&compact)
            .map_err(|e| SubmitError::InvalidResponse(format!("content not base64: {e}")))?;
        let text = String::from_utf8_lossy(&decoded).into_owned();

        Ok(Some((text, contents.sha)))
    }

    async fn create_branch(&self, branch: &str, base_branch: &str) -> Result<(), SubmitError> {
        let url = format!(
            "{}/repos/{}/git/ref/heads/{}",
            self.base_url, self.repo, base_branch
        );
        let response = self.request(self.client.get(&url)).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SubmitError::Status { status, url });
        }
        let base: RefResponse = response
            .json()
            .await
            .map_err(|e| SubmitError::InvalidResponse(e.to_string()))?;

        let url = format!("{}/repos/{}/git/refs", self.base_url, self.repo);
        let response = self
            .request(self.client.post(&url))
            .json(&json!({
                "ref": format!("refs/heads/{branch}"),
                "sha": base.object.sha,
            }))
            .send()
            .await?;
        let status = response.status();

        // 422 means the branch already exists, e.g. from a run that failed
        // after this point; reusing it keeps the retry path working.
        if status == reqwest::StatusCode::UNPROCESSABLE_ENTITY {
            warn!("Branch {} already exists, reusing it", branch);
            return Ok(());
        }
        if !status.is_success() {
            return Err(SubmitError::Status { status, url });
        }
        Ok(())
    }

    async fn update_file(
        &self,
        path: &str,
        branch: &str,
        content: &str,
        previous_sha: Option<&str>,
        message: &str,
    ) -> Result<(), SubmitError> {
        let url = format!("{}/repos/{}/contents/{}", self.base_url, self.repo, path);
        let mut body = json!({
            "message": message,
            "content": BASE64.encode(content),
            "branch": branch,
        });
        if let Some(sha) = previous_sha {
            body["sha"] = json!(sha);
        }

        let response = self
            .request(self.client.put(&url))
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SubmitError::Status { status, url });
        }
        Ok(())
    }

    async fn open_and_merge_pull(
        &self,
        branch: &str,
        base_branch: &str,
        title: &str,
        body: &str,
    ) -> Result<String, SubmitError> {
        let url = format!("{}/repos/{}/pulls", self.base_url, self.repo);
        let response = self
            .request(self.client.post(&url))
            .json(&json!({
                "title": title,
                "head": branch,
                "base": base_branch,
                "body": body,
            }))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SubmitError::Status { status, url });
        }
        let pull: PullResponse = response
            .json()
            .await
            .map_err(|e| SubmitError::InvalidResponse(e.to_string()))?;

        let url = format!(
            "{}/repos/{}/pulls/{}/merge",
            self.base_url, self.repo, pull.number
        );
        let response = self
            .request(self.client.put(&url))
            .json(&json!({ "merge_method": "squash" }))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SubmitError::Status { status, url });
        }

        Ok(pull.html_url)
    }
}

#[async_trait::async_trait]
impl ChangeSubmitter for GitHubSubmitter {
    async fn submit(
        &self,
        key: &str,
        old_version: Option<&str>,
        new_version: &str,
        base_branch: &str,
    ) -> Result<Option<String>, SubmitError> {
        let path = self.version_file_path(key);
        let desired = format!("{new_version}\n");

        let current = self.current_file(&path, base_branch).await?;
        let previous_sha = match &current {
            Some((text, _)) if *text == desired => {
                info!("Version file for {} already records {}", key, new_version);
                return Ok(None);
            }
            Some((_, sha)) => Some(sha.clone()),
            None => None,
        };

        let branch = format!(
            "sync/{}-{}",
            key.replace('/', "-"),
            new_version.replace('/', "-")
        );
        let title = format!("chore: update {key} to {new_version}");
        let body = match old_version {
            Some(old) => format!("Automated version bump of `{key}`: `{old}` -> `{new_version}`"),
            None => format!("Automated version bump of `{key}` to `{new_version}` (first sync)"),
        };

        self.create_branch(&branch, base_branch).await?;
        self.update_file(&path, &branch, &desired, previous_sha.as_deref(), &title)
            .await?;
        let reference = self
            .open_and_merge_pull(&branch, base_branch, &title, &body)
            .await?;

        info!("Change request merged: {}", reference);
        Ok(Some(reference))
    }
}
