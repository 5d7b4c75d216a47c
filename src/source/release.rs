//! GitHub Releases version source

use serde::Deserialize;
use tracing::warn;

use crate::config::{METADATA_TIMEOUT_SECS, SourceKind};
use crate::source::VersionSource;
use crate::source::error::SourceError;

/// Default base URL for GitHub API
pub const DEFAULT_BASE_URL: &str = "https://api.github.com";

/// Response from the GitHub "latest release" endpoint
#[derive(Debug, Deserialize)]
struct Release {
    tag_name: String,
}

/// "Most recent published release" semantics: queries
/// `/repos/{subject}/releases/latest` and treats 404 as "no releases yet".
pub struct ReleaseSource {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ReleaseSource {
    /// Creates a new ReleaseSource with a custom base URL and optional token
    pub fn new(base_url: &str, token: Option<String>) -> Self {
        Self {
            client: github_client(),
            base_url: base_url.to_string(),
            token,
        }
    }
}

impl Default for ReleaseSource {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL, None)
    }
}

/// Shared client builder for GitHub sources
pub(crate) fn github_client() -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent("release-sync")
        .timeout(std::time::Duration::from_secs(METADATA_TIMEOUT_SECS))
        .build()
        .expect("Failed to create HTTP client")
}

/// Attach the standard GitHub headers to a request
pub(crate) fn github_request(
    request: reqwest::RequestBuilder,
    token: Option<&str>,
) -> reqwest::RequestBuilder {
    let request = request.header("Accept", "application/vnd.github+json");
    match token {
        Some(token) => request.header("Authorization", format!("Bearer {token}")),
        None => request,
    }
}

#[async_trait::async_trait]
impl VersionSource for ReleaseSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Release
    }

    async fn latest(&self, subject: &str) -> Result<Option<String>, SourceError> {
        let url = format!("{}/repos/{}/releases/latest", self.base_url, subject);

        let response = github_request(self.client.get(&url), self.token.as_deref())
            .send()
            .await?;

        let status = response.status();

        // No published releases is an expected state, not a failure
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !status.is_success() {
            warn!("GitHub API returned status {}: {}", status, url);
            return Err(SourceError::Status { status, url });
        }

        let release: Release = response.json().await.map_err(|e| {
            warn!("Failed to parse GitHub release response: {}", e);
            SourceError::InvalidResponse(e.to_string())
        })?;

        Ok(Some(release.tag_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    #[tokio::test]
    async fn latest_returns_tag_name_of_latest_release() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/repos/minio/minio/releases/latest")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"tag_name": "RELEASE.2024-01-15T00-00-00Z"}"#)
            .create_async()
            .await;

        let source = ReleaseSource::new(&server.url(), None);
        let result = source.latest("minio/minio").await.unwrap();

        mock.assert_async().await;
        assert_eq!(result, Some("RELEASE.2024-01-15T00-00-00Z".to_string()));
    }

    #[tokio::test]
    async fn latest_returns_none_for_404() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/repos/no/releases/releases/latest")
            .with_status(404)
            .with_header("content-type", "application/json")
            .with_body(r#"{"message": "Not Found"}"#)
            .create_async()
            .await;

        let source = ReleaseSource::new(&server.url(), None);
        let result = source.latest("no/releases").await.unwrap();

        mock.assert_async().await;
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn latest_surfaces_server_errors_as_status_error_not_absent() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/repos/minio/minio/releases/latest")
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let source = ReleaseSource::new(&server.url(), None);
        let result = source.latest("minio/minio").await;

        mock.assert_async().await;
        assert!(matches!(
            result,
            Err(SourceError::Status { status, .. }) if status.as_u16() == 500
        ));
    }

    #[tokio::test]
    async fn latest_sends_bearer_token_when_configured() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/repos/minio/minio/releases/latest")
            .match_header("authorization", "Bearer sekrit")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"tag_name": "v1.0.0"}"#)
            .create_async()
            .await;

        let source = ReleaseSource::new(&server.url(), Some("sekrit".to_string()));
        let result = source.latest("minio/minio").await.unwrap();

        mock.assert_async().await;
        assert_eq!(result, Some("v1.0.0".to_string()));
    }
}
