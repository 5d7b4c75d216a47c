//! GitHub tag-listing version source

use serde::Deserialize;
use tracing::warn;

use crate::config::SourceKind;
use crate::source::VersionSource;
use crate::source::error::SourceError;
use crate::source::release::{DEFAULT_BASE_URL, github_client, github_request};

/// One entry of the GitHub tag listing
#[derive(Debug, Deserialize)]
struct Tag {
    name: String,
}

/// "First tag in the default ordering" semantics: GitHub lists tags
/// newest-first, so the head of `/repos/{subject}/tags` is the latest.
pub struct TagSource {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl TagSource {
    /// Creates a new TagSource with a custom base URL and optional token
    pub fn new(base_url: &str, token: Option<String>) -> Self {
        Self {
            client: github_client(),
            base_url: base_url.to_string(),
            token,
        }
    }
}

impl Default for TagSource {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL, None)
    }
}

#[async_trait::async_trait]
impl VersionSource for TagSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Tag
    }

    async fn latest(&self, subject: &str) -> Result<Option<String>, SourceError> {
        let url = format!("{}/repos/{}/tags", self.base_url, subject);

        let response = github_request(self.client.get(&url), self.token.as_deref())
            .send()
            .await?;

        let status = response.status();

        if !status.is_success() {
            warn!("GitHub API returned status {}: {}", status, url);
            return Err(SourceError::Status { status, url });
        }

        let tags: Vec<Tag> = response.json().await.map_err(|e| {
            warn!("Failed to parse GitHub tags response: {}", e);
            SourceError::InvalidResponse(e.to_string())
        })?;

        Ok(tags.into_iter().next().map(|tag| tag.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    #[tokio::test]
    async fn latest_returns_first_tag_of_listing() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/repos/redis/redis/tags")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"name": "7.2.4"}, {"name": "7.2.3"}, {"name": "7.2.2"}]"#)
            .create_async()
            .await;

        let source = TagSource::new(&server.url(), None);
        let result = source.latest("redis/redis").await.unwrap();

        mock.assert_async().await;
        assert_eq!(result, Some("7.2.4".to_string()));
    }

    #[tokio::test]
    async fn latest_returns_none_for_empty_tag_list() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/repos/fresh/repo/tags")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("[]")
            .create_async()
            .await;

        let source = TagSource::new(&server.url(), None);
        let result = source.latest("fresh/repo").await.unwrap();

        mock.assert_async().await;
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn latest_surfaces_non_success_status_as_error() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/repos/redis/redis/tags")
            .with_status(403)
            .with_body(r#"{"message": "rate limited"}"#)
            .create_async()
            .await;

        let source = TagSource::new(&server.url(), None);
        let result = source.latest("redis/redis").await;

        mock.assert_async().await;
        assert!(matches!(result, Err(SourceError::Status { .. })));
    }
}
