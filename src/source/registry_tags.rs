//! Docker Hub tag-listing version source

use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::{METADATA_TIMEOUT_SECS, SourceKind};
use crate::source::VersionSource;
use crate::source::error::SourceError;
use crate::source::order;

/// Default base URL for the Docker Hub registry API
pub const DEFAULT_BASE_URL: &str = "https://registry.hub.docker.com/v2";

/// One page of the tag listing
#[derive(Debug, Deserialize)]
struct TagPage {
    results: Vec<TagEntry>,
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TagEntry {
    name: String,
}

/// Restartable page sequence over a repository's tags.
///
/// Pages are fetched lazily; the listing terminates when the API stops
/// returning a `next` link. Memory stays bounded by one page at a time.
pub struct TagPages<'a> {
    client: &'a reqwest::Client,
    next_url: Option<String>,
}

impl<'a> TagPages<'a> {
    fn new(client: &'a reqwest::Client, base_url: &str, image: &str) -> Self {
        Self {
            client,
            next_url: Some(format!("{base_url}/repositories/{image}/tags")),
        }
    }

    /// Fetches the next page of tag names, or `None` once exhausted.
    pub async fn next_page(&mut self) -> Result<Option<Vec<String>>, SourceError> {
        let Some(url) = self.next_url.take() else {
            return Ok(None);
        };

        let response = self.client.get(&url).send().await?;
        let status = response.status();

        if !status.is_success() {
            warn!("Docker Hub returned status {}: {}", status, url);
            return Err(SourceError::Status { status, url });
        }

        let page: TagPage = response.json().await.map_err(|e| {
            warn!("Failed to parse Docker Hub tag page: {}", e);
            SourceError::InvalidResponse(e.to_string())
        })?;

        self.next_url = page.next;
        Ok(Some(page.results.into_iter().map(|t| t.name).collect()))
    }
}

/// "Version-aware maximum over all tags" semantics: enumerates every page of
/// the repository's tags, keeps those matching the configured literal prefix,
/// and selects the maximum under [`order::compare_tags`].
pub struct RegistryTagSource {
    client: reqwest::Client,
    base_url: String,
    tag_prefix: Option<String>,
}

impl RegistryTagSource {
    /// Creates a new RegistryTagSource with a custom base URL
    pub fn new(base_url: &str, tag_prefix: Option<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent("release-sync")
                .timeout(std::time::Duration::from_secs(METADATA_TIMEOUT_SECS))
                .build()
                .expect("Failed to create HTTP client"),
            base_url: base_url.to_string(),
            tag_prefix,
        }
    }
}

impl Default for RegistryTagSource {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL, None)
    }
}

#[async_trait::async_trait]
impl VersionSource for RegistryTagSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Registry
    }

    async fn latest(&self, subject: &str) -> Result<Option<String>, SourceError> {
        let mut pages = TagPages::new(&self.client, &self.base_url, subject);
        let mut best: Option<String> = None;
        let mut seen = 0usize;

        while let Some(tags) = pages.next_page().await? {
            seen += tags.len();
            for tag in tags {
                if let Some(prefix) = &self.tag_prefix
                    && !tag.starts_with(prefix.as_str())
                {
                    continue;
                }
                let keep = match &best {
                    Some(current) => order::compare_tags(&tag, current).is_gt(),
                    None => true,
                };
                if keep {
                    best = Some(tag);
                }
            }
        }

        debug!(
            "Scanned {} tags for {} (prefix: {:?})",
            seen, subject, self.tag_prefix
        );
        Ok(best)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    #[tokio::test]
    async fn latest_selects_numeric_maximum_not_lexicographic() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/repositories/grafana/grafana/tags")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                    "results": [{"name": "1.2.0"}, {"name": "1.10.0"}, {"name": "1.9.3"}],
                    "next": null
                }"#,
            )
            .create_async()
            .await;

        let source = RegistryTagSource::new(&server.url(), None);
        let result = source.latest("grafana/grafana").await.unwrap();

        mock.assert_async().await;
        assert_eq!(result, Some("1.10.0".to_string()));
    }

    #[tokio::test]
    async fn latest_follows_pagination_until_exhausted() {
        let mut server = Server::new_async().await;

        let second_url = format!("{}/repositories/a/b/tags?page=2", server.url());
        let first = server
            .mock("GET", "/repositories/a/b/tags")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(format!(
                r#"{{"results": [{{"name": "1.0.0"}}], "next": "{second_url}"}}"#
            ))
            .create_async()
            .await;
        let second = server
            .mock("GET", "/repositories/a/b/tags?page=2")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"results": [{"name": "2.0.0"}], "next": null}"#)
            .create_async()
            .await;

        let source = RegistryTagSource::new(&server.url(), None);
        let result = source.latest("a/b").await.unwrap();

        first.assert_async().await;
        second.assert_async().await;
        assert_eq!(result, Some("2.0.0".to_string()));
    }

    #[tokio::test]
    async fn latest_filters_by_literal_prefix_before_selection() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/repositories/x/comfyui/tags")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                    "results": [
                        {"name": "cu124-megapak-1.0"},
                        {"name": "1.0"},
                        {"name": "cu124-megapak-2.0"}
                    ],
                    "next": null
                }"#,
            )
            .create_async()
            .await;

        let source =
            RegistryTagSource::new(&server.url(), Some("cu124-megapak-".to_string()));
        let result = source.latest("x/comfyui").await.unwrap();

        mock.assert_async().await;
        assert_eq!(result, Some("cu124-megapak-2.0".to_string()));
    }

    #[tokio::test]
    async fn latest_returns_none_when_no_tag_matches_prefix() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/repositories/x/y/tags")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"results": [{"name": "latest"}], "next": null}"#)
            .create_async()
            .await;

        let source = RegistryTagSource::new(&server.url(), Some("v".to_string()));
        let result = source.latest("x/y").await.unwrap();

        mock.assert_async().await;
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn latest_surfaces_server_errors_as_status_error() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/repositories/x/y/tags")
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let source = RegistryTagSource::new(&server.url(), None);
        let result = source.latest("x/y").await;

        mock.assert_async().await;
        assert!(matches!(result, Err(SourceError::Status { .. })));
    }
}
