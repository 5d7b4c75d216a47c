//! Sibling artifact-upload flow: fetch a release artifact over HTTP and put
//! it in object storage unless it is already there.
//!
//! This flow runs alongside image sync for projects that also publish plain
//! binaries; it shares nothing with the version pipeline beyond the HTTP
//! client.

use std::path::Path;

#[cfg(test)]
use mockall::automock;

use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("download failed: {0}")]
    Download(#[from] reqwest::Error),

    #[error("unexpected status {status} downloading {url}")]
    DownloadStatus {
        status: reqwest::StatusCode,
        url: String,
    },

    #[error("local I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("object store error: {0}")]
    Store(String),
}

/// Object-storage boundary: existence check and single-file put, both
/// idempotent.
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait ObjectStore: Send + Sync {
    async fn exists(&self, bucket: &str, key: &str) -> Result<bool, StorageError>;

    async fn upload(&self, bucket: &str, local_path: &Path, key: &str)
    -> Result<(), StorageError>;
}

/// Download `url` and upload it to `bucket` under its filename.
///
/// Returns `true` if the artifact was uploaded, `false` if it was skipped
/// because it already exists (`skip_if_exists`).
pub async fn fetch_and_store(
    client: &reqwest::Client,
    store: &dyn ObjectStore,
    url: &str,
    bucket: &str,
    skip_if_exists: bool,
) -> Result<bool, StorageError> {
    let filename = url.rsplit('/').next().unwrap_or(url).to_string();

    if skip_if_exists && store.exists(bucket, &filename).await? {
        info!("Artifact {} already exists in {}, skipping", filename, bucket);
        return Ok(false);
    }

    info!("Downloading {}", url);
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(StorageError::DownloadStatus {
            status,
            url: url.to_string(),
        });
    }
    let body = response.bytes().await?;

    let local_path = std::env::temp_dir().join(&filename);
    tokio::fs::write(&local_path, &body).await?;

    let uploaded = store.upload(bucket, &local_path, &filename).await;
    // The scratch copy goes away whether or not the upload succeeded
    let _ = tokio::fs::remove_file(&local_path).await;
    uploaded?;

    info!("Uploaded {} to {}", filename, bucket);
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;
    use mockito::Server;

    #[tokio::test]
    async fn existing_artifact_is_skipped_without_download() {
        let server = Server::new_async().await;
        // No mock registered: any request to the server would 501 and fail
        let url = format!("{}/releases/tool-v1.tar.gz", server.url());

        let mut store = MockObjectStore::new();
        store
            .expect_exists()
            .with(eq("artifacts"), eq("tool-v1.tar.gz"))
            .times(1)
            .returning(|_, _| Ok(true));
        store.expect_upload().times(0);

        let client = reqwest::Client::new();
        let uploaded = fetch_and_store(&client, &store, &url, "artifacts", true)
            .await
            .unwrap();
        assert!(!uploaded);
    }

    #[tokio::test]
    async fn missing_artifact_is_downloaded_and_uploaded() {
        let mut server = Server::new_async().await;
        let download = server
            .mock("GET", "/releases/tool-v1.tar.gz")
            .with_status(200)
            .with_body("artifact-bytes")
            .create_async()
            .await;
        let url = format!("{}/releases/tool-v1.tar.gz", server.url());

        let mut store = MockObjectStore::new();
        store.expect_exists().times(1).returning(|_, _| Ok(false));
        store
            .expect_upload()
            .with(
                eq("artifacts"),
                mockall::predicate::always(),
                eq("tool-v1.tar.gz"),
            )
            .times(1)
            .returning(|_, _, _| Ok(()));

        let client = reqwest::Client::new();
        let uploaded = fetch_and_store(&client, &store, &url, "artifacts", true)
            .await
            .unwrap();

        download.assert_async().await;
        assert!(uploaded);
    }

    #[tokio::test]
    async fn failed_download_surfaces_status_error() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/releases/tool-v1.tar.gz")
            .with_status(500)
            .create_async()
            .await;
        let url = format!("{}/releases/tool-v1.tar.gz", server.url());

        let mut store = MockObjectStore::new();
        store.expect_exists().returning(|_, _| Ok(false));
        store.expect_upload().times(0);

        let client = reqwest::Client::new();
        let result = fetch_and_store(&client, &store, &url, "artifacts", true).await;
        assert!(matches!(result, Err(StorageError::DownloadStatus { .. })));
    }
}
