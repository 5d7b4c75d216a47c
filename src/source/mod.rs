//! Version sources: pluggable "latest upstream version" strategies
//!
//! A [`VersionSource`] answers one question: what is the newest version of
//! the tracked subject? Three strategies exist:
//!
//! - [`release::ReleaseSource`]: most recent published GitHub release
//! - [`tags::TagSource`]: first tag in GitHub's default tag ordering
//! - [`registry_tags::RegistryTagSource`]: version-aware maximum over all
//!   Docker Hub tags, optionally filtered by a literal prefix
//!
//! "Nothing found upstream" is `Ok(None)`, never an error; transport
//! failures always surface as [`error::SourceError`].

pub mod error;
pub mod order;
pub mod registry_tags;
pub mod release;
pub mod tags;

#[cfg(test)]
use mockall::automock;

use crate::config::{SourceKind, SyncConfig};
use error::SourceError;

/// Trait for resolving the latest version of a tracked subject
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait VersionSource: Send + Sync {
    /// Returns the strategy this implementation uses
    fn kind(&self) -> SourceKind;

    /// Resolves the latest version for `subject`.
    ///
    /// # Arguments
    /// * `subject` - `owner/repo` for GitHub sources, `owner/image` for
    ///   registry tag listings
    ///
    /// # Returns
    /// * `Ok(Some(version))` - the newest version identifier
    /// * `Ok(None)` - nothing found upstream (no releases, empty tag list)
    /// * `Err(SourceError)` - transport or response failure
    async fn latest(&self, subject: &str) -> Result<Option<String>, SourceError>;
}

/// Builds the version source a configuration selects.
///
/// Selection happens once at configuration-parse time; the returned source
/// is used for every call in the run.
pub fn from_config(config: &SyncConfig, github_token: Option<&str>) -> Box<dyn VersionSource> {
    let token = github_token.map(str::to_string);
    match config.source {
        SourceKind::Release => Box::new(release::ReleaseSource::new(
            release::DEFAULT_BASE_URL,
            token,
        )),
        SourceKind::Tag => Box::new(tags::TagSource::new(release::DEFAULT_BASE_URL, token)),
        SourceKind::Registry => Box::new(registry_tags::RegistryTagSource::new(
            registry_tags::DEFAULT_BASE_URL,
            config.tag_prefix.clone(),
        )),
    }
}
