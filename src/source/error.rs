use thiserror::Error;

/// Failures talking to a version source.
///
/// The documented not-found cases (release 404, empty tag list) are not
/// errors; sources translate them to `Ok(None)`.
#[derive(Debug, Error)]
pub enum SourceError {
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
