//! `image[:tag]` reference parsing

/// A parsed image reference: repository plus optional tag.
///
/// The tag separator is the last `:` after the last `/`, so references
/// carrying a registry port (`registry.example.com:5000/app`) parse as
/// untagged rather than losing their path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    pub repository: String,
    pub tag: Option<String>,
}

impl ImageRef {
    pub fn parse(reference: &str) -> Self {
        let slash = reference.rfind('/');
        match reference.rfind(':') {
            Some(colon) if slash.is_none_or(|s| colon > s) => Self {
                repository: reference[..colon].to_string(),
                tag: Some(reference[colon + 1..].to_string()),
            },
            _ => Self {
                repository: reference.to_string(),
                tag: None,
            },
        }
    }

    /// Last path segment of the repository (`lscr.io/linuxserver/jellyfin`
    /// -> `jellyfin`).
    pub fn basename(&self) -> &str {
        self.repository
            .rsplit('/')
            .next()
            .unwrap_or(&self.repository)
    }
}
