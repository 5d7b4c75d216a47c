//! Declarative version transformation rules.
//!
//! Replaces the arbitrary-expression transform the workflows used to embed
//! with a small enumerated rule language, parsed once at configuration time:
//!
//! - `none` (or empty): identity
//! - `strip-prefix:<p>`: remove a literal prefix if present
//! - `regex-capture:<pattern>`: first capture group of the first match;
//!   no match means the version is deliberately skipped
//! - `skip-if:<pattern>`: skip the version when the pattern matches
//! - `replace:<pattern>:<replacement>`: regex replace-all
//!
//! Skipping is a value ([`TransformOutcome::Skip`]), never an error; a
//! skipped version is never recorded as synced.

use regex::Regex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransformError {
    #[error("unknown transform rule: {0}")]
    UnknownRule(String),

    #[error("invalid regex in transform rule: {0}")]
    InvalidRegex(#[from] regex::Error),

    #[error("regex-capture pattern has no capture group: {0}")]
    MissingCaptureGroup(String),

    #[error("malformed transform rule: {0}")]
    Malformed(String),
}

/// Result of applying a transform rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransformOutcome {
    /// The version to use for acquisition
    Version(String),
    /// This version is deliberately not synced
    Skip,
}

/// A parsed transform rule
#[derive(Debug, Clone)]
pub enum TransformRule {
    Identity,
    StripPrefix(String),
    RegexCapture(Regex),
    SkipIf(Regex),
    Replace { pattern: Regex, replacement: String },
}

impl TransformRule {
    /// Parse a rule expression.
    pub fn parse(spec: &str) -> Result<Self, TransformError> {
        let spec = spec.trim();
        if spec.is_empty() || spec == "none" {
            return Ok(Self::Identity);
        }

        let Some((name, rest)) = spec.split_once(':') else {
            return Err(TransformError::UnknownRule(spec.to_string()));
        };

        match name {
            "strip-prefix" => Ok(Self::StripPrefix(rest.to_string())),
            "regex-capture" => {
                let pattern = Regex::new(rest)?;
                if pattern.captures_len() < 2 {
                    return Err(TransformError::MissingCaptureGroup(rest.to_string()));
                }
                Ok(Self::RegexCapture(pattern))
            }
            "skip-if" => Ok(Self::SkipIf(Regex::new(rest)?)),
            "replace" => {
                let Some((pattern, replacement)) = rest.split_once(':') else {
                    return Err(TransformError::Malformed(spec.to_string()));
                };
                Ok(Self::Replace {
                    pattern: Regex::new(pattern)?,
                    replacement: replacement.to_string(),
                })
            }
            _ => Err(TransformError::UnknownRule(spec.to_string())),
        }
    }

    /// Apply the rule to a raw version string.
    pub fn apply(&self, raw: &str) -> TransformOutcome {
        match self {
            Self::Identity => TransformOutcome::Version(raw.to_string()),
            Self::StripPrefix(prefix) => TransformOutcome::Version(
                raw.strip_prefix(prefix.as_str()).unwrap_or(raw).to_string(),
            ),
            Self::RegexCapture(pattern) => match pattern.captures(raw) {
                Some(captures) => match captures.get(1) {
                    Some(group) => TransformOutcome::Version(group.as_str().to_string()),
                    None => TransformOutcome::Skip,
                },
                None => TransformOutcome::Skip,
            },
            Self::SkipIf(pattern) => {
                if pattern.is_match(raw) {
                    TransformOutcome::Skip
                } else {
                    TransformOutcome::Version(raw.to_string())
                }
            }
            Self::Replace {
                pattern,
                replacement,
            } => TransformOutcome::Version(pattern.replace_all(raw, replacement.as_str()).into_owned()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", "v1.2.3", TransformOutcome::Version("v1.2.3".to_string()))]
    #[case("none", "v1.2.3", TransformOutcome::Version("v1.2.3".to_string()))]
    #[case("strip-prefix:v", "v1.2.3", TransformOutcome::Version("1.2.3".to_string()))]
    #[case("strip-prefix:v", "1.2.3", TransformOutcome::Version("1.2.3".to_string()))] // absent prefix is a no-op
    #[case("regex-capture:^v(\\d+\\.\\d+\\.\\d+)$", "v1.2.3", TransformOutcome::Version("1.2.3".to_string()))]
    #[case("regex-capture:^v(\\d+\\.\\d+\\.\\d+)$", "nightly", TransformOutcome::Skip)]
    #[case("skip-if:-rc", "1.2.3-rc1", TransformOutcome::Skip)]
    #[case("skip-if:-rc", "1.2.3", TransformOutcome::Version("1.2.3".to_string()))]
    #[case("replace:_:-", "1_2_3", TransformOutcome::Version("1-2-3".to_string()))]
    fn test_apply(#[case] rule: &str, #[case] raw: &str, #[case] expected: TransformOutcome) {
        let rule = TransformRule::parse(rule).unwrap();
        assert_eq!(rule.apply(raw), expected);
    }

    #[test]
    fn parse_rejects_unknown_rule() {
        assert!(matches!(
            TransformRule::parse("uppercase:x"),
            Err(TransformError::UnknownRule(_))
        ));
        assert!(matches!(
            TransformRule::parse("garbage"),
            Err(TransformError::UnknownRule(_))
        ));
    }

    #[test]
    fn parse_rejects_invalid_regex() {
        assert!(matches!(
            TransformRule::parse("skip-if:["),
            Err(TransformError::InvalidRegex(_))
        ));
    }

    #[test]
    fn parse_rejects_capture_rule_without_group() {
        assert!(matches!(
            TransformRule::parse("regex-capture:^v\\d+$"),
            Err(TransformError::MissingCaptureGroup(_))
        ));
    }

    #[test]
    fn parse_rejects_replace_without_replacement() {
        assert!(matches!(
            TransformRule::parse("replace:_"),
            Err(TransformError::Malformed(_))
        ));
    }
}
