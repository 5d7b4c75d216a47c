//! Version-aware tag ordering
//!
//! Registry tag listings mix clean semver tags with things like
//! `cu124-megapak-2.0` or date stamps. Selection of the "latest" tag uses
//! semver when both candidates parse, numeric dotted-segment comparison
//! otherwise, and plain string comparison for segments that are not numbers.

use std::cmp::Ordering;

use semver::Version;

/// Parse a version string into a semver::Version, normalizing partial
/// versions.
///
/// Handles partial versions like "1" or "1.2" by padding with zeros.
///
/// Examples:
/// - "1" -> Version(1, 0, 0)
/// - "1.2" -> Version(1, 2, 0)
/// - "1.2.3" -> Version(1, 2, 3)
pub fn parse_version(version: &str) -> Option<Version> {
    let parts: Vec<&str> = version.split('.').collect();
    let normalized = match parts.len() {
        1 => format!("{}.0.0", parts[0]),
        2 => format!("{}.{}.0", parts[0], parts[1]),
        _ => version.to_string(),
    };
    Version::parse(&normalized).ok()
}

/// Compare two tags under version-aware ordering.
///
/// Semver fast path, then dotted segments compared pairwise (numerically
/// where both sides are numbers), then segment count.
pub fn compare_tags(a: &str, b: &str) -> Ordering {
    if let (Some(a), Some(b)) = (parse_version(a), parse_version(b)) {
        return a.cmp(&b);
    }

    let mut left = a.split('.');
    let mut right = b.split('.');
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) => {
                let ordering = match (l.parse::<u64>(), r.parse::<u64>()) {
                    (Ok(l), Ok(r)) => l.cmp(&r),
                    _ => l.cmp(r),
                };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
        }
    }
}
