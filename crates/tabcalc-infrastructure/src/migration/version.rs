//! Schema version tags.

use semver::Version;

/// Schema version written by this build.
pub const CURRENT_SCHEMA_VERSION: &str = "1.1.0";

/// Version assumed for data that has flat keys but no version tag.
pub const FLAT_LAYOUT_VERSION: &str = "1.0.0";

/// The schema version written by this build, as a [`Version`].
pub fn current_schema_version() -> Version {
    Version::new(1, 1, 0)
}

/// The version assumed for untagged flat data, as a [`Version`].
pub fn flat_layout_version() -> Version {
    Version::new(1, 0, 0)
}

/// Parses a stored version tag leniently.
///
/// Accepts full semver (`1.1.0`), shortened forms (`1`, `1.1`) and a leading
/// `v`. Missing components count as zero. Returns `None` for anything else.
pub fn parse_version_tag(tag: &str) -> Option<Version> {
    let tag = tag.trim();
    let tag = tag.strip_prefix('v').unwrap_or(tag);

    if let Ok(version) = Version::parse(tag) {
        return Some(version);
    }

    let parts: Vec<&str> = tag.split('.').collect();
    if parts.is_empty() || parts.len() > 3 {
        return None;
    }

    let mut numbers = [0u64; 3];
    for (slot, part) in numbers.iter_mut().zip(&parts) {
        *slot = part.parse().ok()?;
    }
    Some(Version::new(numbers[0], numbers[1], numbers[2]))
}

/// Like [`parse_version_tag`], but maps unparseable tags to `0.0.0` so that
/// every migration step runs.
pub fn stored_version_or_zero(tag: &str) -> Version {
    parse_version_tag(tag).unwrap_or_else(|| {
        tracing::warn!(
            "[Migration] Unrecognized version tag '{}', treating as 0.0.0",
            tag
        );
        Version::new(0, 0, 0)
    })
}
