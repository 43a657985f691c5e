//! Lenient decoding of raw sections.

use serde::de::DeserializeOwned;

/// Decodes a JSON section.
///
/// Returns `None` when the section is absent or cannot be decoded; the latter
/// is logged, since the section's data is lost.
pub fn decode_section<T: DeserializeOwned>(section: &str, raw: Option<&str>) -> Option<T> {
    let text = raw?;
    match serde_json::from_str(text) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(
                "[Migration] Corrupt section '{}' replaced by its default: {}",
                section,
                e
            );
            None
        }
    }
}
