//! Formula typesetting capability.

/// Renders TeX into display markup.
///
/// Rendering never fails: malformed input degrades to escaped plain text.
pub trait Typesetter: Send + Sync {
    fn render_to_markup(&self, tex: &str) -> String;
}
