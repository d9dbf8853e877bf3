//! Title → slug normalization.
//!
//! Slugs double as article file stems and branch name components, so they are
//! restricted to `[a-z0-9-]`.

use std::sync::LazyLock;

use regex::Regex;

/// Maximum slug length in characters.
pub const MAX_SLUG_LEN: usize = 50;

/// Normalize a title into a slug.
///
/// Strips a leading heading marker, lowercases, collapses every run of
/// characters outside `[a-z0-9]` into one hyphen, trims hyphens from both
/// ends and truncates to [`MAX_SLUG_LEN`]. Symbol-only input yields `""`.
pub fn slugify(title: &str) -> String {
    static NON_SLUG_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("valid regex"));

    let text = title.trim_start().trim_start_matches('#').trim().to_lowercase();
    let collapsed = NON_SLUG_RE.replace_all(&text, "-");
    let trimmed = collapsed.trim_matches('-');

    // Only ASCII survives the regex, so byte and char offsets agree.
    let cut = &trimmed[..trimmed.len().min(MAX_SLUG_LEN)];
    cut.trim_end_matches('-').to_string()
}

/// Resolve the effective `(title, slug)` pair for a title, falling back to
/// `default_title` when the title is blank or slugifies to nothing.
pub fn resolve_title(title: &str, default_title: &str) -> (String, String) {
    let title = title.trim_start().trim_start_matches('#').trim();
    let slug = slugify(title);
    if slug.is_empty() {
        tracing::debug!(title, default_title, "title has no slug, using default title");
        return (default_title.to_string(), slugify(default_title));
    }
    (title.to_string(), slug)
}
