/// Normalize a title into a lowercase, hyphen-separated ASCII slug.
///
/// ASCII alphanumerics are kept, everything else collapses into a single
/// hyphen, and leading/trailing hyphens are trimmed. Non-ASCII characters
/// are dropped rather than transliterated.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_hyphen = false;

    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c.to_ascii_lowercase());
        } else if c.is_ascii() {
            pending_hyphen = true;
        }
        // Non-ASCII: dropped without forcing a separator
    }

    slug
}

/// Check that a caller-supplied slug is already in normalized form
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}
