//! Tag list parsing.

/// Parses an editor-supplied, comma-separated tag list.
///
/// Each entry is trimmed and lowercased; empty entries are dropped and
/// duplicates keep their first position.
///
/// ```ignore
/// assert_eq!(parse_tags("PHP, Laravel, laravel"), vec!["php", "laravel"]);
/// ```
pub fn parse_tags(tags_text: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();

    for raw in tags_text.split(',') {
        let tag = raw.trim().to_lowercase();
        if tag.is_empty() || tags.contains(&tag) {
            continue;
        }
        tags.push(tag);
    }

    tags
}
