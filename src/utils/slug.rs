//! URL slug generation.

use regex::Regex;
use std::sync::LazyLock;

static NON_SLUG_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("valid slug regex"));

/// Turns a title into a lowercase, hyphen-separated slug.
///
/// Runs of non-alphanumeric ASCII characters collapse into one hyphen;
/// leading and trailing hyphens are removed.
///
/// ```ignore
/// assert_eq!(slugify("Hello, World!"), "hello-world");
/// ```
pub fn slugify(title: &str) -> String {
    let lower = title.to_lowercase();
    NON_SLUG_CHARS
        .replace_all(&lower, "-")
        .trim_matches('-')
        .to_string()
}

/// Extracts the numeric id from an `"{id}-{slug}"` path segment.
pub fn id_from_id_slug(id_slug: &str) -> Option<i64> {
    id_slug.split('-').next()?.parse().ok()
}
