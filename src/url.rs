//! URL normalization: a convention some upstream scrapers rely
//! on for encoding query parameters into what would otherwise look like a
//! path, used only by a fetching collaborator — never by the evaluator or
//! chain resolver themselves.

/// Replaces the first `|` in `url` with `?`, leaving every other character
/// untouched.
///
/// This is exposed as a free function rather than wired into [`crate::eval`]
/// or [`crate::chain`] on purpose: the evaluator and chain resolver never
/// fetch a URL, so they never need this rewrite.
#[must_use]
pub fn normalize_query_separator(url: &str) -> String {
    match url.find('|') {
        Some(index) => {
            let mut normalized = String::with_capacity(url.len());
            normalized.push_str(&url[..index]);
            normalized.push('?');
            normalized.push_str(&url[index + '|'.len_utf8()..]);
            normalized
        }
        None => url.to_string(),
    }
}
