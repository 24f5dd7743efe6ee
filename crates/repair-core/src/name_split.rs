//! Name splitting for the contact adapter: turns a single `name`
//! value into `first_name`/`last_name` before the header resolver runs.
//!
//! This only matters for schemas that declare both `first_name` and
//! `last_name` ([`crate::schema::Schema::supports_name_split`]); the object
//! adapter is the only caller, since tabular/event input never carries a
//! bare `name` key in practice.

/// Slugs that are treated as "the full name field" when neither `first_name`
/// nor `last_name` is present. Not a schema synonym table entry, since no
/// bootstrap schema declares a canonical `name` field.
const NAME_ALIASES: &[&str] = &["name", "full_name", "fullname", "contact_name"];

#[must_use]
pub fn is_name_alias(slug: &str) -> bool {
    NAME_ALIASES.contains(&slug)
}

/// Split `raw` into `(first, last)`: a comma splits `"Last, First"`;
/// otherwise the first whitespace run splits `"First Last"`; a single token
/// becomes `first_name` only.
#[must_use]
pub fn split(raw: &str) -> (Option<String>, Option<String>) {
    if let Some((last, first)) = raw.split_once(',') {
        let first = non_empty(first);
        let last = non_empty(last);
        return (first, last);
    }
    if let Some((first, rest)) = raw.split_once(char::is_whitespace) {
        let first = non_empty(first);
        let last = non_empty(rest);
        return (first, last);
    }
    (non_empty(raw), None)
}

fn non_empty(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
