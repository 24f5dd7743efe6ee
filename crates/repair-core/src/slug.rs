//! Slug normalization: the lower-cased, non-alphanumeric-collapsed,
//! underscore-joined form used for every key comparison in the engine.

/// Normalize `s` into its slug form, e.g. `"E-Mail"`, `"email"`, and
/// `"email address"` all slug to `"email"`.
#[must_use]
pub fn slug(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut pending_sep = false;
    for ch in s.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('_');
            }
            out.push(ch.to_ascii_lowercase());
            pending_sep = false;
        } else {
            pending_sep = true;
        }
    }
    out
}
