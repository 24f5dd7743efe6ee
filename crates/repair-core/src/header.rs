//! Header Resolver: maps raw input keys/columns to canonical schema
//! fields, once per batch, extracting inline units from parenthesized
//! headers like `Weight (lb)`.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::schema::Schema;
use crate::slug::slug;
use crate::trace::{Op, TraceEntry};

static UNIT_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+?)\s*\(([^)]+)\)\s*$").expect("unit-tag regex is valid"));

/// What a single input key resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    /// Maps to this canonical field; carries the inline unit, if any.
    Field { field: String, unit: Option<String> },
    /// No rule matched, or a duplicate of an already-claimed field.
    Unmapped { duplicate_of: Option<String> },
}

/// Per-batch mapping from input key to canonical field or *unmapped*,
/// preserving input order. Immutable once built.
#[derive(Debug, Clone)]
pub struct HeaderMap {
    entries: Vec<(String, Resolved)>,
}

impl HeaderMap {
    #[must_use]
    pub fn entries(&self) -> &[(String, Resolved)] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Resolve `keys` against `schema`, returning the header map plus the
/// `map_header`/`unmapped` trace entries it produced.
#[must_use]
pub fn resolve_headers(schema: &Schema, keys: &[String]) -> (HeaderMap, Vec<TraceEntry>) {
    let mut claimed: HashSet<String> = HashSet::new();
    let mut entries = Vec::with_capacity(keys.len());
    let mut trace = Vec::with_capacity(keys.len());

    for key in keys {
        let (field_match, unit) = match_field(schema, key);
        let resolved = match field_match {
            Some(field) if claimed.contains(&field) => {
                trace.push(
                    TraceEntry::new(Op::Unmapped, key.clone())
                        .detail(format!("duplicate_of:{field}")),
                );
                Resolved::Unmapped { duplicate_of: Some(field) }
            }
            Some(field) => {
                claimed.insert(field.clone());
                trace.push(TraceEntry::new(Op::MapHeader, field.clone()).from(key.clone()));
                Resolved::Field { field, unit }
            }
            None => {
                trace.push(TraceEntry::new(Op::Unmapped, key.clone()).detail("unmapped"));
                Resolved::Unmapped { duplicate_of: None }
            }
        };
        entries.push((key.clone(), resolved));
    }

    (HeaderMap { entries }, trace)
}

/// Rules 1–3: exact slug, synonym, then retry both on a unit-tagged base.
fn match_field(schema: &Schema, key: &str) -> (Option<String>, Option<String>) {
    if let Some(field) = direct_match(schema, key) {
        return (Some(field), None);
    }
    if let Some(caps) = UNIT_TAG.captures(key.trim()) {
        let base = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        let unit = caps.get(2).map(|m| m.as_str().to_string());
        if let Some(field) = direct_match(schema, base) {
            return (Some(field), unit);
        }
    }
    (None, None)
}

/// Rules 1–2: exact slug match against a field name, then against synonyms.
fn direct_match(schema: &Schema, text: &str) -> Option<String> {
    let needle = slug(text);
    if needle.is_empty() {
        return None;
    }
    for field in schema.fields() {
        if slug(&field.name) == needle {
            return Some(field.name.clone());
        }
    }
    for field in schema.fields() {
        if schema.synonyms_of(&field.name).iter().any(|syn| slug(syn) == needle) {
            return Some(field.name.clone());
        }
    }
    None
}
