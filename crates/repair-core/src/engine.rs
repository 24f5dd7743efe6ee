//! Repair Engine: drives a batch of records through the Header
//! Resolver and Value Coercer, assembling the output records, the trace,
//! and the summary.
//!
//! The engine is purely functional: no shared mutable state, no I/O. The
//! same [`repair`] call underpins the tabular, event, and object adapters —
//! they differ only in how they turn their native input into the
//! `(header_keys, rows)` shape this function expects.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::coerce::coerce;
use crate::header::{resolve_headers, HeaderMap, Resolved};
use crate::schema::Schema;
use crate::trace::{Op, TraceEntry};

/// How many `before`/`after` pairs [`RepairResult::sample_diffs`] retains.
pub const SAMPLE_DIFF_LIMIT: usize = 5;

/// One output record: every schema field, in schema order, each either a
/// canonical value or *absent*.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputRecord(Vec<(String, Option<String>)>);

impl OutputRecord {
    fn blank(schema: &Schema) -> Self {
        Self(schema.fields().iter().map(|f| (f.name.clone(), None)).collect())
    }

    pub(crate) fn set(&mut self, field: &str, value: Option<String>) {
        if let Some(slot) = self.0.iter_mut().find(|(name, _)| name == field) {
            slot.1 = value;
        }
    }

    /// The value of `field`, if present on this record and not absent.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.iter().find(|(name, _)| name == field)?.1.as_deref()
    }

    /// Fields in schema order, as `(name, value)` pairs.
    #[must_use]
    pub fn fields(&self) -> &[(String, Option<String>)] {
        &self.0
    }

    /// Render as a JSON object, *absent* fields as `null`.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        for (field, value) in &self.0 {
            map.insert(field.clone(), value.clone().map_or(serde_json::Value::Null, serde_json::Value::String));
        }
        serde_json::Value::Object(map)
    }
}

/// One `input -> field/unmapped` fact, for the summary's `header_map`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeaderMapSummaryEntry {
    pub input: String,
    pub field: Option<String>,
    pub unit: Option<String>,
}

/// `{schema, rows_in, rows_out, header_map, error_counts}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Summary {
    pub schema: String,
    pub rows_in: usize,
    pub rows_out: usize,
    pub header_map: Vec<HeaderMapSummaryEntry>,
    pub error_counts: BTreeMap<String, usize>,
}

/// One retained before/after pair, with the trace that explains the change.
#[derive(Debug, Clone)]
pub struct SampleDiff {
    pub before: Vec<(String, String)>,
    pub after: OutputRecord,
    pub trace: Vec<TraceEntry>,
}

/// `{records_out, summary, sample_diffs}`.
#[derive(Debug, Clone)]
pub struct RepairResult {
    pub records_out: Vec<OutputRecord>,
    pub summary: Summary,
    pub sample_diffs: Vec<SampleDiff>,
}

/// Repair a batch: `header_keys` names each column/key, applied positionally
/// to every row in `rows`.
#[must_use]
pub fn repair(schema: &Schema, header_keys: &[String], rows: &[Vec<String>]) -> RepairResult {
    let (header_map, _) = resolve_headers(schema, header_keys);

    let mut records_out = Vec::with_capacity(rows.len());
    let mut sample_diffs = Vec::new();
    let mut error_counts: BTreeMap<String, usize> = BTreeMap::new();

    for row in rows {
        let (output, record_trace) = repair_row(schema, &header_map, row);

        for entry in &record_trace {
            if matches!(entry.op, Op::CoerceError | Op::Unmapped) {
                let key = entry.detail.clone().unwrap_or_else(|| "unmapped".to_string());
                *error_counts.entry(key).or_insert(0) += 1;
            }
        }

        if sample_diffs.len() < SAMPLE_DIFF_LIMIT {
            let before = header_keys
                .iter()
                .cloned()
                .zip(row.iter().cloned().chain(std::iter::repeat(String::new())))
                .collect();
            sample_diffs.push(SampleDiff { before, after: output.clone(), trace: record_trace });
        }

        records_out.push(output);
    }

    let summary = Summary {
        schema: schema.name.clone(),
        rows_in: rows.len(),
        rows_out: records_out.len(),
        header_map: summarize_header_map(&header_map),
        error_counts,
    };

    RepairResult { records_out, summary, sample_diffs }
}

/// Run one row through the already-resolved header map, producing its
/// output record and full trace (header facts interleaved with the
/// coercion decisions they triggered, in input-key order).
fn repair_row(schema: &Schema, header_map: &HeaderMap, row: &[String]) -> (OutputRecord, Vec<TraceEntry>) {
    let mut output = OutputRecord::blank(schema);
    let mut trace = Vec::new();

    for (idx, (input_key, resolved)) in header_map.entries().iter().enumerate() {
        let raw = row.get(idx).map(String::as_str).unwrap_or("");
        match resolved {
            Resolved::Field { field, unit } => {
                trace.push(TraceEntry::new(Op::MapHeader, field.clone()).from(input_key.clone()));
                let kind = schema
                    .kind_of(field)
                    .expect("header resolution only returns fields declared on the schema");
                let coerced = coerce(kind, field, raw, unit.as_deref());
                output.set(field, coerced.value);
                trace.extend(coerced.trace);
            }
            Resolved::Unmapped { duplicate_of } => {
                let detail = duplicate_of
                    .as_ref()
                    .map_or_else(|| "unmapped".to_string(), |f| format!("duplicate_of:{f}"));
                trace.push(TraceEntry::new(Op::Unmapped, input_key.clone()).detail(detail));
            }
        }
    }

    (output, trace)
}

fn summarize_header_map(header_map: &HeaderMap) -> Vec<HeaderMapSummaryEntry> {
    header_map
        .entries()
        .iter()
        .map(|(input, resolved)| match resolved {
            Resolved::Field { field, unit } => {
                HeaderMapSummaryEntry { input: input.clone(), field: Some(field.clone()), unit: unit.clone() }
            }
            Resolved::Unmapped { .. } => HeaderMapSummaryEntry { input: input.clone(), field: None, unit: None },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaRegistry;

    fn keys(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| (*s).to_string()).collect()
    }

    fn row(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn s1_contacts_header_remap_and_coercion() {
        let registry = SchemaRegistry::bootstrap();
        let schema = registry.get("contacts").unwrap();
        let header = keys(&["Email", "E-Mail", "Phone", "First Name", "Last Name", "Company"]);
        let rows = vec![row(&["A@B.COM", "x@y.com", "(555) 123-4567", "Jane", "Doe", "Acme"])];

        let result = repair(schema, &header, &rows);
        let out = &result.records_out[0];
        assert_eq!(out.get("email"), Some("a@b.com"));
        assert_eq!(out.get("phone"), Some("5551234567"));
        assert_eq!(out.get("first_name"), Some("Jane"));
        assert_eq!(out.get("last_name"), Some("Doe"));
        assert_eq!(out.get("company"), Some("Acme"));

        let trace = &result.sample_diffs[0].trace;
        assert!(trace.iter().any(|t| t.op == Op::Unmapped && t.detail.as_deref() == Some("duplicate_of:email")));
    }

    #[test]
    fn s2_products_unit_tagged_header() {
        let registry = SchemaRegistry::bootstrap();
        let schema = registry.get("products").unwrap();
        let header = keys(&["SKU", "Name", "Weight (lb)", "Length (ft)"]);
        let rows = vec![row(&["K1", "Widget", "2.2", "3"])];

        let result = repair(schema, &header, &rows);
        let out = &result.records_out[0];
        assert_eq!(out.get("sku"), Some("K1"));
        assert_eq!(out.get("name"), Some("Widget"));
        assert_eq!(out.get("weight_kg"), Some("0.997903"));
        assert_eq!(out.get("length_m"), Some("0.914400"));
        assert_eq!(out.get("price"), None);
    }

    #[test]
    fn s3_transactions_mixed_dates() {
        let registry = SchemaRegistry::bootstrap();
        let schema = registry.get("transactions").unwrap();
        let header = keys(&["occurred_at"]);
        let rows = vec![
            row(&["2024-01-02"]),
            row(&["01/02/2024"]),
            row(&["Jan 2, 2024"]),
            row(&["not a date"]),
        ];

        let result = repair(schema, &header, &rows);
        assert_eq!(result.records_out[0].get("occurred_at"), Some("2024-01-02"));
        assert_eq!(result.records_out[1].get("occurred_at"), Some("2024-01-02"));
        assert_eq!(result.records_out[2].get("occurred_at"), Some("2024-01-02"));
        assert_eq!(result.records_out[3].get("occurred_at"), None);
        assert_eq!(result.summary.error_counts.get("unrecognized_date:not a date"), Some(&1));
    }

    #[test]
    fn every_output_record_has_full_schema_field_set() {
        let registry = SchemaRegistry::bootstrap();
        let schema = registry.get("products").unwrap();
        let header = keys(&["SKU"]);
        let rows = vec![row(&["K1"])];
        let result = repair(schema, &header, &rows);
        let fields: Vec<&str> = result.records_out[0].fields().iter().map(|(f, _)| f.as_str()).collect();
        let expected: Vec<&str> = schema.fields().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(fields, expected);
    }

    #[test]
    fn idempotent_on_its_own_output() {
        let registry = SchemaRegistry::bootstrap();
        let schema = registry.get("contacts").unwrap();
        let header = keys(&["Email", "Phone", "First Name", "Last Name", "Company"]);
        let rows = vec![row(&["A@B.COM", "(555) 123-4567", "Jane", "Doe", "Acme"])];

        let once = repair(schema, &header, &rows);
        let rendered: Vec<String> = once.records_out[0].fields().iter().map(|(_, v)| v.clone().unwrap_or_default()).collect();
        let twice = repair(schema, &header, &[rendered]);

        assert_eq!(once.records_out[0], twice.records_out[0]);
    }

    #[test]
    fn deterministic_across_runs() {
        let registry = SchemaRegistry::bootstrap();
        let schema = registry.get("contacts").unwrap();
        let header = keys(&["Email", "Phone"]);
        let rows = vec![row(&["A@B.COM", "555-1234"])];

        let first = repair(schema, &header, &rows);
        let second = repair(schema, &header, &rows);
        assert_eq!(first.records_out[0], second.records_out[0]);
        assert_eq!(first.summary.error_counts, second.summary.error_counts);
    }

    #[test]
    fn order_preservation() {
        let registry = SchemaRegistry::bootstrap();
        let schema = registry.get("contacts").unwrap();
        let header = keys(&["Email"]);
        let rows = vec![row(&["a@b.com"]), row(&["c@d.com"]), row(&["e@f.com"])];
        let result = repair(schema, &header, &rows);
        let emails: Vec<Option<&str>> = result.records_out.iter().map(|r| r.get("email")).collect();
        assert_eq!(emails, vec![Some("a@b.com"), Some("c@d.com"), Some("e@f.com")]);
    }

    #[test]
    fn sample_diffs_capped_at_limit() {
        let registry = SchemaRegistry::bootstrap();
        let schema = registry.get("contacts").unwrap();
        let header = keys(&["Email"]);
        let rows: Vec<Vec<String>> = (0..20).map(|i| row(&[&format!("user{i}@b.com")])).collect();
        let result = repair(schema, &header, &rows);
        assert_eq!(result.sample_diffs.len(), SAMPLE_DIFF_LIMIT);
        assert_eq!(result.records_out.len(), 20);
    }

    #[test]
    fn all_fields_failing_still_yields_all_absent_row() {
        let registry = SchemaRegistry::bootstrap();
        let schema = registry.get("transactions").unwrap();
        let header = keys(&["amount", "occurred_at", "currency"]);
        let rows = vec![row(&["not-a-number", "not-a-date", "dollars"])];
        let result = repair(schema, &header, &rows);
        let out = &result.records_out[0];
        assert_eq!(out.get("amount"), None);
        assert_eq!(out.get("occurred_at"), None);
        assert_eq!(out.get("currency"), None);
    }
}
