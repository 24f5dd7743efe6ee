//! Object Adapter: runs the repair engine against a single key/value
//! JSON object, applying the contact adapter's name-splitting rule
//! first when the target schema calls for it.
//!
//! This is the thinnest of the three adapters: it turns a JSON object into
//! the `(header_keys, rows)` shape [`repair_core::engine::repair`] expects,
//! runs a one-record batch, and unwraps the single resulting record.

use repair_core::engine::{OutputRecord, Summary};
use repair_core::header::{resolve_headers, Resolved};
use repair_core::name_split;
use repair_core::schema::Schema;
use repair_core::slug::slug;
use repair_core::trace::{Op, TraceEntry};
use serde_json::{Map, Value};
use thiserror::Error;

/// Structural failures at the object adapter boundary.
#[derive(Debug, Error)]
pub enum ObjectError {
    #[error("invalid_json:expected a JSON object")]
    NotAnObject,
}

/// The repaired record plus its trace and the batch-of-one summary.
pub struct ObjectResult {
    pub record: OutputRecord,
    pub trace: Vec<TraceEntry>,
    pub summary: Summary,
}

/// Normalize `payload` against `schema`. `payload` must be a JSON object;
/// anything else is a structural error.
pub fn normalize(schema: &Schema, payload: &Value) -> Result<ObjectResult, ObjectError> {
    let object = payload.as_object().ok_or(ObjectError::NotAnObject)?;
    Ok(normalize_object(schema, object))
}

fn normalize_object(schema: &Schema, object: &Map<String, Value>) -> ObjectResult {
    let mut keys: Vec<String> = object.keys().cloned().collect();
    let mut values: Vec<String> = keys.iter().map(|k| raw_value(&object[k])).collect();

    let split_trace = maybe_split_name(schema, &mut keys, &mut values);

    let result = repair_core::engine::repair(schema, &keys, &values_as_row(&values));
    let mut trace = split_trace;
    trace.extend(
        result
            .sample_diffs
            .first()
            .map(|diff| diff.trace.clone())
            .unwrap_or_default(),
    );

    tracing::info!(schema = %schema.name, fields = keys.len(), "normalized object");

    ObjectResult {
        record: result
            .records_out
            .into_iter()
            .next()
            .expect("a one-record batch always yields exactly one output record"),
        trace,
        summary: result.summary,
    }
}

fn values_as_row(values: &[String]) -> [Vec<String>; 1] {
    [values.to_vec()]
}

/// If `schema` supports name splitting and the object carries a `name`-like
/// key but neither `first_name` nor `last_name`, split it in place and
/// return the `split_name` trace entries it produced.
fn maybe_split_name(schema: &Schema, keys: &mut Vec<String>, values: &mut Vec<String>) -> Vec<TraceEntry> {
    if !schema.supports_name_split() {
        return Vec::new();
    }

    let (header_map, _) = resolve_headers(schema, keys);
    let already_split = header_map.entries().iter().any(|(_, resolved)| {
        matches!(resolved, Resolved::Field { field, .. } if field == "first_name" || field == "last_name")
    });
    if already_split {
        return Vec::new();
    }

    let Some(idx) = keys.iter().position(|k| name_split::is_name_alias(&slug(k))) else {
        return Vec::new();
    };

    let name_key = keys[idx].clone();
    let raw = values[idx].trim().to_string();
    if raw.is_empty() {
        return Vec::new();
    }

    let (first, last) = name_split::split(&raw);
    keys.remove(idx);
    values.remove(idx);

    let mut insert_at = idx;
    if let Some(last_value) = &last {
        keys.insert(insert_at, "last_name".to_string());
        values.insert(insert_at, last_value.clone());
        insert_at += 1;
    }
    if let Some(first_value) = &first {
        keys.insert(insert_at, "first_name".to_string());
        values.insert(insert_at, first_value.clone());
    }

    let from = format!("{name_key}={raw}");
    let mut trace = Vec::new();
    if let Some(first_value) = &first {
        trace.push(TraceEntry::new(Op::SplitName, "first_name").from(from.clone()).to(first_value.clone()));
    }
    if let Some(last_value) = &last {
        trace.push(TraceEntry::new(Op::SplitName, "last_name").from(from.clone()).to(last_value.clone()));
    }
    trace
}

/// Render a JSON scalar as the raw string the engine's coercers expect.
/// Arrays/objects pass through as their compact JSON text (opaque input).
fn raw_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}
