//! Tabular Adapter: parses delimited input with a permissive decoder,
//! drives the repair engine once per row, and serializes canonical output
//! with the schema's declared field order.
//!
//! A real CSV reader/writer is used throughout (RFC 4180 quoting, embedded
//! commas/newlines/quotes) rather than naive `split(',')`; only the initial
//! byte-to-`String` step is permissive, replacing invalid UTF-8 sequences
//! with U+FFFD before the bytes ever reach the CSV reader.

use repair_core::engine::RepairResult;
use repair_core::schema::Schema;
use thiserror::Error;

/// Structural failures at the tabular adapter boundary. Per-row
/// coercion failures never surface here — they live in-band in the trace.
#[derive(Debug, Error)]
pub enum TabularError {
    #[error("unreadable_input:missing header row")]
    MissingHeader,
    #[error("unreadable_input:{0}")]
    Csv(#[from] csv::Error),
}

/// `repair_csv`'s result: the rendered CSV bytes plus the engine's summary
/// and sample diffs, for callers (HTTP handler, CLI) that want to report on
/// the repair without re-parsing their own output.
pub struct TabularResult {
    pub output_csv: Vec<u8>,
    pub repair: RepairResult,
}

/// Repair `input` (raw bytes, permissively decoded) against `schema`,
/// returning the schema-ordered CSV output plus the repair summary.
pub fn repair_csv(schema: &Schema, input: &[u8]) -> Result<TabularResult, TabularError> {
    let text = String::from_utf8_lossy(input);

    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(text.as_bytes());
    let header_keys: Vec<String> = reader
        .headers()
        .map_err(|_| TabularError::MissingHeader)?
        .iter()
        .map(str::to_string)
        .collect();
    if header_keys.is_empty() {
        return Err(TabularError::MissingHeader);
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect::<Vec<String>>());
    }

    tracing::info!(
        schema = %schema.name,
        rows_in = rows.len(),
        columns = header_keys.len(),
        "repairing tabular batch"
    );

    let result = repair_core::repair(schema, &header_keys, &rows);
    let output_csv = render_csv(schema, &result)?;

    Ok(TabularResult { output_csv, repair: result })
}

/// Render the engine's output records as CSV, schema-field-ordered, with
/// *absent* rendered as an empty string.
fn render_csv(schema: &Schema, result: &RepairResult) -> Result<Vec<u8>, TabularError> {
    let mut writer = csv::WriterBuilder::new().from_writer(Vec::new());
    let header: Vec<&str> = schema.fields().iter().map(|f| f.name.as_str()).collect();
    writer.write_record(&header)?;

    for record in &result.records_out {
        let row: Vec<&str> = record.fields().iter().map(|(_, v)| v.as_deref().unwrap_or("")).collect();
        writer.write_record(&row)?;
    }

    writer.flush().map_err(|e| TabularError::Csv(e.into()))?;
    Ok(writer.into_inner().expect("writer flushed above"))
}
