//! Value Coercer: per-kind normalization and validation.
//!
//! Every coercer shares one rule: empty or whitespace-only input becomes
//! *absent* with no error, regardless of kind. A coercion failure always
//! yields *absent* plus a `coerce_error` trace entry — never a partial or
//! garbled value.

use crate::schema::Kind;
use crate::trace::{Op, TraceEntry};
use crate::units;

/// Extra date formats tried only after the six fixed formats fail.
/// Not an attempt at fuzzy/statistical parsing — still a closed, ordered list.
const GENERAL_DATE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%d.%m.%Y",
    "%m-%d-%Y",
    "%B %d, %Y",
    "%d %B %Y",
    "%d %b %Y",
];

const FIXED_DATE_FORMATS: &[&str] =
    &["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d", "%d-%b-%Y", "%d/%m/%Y", "%b %d, %Y"];

const COMMON_CURRENCIES: &[&str] = &["USD", "EUR", "GBP", "JPY", "CAD", "AUD", "INR"];

/// Result of coercing one raw value under one field's kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coerced {
    pub value: Option<String>,
    pub trace: Vec<TraceEntry>,
}

impl Coerced {
    fn absent() -> Self {
        Self { value: None, trace: Vec::new() }
    }

    fn ok(value: String, entry: TraceEntry) -> Self {
        Self { value: Some(value), trace: vec![entry] }
    }

    fn err(field: &str, detail: impl Into<String>) -> Self {
        Self { value: None, trace: vec![TraceEntry::new(Op::CoerceError, field).detail(detail.into())] }
    }
}

/// Coerce `raw` under `kind`. `unit`, when present, came from a unit-tagged
/// header and only matters for `mass_si`/`length_si`.
#[must_use]
pub fn coerce(kind: Kind, field: &str, raw: &str, unit: Option<&str>) -> Coerced {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Coerced::absent();
    }

    match kind {
        Kind::Email => coerce_email(field, trimmed),
        Kind::Phone => coerce_phone(field, trimmed),
        Kind::Decimal => coerce_decimal(field, trimmed),
        Kind::Date => coerce_date(field, trimmed),
        Kind::Currency => coerce_currency(field, trimmed),
        Kind::OpaqueId => Coerced { value: Some(trimmed.to_string()), trace: Vec::new() },
        Kind::FreeText => Coerced { value: Some(trimmed.to_string()), trace: Vec::new() },
        Kind::MassSi => coerce_dimensional(field, trimmed, unit, units::normalize_mass),
        Kind::LengthSi => coerce_dimensional(field, trimmed, unit, units::normalize_length),
    }
}

fn coerce_email(field: &str, trimmed: &str) -> Coerced {
    let lowered = trimmed.to_lowercase();
    Coerced::ok(lowered.clone(), TraceEntry::new(Op::Lower, field).from(trimmed).to(lowered))
}

fn coerce_phone(field: &str, trimmed: &str) -> Coerced {
    let digits: String = trimmed.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return Coerced::absent();
    }
    Coerced::ok(digits.clone(), TraceEntry::new(Op::Digits, field).from(trimmed).to(digits))
}

/// Strip everything but digits, `.`, and `-`, as the `decimal` kind specifies.
fn strip_numeric(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-').collect()
}

fn coerce_decimal(field: &str, trimmed: &str) -> Coerced {
    let stripped = strip_numeric(trimmed);
    match stripped.parse::<f64>() {
        Ok(value) => {
            let rendered = format!("{value:.2}");
            Coerced::ok(rendered.clone(), TraceEntry::new(Op::ParseDecimal, field).from(trimmed).to(rendered))
        }
        Err(_) => Coerced::err(field, format!("bad_decimal:{trimmed}")),
    }
}

fn coerce_date(field: &str, trimmed: &str) -> Coerced {
    for fmt in FIXED_DATE_FORMATS.iter().chain(GENERAL_DATE_FORMATS) {
        if let Ok(date) = chrono::NaiveDate::parse_from_str(trimmed, fmt) {
            let rendered = date.format("%Y-%m-%d").to_string();
            return Coerced::ok(rendered.clone(), TraceEntry::new(Op::ParseDate, field).from(trimmed).to(rendered));
        }
        if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(trimmed, fmt) {
            let rendered = dt.format("%Y-%m-%d").to_string();
            return Coerced::ok(rendered.clone(), TraceEntry::new(Op::ParseDate, field).from(trimmed).to(rendered));
        }
    }
    Coerced::err(field, format!("unrecognized_date:{trimmed}"))
}

fn coerce_currency(field: &str, trimmed: &str) -> Coerced {
    let stripped: String = trimmed.chars().filter(|c| c.is_ascii_alphabetic()).collect();
    let upper = stripped.to_uppercase();
    let valid = COMMON_CURRENCIES.contains(&upper.as_str()) || (2..=4).contains(&upper.len());
    if valid && !upper.is_empty() {
        Coerced::ok(upper.clone(), TraceEntry::new(Op::UppercaseCurrency, field).from(trimmed).to(upper))
    } else {
        Coerced::err(field, format!("bad_currency:{trimmed}"))
    }
}

fn coerce_dimensional(
    field: &str,
    trimmed: &str,
    unit: Option<&str>,
    convert: fn(f64, &str) -> Result<f64, String>,
) -> Coerced {
    let stripped = strip_numeric(trimmed);
    let Ok(raw_value) = stripped.parse::<f64>() else {
        return Coerced::err(field, format!("bad_decimal:{trimmed}"));
    };

    match unit {
        Some(unit) => match convert(raw_value, unit) {
            Ok(si_value) => {
                let rendered = format!("{si_value:.6}");
                Coerced::ok(
                    rendered.clone(),
                    TraceEntry::new(Op::ConvertUnit, field).from(trimmed).to(rendered).detail(unit),
                )
            }
            Err(detail) => Coerced::err(field, detail),
        },
        None => {
            let rendered = format!("{raw_value:.6}");
            Coerced::ok(
                rendered.clone(),
                TraceEntry::new(Op::ParseDecimal, field).from(trimmed).to(rendered),
            )
        }
    }
}
