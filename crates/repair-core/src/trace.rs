//! The trace: an ordered, machine-readable record of every decision the
//! engine makes while repairing one record.
//!
//! The trace is part of the contract, not a debug artifact — entry order and
//! the `op` vocabulary below must not change shape across releases.

use serde::{Deserialize, Serialize};

/// Closed vocabulary of trace operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Op {
    MapHeader,
    Unmapped,
    Lower,
    Digits,
    ParseDate,
    ParseDecimal,
    UppercaseCurrency,
    SplitName,
    ConvertUnit,
    CoerceError,
    TimestampFallback,
}

/// One entry in a record's trace: `{op, field, from?, to?, detail?}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceEntry {
    pub op: Op,
    pub field: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl TraceEntry {
    pub fn new(op: Op, field: impl Into<String>) -> Self {
        Self { op, field: field.into(), from: None, to: None, detail: None }
    }

    #[must_use]
    pub fn from(mut self, from: impl Into<String>) -> Self {
        self.from = Some(from.into());
        self
    }

    #[must_use]
    pub fn to(mut self, to: impl Into<String>) -> Self {
        self.to = Some(to.into());
        self
    }

    #[must_use]
    pub fn detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}
