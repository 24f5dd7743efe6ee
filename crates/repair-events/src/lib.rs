//! Event Adapter: a pure function per supported source, mapping a
//! vendor webhook payload into the canonical event shape.
//!
//! Unlike the tabular/object adapters, this one never calls into
//! [`repair_core::engine`] — there is no per-field coercion here, only a
//! fixed structural reshape. It still reports its decisions through the same
//! [`repair_core::trace::TraceEntry`] vocabulary so the HTTP surface can
//! return a consistent shape across all three modalities.

use chrono::{DateTime, Utc};
use repair_core::trace::{Op, TraceEntry};
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// Structural failures at the event adapter boundary.
#[derive(Debug, Error)]
pub enum EventError {
    #[error("unsupported_source:{0}")]
    UnsupportedSource(String),
    #[error("invalid_json:expected a JSON object")]
    NotAnObject,
}

/// `{event_id, source, occurred_at, actor?, subject?, action, metadata?, trace?}`.
#[derive(Debug, Clone, Serialize)]
pub struct CanonicalEvent {
    pub event_id: String,
    pub source: String,
    pub occurred_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<Value>,
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub trace: Vec<TraceEntry>,
}

/// Map `payload` from `source` (`stripe`, `github`, or `slack`) into a
/// [`CanonicalEvent`]. Unknown sources are a structural error.
pub fn normalize_event(source: &str, payload: &Value) -> Result<CanonicalEvent, EventError> {
    let object = payload.as_object().ok_or(EventError::NotAnObject)?;
    let event = match source {
        "stripe" => map_stripe(object),
        "github" => map_github(object),
        "slack" => map_slack(object),
        other => return Err(EventError::UnsupportedSource(other.to_string())),
    };
    tracing::info!(source, event_id = %event.event_id, action = %event.action, "normalized webhook event");
    Ok(event)
}

fn str_field(object: &Map<String, Value>, key: &str) -> String {
    object.get(key).and_then(Value::as_str).unwrap_or_default().to_string()
}

fn from_unix(object: &Map<String, Value>, key: &str) -> (String, Vec<TraceEntry>) {
    let raw = object.get(key).and_then(Value::as_i64);
    match raw.and_then(|secs| DateTime::from_timestamp(secs, 0)) {
        Some(dt) => (dt.to_rfc3339(), Vec::new()),
        None => {
            let now = Utc::now().to_rfc3339();
            let trace = vec![TraceEntry::new(Op::TimestampFallback, "occurred_at")
                .detail("timestamp_fallback")
                .to(now.clone())];
            (now, trace)
        }
    }
}

/// Payment processor (Stripe-shaped) events.
fn map_stripe(object: &Map<String, Value>) -> CanonicalEvent {
    let event_id = str_field(object, "id");
    let action = str_field(object, "type");
    let (occurred_at, trace) = from_unix(object, "created");

    let data_object = object.get("data").and_then(|d| d.get("object")).and_then(Value::as_object);

    let actor = data_object
        .and_then(|o| o.get("customer"))
        .cloned()
        .map(|id| serde_json::json!({ "id": id }));

    let subject = data_object.map(|o| {
        serde_json::json!({
            "type": o.get("object").cloned().unwrap_or(Value::Null),
            "id": o.get("id").cloned().unwrap_or(Value::Null),
        })
    });

    let metadata = data_object.map(|o| {
        let mut rest = o.clone();
        rest.remove("id");
        rest.remove("object");
        rest.remove("customer");
        Value::Object(rest)
    });

    CanonicalEvent {
        event_id,
        source: "stripe".to_string(),
        occurred_at,
        actor,
        subject,
        action,
        metadata,
        trace,
    }
}

/// Source-control (GitHub-shaped) events.
fn map_github(object: &Map<String, Value>) -> CanonicalEvent {
    let event_id = str_field(object, "id");
    let action = str_field(object, "action");
    let occurred_at = Utc::now().to_rfc3339();

    let sender = object.get("sender").and_then(Value::as_object);
    let actor = sender.map(|s| {
        serde_json::json!({
            "id": s.get("id").cloned().unwrap_or(Value::Null),
            "login": s.get("login").cloned().unwrap_or(Value::Null),
        })
    });

    let (subject_type, sub_object) = if let Some(pr) = object.get("pull_request").and_then(Value::as_object) {
        (Some("pull_request"), Some(pr))
    } else if let Some(issue) = object.get("issue").and_then(Value::as_object) {
        (Some("issue"), Some(issue))
    } else {
        (None, None)
    };

    let subject = subject_type.map(|kind| {
        serde_json::json!({
            "type": kind,
            "id": sub_object.and_then(|o| o.get("id")).cloned().unwrap_or(Value::Null),
            "number": sub_object.and_then(|o| o.get("number")).cloned().unwrap_or(Value::Null),
        })
    });

    let title = sub_object.and_then(|o| o.get("title")).cloned().unwrap_or(Value::Null);
    let url = sub_object
        .and_then(|o| o.get("html_url").or_else(|| o.get("url")))
        .cloned()
        .unwrap_or(Value::Null);
    let repo_full_name = object
        .get("repository")
        .and_then(|r| r.get("full_name"))
        .cloned()
        .unwrap_or(Value::Null);

    let metadata = Some(serde_json::json!({
        "title": title,
        "url": url,
        "repository": repo_full_name,
    }));

    CanonicalEvent {
        event_id,
        source: "github".to_string(),
        occurred_at,
        actor,
        subject,
        action,
        metadata,
        trace: Vec::new(),
    }
}

/// Chat (Slack-shaped) events.
fn map_slack(object: &Map<String, Value>) -> CanonicalEvent {
    let event_id = str_field(object, "event_id");
    let (occurred_at, trace) = from_unix(object, "event_time");

    let inner = object.get("event").and_then(Value::as_object);
    let action = inner.map(|e| str_field(e, "type")).unwrap_or_default();

    let actor = inner
        .and_then(|e| e.get("user"))
        .cloned()
        .map(|id| serde_json::json!({ "id": id }));

    let subject = inner.map(|e| {
        serde_json::json!({
            "type": e.get("type").cloned().unwrap_or(Value::Null),
            "channel": e.get("channel").cloned().unwrap_or(Value::Null),
        })
    });

    let metadata = inner.map(|e| {
        let mut rest = e.clone();
        rest.remove("user");
        rest.remove("channel");
        rest.remove("type");
        Value::Object(rest)
    });

    CanonicalEvent {
        event_id,
        source: "slack".to_string(),
        occurred_at,
        actor,
        subject,
        action,
        metadata,
        trace,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn s4_payment_processor_event() {
        let payload = serde_json::json!({
            "id": "evt_1",
            "type": "charge.succeeded",
            "created": 1_700_000_000,
            "data": {
                "object": {
                    "id": "ch_1",
                    "object": "charge",
                    "customer": "cus_1",
                    "amount": 1299
                }
            }
        });

        let event = normalize_event("stripe", &payload).unwrap();
        assert_eq!(event.source, "stripe");
        assert_eq!(event.action, "charge.succeeded");
        assert_eq!(event.actor, Some(serde_json::json!({ "id": "cus_1" })));
        assert_eq!(event.subject, Some(serde_json::json!({ "type": "charge", "id": "ch_1" })));
        assert_eq!(event.metadata, Some(serde_json::json!({ "amount": 1299 })));
        assert_eq!(event.occurred_at, "2023-11-14T22:13:20+00:00");
        assert!(event.trace.is_empty());
    }

    #[test]
    fn s5_chat_event_with_missing_timestamp_falls_back_to_now() {
        let payload = serde_json::json!({
            "event_id": "E",
            "event": { "type": "message", "user": "U", "channel": "C", "text": "hi" }
        });

        let before = Utc::now();
        let event = normalize_event("slack", &payload).unwrap();
        let occurred_at: DateTime<Utc> = event.occurred_at.parse().unwrap();

        assert_eq!(event.action, "message");
        assert_eq!(event.metadata, Some(serde_json::json!({ "text": "hi" })));
        assert!((occurred_at - before) < Duration::seconds(5));
        assert!(event.trace.iter().any(|t| t.op == Op::TimestampFallback));
    }

    #[test]
    fn github_pull_request_event() {
        let payload = serde_json::json!({
            "id": "d1",
            "action": "opened",
            "sender": { "id": 1, "login": "octocat" },
            "pull_request": { "id": 99, "number": 5, "title": "Fix bug", "html_url": "https://x/5" },
            "repository": { "full_name": "org/repo" }
        });

        let event = normalize_event("github", &payload).unwrap();
        assert_eq!(event.subject, Some(serde_json::json!({ "type": "pull_request", "id": 99, "number": 5 })));
        assert_eq!(event.actor, Some(serde_json::json!({ "id": 1, "login": "octocat" })));
        assert_eq!(
            event.metadata,
            Some(serde_json::json!({ "title": "Fix bug", "url": "https://x/5", "repository": "org/repo" }))
        );
    }

    #[test]
    fn github_issue_event_when_no_pull_request_present() {
        let payload = serde_json::json!({
            "id": "d2",
            "action": "closed",
            "sender": { "id": 2, "login": "bob" },
            "issue": { "id": 42, "number": 7, "title": "Bug report" },
            "repository": { "full_name": "org/repo" }
        });

        let event = normalize_event("github", &payload).unwrap();
        assert_eq!(event.subject, Some(serde_json::json!({ "type": "issue", "id": 42, "number": 7 })));
    }

    #[test]
    fn unsupported_source_is_structural_error() {
        let payload = serde_json::json!({});
        let err = normalize_event("bogus", &payload).unwrap_err();
        assert!(matches!(err, EventError::UnsupportedSource(s) if s == "bogus"));
    }

    #[test]
    fn non_object_payload_is_structural_error() {
        let payload = serde_json::json!([1, 2, 3]);
        let err = normalize_event("stripe", &payload).unwrap_err();
        assert!(matches!(err, EventError::NotAnObject));
    }

    #[test]
    fn missing_fields_are_absent_not_zero_valued() {
        let payload = serde_json::json!({ "id": "evt_2", "type": "ping", "created": 1_700_000_000 });
        let event = normalize_event("stripe", &payload).unwrap();
        assert_eq!(event.actor, None);
        assert_eq!(event.subject, None);
        assert_eq!(event.metadata, None);
    }
}
