//! Request-log events and their classification.
//!
//! A captured request is eligible for printing when it was a `POST` whose
//! body is a JSON object with a `message` field.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::timestamps::parse_timestamp;

/// Name of the body field carrying the text to print
pub const MESSAGE_FIELD: &str = "message";

/// One captured request as returned by the request-log API.
///
/// Every field is optional: the upstream is untrusted and an event missing
/// a field is classified, not rejected at decode time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawEvent {
    /// Upstream identifier, only used in logs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    #[serde(default)]
    pub method: Option<String>,
    /// Request body; the API names it `content`
    #[serde(default)]
    pub content: Option<Value>,
    /// Fallback body field used by some API versions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl RawEvent {
    /// Body as sent, preferring `content` over `body`.
    pub fn raw_body(&self) -> Option<&Value> {
        self.content.as_ref().or(self.body.as_ref())
    }

    /// Creation instant, or `None` when the event has no `created_at`.
    ///
    /// Malformed values map to the sentinel instant, see
    /// [`parse_timestamp`](crate::timestamps::parse_timestamp).
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at.as_deref().map(parse_timestamp)
    }

    /// Short label for log lines
    pub fn label(&self) -> &str {
        self.uuid
            .as_deref()
            .or(self.created_at.as_deref())
            .unwrap_or("<unknown>")
    }
}

/// Result of classifying one [`RawEvent`]
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedEvent {
    pub is_eligible: bool,
    pub payload: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Classify `event`, parsing its body once for both checks.
///
/// Returns `None` when the event carries no `created_at`.
pub fn classify(event: &RawEvent) -> Option<ClassifiedEvent> {
    let created_at = event.created_at()?;
    let body = parse_body(event);
    Some(ClassifiedEvent {
        is_eligible: is_post(event) && body.as_ref().is_some_and(has_message_field),
        payload: body.as_ref().and_then(message_text),
        created_at,
    })
}

/// Whether `event` is a `POST` with a JSON object body holding `message`.
pub fn is_eligible(event: &RawEvent) -> bool {
    is_post(event) && parse_body(event).as_ref().is_some_and(has_message_field)
}

/// Text of the `message` field, independent of the method check.
///
/// Strings are returned as-is; other non-null JSON values are returned in
/// their compact JSON form.
pub fn extract_payload(event: &RawEvent) -> Option<String> {
    parse_body(event).as_ref().and_then(message_text)
}

fn is_post(event: &RawEvent) -> bool {
    event
        .method
        .as_deref()
        .is_some_and(|method| method.trim().eq_ignore_ascii_case("POST"))
}

fn has_message_field(body: &Map<String, Value>) -> bool {
    body.contains_key(MESSAGE_FIELD)
}

fn message_text(body: &Map<String, Value>) -> Option<String> {
    match body.get(MESSAGE_FIELD)? {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

/// Decode the body into a JSON object.
///
/// A string body is parsed as JSON text; a body the API already decoded
/// is used directly. Empty bodies, parse failures and non-object documents
/// all yield `None`.
fn parse_body(event: &RawEvent) -> Option<Map<String, Value>> {
    let decoded = match event.raw_body()? {
        Value::String(text) => {
            if text.trim().is_empty() {
                return None;
            }
            serde_json::from_str::<Value>(text).ok()?
        }
        structured => structured.clone(),
    };

    match decoded {
        Value::Object(map) if !map.is_empty() => Some(map),
        _ => None,
    }
}
