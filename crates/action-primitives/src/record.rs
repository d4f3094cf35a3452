//! Ingestion of backend action records.
//!
//! The backend emits two equivalent shapes and both stay supported:
//!
//! ```json
//! {"type": "mouse_move", "parameters": {"x": 5, "y": 5}}
//! {"action": "mouse_move", "x": 5, "y": 5}
//! ```
//!
//! The kind comes from `type`, falling back to `action`. Parameters come from
//! a nested `parameters` object, falling back to the record's own fields.
//! Decoding never fails for a single record: anything unusable becomes
//! [`PageAction::Unsupported`] or an action with missing parameters.

use pagepilot_core_types::Point;
use serde_json::{Map, Value};
use tracing::warn;

use crate::errors::ActionError;
use crate::types::{ActionKind, KeyInput, PageAction, ScrollDirection, TabOp};

/// Decode one record into its canonical form.
pub fn decode_action(record: &Value) -> PageAction {
    let Some(fields) = record.as_object() else {
        warn!(record = %record, "action record is not an object; ignoring");
        return PageAction::Unsupported { tag: None };
    };

    let tag = kind_tag(fields);
    let params = match fields.get("parameters") {
        Some(Value::Object(nested)) => nested,
        _ => fields,
    };

    let Some(tag) = tag else {
        warn!("action record has no kind");
        return PageAction::Unsupported { tag: None };
    };
    let Some(kind) = ActionKind::from_tag(tag) else {
        warn!(kind = %tag, "unknown action kind");
        return PageAction::Unsupported {
            tag: Some(tag.to_string()),
        };
    };

    let params = Params(params);
    match kind {
        ActionKind::MouseMove => PageAction::MovePointer {
            point: match (params.number("x"), params.number("y")) {
                (Some(x), Some(y)) => Some(Point::new(x, y)),
                _ => None,
            },
            box_id: params.label("box_number"),
        },
        ActionKind::LeftClick => PageAction::PrimaryClick,
        ActionKind::RightClick => PageAction::SecondaryClick,
        ActionKind::SendKey => PageAction::SendKeys {
            input: params
                .text("key_name")
                .or_else(|| params.text("keys"))
                .map(|raw| KeyInput::parse(&raw)),
        },
        ActionKind::ScrollUp => PageAction::Scroll {
            direction: ScrollDirection::Up,
            lines: params.lines(),
        },
        ActionKind::ScrollDown => PageAction::Scroll {
            direction: ScrollDirection::Down,
            lines: params.lines(),
        },
        ActionKind::NavigateToLink => PageAction::Navigate {
            url: params.text("url"),
        },
        ActionKind::SwitchTab => PageAction::Tab { op: TabOp::Switch },
        ActionKind::CloseTab => PageAction::Tab { op: TabOp::Close },
        ActionKind::NewTab => PageAction::Tab { op: TabOp::New },
        ActionKind::Wait => PageAction::Wait {
            ms: params.positive("ms"),
        },
        ActionKind::Notification => PageAction::Notify {
            text: params.text("text"),
        },
    }
}

/// Decode every record of a list, in order.
pub fn decode_actions(records: &[Value]) -> Vec<PageAction> {
    records.iter().map(decode_action).collect()
}

/// Decode a payload that must be a JSON array of records.
pub fn decode_action_list(payload: &Value) -> Result<Vec<PageAction>, ActionError> {
    match payload {
        Value::Array(records) => Ok(decode_actions(records)),
        other => Err(ActionError::InvalidPayload(format!(
            "expected an array of actions, got {}",
            json_type(other)
        ))),
    }
}

/// Unwrap the envelopes the backend and tooling use around an action list:
/// a bare array, `{"commands": [...]}`, `{"actions": [...]}`, or
/// `{"error": "..."}`.
pub fn decode_envelope(payload: &Value) -> Result<Vec<PageAction>, ActionError> {
    if let Value::Object(fields) = payload {
        if let Some(commands) = fields.get("commands").or_else(|| fields.get("actions")) {
            return decode_action_list(commands);
        }
        if let Some(error) = fields.get("error") {
            let message = error
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| error.to_string());
            return Err(ActionError::Backend(message));
        }
    }
    decode_action_list(payload)
}

fn kind_tag(fields: &Map<String, Value>) -> Option<&str> {
    non_empty_str(fields, "type").or_else(|| non_empty_str(fields, "action"))
}

fn non_empty_str<'a>(fields: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    fields
        .get(key)
        .and_then(Value::as_str)
        .filter(|tag| !tag.is_empty())
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

struct Params<'a>(&'a Map<String, Value>);

impl Params<'_> {
    /// Numbers are accepted as JSON numbers or numeric strings.
    fn number(&self, key: &str) -> Option<f64> {
        let value = match self.0.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        value.filter(|n| n.is_finite())
    }

    /// Non-zero count; zero and negatives read as "not given" so the
    /// handler applies its default.
    fn positive(&self, key: &str) -> Option<u64> {
        let value = self.number(key)?;
        if value >= 1.0 {
            Some(value.trunc() as u64)
        } else {
            None
        }
    }

    /// Line count, saturated to `u32::MAX`
    fn lines(&self) -> Option<u32> {
        self.positive("lines")
            .map(|n| u32::try_from(n).unwrap_or(u32::MAX))
    }

    fn text(&self, key: &str) -> Option<String> {
        match self.0.get(key)? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Identifier-like value of any scalar type
    fn label(&self, key: &str) -> Option<String> {
        match self.0.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}
