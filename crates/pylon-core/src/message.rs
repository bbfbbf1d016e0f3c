//! Frame classification
//!
//! The classifier never panics on bad input: syntactically broken text
//! becomes [`Error::Parse`], and well-formed JSON with a missing or
//! unrecognized `type` becomes [`MessageKind::Unknown`] carrying the
//! original tag so the hub can echo it back to the sender.

use serde::Serialize;
use serde_json::Value;

use crate::error::{Error, Result};

/// Wire tag for sensor readings (device to viewers)
pub const TYPE_SENSOR_DATA: &str = "sensor_data";
/// Wire tag for control commands (viewer to device)
pub const TYPE_COMMAND: &str = "command";
/// Wire tag for chat between viewers
pub const TYPE_CHAT_MESSAGE: &str = "chat_message";
/// Wire tag for status frames; server-originated, never expected as input
pub const TYPE_STATUS_UPDATE: &str = "status_update";

/// Semantic type of an inbound frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageKind {
    /// Sensor reading; the first connection to send one becomes the device
    SensorData,
    /// Control command destined for the device
    Command,
    /// Chat text fanned out to the other connections
    ChatMessage,
    /// Status frame arriving as input (clients should not send these)
    StatusUpdate,
    /// Well-formed JSON with an unrecognized `type` tag, tag preserved
    Unknown(String),
}

impl MessageKind {
    /// The tag to echo back in `unknown type:` status replies
    pub fn tag(&self) -> &str {
        match self {
            MessageKind::SensorData => TYPE_SENSOR_DATA,
            MessageKind::Command => TYPE_COMMAND,
            MessageKind::ChatMessage => TYPE_CHAT_MESSAGE,
            MessageKind::StatusUpdate => TYPE_STATUS_UPDATE,
            MessageKind::Unknown(tag) => tag,
        }
    }
}

/// A classified inbound frame
///
/// Ephemeral: exists for one routing decision. The hub forwards the raw
/// text verbatim, so only the routing-relevant fields are extracted.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub kind: MessageKind,
    /// The `content` field, when present and a string
    pub content: Option<String>,
}

/// Classify a raw text frame.
///
/// Returns [`Error::Parse`] only for syntactically broken JSON. Every
/// well-formed document classifies successfully: a missing `type` key maps
/// to `Unknown("(none)")`, a non-string `type` is echoed in its JSON
/// rendering.
pub fn classify(raw: &str) -> Result<Message> {
    let value: Value = serde_json::from_str(raw).map_err(|e| Error::Parse(e.to_string()))?;

    let kind = match value.get("type") {
        Some(Value::String(tag)) => match tag.as_str() {
            TYPE_SENSOR_DATA => MessageKind::SensorData,
            TYPE_COMMAND => MessageKind::Command,
            TYPE_CHAT_MESSAGE => MessageKind::ChatMessage,
            TYPE_STATUS_UPDATE => MessageKind::StatusUpdate,
            other => MessageKind::Unknown(other.to_string()),
        },
        Some(other) => MessageKind::Unknown(other.to_string()),
        None => MessageKind::Unknown("(none)".to_string()),
    };

    let content = value
        .get("content")
        .and_then(Value::as_str)
        .map(str::to_string);

    Ok(Message { kind, content })
}

#[derive(Serialize)]
struct StatusFrame<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    content: &'a str,
}

/// Build a server-originated `status_update` frame.
pub fn status(content: &str) -> String {
    // Two borrowed strings; serialization cannot fail
    serde_json::to_string(&StatusFrame {
        kind: TYPE_STATUS_UPDATE,
        content,
    })
    .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_known_tags() {
        let msg = classify(r#"{"type":"sensor_data","temperature":21.5}"#).unwrap();
        assert_eq!(msg.kind, MessageKind::SensorData);
        assert_eq!(msg.content, None);

        let msg = classify(r#"{"type":"command","content":"led_on"}"#).unwrap();
        assert_eq!(msg.kind, MessageKind::Command);
        assert_eq!(msg.content.as_deref(), Some("led_on"));

        let msg = classify(r#"{"type":"chat_message","content":"hi"}"#).unwrap();
        assert_eq!(msg.kind, MessageKind::ChatMessage);

        let msg = classify(r#"{"type":"status_update","content":"x"}"#).unwrap();
        assert_eq!(msg.kind, MessageKind::StatusUpdate);
    }

    #[test]
    fn unrecognized_tag_is_preserved() {
        let msg = classify(r#"{"type":"telemetry_v2"}"#).unwrap();
        assert_eq!(msg.kind, MessageKind::Unknown("telemetry_v2".to_string()));
        assert_eq!(msg.kind.tag(), "telemetry_v2");
    }

    #[test]
    fn missing_or_nonstring_tag_is_unknown() {
        let msg = classify(r#"{"content":"no type here"}"#).unwrap();
        assert_eq!(msg.kind, MessageKind::Unknown("(none)".to_string()));

        let msg = classify(r#"{"type":42}"#).unwrap();
        assert_eq!(msg.kind, MessageKind::Unknown("42".to_string()));

        // Valid JSON that is not an object still classifies
        let msg = classify("[1,2,3]").unwrap();
        assert_eq!(msg.kind, MessageKind::Unknown("(none)".to_string()));
    }

    #[test]
    fn broken_json_is_a_parse_error() {
        let err = classify("not-json{{").unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn status_frame_shape() {
        let frame = status("device online");
        let value: serde_json::Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(value["type"], "status_update");
        assert_eq!(value["content"], "device online");
    }
}
