//! # Domain Types
//!
//! Core data carried through the trigger-match-execute pipeline. All of these
//! are plain values: built from a transport event, consumed synchronously,
//! then discarded. Nothing here is persisted.

use serde::Deserialize;

/// Chat-type classification of the originating room.
/// Only `Group` chats are eligible to trigger script execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatScope {
    Group,
    Direct,
}

/// One decoded inbound message event, as handed over by the transport adapter.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub scope: ChatScope,
    pub chat_id: String,
    pub sender_id: String,
    pub message_id: String,
    /// Raw content payload: a JSON document expected to carry a "text" field.
    pub content: String,
}

/// Everything the executor needs about a matched message.
/// Created only when the event filter finds a match.
#[derive(Debug, Clone)]
pub struct TriggerContext {
    pub message_id: String,
    pub chat_id: String,
    pub sender_id: String,
    /// Full extracted text of the triggering message.
    pub text: String,
    /// Literal text of the first matched span.
    pub matched_text: String,
}

/// Outcome of a completed (non-timed-out) script run.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

/// Typed view of the content payload. Absent fields decode to an empty
/// string rather than failing, so a payload without "text" is a no-match.
#[derive(Debug, Deserialize)]
struct MessageContent {
    #[serde(default)]
    text: String,
}

/// Extract the plain text from a message content payload.
///
/// Malformed or empty payloads yield an empty string; that is a routine
/// no-match for the filter, never an error.
pub fn extract_text(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }
    serde_json::from_str::<MessageContent>(raw)
        .map(|content| content.text)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_text_well_formed() {
        assert_eq!(extract_text(r#"{"text":"/run build now"}"#), "/run build now");
    }

    #[test]
    fn test_extract_text_missing_field() {
        assert_eq!(extract_text(r#"{"image_key":"img_v2_abc"}"#), "");
    }

    #[test]
    fn test_extract_text_malformed_is_empty_and_idempotent() {
        let payload = r#"{"text": unquoted"#;
        assert_eq!(extract_text(payload), "");
        // No parse state is retained between calls.
        assert_eq!(extract_text(payload), "");
    }

    #[test]
    fn test_extract_text_empty_payload() {
        assert_eq!(extract_text(""), "");
    }
}
