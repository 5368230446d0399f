//! # Event Filter
//!
//! Decides whether an inbound message is eligible to trigger script execution:
//! group scope check, text extraction, pattern search. Stateless: the decision
//! is a pure function of the configuration and the single input message.

use regex::Regex;

use crate::domain::types::{ChatScope, InboundMessage, TriggerContext, extract_text};

pub struct EventFilter {
    pattern: Regex,
}

impl EventFilter {
    pub fn new(pattern: Regex) -> Self {
        Self { pattern }
    }

    /// Evaluate one inbound message. Returns a `TriggerContext` for the first
    /// matched span, or `None` if the message is out of scope, has no usable
    /// text, or does not match. Rejection has no side effects beyond logging.
    pub fn evaluate(&self, msg: &InboundMessage) -> Option<TriggerContext> {
        let text = extract_text(&msg.content);
        tracing::debug!(
            "Received message: scope={:?} chat_id={} sender_id={} text={:?}",
            msg.scope,
            msg.chat_id,
            msg.sender_id,
            text
        );

        if msg.scope != ChatScope::Group {
            return None;
        }
        if text.is_empty() {
            return None;
        }

        // Search, not an anchored match: the pattern may hit mid-string.
        let matched = self.pattern.find(&text)?;
        tracing::info!(
            "Pattern matched: message_id={} chat_id={} matched_text={:?}",
            msg.message_id,
            msg.chat_id,
            matched.as_str()
        );

        let matched_text = matched.as_str().to_string();
        Some(TriggerContext {
            message_id: msg.message_id.clone(),
            chat_id: msg.chat_id.clone(),
            sender_id: msg.sender_id.clone(),
            text,
            matched_text,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::config::DEFAULT_MATCH_PATTERN;

    fn default_filter() -> EventFilter {
        EventFilter::new(Regex::new(DEFAULT_MATCH_PATTERN).unwrap())
    }

    fn group_message(content: &str) -> InboundMessage {
        InboundMessage {
            scope: ChatScope::Group,
            chat_id: "!room:example.org".to_string(),
            sender_id: "@alice:example.org".to_string(),
            message_id: "$evt_1".to_string(),
            content: content.to_string(),
        }
    }

    #[test]
    fn test_plain_text_does_not_match() {
        let filter = default_filter();
        assert!(filter.evaluate(&group_message(r#"{"text":"hello"}"#)).is_none());
    }

    #[test]
    fn test_run_command_matches_full_span() {
        let filter = default_filter();
        let ctx = filter
            .evaluate(&group_message(r#"{"text":"/run build now"}"#))
            .unwrap();
        assert_eq!(ctx.matched_text, "/run build now");
        assert_eq!(ctx.text, "/run build now");
        assert_eq!(ctx.chat_id, "!room:example.org");
        assert_eq!(ctx.message_id, "$evt_1");
    }

    #[test]
    fn test_direct_chat_rejected_even_on_match() {
        let filter = default_filter();
        let mut msg = group_message(r#"{"text":"/run build now"}"#);
        msg.scope = ChatScope::Direct;
        assert!(filter.evaluate(&msg).is_none());
    }

    #[test]
    fn test_unanchored_pattern_matches_mid_string() {
        let filter = EventFilter::new(Regex::new(r"deploy \S+").unwrap());
        let ctx = filter
            .evaluate(&group_message(r#"{"text":"please deploy prod thanks"}"#))
            .unwrap();
        assert_eq!(ctx.matched_text, "deploy prod");
    }

    #[test]
    fn test_first_match_span_wins() {
        let filter = EventFilter::new(Regex::new(r"go").unwrap());
        let ctx = filter
            .evaluate(&group_message(r#"{"text":"go go go"}"#))
            .unwrap();
        assert_eq!(ctx.matched_text, "go");
    }

    #[test]
    fn test_malformed_content_rejected() {
        let filter = default_filter();
        assert!(filter.evaluate(&group_message("/run not json")).is_none());
    }

    #[test]
    fn test_missing_text_field_rejected() {
        let filter = default_filter();
        assert!(
            filter
                .evaluate(&group_message(r#"{"file_key":"f_abc"}"#))
                .is_none()
        );
    }
}
