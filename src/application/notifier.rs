//! # Notifier
//!
//! Thin wrapper over the chat transport's send capability. Notification is
//! strictly best effort: a failed send is logged and forgotten, and must
//! never abort or roll back an execution that already started.

use std::sync::Arc;

use crate::domain::traits::ChatProvider;

pub struct Notifier {
    chat: Arc<dyn ChatProvider>,
}

impl Notifier {
    pub fn new(chat: Arc<dyn ChatProvider>) -> Self {
        Self { chat }
    }

    /// Send `text` to `chat_id`. An empty chat id is a silent no-op; a
    /// transport failure is logged as a warning and swallowed. No retry.
    pub async fn notify(&self, chat_id: &str, text: &str) {
        if chat_id.is_empty() {
            return;
        }
        if let Err(err) = self.chat.send_text(chat_id, text).await {
            tracing::warn!(
                "Failed to send chat message: code={} msg={}",
                err.code,
                err.message
            );
        }
    }
}
