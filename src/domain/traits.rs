//! # Domain Traits
//!
//! Abstract interface for the chat transport. The pipeline only ever needs
//! "send a text message to a chat id"; the Matrix implementation lives in the
//! infrastructure layer, and tests substitute their own.

use async_trait::async_trait;
use thiserror::Error;

/// Structured send failure reported by the transport.
#[derive(Debug, Error)]
#[error("send failed: code={code} msg={message}")]
pub struct SendError {
    /// Machine-readable failure code (e.g. an errcode or HTTP status).
    pub code: String,
    pub message: String,
}

/// Abstract interface for a chat provider (e.g. Matrix, Console).
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Send a plain text message to the given chat.
    /// Delivery is never assumed; the caller decides what a failure means.
    async fn send_text(&self, chat_id: &str, text: &str) -> Result<(), SendError>;
}
