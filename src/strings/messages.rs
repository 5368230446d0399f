//! # Messages
//!
//! Format functions for user-facing chat messages.

pub fn execution_started(message_id: &str) -> String {
    format!("Executing update script triggered by message {message_id}")
}
