//! # Matrix Service Adapter
//!
//! Implements the `ChatProvider` trait for the Matrix protocol using the
//! `matrix_sdk`, and decodes sync-loop message events into the
//! transport-neutral `InboundMessage` consumed by the pipeline.

use async_trait::async_trait;
use matrix_sdk::Client;
use matrix_sdk::room::Room;
use matrix_sdk::ruma::RoomId;
use matrix_sdk::ruma::events::room::message::{
    MessageType, OriginalSyncRoomMessageEvent, RoomMessageEventContent,
};

use crate::domain::traits::{ChatProvider, SendError};
use crate::domain::types::{ChatScope, InboundMessage};

#[derive(Clone)]
pub struct MatrixService {
    client: Client,
}

impl MatrixService {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ChatProvider for MatrixService {
    async fn send_text(&self, chat_id: &str, text: &str) -> Result<(), SendError> {
        let room_id = RoomId::parse(chat_id).map_err(|err| SendError {
            code: "invalid_room_id".to_string(),
            message: err.to_string(),
        })?;
        let room = self.client.get_room(&room_id).ok_or_else(|| SendError {
            code: "room_not_found".to_string(),
            message: format!("Bot is not joined to room {chat_id}"),
        })?;
        room.send(RoomMessageEventContent::text_plain(text))
            .await
            .map(|_| ())
            .map_err(to_send_error)
    }
}

fn to_send_error(err: matrix_sdk::Error) -> SendError {
    let code = match &err {
        matrix_sdk::Error::Http(http) => http
            .client_api_error_kind()
            .map(|kind| format!("{kind:?}"))
            .unwrap_or_else(|| "http_error".to_string()),
        _ => "sdk_error".to_string(),
    };
    SendError {
        code,
        message: err.to_string(),
    }
}

/// Decode one room message event into an `InboundMessage`.
///
/// Only plain text messages pass through; the content body is wrapped in the
/// JSON payload shape the filter expects. Rooms the SDK cannot classify are
/// treated as direct chats.
pub async fn inbound_from_event(
    event: &OriginalSyncRoomMessageEvent,
    room: &Room,
) -> Option<InboundMessage> {
    let MessageType::Text(text_content) = &event.content.msgtype else {
        return None;
    };

    let scope = match room.is_direct().await {
        Ok(true) => ChatScope::Direct,
        Ok(false) => ChatScope::Group,
        Err(err) => {
            tracing::debug!("Could not classify room {}: {err}", room.room_id());
            ChatScope::Direct
        }
    };

    Some(InboundMessage {
        scope,
        chat_id: room.room_id().as_str().to_string(),
        sender_id: event.sender.as_str().to_string(),
        message_id: event.event_id.as_str().to_string(),
        content: serde_json::json!({ "text": text_content.body }).to_string(),
    })
}
