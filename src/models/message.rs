//! Modelo de Message
//!
//! Log append-only de mensajes de chat. El room_id es igual al id del
//! cliente, así admin y cliente convergen en la misma sala sin importar
//! quién inicia la conversación.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct Message {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub room_id: Uuid,
    pub body: String,
    pub sent_at: DateTime<Utc>,
}

/// Response de mensaje para la API y el canal websocket
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub id: String,
    pub sender_id: String,
    pub receiver_id: String,
    pub room_id: String,
    pub message: String,
    pub timestamp: String,
}

impl From<Message> for MessageResponse {
    fn from(m: Message) -> Self {
        Self {
            id: m.id.to_string(),
            sender_id: m.sender_id.to_string(),
            receiver_id: m.receiver_id.to_string(),
            room_id: m.room_id.to_string(),
            message: m.body,
            timestamp: m.sent_at.to_rfc3339(),
        }
    }
}
