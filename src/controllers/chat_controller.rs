//! Controller de chat
//!
//! Historial REST de conversaciones. La entrega en vivo va por el canal
//! websocket; acá solo se lee y escribe el log append-only de mensajes.
//! La sala de una conversación es siempre el id del cliente, así admin
//! y cliente convergen sin importar quién inicia.

use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

use crate::dto::chat_dto::{AdminContactResponse, ChatListEntry};
use crate::models::auth::UserInfo;
use crate::models::message::MessageResponse;
use crate::repositories::message_repository::MessageRepository;
use crate::repositories::user_repository::UserRepository;
use crate::utils::errors::AppError;

pub struct ChatController {
    repository: MessageRepository,
    users: UserRepository,
}

impl ChatController {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: MessageRepository::new(pool.clone()),
            users: UserRepository::new(pool),
        }
    }

    /// Contacto del admin para el widget de soporte del cliente
    pub async fn admin_contact(&self) -> Result<AdminContactResponse, AppError> {
        let admin = self
            .users
            .find_admin()
            .await?
            .ok_or_else(|| AppError::NotFound("Admin not found".to_string()))?;

        Ok(AdminContactResponse {
            id: admin.id.to_string(),
            name: admin.name,
        })
    }

    /// Conversaciones del admin: un usuario por entrada con su último
    /// mensaje, ordenado del más reciente al más antiguo.
    pub async fn chat_list(&self, admin_id: Uuid) -> Result<Vec<ChatListEntry>, AppError> {
        let messages = self.repository.find_involving(admin_id).await?;

        let users: HashMap<Uuid, _> = self
            .users
            .find_all()
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();

        // Los mensajes vienen del más nuevo al más viejo: el primero que
        // involucra a cada usuario es su último mensaje
        let mut seen = Vec::new();
        let mut entries = Vec::new();
        for message in &messages {
            let other = if message.sender_id == admin_id {
                message.receiver_id
            } else {
                message.sender_id
            };

            if other == admin_id || seen.contains(&other) {
                continue;
            }
            seen.push(other);

            if let Some(user) = users.get(&other) {
                entries.push(ChatListEntry {
                    id: user.id.to_string(),
                    name: user.name.clone(),
                    email: user.email.clone(),
                    last_message: message.body.clone(),
                    last_timestamp: message.sent_at.to_rfc3339(),
                });
            }
        }

        Ok(entries)
    }

    /// Historial entre el usuario autenticado y otro usuario
    pub async fn conversation(
        &self,
        me: Uuid,
        other: Uuid,
    ) -> Result<Vec<MessageResponse>, AppError> {
        let messages = self.repository.find_conversation(me, other).await?;
        Ok(messages.into_iter().map(MessageResponse::from).collect())
    }

    /// Persiste un mensaje entrante del websocket. La sala tiene que ser
    /// la del propio cliente, salvo que escriba el admin.
    pub async fn send_message(
        &self,
        sender: &UserInfo,
        room_id: Uuid,
        receiver_id: Uuid,
        body: String,
    ) -> Result<MessageResponse, AppError> {
        if body.trim().is_empty() {
            return Err(AppError::BadRequest("Message cannot be empty".to_string()));
        }

        if !sender.is_admin() && room_id != sender.id {
            return Err(AppError::Forbidden(
                "Cannot write to another user's room".to_string(),
            ));
        }

        let message = self
            .repository
            .create(sender.id, receiver_id, room_id, body)
            .await?;

        Ok(MessageResponse::from(message))
    }
}
