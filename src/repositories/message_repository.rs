use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::message::Message;
use crate::utils::errors::AppError;

pub struct MessageRepository {
    pool: PgPool,
}

impl MessageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        sender_id: Uuid,
        receiver_id: Uuid,
        room_id: Uuid,
        body: String,
    ) -> Result<Message, AppError> {
        let message = sqlx::query_as::<_, Message>(
            r#"
            INSERT INTO messages (id, sender_id, receiver_id, room_id, body, sent_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(sender_id)
        .bind(receiver_id)
        .bind(room_id)
        .bind(body)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(message)
    }

    /// Historial completo entre dos usuarios, del más antiguo al más reciente
    pub async fn find_conversation(
        &self,
        a: Uuid,
        b: Uuid,
    ) -> Result<Vec<Message>, AppError> {
        let messages = sqlx::query_as::<_, Message>(
            r#"
            SELECT * FROM messages
            WHERE (sender_id = $1 AND receiver_id = $2)
               OR (sender_id = $2 AND receiver_id = $1)
            ORDER BY sent_at ASC
            "#,
        )
        .bind(a)
        .bind(b)
        .fetch_all(&self.pool)
        .await?;

        Ok(messages)
    }

    /// Todos los mensajes donde participa el usuario, del más reciente
    /// al más antiguo (para armar el listado de conversaciones del admin)
    pub async fn find_involving(&self, user_id: Uuid) -> Result<Vec<Message>, AppError> {
        let messages = sqlx::query_as::<_, Message>(
            r#"
            SELECT * FROM messages
            WHERE sender_id = $1 OR receiver_id = $1
            ORDER BY sent_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(messages)
    }
}
