use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::user::User;
use crate::utils::errors::AppError;

pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        name: String,
        email: String,
        password_hash: String,
        role: &str,
    ) -> Result<User, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, name, email, password_hash, role, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(email.to_lowercase())
        .bind(password_hash)
        .bind(role)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email.to_lowercase())
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    pub async fn email_exists(&self, email: &str) -> Result<bool, AppError> {
        let result: (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
                .bind(email.to_lowercase())
                .fetch_one(&self.pool)
                .await?;

        Ok(result.0)
    }

    pub async fn find_all(&self) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await?;

        Ok(users)
    }

    /// Primer usuario con rol admin (contacto del chat de soporte)
    pub async fn find_admin(&self) -> Result<Option<User>, AppError> {
        let admin = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE role = 'admin' ORDER BY created_at ASC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(admin)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn update_profile(
        &self,
        id: Uuid,
        phone: Option<String>,
        license_number: Option<String>,
        license_expiry: Option<NaiveDate>,
    ) -> Result<User, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET phone = COALESCE($2, phone),
                license_number = COALESCE($3, license_number),
                license_expiry = COALESCE($4, license_expiry)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(phone)
        .bind(license_number)
        .bind(license_expiry)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn set_license_image(&self, id: Uuid, image_url: &str) -> Result<User, AppError> {
        let user = sqlx::query_as::<_, User>(
            "UPDATE users SET license_image = $2 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(image_url)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    /// Guarda el token de reset junto con el timestamp de la solicitud,
    /// que sirve de guard para el rate limit de 60 segundos.
    pub async fn set_reset_token(
        &self,
        id: Uuid,
        token: &str,
        expiry: DateTime<Utc>,
        requested_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE users
            SET reset_token = $2, reset_token_expiry = $3, last_reset_request = $4
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(token)
        .bind(expiry)
        .bind(requested_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn find_by_valid_reset_token(&self, token: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE reset_token = $1 AND reset_token_expiry > $2",
        )
        .bind(token)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn update_password_and_clear_token(
        &self,
        id: Uuid,
        password_hash: &str,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE users
            SET password_hash = $2, reset_token = NULL, reset_token_expiry = NULL
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(password_hash)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn count_customers(&self) -> Result<i64, AppError> {
        let result: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE role = 'user'")
            .fetch_one(&self.pool)
            .await?;

        Ok(result.0)
    }
}
