//! Controller de autenticación y usuarios
//!
//! Registro, login, perfil, administración de usuarios y el flujo de
//! recuperación de password con su rate limit de 60 segundos por cuenta.

use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::dto::auth_dto::{
    AuthResponse, ForgotPasswordRequest, LoginRequest, RegisterRequest, ResetPasswordRequest,
    UpdateProfileRequest,
};
use crate::models::auth::UserInfo;
use crate::models::user::UserResponse;
use crate::repositories::user_repository::UserRepository;
use crate::services::email_service::EmailService;
use crate::services::jwt_service::JwtService;
use crate::utils::errors::AppError;

/// Ventana del rate limit de solicitudes de reset, por usuario
pub const RESET_REQUEST_WINDOW_SECS: i64 = 60;

/// Vigencia del token de reset
pub const RESET_TOKEN_TTL_MINUTES: i64 = 15;

/// Segundos que faltan para poder pedir otro reset, si todavía no se puede
pub fn reset_wait_remaining(
    last_request: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Option<i64> {
    let last = last_request?;
    let elapsed = (now - last).num_seconds();
    if elapsed < RESET_REQUEST_WINDOW_SECS {
        Some(RESET_REQUEST_WINDOW_SECS - elapsed)
    } else {
        None
    }
}

/// Token de reset: 32 bytes aleatorios en hex (64 caracteres)
fn generate_reset_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

pub struct AuthController {
    repository: UserRepository,
}

impl AuthController {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: UserRepository::new(pool),
        }
    }

    pub async fn register(
        &self,
        request: RegisterRequest,
        jwt: &JwtService,
        email: EmailService,
    ) -> Result<AuthResponse, AppError> {
        request.validate()?;

        if self.repository.email_exists(&request.email).await? {
            return Err(AppError::BadRequest("User already exists".to_string()));
        }

        let hash = bcrypt::hash(&request.password, bcrypt::DEFAULT_COST)
            .map_err(|e| AppError::Hash(e.to_string()))?;

        let user = self
            .repository
            .create(request.name, request.email, hash, "user")
            .await?;

        let token = jwt
            .generate_access_token(&user.to_user_info())
            .map_err(AppError::Jwt)?;

        // Correo de bienvenida fuera del camino crítico
        let welcome_user = user.clone();
        tokio::spawn(async move {
            email.send_welcome(&welcome_user).await;
        });

        Ok(AuthResponse {
            token,
            user: UserResponse::from(user),
        })
    }

    pub async fn login(
        &self,
        request: LoginRequest,
        jwt: &JwtService,
    ) -> Result<AuthResponse, AppError> {
        request.validate()?;

        let user = self
            .repository
            .find_by_email(&request.email)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Invalid credentials".to_string()))?;

        let matches = bcrypt::verify(&request.password, &user.password_hash)
            .map_err(|e| AppError::Hash(e.to_string()))?;

        if !matches {
            return Err(AppError::Unauthorized("Invalid credentials".to_string()));
        }

        let token = jwt
            .generate_access_token(&user.to_user_info())
            .map_err(AppError::Jwt)?;

        Ok(AuthResponse {
            token,
            user: UserResponse::from(user),
        })
    }

    pub async fn me(&self, user_id: Uuid) -> Result<UserResponse, AppError> {
        let user = self
            .repository
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        Ok(UserResponse::from(user))
    }

    pub async fn update_profile(
        &self,
        user_id: Uuid,
        request: UpdateProfileRequest,
    ) -> Result<UserResponse, AppError> {
        request.validate()?;

        let user = self
            .repository
            .update_profile(
                user_id,
                request.phone,
                request.license_number,
                request.license_expiry,
            )
            .await?;

        Ok(UserResponse::from(user))
    }

    pub async fn set_license_image(
        &self,
        user_id: Uuid,
        image_url: &str,
    ) -> Result<UserResponse, AppError> {
        let user = self.repository.set_license_image(user_id, image_url).await?;
        Ok(UserResponse::from(user))
    }

    pub async fn list_users(&self) -> Result<Vec<UserResponse>, AppError> {
        let users = self.repository.find_all().await?;
        Ok(users.into_iter().map(UserResponse::from).collect())
    }

    pub async fn delete_user(&self, id: Uuid, acting: &UserInfo) -> Result<(), AppError> {
        let user = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        // Un admin no puede borrarse a sí mismo
        if user.id == acting.id {
            return Err(AppError::BadRequest("You cannot delete yourself".to_string()));
        }

        self.repository.delete(id).await
    }

    /// Solicitud de reset de password. Una por usuario cada 60 segundos;
    /// la segunda dentro de la ventana responde 429 con los segundos
    /// que faltan.
    pub async fn forgot_password(
        &self,
        request: ForgotPasswordRequest,
        email: EmailService,
    ) -> Result<(), AppError> {
        request.validate()?;

        let user = self
            .repository
            .find_by_email(&request.email)
            .await?
            .ok_or_else(|| AppError::NotFound("No account with that email".to_string()))?;

        let now = Utc::now();
        if let Some(retry_after_secs) = reset_wait_remaining(user.last_reset_request, now) {
            return Err(AppError::RateLimitExceeded { retry_after_secs });
        }

        let token = generate_reset_token();
        let expiry = now + Duration::minutes(RESET_TOKEN_TTL_MINUTES);

        self.repository
            .set_reset_token(user.id, &token, expiry, now)
            .await?;

        tokio::spawn(async move {
            email.send_password_reset(&user, &token).await;
        });

        Ok(())
    }

    pub async fn reset_password(&self, request: ResetPasswordRequest) -> Result<(), AppError> {
        request.validate()?;

        let user = self
            .repository
            .find_by_valid_reset_token(&request.token)
            .await?
            .ok_or_else(|| {
                AppError::BadRequest("Invalid or expired reset token".to_string())
            })?;

        let hash = bcrypt::hash(&request.password, bcrypt::DEFAULT_COST)
            .map_err(|e| AppError::Hash(e.to_string()))?;

        self.repository
            .update_password_and_clear_token(user.id, &hash)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_request_within_window_is_throttled() {
        let now = Utc::now();
        let last = now - Duration::seconds(10);

        let remaining = reset_wait_remaining(Some(last), now);
        assert_eq!(remaining, Some(50));
    }

    #[test]
    fn test_request_after_window_is_allowed() {
        let now = Utc::now();
        let last = now - Duration::seconds(61);

        assert_eq!(reset_wait_remaining(Some(last), now), None);
    }

    #[test]
    fn test_first_request_is_always_allowed() {
        assert_eq!(reset_wait_remaining(None, Utc::now()), None);
    }

    #[test]
    fn test_reset_token_is_64_hex_chars() {
        let token = generate_reset_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
