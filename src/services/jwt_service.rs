use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::models::auth::{JwtClaims, UserInfo, UserRole};

/// Configuración JWT
pub struct JwtConfig {
    pub secret: String,
    pub algorithm: Algorithm,
    pub access_token_duration: Duration,
}

impl JwtConfig {
    pub fn with_secret(secret: String, expiration_hours: u64) -> Self {
        Self {
            secret,
            algorithm: Algorithm::HS256,
            access_token_duration: Duration::hours(expiration_hours as i64),
        }
    }
}

/// Servicio JWT
#[derive(Clone)]
pub struct JwtService {
    algorithm: Algorithm,
    access_token_duration: Duration,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtService {
    pub fn from_config(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_ref());
        let decoding_key = DecodingKey::from_secret(config.secret.as_ref());

        Self {
            algorithm: config.algorithm,
            access_token_duration: config.access_token_duration,
            encoding_key,
            decoding_key,
        }
    }

    /// Genera un token de acceso para el usuario
    pub fn generate_access_token(&self, user_info: &UserInfo) -> Result<String, String> {
        let now = Utc::now();
        let exp = now + self.access_token_duration;

        let claims = JwtClaims {
            sub: user_info.id.to_string(),
            name: user_info.name.clone(),
            email: user_info.email.clone(),
            role: user_info.role.as_str().to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::new(self.algorithm), &claims, &self.encoding_key)
            .map_err(|e| format!("Error generating access token: {}", e))
    }

    /// Valida y decodifica un token
    pub fn validate_token(&self, token: &str) -> Result<JwtClaims, String> {
        let validation = Validation::new(self.algorithm);

        decode::<JwtClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| format!("Invalid token: {}", e))
    }

    /// Obtiene información completa del usuario desde el token
    pub fn get_user_info(&self, token: &str) -> Result<UserInfo, String> {
        let claims = self.validate_token(token)?;

        let id = Uuid::parse_str(&claims.sub)
            .map_err(|_| "Invalid user id in token".to_string())?;

        Ok(UserInfo {
            id,
            name: claims.name,
            email: claims.email,
            role: UserRole::from_str(&claims.role).ok_or("Invalid role in token")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_user() -> UserInfo {
        UserInfo {
            id: Uuid::new_v4(),
            name: "Test User".to_string(),
            email: "test@example.com".to_string(),
            role: UserRole::User,
        }
    }

    #[test]
    fn test_generate_and_validate_token() {
        let jwt_service = JwtService::from_config(JwtConfig::with_secret(
            "test-secret".to_string(),
            24,
        ));
        let user_info = test_user();

        let token = jwt_service.generate_access_token(&user_info).unwrap();
        assert!(!token.is_empty());

        let claims = jwt_service.validate_token(&token).unwrap();
        assert_eq!(claims.sub, user_info.id.to_string());
        assert_eq!(claims.email, "test@example.com");
        assert_eq!(claims.role, "user");
    }

    #[test]
    fn test_round_trip_user_info() {
        let jwt_service = JwtService::from_config(JwtConfig::with_secret(
            "test-secret".to_string(),
            24,
        ));
        let user_info = test_user();

        let token = jwt_service.generate_access_token(&user_info).unwrap();
        let decoded = jwt_service.get_user_info(&token).unwrap();

        assert_eq!(decoded.id, user_info.id);
        assert_eq!(decoded.role, UserRole::User);
    }

    #[test]
    fn test_reject_token_with_wrong_secret() {
        let issuer = JwtService::from_config(JwtConfig::with_secret("secret-a".to_string(), 24));
        let verifier = JwtService::from_config(JwtConfig::with_secret("secret-b".to_string(), 24));

        let token = issuer.generate_access_token(&test_user()).unwrap();
        assert!(verifier.validate_token(&token).is_err());
    }
}
