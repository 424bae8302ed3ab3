//! Configuración de variables de entorno
//!
//! Este módulo maneja la configuración del entorno y variables de configuración.

use std::env;

/// Configuración SMTP para el despacho de notificaciones.
/// Si falta alguna variable, el envío de correos queda deshabilitado.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub email: String,
    pub password: String,
    pub from_name: String,
}

impl SmtpConfig {
    fn from_env() -> Option<Self> {
        Some(Self {
            host: env::var("SMTP_HOST").ok()?,
            port: env::var("SMTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(587),
            email: env::var("SMTP_EMAIL").ok()?,
            password: env::var("SMTP_PASSWORD").ok()?,
            from_name: env::var("FROM_NAME").unwrap_or_else(|_| "IntelliDrive".to_string()),
        })
    }
}

/// Configuración del entorno
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    pub environment: String,
    pub port: u16,
    pub host: String,
    pub jwt_secret: String,
    pub jwt_expiration: u64,
    pub cors_origins: Vec<String>,
    pub rate_limit_requests: u32,
    pub rate_limit_window: u64,
    /// URL pública del cliente SPA (links en correos)
    pub client_url: String,
    /// Directorio donde se guardan las imágenes subidas
    pub upload_dir: String,
    pub smtp: Option<SmtpConfig>,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            environment: env::var("ENVIRONMENT").expect("ENVIRONMENT must be set"),
            port: env::var("PORT")
                .expect("PORT must be set")
                .parse()
                .expect("PORT must be a valid number"),
            host: env::var("HOST").expect("HOST must be set"),
            jwt_secret: env::var("JWT_SECRET").expect("JWT_SECRET must be set"),
            jwt_expiration: env::var("JWT_EXPIRATION")
                .expect("JWT_EXPIRATION must be set")
                .parse()
                .expect("JWT_EXPIRATION must be a valid number"),
            cors_origins: env::var("CORS_ORIGINS")
                .expect("CORS_ORIGINS must be set")
                .split(',')
                .map(|s| s.trim().to_string())
                .collect(),
            rate_limit_requests: env::var("RATE_LIMIT_REQUESTS")
                .expect("RATE_LIMIT_REQUESTS must be set")
                .parse()
                .expect("RATE_LIMIT_REQUESTS must be a valid number"),
            rate_limit_window: env::var("RATE_LIMIT_WINDOW")
                .expect("RATE_LIMIT_WINDOW must be set")
                .parse()
                .expect("RATE_LIMIT_WINDOW must be a valid number"),
            client_url: env::var("CLIENT_URL").expect("CLIENT_URL must be set"),
            upload_dir: env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_string()),
            smtp: SmtpConfig::from_env(),
        }
    }
}

impl EnvironmentConfig {
    /// Verificar si estamos en modo desarrollo
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Verificar si estamos en modo producción
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Obtener la URL del servidor
    pub fn server_url(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
