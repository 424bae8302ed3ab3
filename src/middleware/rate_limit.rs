//! Middleware de Rate Limiting
//!
//! Limitación de velocidad por IP para los endpoints de autenticación.
//! El rate limit por usuario del reset de password (60 segundos) vive
//! aparte, en el controller de auth, porque se apoya en un timestamp
//! persistido por cuenta.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::config::EnvironmentConfig;

/// Estructura para almacenar información de rate limiting por IP
#[derive(Debug, Clone)]
struct RateLimitInfo {
    requests: u32,
    window_start: Instant,
}

/// Estado global del rate limiting
#[derive(Clone)]
pub struct RateLimitState {
    requests: Arc<RwLock<HashMap<String, RateLimitInfo>>>,
    max_requests: u32,
    window_duration: Duration,
}

impl RateLimitState {
    /// Crear nuevo estado de rate limiting
    pub fn new(config: &EnvironmentConfig) -> Self {
        Self {
            requests: Arc::new(RwLock::new(HashMap::new())),
            max_requests: config.rate_limit_requests,
            window_duration: Duration::from_secs(config.rate_limit_window),
        }
    }

    #[cfg(test)]
    fn with_limits(max_requests: u32, window_duration: Duration) -> Self {
        Self {
            requests: Arc::new(RwLock::new(HashMap::new())),
            max_requests,
            window_duration,
        }
    }

    /// Verificar si una IP ha excedido el límite
    pub async fn check_rate_limit(&self, ip: &str) -> Result<(), RateLimitError> {
        let mut requests = self.requests.write().await;
        let now = Instant::now();

        // Limpiar entradas expiradas
        requests.retain(|_, info| now.duration_since(info.window_start) < self.window_duration);

        // Obtener o crear información de rate limiting para esta IP
        let info = requests.entry(ip.to_string()).or_insert(RateLimitInfo {
            requests: 0,
            window_start: now,
        });

        // Verificar si la ventana de tiempo ha expirado
        if now.duration_since(info.window_start) >= self.window_duration {
            info.requests = 1;
            info.window_start = now;
            return Ok(());
        }

        // Verificar si se ha excedido el límite
        if info.requests >= self.max_requests {
            return Err(RateLimitError::LimitExceeded);
        }

        // Incrementar contador de requests
        info.requests += 1;
        Ok(())
    }
}

/// Errores de rate limiting
#[derive(Debug, thiserror::Error)]
pub enum RateLimitError {
    #[error("Rate limit exceeded")]
    LimitExceeded,
}

/// Middleware de rate limiting
pub async fn rate_limit_middleware(
    State(rate_limit_state): State<RateLimitState>,
    request: Request,
    next: Next,
) -> Result<Response, (StatusCode, String)> {
    // Extraer IP del cliente (simplificado - en producción usarías headers reales)
    let ip = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .unwrap_or("unknown")
        .split(',')
        .next()
        .unwrap_or("unknown")
        .trim()
        .to_string();

    // Verificar rate limit
    if let Err(RateLimitError::LimitExceeded) = rate_limit_state.check_rate_limit(&ip).await {
        return Err((
            StatusCode::TOO_MANY_REQUESTS,
            "Rate limit exceeded. Please try again later.".to_string(),
        ));
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_allows_up_to_limit_then_rejects() {
        let state = RateLimitState::with_limits(3, Duration::from_secs(60));

        for _ in 0..3 {
            assert!(state.check_rate_limit("1.2.3.4").await.is_ok());
        }
        assert!(state.check_rate_limit("1.2.3.4").await.is_err());
    }

    #[tokio::test]
    async fn test_limits_are_per_ip() {
        let state = RateLimitState::with_limits(1, Duration::from_secs(60));

        assert!(state.check_rate_limit("1.1.1.1").await.is_ok());
        assert!(state.check_rate_limit("2.2.2.2").await.is_ok());
        assert!(state.check_rate_limit("1.1.1.1").await.is_err());
    }
}
