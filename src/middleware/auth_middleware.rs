//! Middleware de autenticación
//!
//! `protect` valida el Bearer token y deja el UserInfo en las request
//! extensions; `require_admin` corta con 403 a los no-admin.

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::models::auth::UserInfo;
use crate::state::AppState;
use crate::utils::errors::AppError;

/// Extrae el token del header Authorization
fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let auth_header = headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".to_string()))?;

    if let Some(token) = auth_header.strip_prefix("Bearer ") {
        Ok(token)
    } else {
        Err(AppError::Unauthorized("Invalid Authorization header".to_string()))
    }
}

/// Middleware de autenticación: requiere un token válido
pub async fn protect(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_bearer_token(&headers)?;

    let user_info = state
        .jwt
        .get_user_info(token)
        .map_err(AppError::Unauthorized)?;

    // Dejar la información del usuario disponible para los handlers
    request.extensions_mut().insert(user_info);
    Ok(next.run(request).await)
}

/// Middleware de autorización: requiere rol admin.
/// Debe aplicarse después de `protect`.
pub async fn require_admin(request: Request, next: Next) -> Result<Response, AppError> {
    let user_info = request
        .extensions()
        .get::<UserInfo>()
        .ok_or_else(|| AppError::Unauthorized("Not authenticated".to_string()))?;

    if !user_info.is_admin() {
        return Err(AppError::Forbidden(
            "Admin privileges required".to_string(),
        ));
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_extract_bearer_token() {
        let mut headers = HeaderMap::new();
        headers.insert("Authorization", HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(extract_bearer_token(&headers).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn test_reject_missing_header() {
        let headers = HeaderMap::new();
        assert!(extract_bearer_token(&headers).is_err());
    }

    #[test]
    fn test_reject_non_bearer_scheme() {
        let mut headers = HeaderMap::new();
        headers.insert("Authorization", HeaderValue::from_static("Basic dXNlcjpwYXNz"));
        assert!(extract_bearer_token(&headers).is_err());
    }
}
