//! Middleware de CORS
//!
//! En desarrollo se permite cualquier origen; en producción solo los
//! orígenes configurados en CORS_ORIGINS (el SPA y el panel de admin).

use axum::http::{HeaderName, HeaderValue, Method};
use tower_http::cors::CorsLayer;

use crate::config::EnvironmentConfig;

pub fn cors_middleware(config: &EnvironmentConfig) -> CorsLayer {
    if config.is_production() {
        cors_with_origins(&config.cors_origins)
    } else {
        CorsLayer::very_permissive()
    }
}

fn cors_with_origins(origins: &[String]) -> CorsLayer {
    let mut cors = CorsLayer::new();

    for origin in origins {
        if let Ok(header_value) = HeaderValue::from_str(origin) {
            cors = cors.allow_origin(header_value);
        }
    }

    cors.allow_methods([
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::PATCH,
        Method::OPTIONS,
    ])
    .allow_headers([
        HeaderName::from_static("authorization"),
        HeaderName::from_static("content-type"),
        HeaderName::from_static("accept"),
        HeaderName::from_static("origin"),
        HeaderName::from_static("x-requested-with"),
    ])
    .allow_credentials(true)
    .max_age(std::time::Duration::from_secs(3600))
}
