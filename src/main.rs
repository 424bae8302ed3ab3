mod config;
mod controllers;
mod database;
mod dto;
mod middleware;
mod models;
mod repositories;
mod routes;
mod services;
mod state;
mod utils;

use anyhow::Result;
use axum::{response::Json, routing::get, Router};
use dotenvy::dotenv;
use serde_json::json;
use std::net::SocketAddr;
use tokio::signal;
use tower_http::services::ServeDir;
use tracing::{error, info};

use config::environment::EnvironmentConfig;
use database::connection::{create_pool, run_migrations};
use middleware::cors::cors_middleware;
use middleware::rate_limit::{rate_limit_middleware, RateLimitState};
use state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();

    // Configurar logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    info!("🚗 IntelliDrive - Backend de alquiler de vehículos");
    info!("==================================================");

    let config = EnvironmentConfig::default();

    // Inicializar base de datos
    let pool = match create_pool(None).await {
        Ok(pool) => pool,
        Err(e) => {
            error!("❌ Error conectando a la base de datos: {}", e);
            return Err(anyhow::anyhow!("Error de base de datos: {}", e));
        }
    };

    if let Err(e) = run_migrations(&pool).await {
        error!("❌ Error ejecutando migraciones: {}", e);
        return Err(anyhow::anyhow!("Error de migraciones: {}", e));
    }
    info!("✅ Migraciones aplicadas");

    // Cuenta admin por defecto en el primer arranque
    utils::admin_seeder::seed_admin(pool.clone()).await;

    // Directorio de imágenes subidas
    tokio::fs::create_dir_all(&config.upload_dir).await?;

    let rate_limit_state = RateLimitState::new(&config);
    let app_state = AppState::new(pool, config.clone());

    let app = Router::new()
        .route("/health", get(health_endpoint))
        .nest(
            "/api/auth",
            routes::auth_routes::create_auth_router(app_state.clone()).layer(
                axum::middleware::from_fn_with_state(rate_limit_state, rate_limit_middleware),
            ),
        )
        .nest(
            "/api/vehicles",
            routes::vehicle_routes::create_vehicle_router(app_state.clone()),
        )
        .nest(
            "/api/bookings",
            routes::booking_routes::create_booking_router(app_state.clone()),
        )
        .nest(
            "/api/chat",
            routes::chat_routes::create_chat_router(app_state.clone()),
        )
        .nest(
            "/api/admin",
            routes::admin_routes::create_admin_router(app_state.clone()),
        )
        .merge(routes::ws_routes::create_ws_router())
        .nest_service("/uploads", ServeDir::new(&config.upload_dir))
        .layer(cors_middleware(&config))
        .with_state(app_state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    info!("🌐 Servidor iniciando en http://{}", addr);
    info!("🔍 Endpoints disponibles:");
    info!("   GET  /health - Health check");
    info!("🔐 Auth:");
    info!("   POST /api/auth/register - Registro de usuario");
    info!("   POST /api/auth/login - Login");
    info!("   GET  /api/auth/user - Usuario actual");
    info!("   PUT  /api/auth/profile - Actualizar perfil");
    info!("   POST /api/auth/profile/license - Subir licencia");
    info!("   POST /api/auth/forgot-password - Solicitar reset de password");
    info!("   POST /api/auth/reset-password - Reset de password");
    info!("   GET  /api/auth/users - Listar usuarios (admin)");
    info!("   DELETE /api/auth/users/:id - Eliminar usuario (admin)");
    info!("🚗 Vehículos:");
    info!("   GET  /api/vehicles - Flota con disponibilidad");
    info!("   GET  /api/vehicles/:id - Obtener vehículo");
    info!("   POST /api/vehicles - Crear vehículo (admin)");
    info!("   PUT  /api/vehicles/:id - Actualizar vehículo (admin)");
    info!("   DELETE /api/vehicles/:id - Eliminar vehículo (admin)");
    info!("   POST /api/vehicles/:id/location - Actualizar posición GPS");
    info!("📅 Reservas:");
    info!("   POST /api/bookings - Crear reserva");
    info!("   GET  /api/bookings/mybookings - Mis reservas");
    info!("   GET  /api/bookings - Todas las reservas (admin)");
    info!("   PUT  /api/bookings/:id/status - Cambiar estado (admin)");
    info!("💬 Chat:");
    info!("   GET  /api/chat/admin - Contacto del admin");
    info!("   GET  /api/chat/:other_id - Historial de conversación");
    info!("   GET  /api/chat/list - Conversaciones (admin)");
    info!("📊 Admin:");
    info!("   GET  /api/admin/stats - Estadísticas del dashboard");
    info!("⚡ Tiempo real:");
    info!("   GET  /ws?token=... - Canal websocket (posiciones y chat)");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| {
            error!("❌ Error del servidor: {}", e);
            anyhow::anyhow!(e)
        })?;

    info!("👋 Servidor terminado");
    Ok(())
}

/// Health check simple
async fn health_endpoint() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": "intellidrive-backend",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// Señal de apagado graceful
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("🛑 Señal Ctrl+C recibida, apagando servidor...");
        },
        _ = terminate => {
            info!("🛑 Señal de terminación recibida, apagando servidor...");
        },
    }
}
