//! Shared application state
//!
//! Este módulo define el estado compartido de la aplicación que se pasa
//! a través del router de Axum, incluido el bus de eventos en tiempo real.

use sqlx::PgPool;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::config::environment::EnvironmentConfig;
use crate::models::message::MessageResponse;
use crate::services::email_service::EmailService;
use crate::services::jwt_service::{JwtConfig, JwtService};

/// Capacidad del bus de broadcast. Sin backpressure: un receiver lento
/// pierde eventos (lagged) y simplemente sigue desde el más reciente.
const EVENT_BUS_CAPACITY: usize = 256;

/// Evento interno del bus de tiempo real. Cada conexión websocket
/// filtra el stream según sus salas y permisos.
#[derive(Debug, Clone)]
pub enum BusEvent {
    VehicleLocation {
        vehicle_id: Uuid,
        lat: f64,
        lng: f64,
    },
    ChatMessage {
        room_id: Uuid,
        message: MessageResponse,
    },
}

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: EnvironmentConfig,
    pub jwt: JwtService,
    pub email: EmailService,
    events: broadcast::Sender<BusEvent>,
}

impl AppState {
    pub fn new(pool: PgPool, config: EnvironmentConfig) -> Self {
        let jwt = JwtService::from_config(JwtConfig::with_secret(
            config.jwt_secret.clone(),
            config.jwt_expiration,
        ));
        let email = EmailService::new(&config);
        let (events, _) = broadcast::channel(EVENT_BUS_CAPACITY);

        Self {
            pool,
            config,
            jwt,
            email,
            events,
        }
    }

    /// Publica un evento en el bus. Si no hay sockets conectados el
    /// envío falla silenciosamente: entrega perdida, sin replay.
    pub fn publish(&self, event: BusEvent) {
        let _ = self.events.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BusEvent> {
        self.events.subscribe()
    }
}
