//! Canal websocket de tiempo real
//!
//! Un solo endpoint `/ws` autenticado por token en la query string. Cada
//! conexión mantiene sus suscripciones (salas de vehículo y sala de chat)
//! y filtra el bus de broadcast compartido: la autorización de salas vive
//! acá, del lado del servidor, no en el cliente.

use axum::{
    extract::{
        ws::{Message as WsMessage, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::Response,
    routing::get,
    Router,
};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tokio::sync::broadcast;
use tracing::{info, warn};
use uuid::Uuid;

use crate::controllers::chat_controller::ChatController;
use crate::models::auth::UserInfo;
use crate::models::message::MessageResponse;
use crate::repositories::booking_repository::BookingRepository;
use crate::repositories::vehicle_repository::VehicleRepository;
use crate::state::{AppState, BusEvent};
use crate::utils::errors::AppError;

pub fn create_ws_router() -> Router<AppState> {
    Router::new().route("/ws", get(ws_handler))
}

#[derive(Debug, Deserialize)]
struct WsAuthQuery {
    token: String,
}

/// Eventos que manda el cliente
#[derive(Debug, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    JoinVehicleRoom {
        #[serde(rename = "vehicleId")]
        vehicle_id: Uuid,
    },
    UpdateLocation {
        #[serde(rename = "vehicleId")]
        vehicle_id: Uuid,
        lat: f64,
        lng: f64,
    },
    JoinChat {
        room: Uuid,
    },
    SendMessage {
        room: Uuid,
        #[serde(rename = "receiverId")]
        receiver_id: Uuid,
        message: String,
    },
}

/// Eventos que manda el servidor
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    VehicleLocationUpdated {
        #[serde(rename = "vehicleId")]
        vehicle_id: Uuid,
        lat: f64,
        lng: f64,
    },
    ReceiveMessage(MessageResponse),
}

async fn ws_handler(
    State(state): State<AppState>,
    Query(query): Query<WsAuthQuery>,
    ws: WebSocketUpgrade,
) -> Result<Response, AppError> {
    // El handshake websocket no lleva headers custom: el token viaja en
    // la query y se valida antes del upgrade
    let user = state
        .jwt
        .get_user_info(&query.token)
        .map_err(|_| AppError::Unauthorized("Invalid or expired token".to_string()))?;

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, user)))
}

/// Suscripciones de una conexión. Las salas son aditivas: entrar a una
/// nueva conversación no corta la entrega de las anteriores.
#[derive(Debug, Default)]
struct Subscriptions {
    vehicle_rooms: HashSet<Uuid>,
    chat_rooms: HashSet<Uuid>,
}

async fn handle_socket(socket: WebSocket, state: AppState, user: UserInfo) {
    info!("🔌 Websocket conectado: {} ({})", user.name, user.id);

    let (mut sender, mut receiver) = socket.split();
    let mut bus = state.subscribe();
    let mut subs = Subscriptions::default();

    loop {
        tokio::select! {
            incoming = receiver.next() => {
                match incoming {
                    Some(Ok(WsMessage::Text(text))) => {
                        match serde_json::from_str::<ClientEvent>(&text) {
                            Ok(event) => {
                                if let Err(e) =
                                    handle_client_event(&state, &user, event, &mut subs).await
                                {
                                    warn!("⚠️ Evento websocket rechazado para {}: {}", user.id, e);
                                }
                            }
                            Err(e) => {
                                warn!("⚠️ Mensaje websocket inválido de {}: {}", user.id, e);
                            }
                        }
                    }
                    Some(Ok(WsMessage::Close(_))) | None => break,
                    Some(Ok(_)) => {} // ping/pong/binary, nada que hacer
                    Some(Err(e)) => {
                        warn!("⚠️ Error de websocket para {}: {}", user.id, e);
                        break;
                    }
                }
            }
            event = bus.recv() => {
                match event {
                    Ok(event) => {
                        if let Some(outgoing) = filter_event(&user, &subs, event) {
                            let json = match serde_json::to_string(&outgoing) {
                                Ok(json) => json,
                                Err(_) => continue,
                            };
                            if sender.send(WsMessage::Text(json)).await.is_err() {
                                break;
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        // Receiver lento: pierde eventos y sigue desde el último
                        warn!("⚠️ Socket de {} atrasado, {} eventos perdidos", user.id, skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    info!("🔌 Websocket desconectado: {}", user.id);
}

async fn handle_client_event(
    state: &AppState,
    user: &UserInfo,
    event: ClientEvent,
    subs: &mut Subscriptions,
) -> Result<(), AppError> {
    match event {
        ClientEvent::JoinVehicleRoom { vehicle_id } => {
            // Un cliente solo puede seguir vehículos que tiene reservados;
            // el admin los ve todos sin entrar a salas
            if user.is_admin() {
                subs.vehicle_rooms.insert(vehicle_id);
                return Ok(());
            }

            let bookings = BookingRepository::new(state.pool.clone());
            if !bookings.user_engages_vehicle(user.id, vehicle_id).await? {
                return Err(AppError::Forbidden(
                    "No active booking for this vehicle".to_string(),
                ));
            }
            subs.vehicle_rooms.insert(vehicle_id);
            Ok(())
        }

        ClientEvent::UpdateLocation { vehicle_id, lat, lng } => {
            // Last-write-wins: se persiste la posición y se publica al bus
            let vehicles = VehicleRepository::new(state.pool.clone());
            if !vehicles.update_location(vehicle_id, lat, lng).await? {
                return Err(AppError::NotFound("Vehicle not found".to_string()));
            }

            state.publish(BusEvent::VehicleLocation { vehicle_id, lat, lng });
            Ok(())
        }

        ClientEvent::JoinChat { room } => {
            // La sala de chat de un cliente es su propio id
            if !user.is_admin() && room != user.id {
                return Err(AppError::Forbidden(
                    "Cannot join another user's chat room".to_string(),
                ));
            }
            subs.chat_rooms.insert(room);
            Ok(())
        }

        ClientEvent::SendMessage {
            room,
            receiver_id,
            message,
        } => {
            let chat = ChatController::new(state.pool.clone());
            let persisted = chat.send_message(user, room, receiver_id, message).await?;

            state.publish(BusEvent::ChatMessage {
                room_id: room,
                message: persisted,
            });
            Ok(())
        }
    }
}

/// Decide si un evento del bus le llega a esta conexión. Los admins
/// reciben todas las posiciones; los clientes solo las de sus salas.
/// Los mensajes de chat solo llegan a quien está en esa sala.
fn filter_event(user: &UserInfo, subs: &Subscriptions, event: BusEvent) -> Option<ServerEvent> {
    match event {
        BusEvent::VehicleLocation { vehicle_id, lat, lng } => {
            if user.is_admin() || subs.vehicle_rooms.contains(&vehicle_id) {
                Some(ServerEvent::VehicleLocationUpdated { vehicle_id, lat, lng })
            } else {
                None
            }
        }
        BusEvent::ChatMessage { room_id, message } => {
            if subs.chat_rooms.contains(&room_id) {
                Some(ServerEvent::ReceiveMessage(message))
            } else {
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::auth::UserRole;

    fn customer() -> UserInfo {
        UserInfo {
            id: Uuid::new_v4(),
            name: "Cliente".to_string(),
            email: "cliente@test.com".to_string(),
            role: UserRole::User,
        }
    }

    fn admin() -> UserInfo {
        UserInfo {
            id: Uuid::new_v4(),
            name: "Admin".to_string(),
            email: "admin@test.com".to_string(),
            role: UserRole::Admin,
        }
    }

    fn location_event(vehicle_id: Uuid) -> BusEvent {
        BusEvent::VehicleLocation {
            vehicle_id,
            lat: 40.0,
            lng: -3.0,
        }
    }

    #[test]
    fn test_client_event_wire_format() {
        let raw = r#"{"event":"update_location","data":{"vehicleId":"7f2c3a04-9a3f-4a8e-9d1e-111122223333","lat":40.5,"lng":-3.6}}"#;
        let event: ClientEvent = serde_json::from_str(raw).unwrap();

        match event {
            ClientEvent::UpdateLocation { lat, lng, .. } => {
                assert_eq!(lat, 40.5);
                assert_eq!(lng, -3.6);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_server_event_wire_format() {
        let event = ServerEvent::VehicleLocationUpdated {
            vehicle_id: Uuid::nil(),
            lat: 1.0,
            lng: 2.0,
        };
        let json = serde_json::to_string(&event).unwrap();

        assert!(json.contains(r#""event":"vehicle_location_updated""#));
        assert!(json.contains(r#""vehicleId""#));
    }

    #[test]
    fn test_admin_receives_all_locations() {
        let subs = Subscriptions::default();
        let event = location_event(Uuid::new_v4());

        assert!(filter_event(&admin(), &subs, event).is_some());
    }

    #[test]
    fn test_customer_only_receives_joined_vehicle_rooms() {
        let vehicle_id = Uuid::new_v4();
        let mut subs = Subscriptions::default();

        let user = customer();
        assert!(filter_event(&user, &subs, location_event(vehicle_id)).is_none());

        subs.vehicle_rooms.insert(vehicle_id);
        assert!(filter_event(&user, &subs, location_event(vehicle_id)).is_some());
    }

    fn chat_event(room_id: Uuid) -> BusEvent {
        BusEvent::ChatMessage {
            room_id,
            message: MessageResponse {
                id: Uuid::new_v4().to_string(),
                sender_id: Uuid::new_v4().to_string(),
                receiver_id: Uuid::new_v4().to_string(),
                room_id: room_id.to_string(),
                message: "hola".to_string(),
                timestamp: "2026-01-01T00:00:00Z".to_string(),
            },
        }
    }

    #[test]
    fn test_chat_messages_stay_in_their_room() {
        let room_id = Uuid::new_v4();
        let user = customer();
        let mut subs = Subscriptions::default();

        assert!(filter_event(&user, &subs, chat_event(room_id)).is_none());

        subs.chat_rooms.insert(room_id);
        assert!(matches!(
            filter_event(&user, &subs, chat_event(room_id)),
            Some(ServerEvent::ReceiveMessage(_))
        ));
    }

    #[test]
    fn test_chat_rooms_are_additive() {
        // El admin que abre una segunda conversación sigue recibiendo
        // los mensajes de la primera
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        let user = admin();
        let mut subs = Subscriptions::default();

        subs.chat_rooms.insert(first);
        subs.chat_rooms.insert(second);

        assert!(filter_event(&user, &subs, chat_event(first)).is_some());
        assert!(filter_event(&user, &subs, chat_event(second)).is_some());
        assert!(filter_event(&user, &subs, chat_event(Uuid::new_v4())).is_none());
    }
}
