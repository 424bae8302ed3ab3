use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dto::vehicle_dto::VehicleResponse;
use crate::models::booking::Booking;

/// Request para crear una reserva. El precio total se calcula en el
/// servidor a partir de la tarifa horaria del vehículo.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    pub vehicle_id: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

/// Request del admin para avanzar el estado de una reserva
#[derive(Debug, Deserialize)]
pub struct UpdateBookingStatusRequest {
    pub status: String,
}

/// Resumen de usuario embebido en responses de booking (vista admin)
#[derive(Debug, Serialize)]
pub struct BookingUserSummary {
    pub id: String,
    pub name: String,
    pub email: String,
}

/// Response de reserva para la API
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingResponse {
    pub id: String,
    pub user_id: String,
    pub vehicle_id: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub total_price: String,
    pub status: String,
    pub payment_status: String,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle: Option<VehicleResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<BookingUserSummary>,
}

impl BookingResponse {
    pub fn from_booking(booking: Booking) -> Self {
        Self {
            id: booking.id.to_string(),
            user_id: booking.user_id.to_string(),
            vehicle_id: booking.vehicle_id.to_string(),
            start_date: booking.start_date,
            end_date: booking.end_date,
            total_price: booking.total_price.to_string(),
            status: booking.status,
            payment_status: booking.payment_status,
            created_at: booking.created_at.to_rfc3339(),
            vehicle: None,
            user: None,
        }
    }

    pub fn with_vehicle(mut self, vehicle: VehicleResponse) -> Self {
        self.vehicle = Some(vehicle);
        self
    }

    pub fn with_user(mut self, user: BookingUserSummary) -> Self {
        self.user = Some(user);
        self
    }
}
