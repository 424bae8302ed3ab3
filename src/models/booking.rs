//! Modelo de Booking y su máquina de estados
//!
//! Ciclo de vida: pending → confirmed → active → completed,
//! con cancelled alcanzable desde cualquier estado no terminal.
//! Las transiciones a completed/cancelled arrastran el estado del vehículo.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::vehicle::VehicleStatus;

/// Estado de una reserva
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Active,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Active => "active",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(BookingStatus::Pending),
            "confirmed" => Some(BookingStatus::Confirmed),
            "active" => Some(BookingStatus::Active),
            "completed" => Some(BookingStatus::Completed),
            "cancelled" => Some(BookingStatus::Cancelled),
            _ => None,
        }
    }

    /// Estados terminales: no admiten más transiciones
    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Completed | BookingStatus::Cancelled)
    }

    /// Estados que cuentan para la regla de "una reserva activa por usuario"
    /// y que marcan un vehículo como ocupado.
    pub fn engages_vehicle(&self) -> bool {
        matches!(
            self,
            BookingStatus::Pending | BookingStatus::Confirmed | BookingStatus::Active
        )
    }

    /// Verifica si la transición hacia `next` es legal según la máquina de estados
    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        use BookingStatus::*;
        match (self, next) {
            (Pending, Confirmed) => true,
            (Confirmed, Active) => true,
            (Active, Completed) => true,
            // cancelled es alcanzable desde cualquier estado no terminal
            (from, Cancelled) if !from.is_terminal() => true,
            _ => false,
        }
    }

    /// Efecto en cascada sobre el vehículo al entrar en este estado.
    /// Solo completed y cancelled tocan el vehículo.
    pub fn vehicle_status_on_entry(&self) -> Option<VehicleStatus> {
        match self {
            BookingStatus::Completed => Some(VehicleStatus::Cleaning),
            BookingStatus::Cancelled => Some(VehicleStatus::Available),
            _ => None,
        }
    }
}

/// Estado del pago (simulado del lado del cliente, sin gateway real)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
        }
    }
}

/// Booking principal - mapea exactamente a la tabla bookings
#[derive(Debug, Clone, FromRow)]
pub struct Booking {
    pub id: Uuid,
    pub user_id: Uuid,
    pub vehicle_id: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub total_price: Decimal,
    pub status: String,
    pub payment_status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    pub fn status(&self) -> BookingStatus {
        BookingStatus::from_str(&self.status).unwrap_or(BookingStatus::Pending)
    }

    /// Verifica si el intervalo [start_date, end_date] contiene el instante dado
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start_date <= instant && self.end_date >= instant
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_happy_path_transitions() {
        use BookingStatus::*;
        assert!(Pending.can_transition_to(Confirmed));
        assert!(Confirmed.can_transition_to(Active));
        assert!(Active.can_transition_to(Completed));
    }

    #[test]
    fn test_cancel_from_any_non_terminal_state() {
        use BookingStatus::*;
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Confirmed.can_transition_to(Cancelled));
        assert!(Active.can_transition_to(Cancelled));
        assert!(!Completed.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(Cancelled));
    }

    #[test]
    fn test_no_backwards_or_skipping_transitions() {
        use BookingStatus::*;
        assert!(!Pending.can_transition_to(Active));
        assert!(!Confirmed.can_transition_to(Pending));
        assert!(!Completed.can_transition_to(Active));
        assert!(!Cancelled.can_transition_to(Confirmed));
    }

    #[test]
    fn test_vehicle_cascade_only_on_completed_and_cancelled() {
        use BookingStatus::*;
        assert_eq!(Completed.vehicle_status_on_entry(), Some(VehicleStatus::Cleaning));
        assert_eq!(Cancelled.vehicle_status_on_entry(), Some(VehicleStatus::Available));
        assert_eq!(Pending.vehicle_status_on_entry(), None);
        assert_eq!(Confirmed.vehicle_status_on_entry(), None);
        assert_eq!(Active.vehicle_status_on_entry(), None);
    }

    #[test]
    fn test_engaging_states() {
        use BookingStatus::*;
        assert!(Pending.engages_vehicle());
        assert!(Confirmed.engages_vehicle());
        assert!(Active.engages_vehicle());
        assert!(!Completed.engages_vehicle());
        assert!(!Cancelled.engages_vehicle());
    }

    #[test]
    fn test_booking_contains_instant() {
        let now = Utc::now();
        let booking = Booking {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            vehicle_id: Uuid::new_v4(),
            start_date: now - Duration::hours(1),
            end_date: now + Duration::hours(1),
            total_price: Decimal::new(100, 0),
            status: "active".to_string(),
            payment_status: "paid".to_string(),
            created_at: now,
            updated_at: now,
        };
        assert!(booking.contains(now));
        assert!(!booking.contains(now + Duration::hours(2)));
        assert!(!booking.contains(now - Duration::hours(2)));
    }
}
