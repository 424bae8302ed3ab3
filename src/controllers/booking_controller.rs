//! Controller del ciclo de vida de reservas
//!
//! Creación con la regla de una reserva vigente por usuario, listados y
//! transiciones de estado del admin con su cascada sobre el vehículo.
//! No hay transacción entre el write de la reserva y el del vehículo:
//! el comportamiento es el mismo del sistema original y queda asumido.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use std::collections::HashMap;
use tracing::warn;
use uuid::Uuid;

use crate::dto::booking_dto::{
    BookingResponse, BookingUserSummary, CreateBookingRequest, UpdateBookingStatusRequest,
};
use crate::dto::vehicle_dto::VehicleResponse;
use crate::models::auth::UserInfo;
use crate::models::booking::{Booking, BookingStatus, PaymentStatus};
use crate::repositories::booking_repository::BookingRepository;
use crate::repositories::user_repository::UserRepository;
use crate::repositories::vehicle_repository::VehicleRepository;
use crate::services::email_service::EmailService;
use crate::utils::errors::AppError;

/// Regla de una sola reserva vigente por usuario: si ya existe una en
/// {pending, confirmed, active}, la creación se rechaza con conflicto
/// y no se inserta ningún registro.
pub fn ensure_no_engaging_booking(existing: Option<&Booking>) -> Result<(), AppError> {
    if existing.is_some() {
        return Err(AppError::Conflict(
            "You already have an active booking. Only one vehicle can be rented at a time."
                .to_string(),
        ));
    }
    Ok(())
}

/// Precio total: horas (redondeadas hacia arriba) por tarifa horaria
pub fn compute_total_price(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    price_per_hour: Decimal,
) -> Decimal {
    let seconds = (end - start).num_seconds().max(0);
    let hours = (seconds + 3599) / 3600; // ceil
    price_per_hour * Decimal::from(hours)
}

pub struct BookingController {
    repository: BookingRepository,
    vehicles: VehicleRepository,
    users: UserRepository,
}

impl BookingController {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: BookingRepository::new(pool.clone()),
            vehicles: VehicleRepository::new(pool.clone()),
            users: UserRepository::new(pool),
        }
    }

    /// Crea la reserva. El pago se simula del lado del cliente, así que
    /// la reserva entra directamente en active/paid, sin verificación de
    /// pago en el servidor (debilidad conocida del diseño original).
    pub async fn create(
        &self,
        acting: &UserInfo,
        request: CreateBookingRequest,
        email: EmailService,
    ) -> Result<BookingResponse, AppError> {
        if request.end_date <= request.start_date {
            return Err(AppError::BadRequest(
                "End date must be after start date".to_string(),
            ));
        }

        let engaging = self.repository.find_engaging_by_user(acting.id).await?;
        ensure_no_engaging_booking(engaging.as_ref())?;

        let vehicle = self
            .vehicles
            .find_by_id(request.vehicle_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Vehicle not found".to_string()))?;

        let total_price =
            compute_total_price(request.start_date, request.end_date, vehicle.price_per_hour);

        let booking = self
            .repository
            .create(
                acting.id,
                vehicle.id,
                request.start_date,
                request.end_date,
                total_price,
                BookingStatus::Active,
                PaymentStatus::Paid,
            )
            .await?;

        // Confirmación y recibo fuera del camino crítico
        if let Some(user) = self.users.find_by_id(acting.id).await? {
            let confirmation = email.clone();
            let receipt_user = user.clone();
            let receipt_booking = booking.clone();
            let receipt_vehicle = vehicle.clone();
            tokio::spawn(async move {
                confirmation
                    .send_booking_confirmation(&receipt_user, &receipt_booking, &receipt_vehicle)
                    .await;
                confirmation
                    .send_payment_receipt(&receipt_user, &receipt_booking, &receipt_vehicle)
                    .await;
            });
        }

        Ok(BookingResponse::from_booking(booking).with_vehicle(VehicleResponse::from(vehicle)))
    }

    /// Reservas del usuario autenticado, con su vehículo, las más nuevas primero
    pub async fn my_bookings(&self, user_id: Uuid) -> Result<Vec<BookingResponse>, AppError> {
        let bookings = self.repository.find_by_user(user_id).await?;
        let vehicles = self.vehicle_map().await?;

        Ok(bookings
            .into_iter()
            .map(|b| {
                let vehicle = vehicles.get(&b.vehicle_id).cloned();
                let mut response = BookingResponse::from_booking(b);
                if let Some(v) = vehicle {
                    response = response.with_vehicle(v);
                }
                response
            })
            .collect())
    }

    /// Todas las reservas con usuario y vehículo (vista admin)
    pub async fn all_bookings(&self) -> Result<Vec<BookingResponse>, AppError> {
        let bookings = self.repository.find_all_with_renter().await?;
        let vehicles = self.vehicle_map().await?;

        Ok(bookings
            .into_iter()
            .map(|b| {
                let user = BookingUserSummary {
                    id: b.user_id.to_string(),
                    name: b.renter_name.clone(),
                    email: b.renter_email.clone(),
                };
                let vehicle = vehicles.get(&b.vehicle_id).cloned();
                let mut response = BookingResponse::from_booking(b.into_booking()).with_user(user);
                if let Some(v) = vehicle {
                    response = response.with_vehicle(v);
                }
                response
            })
            .collect())
    }

    /// Transición de estado del admin, con cascada sobre el vehículo:
    /// completed deja el vehículo en cleaning, cancelled lo devuelve a
    /// available. Ninguna otra transición toca el vehículo.
    pub async fn update_status(
        &self,
        id: Uuid,
        request: UpdateBookingStatusRequest,
        email: EmailService,
    ) -> Result<BookingResponse, AppError> {
        let next = BookingStatus::from_str(&request.status)
            .ok_or_else(|| AppError::BadRequest(format!("Unknown status '{}'", request.status)))?;

        let booking = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;

        let current = booking.status();
        if !current.can_transition_to(next) {
            return Err(AppError::BadRequest(format!(
                "Invalid status transition from '{}' to '{}'",
                current.as_str(),
                next.as_str()
            )));
        }

        let updated = self.repository.update_status(id, next).await?;

        if let Some(vehicle_status) = next.vehicle_status_on_entry() {
            self.vehicles
                .update_status(updated.vehicle_id, vehicle_status)
                .await?;
        }

        self.notify_status_change(&updated, next, email).await;

        let vehicle = self.vehicles.find_by_id(updated.vehicle_id).await?;
        let user = self.users.find_by_id(updated.user_id).await?;

        let mut response = BookingResponse::from_booking(updated);
        if let Some(v) = vehicle {
            response = response.with_vehicle(VehicleResponse::from(v));
        }
        if let Some(u) = user {
            response = response.with_user(BookingUserSummary {
                id: u.id.to_string(),
                name: u.name,
                email: u.email,
            });
        }

        Ok(response)
    }

    /// Dispara el correo de cambio de estado. Nunca bloquea ni falla el
    /// request del admin: los errores solo quedan en el log.
    async fn notify_status_change(
        &self,
        booking: &Booking,
        status: BookingStatus,
        email: EmailService,
    ) {
        let user = match self.users.find_by_id(booking.user_id).await {
            Ok(Some(user)) => user,
            Ok(None) => return,
            Err(e) => {
                warn!("⚠️ No se pudo cargar el usuario para notificar: {}", e);
                return;
            }
        };

        let vehicle = match self.vehicles.find_by_id(booking.vehicle_id).await {
            Ok(Some(vehicle)) => vehicle,
            Ok(None) => return,
            Err(e) => {
                warn!("⚠️ No se pudo cargar el vehículo para notificar: {}", e);
                return;
            }
        };

        let booking = booking.clone();
        tokio::spawn(async move {
            email
                .send_booking_status_update(&user, &booking, &vehicle, status.as_str())
                .await;
        });
    }

    async fn vehicle_map(&self) -> Result<HashMap<Uuid, VehicleResponse>, AppError> {
        let vehicles = self.vehicles.find_all().await?;
        Ok(vehicles
            .into_iter()
            .map(|v| (v.id, VehicleResponse::from(v)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_total_price_exact_hours() {
        let start = Utc::now();
        let end = start + Duration::hours(3);
        let total = compute_total_price(start, end, Decimal::new(1500, 2)); // 15.00/h
        assert_eq!(total, Decimal::new(4500, 2)); // 45.00
    }

    #[test]
    fn test_total_price_rounds_partial_hours_up() {
        let start = Utc::now();
        let end = start + Duration::minutes(90);
        let total = compute_total_price(start, end, Decimal::new(10, 0));
        assert_eq!(total, Decimal::new(20, 0));
    }

    #[test]
    fn test_total_price_never_negative() {
        let start = Utc::now();
        let end = start - Duration::hours(1);
        let total = compute_total_price(start, end, Decimal::new(10, 0));
        assert_eq!(total, Decimal::ZERO);
    }

    fn booking_with_status(status: &str) -> Booking {
        let now = Utc::now();
        Booking {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            vehicle_id: Uuid::new_v4(),
            start_date: now,
            end_date: now + Duration::hours(4),
            total_price: Decimal::new(60, 0),
            status: status.to_string(),
            payment_status: "paid".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_second_booking_is_rejected_with_conflict() {
        for status in ["pending", "confirmed", "active"] {
            let existing = booking_with_status(status);
            let err = ensure_no_engaging_booking(Some(&existing)).unwrap_err();

            assert!(matches!(err, AppError::Conflict(_)), "status {}", status);
            assert!(err
                .to_string()
                .contains("Only one vehicle can be rented at a time"));
        }
    }

    #[test]
    fn test_booking_allowed_without_engaging_booking() {
        assert!(ensure_no_engaging_booking(None).is_ok());
    }
}
