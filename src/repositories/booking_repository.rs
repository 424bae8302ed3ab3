use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::models::booking::{Booking, BookingStatus, PaymentStatus};
use crate::utils::errors::AppError;

/// Reserva junto con el nombre del usuario que la tiene (para el
/// cálculo de disponibilidad y la vista admin)
#[derive(Debug, FromRow)]
pub struct BookingWithRenter {
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
    pub renter_name: String,
    pub renter_email: String,
}

impl BookingWithRenter {
    pub fn into_booking(self) -> Booking {
        Booking {
            id: self.id,
            user_id: self.user_id,
            vehicle_id: self.vehicle_id,
            start_date: self.start_date,
            end_date: self.end_date,
            total_price: self.total_price,
            status: self.status,
            payment_status: self.payment_status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

pub struct BookingRepository {
    pool: PgPool,
}

impl BookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        user_id: Uuid,
        vehicle_id: Uuid,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
        total_price: Decimal,
        status: BookingStatus,
        payment_status: PaymentStatus,
    ) -> Result<Booking, AppError> {
        let now = Utc::now();
        let booking = sqlx::query_as::<_, Booking>(
            r#"
            INSERT INTO bookings
                (id, user_id, vehicle_id, start_date, end_date, total_price,
                 status, payment_status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(vehicle_id)
        .bind(start_date)
        .bind(end_date)
        .bind(total_price)
        .bind(status.as_str())
        .bind(payment_status.as_str())
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(booking)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Booking>, AppError> {
        let booking = sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(booking)
    }

    /// Reserva vigente del usuario, si existe: status en {pending, confirmed, active}.
    /// Soporta la regla de una sola reserva activa por usuario.
    pub async fn find_engaging_by_user(&self, user_id: Uuid) -> Result<Option<Booking>, AppError> {
        let booking = sqlx::query_as::<_, Booking>(
            r#"
            SELECT * FROM bookings
            WHERE user_id = $1 AND status IN ('pending', 'confirmed', 'active')
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(booking)
    }

    /// Verifica si el usuario tiene reserva vigente sobre ese vehículo
    /// (autorización de la sala de ubicación en el websocket)
    pub async fn user_engages_vehicle(
        &self,
        user_id: Uuid,
        vehicle_id: Uuid,
    ) -> Result<bool, AppError> {
        let result: (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM bookings
                WHERE user_id = $1 AND vehicle_id = $2
                  AND status IN ('pending', 'confirmed', 'active')
            )
            "#,
        )
        .bind(user_id)
        .bind(vehicle_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(result.0)
    }

    pub async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<Booking>, AppError> {
        let bookings = sqlx::query_as::<_, Booking>(
            "SELECT * FROM bookings WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(bookings)
    }

    pub async fn find_all_with_renter(&self) -> Result<Vec<BookingWithRenter>, AppError> {
        let bookings = sqlx::query_as::<_, BookingWithRenter>(
            r#"
            SELECT b.*, u.name AS renter_name, u.email AS renter_email
            FROM bookings b
            JOIN users u ON u.id = b.user_id
            ORDER BY b.created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(bookings)
    }

    /// Reservas que comprometen vehículos ahora o en el futuro:
    /// status en {confirmed, active} y end_date >= now. Insumo del
    /// calculador de disponibilidad.
    pub async fn find_engaging_with_renter(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<BookingWithRenter>, AppError> {
        let bookings = sqlx::query_as::<_, BookingWithRenter>(
            r#"
            SELECT b.*, u.name AS renter_name, u.email AS renter_email
            FROM bookings b
            JOIN users u ON u.id = b.user_id
            WHERE b.status IN ('confirmed', 'active') AND b.end_date >= $1
            "#,
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        Ok(bookings)
    }

    pub async fn update_status(
        &self,
        id: Uuid,
        status: BookingStatus,
    ) -> Result<Booking, AppError> {
        let booking = sqlx::query_as::<_, Booking>(
            "UPDATE bookings SET status = $2, updated_at = $3 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status.as_str())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(booking)
    }

    pub async fn count_active(&self) -> Result<i64, AppError> {
        let result: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM bookings WHERE status = 'active'")
                .fetch_one(&self.pool)
                .await?;

        Ok(result.0)
    }

    /// Suma de total_price sobre reservas pagadas (revenue del dashboard)
    pub async fn paid_revenue(&self) -> Result<Decimal, AppError> {
        let result: (Option<Decimal>,) = sqlx::query_as(
            "SELECT SUM(total_price) FROM bookings WHERE payment_status = 'paid'",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(result.0.unwrap_or(Decimal::ZERO))
    }
}
