use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::dto::vehicle_dto::{CreateVehicleFields, UpdateVehicleFields};
use crate::models::vehicle::{Vehicle, VehicleStatus};
use crate::utils::errors::AppError;

pub struct VehicleRepository {
    pool: PgPool,
}

impl VehicleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        fields: CreateVehicleFields,
        images: Vec<String>,
    ) -> Result<Vehicle, AppError> {
        let price = Decimal::from_f64_retain(fields.price_per_hour)
            .ok_or_else(|| AppError::BadRequest("Invalid price value".to_string()))?;

        let (lat, lng) = fields
            .current_location
            .map(|p| (p.lat, p.lng))
            .unwrap_or((0.0, 0.0));

        let vehicle = sqlx::query_as::<_, Vehicle>(
            r#"
            INSERT INTO vehicles
                (id, make, model, vehicle_type, license_plate, price_per_hour,
                 description, images, status, current_lat, current_lng, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'available', $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(fields.make)
        .bind(fields.model)
        .bind(fields.vehicle_type)
        .bind(fields.license_plate)
        .bind(price)
        .bind(fields.description)
        .bind(images)
        .bind(lat)
        .bind(lng)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(vehicle)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Vehicle>, AppError> {
        let vehicle = sqlx::query_as::<_, Vehicle>("SELECT * FROM vehicles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(vehicle)
    }

    pub async fn find_all(&self) -> Result<Vec<Vehicle>, AppError> {
        let vehicles =
            sqlx::query_as::<_, Vehicle>("SELECT * FROM vehicles ORDER BY created_at DESC")
                .fetch_all(&self.pool)
                .await?;

        Ok(vehicles)
    }

    pub async fn license_plate_exists(&self, license_plate: &str) -> Result<bool, AppError> {
        let result: (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM vehicles WHERE license_plate = $1)")
                .bind(license_plate)
                .fetch_one(&self.pool)
                .await?;

        Ok(result.0)
    }

    pub async fn update(
        &self,
        id: Uuid,
        fields: UpdateVehicleFields,
        images: Option<Vec<String>>,
    ) -> Result<Vehicle, AppError> {
        let current = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Vehicle not found".to_string()))?;

        let price = if let Some(p) = fields.price_per_hour {
            Decimal::from_f64_retain(p)
                .ok_or_else(|| AppError::BadRequest("Invalid price value".to_string()))?
        } else {
            current.price_per_hour
        };

        let (lat, lng) = fields
            .current_location
            .map(|p| (p.lat, p.lng))
            .unwrap_or((current.current_lat, current.current_lng));

        let vehicle = sqlx::query_as::<_, Vehicle>(
            r#"
            UPDATE vehicles
            SET make = $2, model = $3, vehicle_type = $4, license_plate = $5,
                price_per_hour = $6, description = $7, images = $8, status = $9,
                current_lat = $10, current_lng = $11
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(fields.make.unwrap_or(current.make))
        .bind(fields.model.unwrap_or(current.model))
        .bind(fields.vehicle_type.unwrap_or(current.vehicle_type))
        .bind(fields.license_plate.unwrap_or(current.license_plate))
        .bind(price)
        .bind(fields.description.or(current.description))
        .bind(images.unwrap_or(current.images))
        .bind(fields.status.unwrap_or(current.status))
        .bind(lat)
        .bind(lng)
        .fetch_one(&self.pool)
        .await?;

        Ok(vehicle)
    }

    pub async fn update_status(&self, id: Uuid, status: VehicleStatus) -> Result<(), AppError> {
        sqlx::query("UPDATE vehicles SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(status.as_str())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Sobrescribe la última posición conocida. Last-write-wins: no hay
    /// protección de orden frente a entregas desordenadas.
    pub async fn update_location(&self, id: Uuid, lat: f64, lng: f64) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE vehicles SET current_lat = $2, current_lng = $3 WHERE id = $1")
            .bind(id)
            .bind(lat)
            .bind(lng)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM vehicles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Vehicle not found".to_string()));
        }

        Ok(())
    }

    pub async fn count(&self) -> Result<i64, AppError> {
        let result: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM vehicles")
            .fetch_one(&self.pool)
            .await?;

        Ok(result.0)
    }
}
