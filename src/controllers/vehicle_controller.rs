//! Controller de vehículos
//!
//! CRUD de la flota (admin) y el listado público con disponibilidad
//! calculada y filtro de proximidad.

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::dto::vehicle_dto::{
    CreateVehicleFields, UpdateVehicleFields, VehicleAvailabilityResponse, VehicleQuery,
    VehicleResponse,
};
use crate::models::vehicle::{Vehicle, VehicleType};
use crate::repositories::booking_repository::BookingRepository;
use crate::repositories::vehicle_repository::VehicleRepository;
use crate::services::availability_service::{assess_vehicle, within_radius, DEFAULT_RADIUS_KM};
use crate::utils::errors::{conflict_error, not_found_error, AppError};

pub struct VehicleController {
    repository: VehicleRepository,
    bookings: BookingRepository,
}

impl VehicleController {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: VehicleRepository::new(pool.clone()),
            bookings: BookingRepository::new(pool),
        }
    }

    /// Listado público: toda la flota (o la cercana al punto de consulta)
    /// con su disponibilidad evaluada contra el instante actual.
    pub async fn list_with_availability(
        &self,
        query: VehicleQuery,
    ) -> Result<Vec<VehicleAvailabilityResponse>, AppError> {
        let mut vehicles = self.repository.find_all().await?;

        if let (Some(lat), Some(lng)) = (query.lat, query.lng) {
            let radius = query.radius.unwrap_or(DEFAULT_RADIUS_KM);
            vehicles.retain(|v| within_radius(v, lat, lng, radius));
        }

        let now = Utc::now();
        let engaging = self.bookings.find_engaging_with_renter(now).await?;
        let bookings: Vec<_> = engaging
            .into_iter()
            .map(|b| {
                let renter = b.renter_name.clone();
                (b.into_booking(), renter)
            })
            .collect();

        Ok(vehicles
            .into_iter()
            .map(|v| assess_vehicle(v, &bookings, now))
            .collect())
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<VehicleResponse, AppError> {
        let vehicle = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("Vehicle", &id.to_string()))?;

        Ok(VehicleResponse::from(vehicle))
    }

    pub async fn create(
        &self,
        fields: CreateVehicleFields,
        images: Vec<String>,
    ) -> Result<VehicleResponse, AppError> {
        fields.validate()?;

        if VehicleType::from_str(&fields.vehicle_type).is_none() {
            return Err(AppError::BadRequest(format!(
                "Unknown vehicle type '{}'",
                fields.vehicle_type
            )));
        }

        if fields.price_per_hour <= 0.0 {
            return Err(AppError::BadRequest(
                "Price per hour must be positive".to_string(),
            ));
        }

        if self
            .repository
            .license_plate_exists(&fields.license_plate)
            .await?
        {
            return Err(conflict_error(
                "Vehicle",
                "license plate",
                &fields.license_plate,
            ));
        }

        let vehicle = self.repository.create(fields, images).await?;
        Ok(VehicleResponse::from(vehicle))
    }

    pub async fn update(
        &self,
        id: Uuid,
        fields: UpdateVehicleFields,
        images: Option<Vec<String>>,
    ) -> Result<VehicleResponse, AppError> {
        if let Some(ref vehicle_type) = fields.vehicle_type {
            if VehicleType::from_str(vehicle_type).is_none() {
                return Err(AppError::BadRequest(format!(
                    "Unknown vehicle type '{}'",
                    vehicle_type
                )));
            }
        }

        let vehicle = self.repository.update(id, fields, images).await?;
        Ok(VehicleResponse::from(vehicle))
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        self.repository.delete(id).await
    }

    /// Persiste la posición reportada por el endpoint HTTP de GPS.
    /// Last-write-wins, igual que el canal websocket.
    pub async fn update_location(
        &self,
        id: Uuid,
        lat: f64,
        lng: f64,
    ) -> Result<Vehicle, AppError> {
        let updated = self.repository.update_location(id, lat, lng).await?;
        if !updated {
            return Err(AppError::NotFound("Vehicle not found".to_string()));
        }

        let vehicle = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Vehicle not found".to_string()))?;

        Ok(vehicle)
    }
}
