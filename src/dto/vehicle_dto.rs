use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::vehicle::Vehicle;

/// Punto geográfico en el response (lat/lng explícitos, no GeoJSON)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct LocationPoint {
    pub lat: f64,
    pub lng: f64,
}

/// Query params del listado de vehículos. Si llegan coordenadas se aplica
/// el filtro de proximidad (radio en km, default 50).
#[derive(Debug, Default, Deserialize)]
pub struct VehicleQuery {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub radius: Option<f64>,
}

/// Campos de texto del formulario multipart de creación de vehículo.
/// Las imágenes viajan como parts de archivo aparte.
#[derive(Debug, Default, Validate)]
pub struct CreateVehicleFields {
    #[validate(length(min = 1, max = 100))]
    pub make: String,

    #[validate(length(min = 1, max = 100))]
    pub model: String,

    pub vehicle_type: String,

    #[validate(length(min = 3, max = 20))]
    pub license_plate: String,

    pub price_per_hour: f64,

    pub description: Option<String>,

    pub current_location: Option<LocationPoint>,
}

/// Campos del formulario multipart de actualización (todos opcionales)
#[derive(Debug, Default)]
pub struct UpdateVehicleFields {
    pub make: Option<String>,
    pub model: Option<String>,
    pub vehicle_type: Option<String>,
    pub license_plate: Option<String>,
    pub price_per_hour: Option<f64>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub current_location: Option<LocationPoint>,
}

/// Request del endpoint HTTP de actualización de ubicación GPS
#[derive(Debug, Deserialize)]
pub struct UpdateLocationRequest {
    pub lat: f64,
    pub lng: f64,
}

/// Response de vehículo para la API
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleResponse {
    pub id: String,
    pub make: String,
    pub model: String,
    #[serde(rename = "type")]
    pub vehicle_type: String,
    pub license_plate: String,
    pub price_per_hour: String,
    pub description: Option<String>,
    pub images: Vec<String>,
    pub status: String,
    pub current_location: LocationPoint,
    pub created_at: String,
}

impl From<Vehicle> for VehicleResponse {
    fn from(vehicle: Vehicle) -> Self {
        Self {
            id: vehicle.id.to_string(),
            make: vehicle.make,
            model: vehicle.model,
            vehicle_type: vehicle.vehicle_type,
            license_plate: vehicle.license_plate,
            price_per_hour: vehicle.price_per_hour.to_string(),
            description: vehicle.description,
            images: vehicle.images,
            status: vehicle.status,
            current_location: LocationPoint {
                lat: vehicle.current_lat,
                lng: vehicle.current_lng,
            },
            created_at: vehicle.created_at.to_rfc3339(),
        }
    }
}

/// Response del listado público: vehículo + disponibilidad calculada
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleAvailabilityResponse {
    #[serde(flatten)]
    pub vehicle: VehicleResponse,
    pub is_available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_available_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_renter: Option<String>,
}
