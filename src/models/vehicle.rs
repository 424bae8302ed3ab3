//! Modelo de Vehicle
//!
//! Este módulo contiene el struct Vehicle y sus variantes para CRUD operations.
//! Mapea exactamente al schema PostgreSQL con primary key 'id'.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Estado del vehículo
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VehicleStatus {
    Available,
    Rented,
    Maintenance,
    Cleaning,
}

impl VehicleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleStatus::Available => "available",
            VehicleStatus::Rented => "rented",
            VehicleStatus::Maintenance => "maintenance",
            VehicleStatus::Cleaning => "cleaning",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "available" => Some(VehicleStatus::Available),
            "rented" => Some(VehicleStatus::Rented),
            "maintenance" => Some(VehicleStatus::Maintenance),
            "cleaning" => Some(VehicleStatus::Cleaning),
            _ => None,
        }
    }
}

/// Tipo de vehículo ofrecido en la flota
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VehicleType {
    Car,
    Bike,
    Scooter,
}

impl VehicleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleType::Car => "car",
            VehicleType::Bike => "bike",
            VehicleType::Scooter => "scooter",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "car" => Some(VehicleType::Car),
            "bike" => Some(VehicleType::Bike),
            "scooter" => Some(VehicleType::Scooter),
            _ => None,
        }
    }
}

/// Vehicle principal - mapea exactamente a la tabla vehicles
#[derive(Debug, Clone, FromRow)]
pub struct Vehicle {
    pub id: Uuid,
    pub make: String,
    pub model: String,
    pub vehicle_type: String,
    pub license_plate: String,
    pub price_per_hour: Decimal,
    pub description: Option<String>,
    pub images: Vec<String>,
    pub status: String,
    pub current_lat: f64,
    pub current_lng: f64,
    pub geo_fence_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}
