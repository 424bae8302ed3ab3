//! Modelo de GeoFence
//!
//! Polígono nombrado con flag de actividad. La tabla existe y el modelo
//! se expone, pero todavía no hay lógica que lo consuma.

use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct GeoFence {
    pub id: Uuid,
    pub name: String,
    /// GeoJSON Polygon: array de anillos de pares [lng, lat]
    pub polygon: serde_json::Value,
    pub description: Option<String>,
    pub is_active: bool,
}
