use serde::Serialize;

/// Estadísticas del dashboard de administración
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub users: i64,
    pub vehicles: i64,
    pub active_bookings: i64,
    pub revenue: String,
}
