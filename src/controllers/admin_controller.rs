//! Controller del dashboard de administración

use sqlx::PgPool;

use crate::dto::admin_dto::DashboardStats;
use crate::repositories::booking_repository::BookingRepository;
use crate::repositories::user_repository::UserRepository;
use crate::repositories::vehicle_repository::VehicleRepository;
use crate::utils::errors::AppError;

pub struct AdminController {
    users: UserRepository,
    vehicles: VehicleRepository,
    bookings: BookingRepository,
}

impl AdminController {
    pub fn new(pool: PgPool) -> Self {
        Self {
            users: UserRepository::new(pool.clone()),
            vehicles: VehicleRepository::new(pool.clone()),
            bookings: BookingRepository::new(pool),
        }
    }

    /// Estadísticas del dashboard. Las cuatro queries corren en paralelo.
    pub async fn dashboard_stats(&self) -> Result<DashboardStats, AppError> {
        let (users, vehicles, active_bookings, revenue) = tokio::try_join!(
            self.users.count_customers(),
            self.vehicles.count(),
            self.bookings.count_active(),
            self.bookings.paid_revenue(),
        )?;

        Ok(DashboardStats {
            users,
            vehicles,
            active_bookings,
            revenue: revenue.to_string(),
        })
    }
}
