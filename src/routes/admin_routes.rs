use axum::{extract::State, middleware, routing::get, Json, Router};

use crate::controllers::admin_controller::AdminController;
use crate::dto::admin_dto::DashboardStats;
use crate::middleware::auth_middleware::{protect, require_admin};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_admin_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/stats", get(dashboard_stats))
        .layer(middleware::from_fn(require_admin))
        .layer(middleware::from_fn_with_state(state, protect))
}

async fn dashboard_stats(
    State(state): State<AppState>,
) -> Result<Json<DashboardStats>, AppError> {
    let controller = AdminController::new(state.pool.clone());
    let response = controller.dashboard_stats().await?;
    Ok(Json(response))
}
