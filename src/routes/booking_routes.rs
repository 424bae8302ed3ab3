use axum::{
    extract::{Path, State},
    middleware,
    routing::{get, post, put},
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::controllers::booking_controller::BookingController;
use crate::dto::booking_dto::{BookingResponse, CreateBookingRequest, UpdateBookingStatusRequest};
use crate::middleware::auth_middleware::{protect, require_admin};
use crate::models::auth::UserInfo;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_booking_router(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/", post(create_booking))
        .route("/mybookings", get(my_bookings))
        .layer(middleware::from_fn_with_state(state.clone(), protect));

    let admin = Router::new()
        .route("/", get(all_bookings))
        .route("/:id/status", put(update_status))
        .layer(middleware::from_fn(require_admin))
        .layer(middleware::from_fn_with_state(state, protect));

    protected.merge(admin)
}

async fn create_booking(
    State(state): State<AppState>,
    Extension(user): Extension<UserInfo>,
    Json(request): Json<CreateBookingRequest>,
) -> Result<Json<BookingResponse>, AppError> {
    let controller = BookingController::new(state.pool.clone());
    let response = controller
        .create(&user, request, state.email.clone())
        .await?;
    Ok(Json(response))
}

async fn my_bookings(
    State(state): State<AppState>,
    Extension(user): Extension<UserInfo>,
) -> Result<Json<Vec<BookingResponse>>, AppError> {
    let controller = BookingController::new(state.pool.clone());
    let response = controller.my_bookings(user.id).await?;
    Ok(Json(response))
}

async fn all_bookings(
    State(state): State<AppState>,
) -> Result<Json<Vec<BookingResponse>>, AppError> {
    let controller = BookingController::new(state.pool.clone());
    let response = controller.all_bookings().await?;
    Ok(Json(response))
}

async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateBookingStatusRequest>,
) -> Result<Json<BookingResponse>, AppError> {
    let controller = BookingController::new(state.pool.clone());
    let response = controller
        .update_status(id, request, state.email.clone())
        .await?;
    Ok(Json(response))
}
