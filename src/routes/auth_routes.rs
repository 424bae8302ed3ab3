use axum::{
    extract::{Multipart, State},
    middleware,
    routing::{delete, get, post, put},
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::controllers::auth_controller::AuthController;
use crate::dto::auth_dto::{
    AuthResponse, ForgotPasswordRequest, LoginRequest, RegisterRequest, ResetPasswordRequest,
    UpdateProfileRequest,
};
use crate::dto::ApiResponse;
use crate::middleware::auth_middleware::{protect, require_admin};
use crate::models::auth::UserInfo;
use crate::models::user::UserResponse;
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::utils::uploads;

pub fn create_auth_router(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/forgot-password", post(forgot_password))
        .route("/reset-password", post(reset_password));

    let protected = Router::new()
        .route("/user", get(me))
        .route("/profile", put(update_profile))
        .route("/profile/license", post(upload_license))
        .layer(middleware::from_fn_with_state(state.clone(), protect));

    // protect corre antes que require_admin (capa más externa)
    let admin = Router::new()
        .route("/users", get(list_users))
        .route("/users/:id", delete(delete_user))
        .layer(middleware::from_fn(require_admin))
        .layer(middleware::from_fn_with_state(state, protect));

    public.merge(protected).merge(admin)
}

async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let controller = AuthController::new(state.pool.clone());
    let response = controller
        .register(request, &state.jwt, state.email.clone())
        .await?;
    Ok(Json(response))
}

async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let controller = AuthController::new(state.pool.clone());
    let response = controller.login(request, &state.jwt).await?;
    Ok(Json(response))
}

async fn me(
    State(state): State<AppState>,
    Extension(user): Extension<UserInfo>,
) -> Result<Json<UserResponse>, AppError> {
    let controller = AuthController::new(state.pool.clone());
    let response = controller.me(user.id).await?;
    Ok(Json(response))
}

async fn update_profile(
    State(state): State<AppState>,
    Extension(user): Extension<UserInfo>,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let controller = AuthController::new(state.pool.clone());
    let response = controller.update_profile(user.id, request).await?;
    Ok(Json(response))
}

/// Subida de la imagen de la licencia de conducir (multipart)
async fn upload_license(
    State(state): State<AppState>,
    Extension(user): Extension<UserInfo>,
    mut multipart: Multipart,
) -> Result<Json<UserResponse>, AppError> {
    let mut image_url = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        if field.file_name().is_some() {
            let file_name = field.file_name().map(|s| s.to_string());
            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(format!("Invalid upload: {}", e)))?;
            image_url = Some(
                uploads::save_image(&state.config.upload_dir, file_name.as_deref(), &data).await?,
            );
            break;
        }
    }

    let image_url =
        image_url.ok_or_else(|| AppError::BadRequest("License image is required".to_string()))?;

    let controller = AuthController::new(state.pool.clone());
    let response = controller.set_license_image(user.id, &image_url).await?;
    Ok(Json(response))
}

async fn list_users(
    State(state): State<AppState>,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    let controller = AuthController::new(state.pool.clone());
    let response = controller.list_users().await?;
    Ok(Json(response))
}

async fn delete_user(
    State(state): State<AppState>,
    Extension(user): Extension<UserInfo>,
    axum::extract::Path(id): axum::extract::Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let controller = AuthController::new(state.pool.clone());
    controller.delete_user(id, &user).await?;
    Ok(Json(ApiResponse::success_with_message(
        (),
        "User removed".to_string(),
    )))
}

async fn forgot_password(
    State(state): State<AppState>,
    Json(request): Json<ForgotPasswordRequest>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let controller = AuthController::new(state.pool.clone());
    controller
        .forgot_password(request, state.email.clone())
        .await?;
    Ok(Json(ApiResponse::success_with_message(
        (),
        "Password reset email sent".to_string(),
    )))
}

async fn reset_password(
    State(state): State<AppState>,
    Json(request): Json<ResetPasswordRequest>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let controller = AuthController::new(state.pool.clone());
    controller.reset_password(request).await?;
    Ok(Json(ApiResponse::success_with_message(
        (),
        "Password updated".to_string(),
    )))
}
