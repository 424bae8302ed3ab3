use axum::{
    extract::{Path, State},
    middleware,
    routing::get,
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::controllers::chat_controller::ChatController;
use crate::dto::chat_dto::{AdminContactResponse, ChatListEntry};
use crate::middleware::auth_middleware::{protect, require_admin};
use crate::models::auth::UserInfo;
use crate::models::message::MessageResponse;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_chat_router(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/admin", get(admin_contact))
        .route("/:other_id", get(conversation))
        .layer(middleware::from_fn_with_state(state.clone(), protect));

    let admin = Router::new()
        .route("/list", get(chat_list))
        .layer(middleware::from_fn(require_admin))
        .layer(middleware::from_fn_with_state(state, protect));

    protected.merge(admin)
}

async fn admin_contact(
    State(state): State<AppState>,
) -> Result<Json<AdminContactResponse>, AppError> {
    let controller = ChatController::new(state.pool.clone());
    let response = controller.admin_contact().await?;
    Ok(Json(response))
}

async fn chat_list(
    State(state): State<AppState>,
    Extension(user): Extension<UserInfo>,
) -> Result<Json<Vec<ChatListEntry>>, AppError> {
    let controller = ChatController::new(state.pool.clone());
    let response = controller.chat_list(user.id).await?;
    Ok(Json(response))
}

async fn conversation(
    State(state): State<AppState>,
    Extension(user): Extension<UserInfo>,
    Path(other_id): Path<Uuid>,
) -> Result<Json<Vec<MessageResponse>>, AppError> {
    let controller = ChatController::new(state.pool.clone());
    let response = controller.conversation(user.id, other_id).await?;
    Ok(Json(response))
}
