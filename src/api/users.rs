//! User administration endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{
    error::AppResult,
    models::user::UserWithFine,
    services::access::Capability,
    AppState,
};

use super::{AuthenticatedUser, OutcomeResponse};

#[derive(Deserialize)]
pub struct BlockedRequest {
    pub blocked: bool,
}

#[derive(Deserialize)]
pub struct ActiveRequest {
    pub active: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FineResponse {
    pub user_id: i32,
    pub fine: i64,
}

/// All users with their current fine
pub async fn list_users(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<Vec<UserWithFine>>> {
    user.require(&state, Capability::ViewAllUsers).await?;
    Ok(Json(state.services.fines.users_with_fines().await?))
}

pub async fn get_user_fine(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(user_id): Path<i32>,
) -> AppResult<Json<FineResponse>> {
    user.require(&state, Capability::ViewAccount { user_id }).await?;
    let fine = state.services.fines.compute_fine(user_id).await?;
    Ok(Json(FineResponse { user_id, fine }))
}

pub async fn update_blocked(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(user_id): Path<i32>,
    Json(request): Json<BlockedRequest>,
) -> AppResult<Json<OutcomeResponse>> {
    user.require(&state, Capability::ManageUsers).await?;
    state.services.access.set_blocked(user_id, request.blocked).await?;
    Ok(Json(OutcomeResponse::new("success")))
}

pub async fn update_active(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(user_id): Path<i32>,
    Json(request): Json<ActiveRequest>,
) -> AppResult<Json<OutcomeResponse>> {
    user.require(&state, Capability::ManageUsers).await?;
    state.services.access.set_active(user_id, request.active).await?;
    Ok(Json(OutcomeResponse::new("success")))
}
