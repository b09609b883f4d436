//! Registration and login endpoints

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use crate::{
    error::AppResult,
    models::user::{CreateAccount, UserClaims},
    services::access::Capability,
    AppState,
};

use super::AuthenticatedUser;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: String,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Create a reader account (inactive until an administrator activates it)
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<CreateAccount>,
) -> AppResult<(StatusCode, Json<MessageResponse>)> {
    state.services.credentials.register(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "Account created successfully.".to_string(),
        }),
    ))
}

/// Exchange email and password for a session token
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let user = state
        .services
        .credentials
        .authenticate(&request.email, &request.password)
        .await?;
    let token = state.services.sessions.issue(&user)?;

    Ok(Json(LoginResponse {
        token,
        token_type: "Bearer".to_string(),
    }))
}

/// Claims of the current session
pub async fn me(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<UserClaims>> {
    user.require(&state, Capability::ViewProfile).await?;
    Ok(Json(user.0))
}
