//! Category endpoints

use axum::{extract::State, http::StatusCode, Json};

use crate::{
    error::AppResult,
    models::category::{Category, CategoryNode, CreateCategory},
    services::access::Capability,
    AppState,
};

use super::AuthenticatedUser;

/// Categories grouped by top-level name
pub async fn list_categories(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<Vec<CategoryNode>>> {
    user.require(&state, Capability::ViewCatalog).await?;
    Ok(Json(state.services.catalog.list_categories().await?))
}

pub async fn create_category(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<CreateCategory>,
) -> AppResult<(StatusCode, Json<Category>)> {
    user.require(&state, Capability::ManageCategories).await?;
    let category = state.services.catalog.insert_category(request).await?;
    Ok((StatusCode::CREATED, Json(category)))
}
