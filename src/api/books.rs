//! Catalog endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::book::{Book, CatalogEntry, CreateBook},
    services::access::Capability,
    AppState,
};

use super::{AuthenticatedUser, OutcomeResponse};

pub async fn list_books(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<Vec<CatalogEntry>>> {
    user.require(&state, Capability::ViewCatalog).await?;
    Ok(Json(state.services.catalog.list_catalog().await?))
}

pub async fn create_book(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<CreateBook>,
) -> AppResult<(StatusCode, Json<Book>)> {
    user.require(&state, Capability::ManageInventory).await?;
    let book = state.services.catalog.insert_book(request).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

pub async fn delete_book(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<OutcomeResponse>> {
    user.require(&state, Capability::ManageInventory).await?;
    let deleted = state.services.catalog.delete_book(id).await?;
    Ok(Json(OutcomeResponse::new(if deleted { "success" } else { "fail" })))
}
