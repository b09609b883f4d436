//! Circulation endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;

use crate::{
    error::AppResult,
    models::loan::LoanDetails,
    services::access::Capability,
    AppState,
};

use super::{AuthenticatedUser, OutcomeResponse};

/// Borrow or return request
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CirculationRequest {
    pub user_id: i32,
    pub book_id: i32,
}

/// Borrow a book; answers `success` or `fail`
pub async fn borrow(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<CirculationRequest>,
) -> AppResult<Json<OutcomeResponse>> {
    user.require(&state, Capability::Circulate { user_id: request.user_id })
        .await?;

    let outcome = state
        .services
        .loans
        .borrow(request.user_id, request.book_id)
        .await?;

    Ok(Json(OutcomeResponse::new(if outcome.is_success() {
        "success"
    } else {
        "fail"
    })))
}

/// Return a book; answers `success` or `not returned`
pub async fn give_back(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<CirculationRequest>,
) -> AppResult<Json<OutcomeResponse>> {
    user.require(&state, Capability::Circulate { user_id: request.user_id })
        .await?;

    let outcome = state
        .services
        .loans
        .give_back(request.user_id, request.book_id)
        .await?;

    Ok(Json(OutcomeResponse::new(if outcome.is_success() {
        "success"
    } else {
        "not returned"
    })))
}

/// Every loan in the library
pub async fn list_loans(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<Vec<LoanDetails>>> {
    user.require(&state, Capability::ViewAllLoans).await?;
    Ok(Json(state.services.loans.all_loans().await?))
}

/// Loans of one user
pub async fn get_user_loans(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(user_id): Path<i32>,
) -> AppResult<Json<Vec<LoanDetails>>> {
    user.require(&state, Capability::ViewAccount { user_id }).await?;
    Ok(Json(state.services.loans.loans_of(user_id).await?))
}
