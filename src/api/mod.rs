//! API handlers for Bibliotheca REST endpoints

pub mod auth;
pub mod books;
pub mod categories;
pub mod health;
pub mod loans;
pub mod users;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
    routing::{delete, get, post, put},
    Router,
};
use serde::Serialize;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    error::{AppError, AppResult},
    models::user::UserClaims,
    services::access::Capability,
    AppState,
};

/// Extractor for authenticated user from JWT token
pub struct AuthenticatedUser(pub UserClaims);

impl AuthenticatedUser {
    /// Check a capability against these claims
    pub async fn require(&self, state: &AppState, capability: Capability) -> AppResult<()> {
        state.services.access.authorize(&self.0, capability).await
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::InvalidToken("Missing authorization header".to_string()))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::InvalidToken("Invalid authorization header format".to_string()))?;

        let claims = state.services.sessions.validate(token)?;

        Ok(AuthenticatedUser(claims))
    }
}

/// Plain success/failure signal
#[derive(Debug, Serialize)]
pub struct OutcomeResponse {
    pub result: &'static str,
}

impl OutcomeResponse {
    pub fn new(result: &'static str) -> Self {
        Self { result }
    }
}

/// Create the application router with all routes
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        .route("/health", get(health::health_check))
        // Authentication
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/me", get(auth::me))
        // Catalog
        .route("/books", get(books::list_books))
        .route("/books", post(books::create_book))
        .route("/books/:id", delete(books::delete_book))
        .route("/categories", get(categories::list_categories))
        .route("/categories", post(categories::create_category))
        // Circulation
        .route("/loans", get(loans::list_loans))
        .route("/loans", post(loans::borrow))
        .route("/loans/return", post(loans::give_back))
        // Users
        .route("/users", get(users::list_users))
        .route("/users/:id/loans", get(loans::get_user_loans))
        .route("/users/:id/fine", get(users::get_user_fine))
        .route("/users/:id/blocked", put(users::update_blocked))
        .route("/users/:id/active", put(users::update_active))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_v1)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
