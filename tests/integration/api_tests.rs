//! API integration tests, served in-process over the in-memory store

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use bibliotheca_server::{api, config::AppConfig, repository::MemoryStore, AppState};

const ADMIN_EMAIL: &str = "admin@library.test";
const ADMIN_PASSWORD: &str = "admin-secret";

async fn setup() -> (AppState, Router) {
    let state = AppState::new(Arc::new(MemoryStore::new()), AppConfig::default());
    state
        .services
        .credentials
        .ensure_admin(ADMIN_EMAIL, ADMIN_PASSWORD)
        .await
        .unwrap();
    let app = api::router(state.clone());
    (state, app)
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request = Request::builder()
        .method(method)
        .uri(format!("/api/v1{}", uri))
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let body = match body {
        Some(value) => Body::from(serde_json::to_vec(&value).unwrap()),
        None => Body::empty(),
    };

    let response = app.clone().oneshot(request.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn login(app: &Router, email: &str, password: &str) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "email": email, "password": password })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["token_type"], "Bearer");
    body["token"].as_str().unwrap().to_string()
}

async fn register(app: &Router, first_name: &str, email: &str) -> StatusCode {
    let (status, _) = send(
        app,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({
            "firstName": first_name,
            "lastName": "Reader",
            "email": email,
            "mobile": "0600000000",
            "password": "pass1234"
        })),
    )
    .await;
    status
}

async fn user_id(app: &Router, token: &str) -> i64 {
    let (status, body) = send(app, Method::GET, "/auth/me", Some(token), None).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    body["id"].as_i64().unwrap()
}

/// Register, activate and log in a reader; returns (id, token)
async fn active_reader(app: &Router, admin: &str, first_name: &str, email: &str) -> (i64, String) {
    assert_eq!(register(app, first_name, email).await, StatusCode::CREATED);
    let id = {
        let token = login(app, email, "pass1234").await;
        let (_, body) = send(app, Method::GET, "/auth/me", Some(&token), None).await;
        assert_eq!(body["active"], false);
        body["id"].as_i64().unwrap()
    };

    let (status, body) = send(
        app,
        Method::PUT,
        &format!("/users/{}/active", id),
        Some(admin),
        Some(json!({ "active": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);

    (id, login(app, email, "pass1234").await)
}

async fn seed_book(app: &Router, admin: &str, title: &str) -> i64 {
    send(
        app,
        Method::POST,
        "/categories",
        Some(admin),
        Some(json!({ "category": "Fiction", "subCategory": "Classics" })),
    )
    .await;

    let (status, body) = send(
        app,
        Method::POST,
        "/books",
        Some(admin),
        Some(json!({
            "title": title,
            "author": "Jane Austen",
            "price": "12.50",
            "category": "fiction",
            "subCategory": "classics"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body["id"].as_i64().unwrap()
}

async fn available(app: &Router, token: &str, book_id: i64) -> bool {
    let (status, body) = send(app, Method::GET, "/books", Some(token), None).await;
    assert_eq!(status, StatusCode::OK);
    body.as_array()
        .unwrap()
        .iter()
        .find(|book| book["id"].as_i64() == Some(book_id))
        .map(|book| book["available"].as_bool().unwrap())
        .unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let (_, app) = setup().await;
    let (status, body) = send(&app, Method::GET, "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_login_with_wrong_password_is_rejected() {
    let (_, app) = setup().await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "email": ADMIN_EMAIL, "password": "nope" })),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 10);
}

#[tokio::test]
async fn test_duplicate_registration_conflicts() {
    let (_, app) = setup().await;
    assert_eq!(register(&app, "Ann", "ann@library.test").await, StatusCode::CREATED);
    assert_eq!(register(&app, "Ann", "ann@library.test").await, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_missing_or_garbage_token_is_unauthorized() {
    let (_, app) = setup().await;

    let (status, _) = send(&app, Method::GET, "/books", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(&app, Method::GET, "/books", Some("not-a-token"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 12);
}

#[tokio::test]
async fn test_expired_token_is_rejected() {
    let (state, app) = setup().await;
    let admin = state
        .services
        .credentials
        .authenticate(ADMIN_EMAIL, ADMIN_PASSWORD)
        .await
        .unwrap();
    let stale = state
        .services
        .sessions
        .issue_at(&admin, Utc::now() - Duration::hours(3))
        .unwrap();

    let (status, body) = send(&app, Method::GET, "/auth/me", Some(&stale), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 11);
}

#[tokio::test]
async fn test_inactive_reader_cannot_borrow() {
    let (_, app) = setup().await;
    let admin = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let book_id = seed_book(&app, &admin, "Emma").await;

    assert_eq!(register(&app, "Ann", "ann@library.test").await, StatusCode::CREATED);
    let token = login(&app, "ann@library.test", "pass1234").await;
    let id = user_id(&app, &token).await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/loans",
        Some(&token),
        Some(json!({ "userId": id, "bookId": book_id })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(available(&app, &admin, book_id).await);
}

#[tokio::test]
async fn test_reader_cannot_use_admin_endpoints() {
    let (_, app) = setup().await;
    let admin = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let (id, token) = active_reader(&app, &admin, "Ann", "ann@library.test").await;

    let (status, _) = send(&app, Method::GET, "/users", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, Method::GET, "/loans", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app,
        Method::PUT,
        &format!("/users/{}/blocked", id),
        Some(&token),
        Some(json!({ "blocked": false })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_borrow_return_scenario() {
    let (_, app) = setup().await;
    let admin = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let book_id = seed_book(&app, &admin, "Persuasion").await;

    let (ann, ann_token) = active_reader(&app, &admin, "Ann", "ann@library.test").await;
    let (bob, bob_token) = active_reader(&app, &admin, "Bob", "bob@library.test").await;

    // Ann borrows
    let (status, body) = send(
        &app,
        Method::POST,
        "/loans",
        Some(&ann_token),
        Some(json!({ "userId": ann, "bookId": book_id })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"], "success");
    assert!(!available(&app, &bob_token, book_id).await);

    // Bob is refused while the book is out
    let (_, body) = send(
        &app,
        Method::POST,
        "/loans",
        Some(&bob_token),
        Some(json!({ "userId": bob, "bookId": book_id })),
    )
    .await;
    assert_eq!(body["result"], "fail");

    // Bob cannot return Ann's book
    let (_, body) = send(
        &app,
        Method::POST,
        "/loans/return",
        Some(&bob_token),
        Some(json!({ "userId": bob, "bookId": book_id })),
    )
    .await;
    assert_eq!(body["result"], "not returned");
    assert!(!available(&app, &bob_token, book_id).await);

    // Ann returns, then Bob succeeds
    let (_, body) = send(
        &app,
        Method::POST,
        "/loans/return",
        Some(&ann_token),
        Some(json!({ "userId": ann, "bookId": book_id })),
    )
    .await;
    assert_eq!(body["result"], "success");
    assert!(available(&app, &bob_token, book_id).await);

    let (_, body) = send(
        &app,
        Method::POST,
        "/loans",
        Some(&bob_token),
        Some(json!({ "userId": bob, "bookId": book_id })),
    )
    .await;
    assert_eq!(body["result"], "success");

    // History
    let (status, loans) = send(&app, Method::GET, "/loans", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    let loans = loans.as_array().unwrap();
    assert_eq!(loans.len(), 2);
    assert_eq!(loans[0]["userId"].as_i64(), Some(ann));
    assert_eq!(loans[0]["returned"], true);
    assert_eq!(loans[1]["userId"].as_i64(), Some(bob));
    assert_eq!(loans[1]["returned"], false);

    let (status, mine) = send(
        &app,
        Method::GET,
        &format!("/users/{}/loans", ann),
        Some(&ann_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine.as_array().unwrap().len(), 1);

    // Fresh loans carry no fine
    let (_, fine) = send(
        &app,
        Method::GET,
        &format!("/users/{}/fine", bob),
        Some(&bob_token),
        None,
    )
    .await;
    assert_eq!(fine["fine"], 0);
}

#[tokio::test]
async fn test_reader_cannot_borrow_for_someone_else() {
    let (_, app) = setup().await;
    let admin = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let book_id = seed_book(&app, &admin, "Emma").await;
    let (_, ann_token) = active_reader(&app, &admin, "Ann", "ann@library.test").await;
    let (bob, _) = active_reader(&app, &admin, "Bob", "bob@library.test").await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/loans",
        Some(&ann_token),
        Some(json!({ "userId": bob, "bookId": book_id })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_blocked_snapshot_is_enforced_after_relogin() {
    let (_, app) = setup().await;
    let admin = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let book_id = seed_book(&app, &admin, "Emma").await;
    let (ann, _) = active_reader(&app, &admin, "Ann", "ann@library.test").await;

    let (status, _) = send(
        &app,
        Method::PUT,
        &format!("/users/{}/blocked", ann),
        Some(&admin),
        Some(json!({ "blocked": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let token = login(&app, "ann@library.test", "pass1234").await;
    let (status, _) = send(
        &app,
        Method::POST,
        "/loans",
        Some(&token),
        Some(json!({ "userId": ann, "bookId": book_id })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Admin acting for a blocked reader is still refused at borrow time
    let (status, _) = send(
        &app,
        Method::POST,
        "/loans",
        Some(&admin),
        Some(json!({ "userId": ann, "bookId": book_id })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_categories_are_grouped() {
    let (_, app) = setup().await;
    let admin = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    for (category, sub) in [("Fiction", "Classics"), ("Fiction", "Gothic"), ("Science", "Physics")] {
        let (status, _) = send(
            &app,
            Method::POST,
            "/categories",
            Some(&admin),
            Some(json!({ "category": category, "subCategory": sub })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, tree) = send(&app, Method::GET, "/categories", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    let tree = tree.as_array().unwrap();
    assert_eq!(tree.len(), 2);
    assert_eq!(tree[0]["name"], "fiction");
    assert_eq!(tree[0]["children"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_delete_book_with_history_is_refused() {
    let (_, app) = setup().await;
    let admin = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let kept = seed_book(&app, &admin, "Emma").await;
    let spare = seed_book(&app, &admin, "Sanditon").await;
    let (ann, ann_token) = active_reader(&app, &admin, "Ann", "ann@library.test").await;

    send(
        &app,
        Method::POST,
        "/loans",
        Some(&ann_token),
        Some(json!({ "userId": ann, "bookId": kept })),
    )
    .await;

    let (status, _) = send(&app, Method::DELETE, &format!("/books/{}", kept), Some(&admin), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(&app, Method::DELETE, &format!("/books/{}", spare), Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"], "success");

    let (_, body) = send(&app, Method::DELETE, &format!("/books/{}", spare), Some(&admin), None).await;
    assert_eq!(body["result"], "fail");
}
