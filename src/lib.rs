//! Bibliotheca circulation server
//!
//! REST JSON API over a small library: catalog, reader accounts, and the
//! borrow/return workflow with overdue fines.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}

impl AppState {
    /// Wire services over `store`
    pub fn new(store: repository::SharedStore, config: AppConfig) -> Self {
        let services = services::Services::new(store, &config);
        Self {
            config: Arc::new(config),
            services: Arc::new(services),
        }
    }
}
