//! StuffLibrary Server
//!
//! A Rust implementation of the StuffLibrary neighborhood item-sharing
//! server: users list physical items, browse what neighbors share, and
//! negotiate borrowing through a request/approve/return workflow backed
//! by a REST JSON API.

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
    /// Kept alongside the services for the readiness probe
    pub pool: sqlx::PgPool,
}
