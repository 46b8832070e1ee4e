use axum::{Router, http::Method, routing::get};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::clock::Clock;
use crate::config::ServerConfig;
use crate::reminders::ReminderService;
use crate::web::routes::*;

pub use error::AppError;

pub mod error;
pub mod models;
pub mod routes;

#[derive(Clone)]
pub struct AppState {
    pub db_pool: Arc<DatabaseConnection>,
    pub reminder_service: Arc<ReminderService>,
    pub clock: Arc<dyn Clock>,
    pub config: Arc<ServerConfig>,
}

async fn health_check_handler() -> &'static str {
    "OK"
}

pub fn create_axum_router(
    db_pool: Arc<DatabaseConnection>,
    reminder_service: Arc<ReminderService>,
    clock: Arc<dyn Clock>,
    config: Arc<ServerConfig>,
) -> Router {
    let app_state = Arc::new(AppState {
        db_pool,
        reminder_service,
        clock,
        config,
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(vec![
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(health_check_handler))
        .nest("/api/vendors", vendor_routes::create_vendors_router())
        .nest("/api/services", service_routes::create_services_router())
        .with_state(app_state)
        .layer(cors)
}
