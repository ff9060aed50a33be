use std::sync::Arc;

use axum::{Router, routing::get};

use shared_config::AppConfig;

use crate::handlers;

pub fn service_routes(state: Arc<AppConfig>) -> Router {
    // Catalog listing is public: the booking form reads it before login.
    Router::new()
        .route("/", get(handlers::get_services))
        .with_state(state)
}
