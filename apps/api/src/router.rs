use std::sync::Arc;

use axum::{
    Router,
    routing::get,
    Json,
};
use serde_json::json;

use availability_cell::router::{availability_routes, admin_availability_routes};
use appointment_cell::router::appointment_routes;
use service_cell::router::service_routes;
use shared_config::AppConfig;

pub fn create_router(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(|| async {
            Json(json!({
                "status": "ok",
                "message": "Appointment booking API running"
            }))
        }))
        .nest("/services", service_routes(state.clone()))
        .nest("/availability", availability_routes(state.clone()))
        .nest("/admin/availability", admin_availability_routes(state.clone()))
        .nest("/appointments", appointment_routes(state.clone()))
}
