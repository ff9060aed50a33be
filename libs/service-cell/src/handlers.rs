use std::sync::Arc;
use axum::{extract::State, Json};
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::services::CatalogService;

#[axum::debug_handler]
pub async fn get_services(
    State(config): State<Arc<AppConfig>>,
) -> Result<Json<Value>, AppError> {
    let service = CatalogService::new(&config);

    let services = service.list_services(None)
        .await
        .map_err(|e| AppError::Database(format!("Failed to fetch services: {}", e)))?;

    Ok(Json(json!({ "services": services })))
}
