use std::sync::Arc;

use axum::{
    extract::{State, Extension},
    Json,
};
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{AvailabilitySettings, AvailabilityError, UpdateAvailabilityRequest};
use crate::services::AvailabilityService;

fn into_app_error(error: AvailabilityError) -> AppError {
    match error {
        AvailabilityError::Validation(msg) => AppError::Validation(msg),
        AvailabilityError::Database(msg) => AppError::Database(msg),
    }
}

fn availability_body(settings: &AvailabilitySettings, slots: &[String], include_id: bool) -> Value {
    let mut body = json!({
        "start_time": settings.start_time,
        "end_time": settings.end_time,
        "slot_duration_minutes": settings.slot_duration_minutes,
        "working_days": settings.working_days,
        "break_start_time": settings.break_start_time,
        "break_end_time": settings.break_end_time,
        "slots": slots,
    });

    if include_id {
        body["id"] = json!(settings.id);
    }

    body
}

/// Public view of the booking window: settings plus derived slot labels.
#[axum::debug_handler]
pub async fn get_public_availability(
    State(config): State<Arc<AppConfig>>,
) -> Result<Json<Value>, AppError> {
    let service = AvailabilityService::new(&config);

    let (settings, slots) = service.get_availability(None)
        .await
        .map_err(into_app_error)?;

    Ok(Json(json!({
        "availability": availability_body(&settings, &slots, false)
    })))
}

#[axum::debug_handler]
pub async fn get_admin_availability(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    if !user.is_admin() {
        return Err(AppError::Forbidden("Admin access required".to_string()));
    }

    let service = AvailabilityService::new(&config);

    let (settings, slots) = service.get_availability(Some(auth.token()))
        .await
        .map_err(into_app_error)?;

    Ok(Json(json!({
        "availability": availability_body(&settings, &slots, true)
    })))
}

#[axum::debug_handler]
pub async fn update_availability(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(patch): Json<UpdateAvailabilityRequest>,
) -> Result<Json<Value>, AppError> {
    if !user.is_admin() {
        return Err(AppError::Forbidden("Admin access required".to_string()));
    }

    let service = AvailabilityService::new(&config);

    let (settings, slots) = service.update_settings(patch, Some(auth.token()))
        .await
        .map_err(into_app_error)?;

    Ok(Json(json!({
        "message": "Availability updated successfully.",
        "availability": availability_body(&settings, &slots, true)
    })))
}
