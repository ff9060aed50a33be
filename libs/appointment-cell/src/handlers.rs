use std::sync::Arc;

use axum::{
    extract::{Path, Query, State, Extension},
    Json,
};
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{
    AppointmentError, AppointmentSearchQuery, CreateAppointmentRequest, UpdateAppointmentRequest,
};
use crate::services::access::{self, Actor};
use crate::services::booking::AppointmentBookingService;

fn into_app_error(error: AppointmentError) -> AppError {
    match error {
        AppointmentError::NotFound => AppError::NotFound("Appointment not found.".to_string()),
        AppointmentError::ServiceNotFound => AppError::NotFound("Service not found.".to_string()),
        AppointmentError::CustomerNotFound => AppError::NotFound("Customer not found.".to_string()),
        AppointmentError::Forbidden(msg) => AppError::Forbidden(msg),
        AppointmentError::Validation(msg) => AppError::Validation(msg),
        AppointmentError::Database(msg) => AppError::Database(msg),
    }
}

#[axum::debug_handler]
pub async fn create_appointment(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let actor = Actor::from_user(&user).map_err(into_app_error)?;
    let service = AppointmentBookingService::new(&config);

    let appointment = service.create_appointment(request, &actor, auth.token())
        .await
        .map_err(into_app_error)?;

    Ok(Json(json!({
        "message": "Appointment created successfully.",
        "appointment": appointment
    })))
}

#[axum::debug_handler]
pub async fn get_appointments(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Query(query): Query<AppointmentSearchQuery>,
) -> Result<Json<Value>, AppError> {
    let actor = Actor::from_user(&user).map_err(into_app_error)?;
    let service = AppointmentBookingService::new(&config);

    let appointments = service.search_appointments(query, &actor, auth.token())
        .await
        .map_err(into_app_error)?;

    Ok(Json(json!({ "appointments": appointments })))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(config): State<Arc<AppConfig>>,
    Path(appointment_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let actor = Actor::from_user(&user).map_err(into_app_error)?;
    let service = AppointmentBookingService::new(&config);

    let appointment = service.get_appointment(appointment_id, auth.token())
        .await
        .map_err(into_app_error)?;

    // The forbidden response leaks nothing beyond the access decision.
    if !access::can_access(&appointment, &actor) {
        return Err(AppError::Forbidden("Forbidden.".to_string()));
    }

    Ok(Json(json!({ "appointment": appointment })))
}

#[axum::debug_handler]
pub async fn update_appointment(
    State(config): State<Arc<AppConfig>>,
    Path(appointment_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<UpdateAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let actor = Actor::from_user(&user).map_err(into_app_error)?;
    let service = AppointmentBookingService::new(&config);

    let appointment = service.update_appointment(appointment_id, request, &actor, auth.token())
        .await
        .map_err(into_app_error)?;

    Ok(Json(json!({
        "message": "Appointment updated successfully.",
        "appointment": appointment
    })))
}
