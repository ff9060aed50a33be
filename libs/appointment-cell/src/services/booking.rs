use chrono::{DateTime, NaiveDate};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use service_cell::services::CatalogService;

use crate::models::{
    Appointment, AppointmentError, AppointmentSearchQuery, AppointmentStatus,
    CreateAppointmentRequest, UpdateAppointmentRequest, ActorRole,
};
use crate::services::access::{self, Actor, CustomerResolution};

pub struct AppointmentBookingService {
    config: AppConfig,
    supabase: SupabaseClient,
}

/// The date field carries calendar-date semantics; any time-of-day in an
/// RFC 3339 value is discarded.
fn parse_appointment_date(value: &str) -> Result<NaiveDate, AppointmentError> {
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(date);
    }
    if let Ok(datetime) = DateTime::parse_from_rfc3339(value) {
        return Ok(datetime.date_naive());
    }
    Err(AppointmentError::Validation("Invalid appointment date.".to_string()))
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

impl AppointmentBookingService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            config: config.clone(),
            supabase: SupabaseClient::new(config),
        }
    }

    /// Book an appointment. All ids, the date, and the target customer are
    /// validated before the insert; no overlap check is performed.
    pub async fn create_appointment(
        &self,
        request: CreateAppointmentRequest,
        actor: &Actor,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        let service = non_empty(&request.service);
        let appointment_date = non_empty(&request.appointment_date);
        let start_time = non_empty(&request.start_time);
        let end_time = non_empty(&request.end_time);

        let (service, appointment_date, start_time, end_time) =
            match (service, appointment_date, start_time, end_time) {
                (Some(s), Some(d), Some(st), Some(et)) => (s, d, st, et),
                _ => {
                    return Err(AppointmentError::Validation(
                        "service, appointment_date, start_time, and end_time are required.".to_string(),
                    ));
                }
            };

        let service_id = Uuid::parse_str(service)
            .map_err(|_| AppointmentError::Validation("Invalid service id.".to_string()))?;

        let parsed_date = parse_appointment_date(appointment_date)?;

        let catalog = CatalogService::new(&self.config);
        catalog.find_service(service_id, Some(auth_token))
            .await
            .map_err(|e| AppointmentError::Database(e.to_string()))?
            .ok_or(AppointmentError::ServiceNotFound)?;

        let customer = match access::resolve_customer_for_create(request.customer_id.as_deref(), actor)? {
            CustomerResolution::Own(id) => id,
            CustomerResolution::Requested(id) => {
                self.find_customer(id, auth_token).await?;
                id
            }
        };

        debug!("Booking appointment for customer {} on {}", customer, parsed_date);

        let appointment_data = json!({
            "customer": customer,
            "service": service_id,
            "appointment_date": parsed_date.format("%Y-%m-%d").to_string(),
            "start_time": start_time,
            "end_time": end_time,
            "status": AppointmentStatus::Pending,
            "notes": request.notes,
            "created_at": chrono::Utc::now().to_rfc3339(),
            "updated_at": chrono::Utc::now().to_rfc3339()
        });

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("Prefer", reqwest::header::HeaderValue::from_static("return=representation"));

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::POST,
            "/rest/v1/appointments",
            Some(auth_token),
            Some(appointment_data),
            Some(headers),
        ).await.map_err(|e| AppointmentError::Database(e.to_string()))?;

        let row = result.into_iter().next()
            .ok_or_else(|| AppointmentError::Database("Failed to create appointment".to_string()))?;

        serde_json::from_value(row)
            .map_err(|e| AppointmentError::Database(format!("Malformed appointment row: {}", e)))
    }

    pub async fn get_appointment(
        &self,
        appointment_id: Uuid,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await.map_err(|e| AppointmentError::Database(e.to_string()))?;

        let row = result.into_iter().next().ok_or(AppointmentError::NotFound)?;

        serde_json::from_value(row)
            .map_err(|e| AppointmentError::Database(format!("Malformed appointment row: {}", e)))
    }

    /// List appointments visible to the actor. Customers are always scoped
    /// to their own rows; the customer_id filter is admin-only.
    pub async fn search_appointments(
        &self,
        query: AppointmentSearchQuery,
        actor: &Actor,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let mut filters = Vec::new();

        if actor.role == ActorRole::Customer {
            filters.push(format!("customer=eq.{}", actor.id));
        }

        if let Some(status) = query.status {
            filters.push(format!("status=eq.{}", status));
        }

        if let Some(service) = non_empty(&query.service) {
            let service_id = Uuid::parse_str(service)
                .map_err(|_| AppointmentError::Validation("Invalid service id.".to_string()))?;
            filters.push(format!("service=eq.{}", service_id));
        }

        if actor.role == ActorRole::Admin {
            if let Some(customer_id) = non_empty(&query.customer_id) {
                let customer_id = Uuid::parse_str(customer_id)
                    .map_err(|_| AppointmentError::Validation("Invalid customer id.".to_string()))?;
                filters.push(format!("customer=eq.{}", customer_id));
            }
        }

        if let Some(date_from) = non_empty(&query.date_from) {
            let from = parse_appointment_date(date_from)
                .map_err(|_| AppointmentError::Validation("Invalid date_from value.".to_string()))?;
            filters.push(format!("appointment_date=gte.{}", from));
        }

        if let Some(date_to) = non_empty(&query.date_to) {
            let to = parse_appointment_date(date_to)
                .map_err(|_| AppointmentError::Validation("Invalid date_to value.".to_string()))?;
            filters.push(format!("appointment_date=lte.{}", to));
        }

        filters.push("order=appointment_date.asc,start_time.asc".to_string());

        let path = format!("/rest/v1/appointments?{}", filters.join("&"));
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await.map_err(|e| AppointmentError::Database(e.to_string()))?;

        result.into_iter()
            .map(|row| serde_json::from_value(row)
                .map_err(|e| AppointmentError::Database(format!("Malformed appointment row: {}", e))))
            .collect()
    }

    /// Partial update under the role policy. The patch is filtered and every
    /// surviving field validated before the single PATCH is issued, so a
    /// failing field never leaves a half-applied update behind.
    pub async fn update_appointment(
        &self,
        appointment_id: Uuid,
        request: UpdateAppointmentRequest,
        actor: &Actor,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        let appointment = self.get_appointment(appointment_id, auth_token).await?;

        if !access::can_access(&appointment, actor) {
            return Err(AppointmentError::Forbidden("Forbidden.".to_string()));
        }

        let filtered = access::filter_update(&request, actor.role);
        access::check_status_policy(&filtered, actor.role)?;

        let mut update_data = serde_json::Map::new();

        if let Some(service) = non_empty(&filtered.service) {
            let service_id = Uuid::parse_str(service)
                .map_err(|_| AppointmentError::Validation("Invalid service id.".to_string()))?;

            let catalog = CatalogService::new(&self.config);
            catalog.find_service(service_id, Some(auth_token))
                .await
                .map_err(|e| AppointmentError::Database(e.to_string()))?
                .ok_or(AppointmentError::ServiceNotFound)?;

            update_data.insert("service".to_string(), json!(service_id));
        }

        if let Some(customer) = non_empty(&filtered.customer) {
            // Only reachable for admins; the filter strips this for customers.
            let customer_id = Uuid::parse_str(customer)
                .map_err(|_| AppointmentError::Validation("Invalid customer id.".to_string()))?;
            self.find_customer(customer_id, auth_token).await?;
            update_data.insert("customer".to_string(), json!(customer_id));
        }

        if let Some(appointment_date) = non_empty(&filtered.appointment_date) {
            let parsed_date = parse_appointment_date(appointment_date)?;
            update_data.insert(
                "appointment_date".to_string(),
                json!(parsed_date.format("%Y-%m-%d").to_string()),
            );
        }

        if let Some(start_time) = filtered.start_time {
            update_data.insert("start_time".to_string(), json!(start_time));
        }
        if let Some(end_time) = filtered.end_time {
            update_data.insert("end_time".to_string(), json!(end_time));
        }
        if let Some(status) = filtered.status {
            update_data.insert("status".to_string(), json!(status));
        }
        if let Some(notes) = filtered.notes {
            update_data.insert("notes".to_string(), json!(notes));
        }

        update_data.insert("updated_at".to_string(), json!(chrono::Utc::now().to_rfc3339()));

        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("Prefer", reqwest::header::HeaderValue::from_static("return=representation"));

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::PATCH,
            &path,
            Some(auth_token),
            Some(Value::Object(update_data)),
            Some(headers),
        ).await.map_err(|e| AppointmentError::Database(e.to_string()))?;

        let row = result.into_iter().next()
            .ok_or_else(|| AppointmentError::Database("Failed to update appointment".to_string()))?;

        serde_json::from_value(row)
            .map_err(|e| AppointmentError::Database(format!("Malformed appointment row: {}", e)))
    }

    /// The target of a booking-on-behalf must exist and actually be a
    /// customer; admins and other roles are not bookable targets.
    async fn find_customer(
        &self,
        customer_id: Uuid,
        auth_token: &str,
    ) -> Result<(), AppointmentError> {
        let path = format!("/rest/v1/users?id=eq.{}", customer_id);
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await.map_err(|e| AppointmentError::Database(e.to_string()))?;

        let is_customer = result.first()
            .and_then(|row| row["role"].as_str())
            .map(|role| role == "customer")
            .unwrap_or(false);

        if !is_customer {
            return Err(AppointmentError::CustomerNotFound);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_dates_and_rfc3339() {
        assert_eq!(
            parse_appointment_date("2025-06-02").unwrap(),
            NaiveDate::from_ymd_opt(2025, 6, 2).unwrap()
        );
        assert_eq!(
            parse_appointment_date("2025-06-02T14:30:00Z").unwrap(),
            NaiveDate::from_ymd_opt(2025, 6, 2).unwrap()
        );
    }

    #[test]
    fn rejects_unparseable_dates() {
        for value in ["tomorrow", "02/06/2025", "2025-13-01", ""] {
            assert!(parse_appointment_date(value).is_err(), "accepted {:?}", value);
        }
    }
}
