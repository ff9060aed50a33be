use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{AvailabilitySettings, AvailabilityError, UpdateAvailabilityRequest};
use crate::services::schedule;

const SETTINGS_KEY: &str = "default";

pub struct AvailabilityService {
    supabase: SupabaseClient,
}

impl AvailabilityService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    /// Load the settings singleton, creating it with the fixed defaults on
    /// first access. Idempotent: repeated calls return the same row.
    pub async fn ensure_settings(
        &self,
        auth_token: Option<&str>,
    ) -> Result<AvailabilitySettings, AvailabilityError> {
        let path = format!("/rest/v1/availability_settings?key=eq.{}", SETTINGS_KEY);
        let existing: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            auth_token,
            None,
        ).await.map_err(|e| AvailabilityError::Database(e.to_string()))?;

        if let Some(row) = existing.into_iter().next() {
            return serde_json::from_value(row)
                .map_err(|e| AvailabilityError::Database(format!("Malformed settings row: {}", e)));
        }

        debug!("No availability settings found, creating defaults");

        let defaults = json!({
            "key": SETTINGS_KEY,
            "start_time": "09:00",
            "end_time": "17:00",
            "slot_duration_minutes": 60,
            "working_days": [1, 2, 3, 4, 5, 6],
            "break_start_time": "13:00",
            "break_end_time": "14:00",
            "created_at": chrono::Utc::now().to_rfc3339(),
            "updated_at": chrono::Utc::now().to_rfc3339()
        });

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("Prefer", reqwest::header::HeaderValue::from_static("return=representation"));

        let created: Vec<Value> = self.supabase.request_with_headers(
            Method::POST,
            "/rest/v1/availability_settings",
            auth_token,
            Some(defaults),
            Some(headers),
        ).await.map_err(|e| AvailabilityError::Database(e.to_string()))?;

        let row = created.into_iter().next()
            .ok_or_else(|| AvailabilityError::Database("Failed to create availability settings".to_string()))?;

        serde_json::from_value(row)
            .map_err(|e| AvailabilityError::Database(format!("Malformed settings row: {}", e)))
    }

    /// Settings plus the derived slot labels.
    pub async fn get_availability(
        &self,
        auth_token: Option<&str>,
    ) -> Result<(AvailabilitySettings, Vec<String>), AvailabilityError> {
        let settings = self.ensure_settings(auth_token).await?;
        let slots = schedule::generate_slots(&settings)?;
        Ok((settings, slots))
    }

    /// Apply an admin patch to the singleton. The whole patch is validated
    /// before any write is issued; only provided fields are written.
    pub async fn update_settings(
        &self,
        patch: UpdateAvailabilityRequest,
        auth_token: Option<&str>,
    ) -> Result<(AvailabilitySettings, Vec<String>), AvailabilityError> {
        schedule::validate_settings_patch(&patch)?;

        // Creates the row on first update so the PATCH below has a target.
        self.ensure_settings(auth_token).await?;

        let mut update_data = serde_json::Map::new();

        if let Some(start_time) = patch.start_time {
            update_data.insert("start_time".to_string(), json!(start_time));
        }
        if let Some(end_time) = patch.end_time {
            update_data.insert("end_time".to_string(), json!(end_time));
        }
        if let Some(duration) = patch.slot_duration_minutes {
            update_data.insert("slot_duration_minutes".to_string(), json!(duration));
        }
        if let Some(working_days) = patch.working_days {
            update_data.insert("working_days".to_string(), json!(working_days));
        }
        if let Some(break_start_time) = patch.break_start_time {
            update_data.insert("break_start_time".to_string(), json!(break_start_time));
        }
        if let Some(break_end_time) = patch.break_end_time {
            update_data.insert("break_end_time".to_string(), json!(break_end_time));
        }

        update_data.insert("updated_at".to_string(), json!(chrono::Utc::now().to_rfc3339()));

        let path = format!("/rest/v1/availability_settings?key=eq.{}", SETTINGS_KEY);
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("Prefer", reqwest::header::HeaderValue::from_static("return=representation"));

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::PATCH,
            &path,
            auth_token,
            Some(Value::Object(update_data)),
            Some(headers),
        ).await.map_err(|e| AvailabilityError::Database(e.to_string()))?;

        let row = result.into_iter().next()
            .ok_or_else(|| AvailabilityError::Database("Failed to update availability settings".to_string()))?;

        let settings: AvailabilitySettings = serde_json::from_value(row)
            .map_err(|e| AvailabilityError::Database(format!("Malformed settings row: {}", e)))?;
        let slots = schedule::generate_slots(&settings)?;

        Ok((settings, slots))
    }
}
