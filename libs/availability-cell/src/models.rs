use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};

/// The one global scheduling configuration. Singleton row, `key = "default"`;
/// created lazily with fixed defaults, mutated only by admins, never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilitySettings {
    pub id: Uuid,
    pub key: String,
    pub start_time: String,
    pub end_time: String,
    pub slot_duration_minutes: i32,
    pub working_days: Vec<i32>,
    pub break_start_time: Option<String>,
    pub break_end_time: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Admin settings patch. Absent fields are left untouched; an empty string
/// for a break bound clears it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateAvailabilityRequest {
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub slot_duration_minutes: Option<i32>,
    pub working_days: Option<Vec<i32>>,
    pub break_start_time: Option<String>,
    pub break_end_time: Option<String>,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum AvailabilityError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),
}
