use anyhow::{Result, anyhow};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::Service;

pub struct CatalogService {
    supabase: SupabaseClient,
}

impl CatalogService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    /// Seed the catalog with the default services when it is empty.
    /// Idempotent: a non-empty catalog is left untouched.
    pub async fn ensure_default_services(&self, auth_token: Option<&str>) -> Result<()> {
        let existing: Vec<Value> = self.supabase.request(
            Method::GET,
            "/rest/v1/services?select=id&limit=1",
            auth_token,
            None,
        ).await?;

        if !existing.is_empty() {
            return Ok(());
        }

        debug!("Service catalog empty, seeding default services");

        let defaults = json!([
            {
                "name": "General Consultation",
                "description": "Professional consultation with experienced staff",
                "duration_minutes": 30,
                "price": 30,
                "is_active": true
            },
            {
                "name": "Skin Care Session",
                "description": "Refreshing skin treatment for glowing results",
                "duration_minutes": 45,
                "price": 45,
                "is_active": true
            },
            {
                "name": "Business Coaching",
                "description": "One on one growth and strategy guidance",
                "duration_minutes": 60,
                "price": 60,
                "is_active": true
            },
            {
                "name": "Salon Services",
                "description": "Premium hair and beauty services",
                "duration_minutes": 90,
                "price": 75,
                "is_active": true
            }
        ]);

        let _: Value = self.supabase.request(
            Method::POST,
            "/rest/v1/services",
            auth_token,
            Some(defaults),
        ).await?;

        Ok(())
    }

    /// Active services, oldest first.
    pub async fn list_services(&self, auth_token: Option<&str>) -> Result<Vec<Service>> {
        self.ensure_default_services(auth_token).await?;

        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            "/rest/v1/services?is_active=eq.true&order=created_at.asc",
            auth_token,
            None,
        ).await?;

        let services: Vec<Service> = result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(services)
    }

    /// Look a service up by id. `None` when the id matches no row.
    pub async fn find_service(
        &self,
        service_id: Uuid,
        auth_token: Option<&str>,
    ) -> Result<Option<Service>> {
        debug!("Fetching service: {}", service_id);

        let path = format!("/rest/v1/services?id=eq.{}", service_id);
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            auth_token,
            None,
        ).await?;

        match result.into_iter().next() {
            Some(value) => {
                let service: Service = serde_json::from_value(value)
                    .map_err(|e| anyhow!("Malformed service row: {}", e))?;
                Ok(Some(service))
            }
            None => Ok(None),
        }
    }
}
