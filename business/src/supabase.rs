//! Supabase adapter over plain HTTP.
//!
//! Two services of a Supabase project are used:
//! - PostgREST (`/rest/v1/{table}`) for the reachability probe
//! - GoTrue (`/auth/v1/...`) for the health signal and for password sign-in
//!
//! Every request carries the anon key in the `apikey` header. PostgREST also
//! expects it as a bearer token when no user session is attached.

use async_trait::async_trait;
use log::{debug, info};
use reqwest::StatusCode;
use serde::Deserialize;

use crate::config::SupabaseConfig;
use crate::database::{DatabaseClient, DatabaseError, HealthReport};

pub const REST_PATH: &str = "/rest/v1";
pub const AUTH_PATH: &str = "/auth/v1";

/// Error body returned by PostgREST.
#[derive(Debug, Clone, Deserialize)]
pub struct PostgrestError {
    pub message: Option<String>,
    pub code: Option<String>,
    pub details: Option<String>,
    pub hint: Option<String>,
}

/// Base URL, anon key and a configured HTTP client, shared by the database and
/// auth adapters.
#[derive(Debug, Clone)]
pub(crate) struct Endpoint {
    base_url: Option<String>,
    anon_key: Option<String>,
    http: reqwest::Client,
}

impl Endpoint {
    pub(crate) fn new(config: &SupabaseConfig) -> Result<Self, DatabaseError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;
        Ok(Self {
            base_url: config.base_url().map(str::to_owned),
            anon_key: config.anon_key().map(str::to_owned),
            http,
        })
    }

    pub(crate) fn url(&self, path: &str) -> Result<String, DatabaseError> {
        let base = self
            .base_url
            .as_deref()
            .filter(|base| !base.is_empty())
            .ok_or_else(|| DatabaseError::InvalidUrl("SUPABASE_URL is not set".to_owned()))?;
        Ok(format!("{base}{path}"))
    }

    pub(crate) fn anon_key(&self) -> &str {
        self.anon_key.as_deref().unwrap_or_default()
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }
}

/// [`DatabaseClient`] backed by a Supabase project.
#[derive(Debug, Clone)]
pub struct SupabaseClient {
    endpoint: Endpoint,
}

impl SupabaseClient {
    pub fn new(config: &SupabaseConfig) -> Result<Self, DatabaseError> {
        Ok(Self {
            endpoint: Endpoint::new(config)?,
        })
    }
}

/// Extracts the PostgREST error message, falling back to the status code.
fn extract_error_message(status: StatusCode, body: &[u8]) -> String {
    serde_json::from_slice::<PostgrestError>(body)
        .ok()
        .and_then(|err| err.message)
        .unwrap_or_else(|| format!("request failed with status {}", status.as_u16()))
}

#[async_trait]
impl DatabaseClient for SupabaseClient {
    async fn query(
        &self,
        table: &str,
        projection: &str,
        limit: u32,
    ) -> Result<Vec<serde_json::Value>, DatabaseError> {
        let url = self.endpoint.url(&format!("{REST_PATH}/{table}"))?;
        let key = self.endpoint.anon_key();
        let limit = limit.to_string();
        debug!("SupabaseClient: GET {url} select={projection} limit={limit}");

        let response = self
            .endpoint
            .http()
            .get(&url)
            .header("apikey", key)
            .bearer_auth(key)
            .query(&[("select", projection), ("limit", limit.as_str())])
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            let message = extract_error_message(status, &body);
            info!(
                "SupabaseClient: query on '{table}' rejected with status {}: {message}",
                status.as_u16()
            );
            return Err(DatabaseError::query(status.as_u16(), message));
        }

        serde_json::from_slice::<Vec<serde_json::Value>>(&body)
            .map_err(|e| DatabaseError::Decode(e.to_string()))
    }

    async fn health_check(&self) -> Result<HealthReport, DatabaseError> {
        let url = self.endpoint.url(&format!("{AUTH_PATH}/health"))?;
        debug!("SupabaseClient: GET {url}");

        let response = self
            .endpoint
            .http()
            .get(&url)
            .header("apikey", self.endpoint.anon_key())
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(HealthReport::healthy("Database connection healthy"))
        } else {
            Ok(HealthReport::unhealthy(format!(
                "Health check failed with status {}",
                status.as_u16()
            )))
        }
    }
}
