//! The database capability consumed by the connectivity reporter.

use std::fmt::Debug;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DatabaseError {
    /// The backend answered, but rejected the query.
    #[error("{message}")]
    Query { status: u16, message: String },
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected response body: {0}")]
    Decode(String),
    #[error("invalid backend url: {0}")]
    InvalidUrl(String),
}

impl DatabaseError {
    pub fn query(status: u16, message: impl Into<String>) -> Self {
        Self::Query {
            status,
            message: message.into(),
        }
    }

    pub fn is_query(&self) -> bool {
        matches!(self, Self::Query { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub message: String,
}

impl HealthReport {
    pub fn healthy(message: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Healthy,
            message: message.into(),
        }
    }

    pub fn unhealthy(message: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Unhealthy,
            message: message.into(),
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status == HealthStatus::Healthy
    }
}

/// Read access plus a readiness signal for the hosted backend.
///
/// Implementations must be cheap to share behind an `Arc`; the reporter calls
/// them from a spawned task.
#[async_trait]
pub trait DatabaseClient: Send + Sync + Debug {
    /// Selects `projection` from `table`, returning at most `limit` rows.
    async fn query(
        &self,
        table: &str,
        projection: &str,
        limit: u32,
    ) -> Result<Vec<serde_json::Value>, DatabaseError>;

    async fn health_check(&self) -> Result<HealthReport, DatabaseError>;
}
