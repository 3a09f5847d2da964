//! Backend connectivity reporting.
//!
//! [`ConnectivityReporter`] owns the current [`ConnectionState`] and publishes it
//! through a `watch` channel, so any number of consumers can gate features on
//! backend availability. Verification runs once when the reporter is mounted and
//! again whenever a consumer asks for it; there is no retry or backoff.
//!
//! ## Verification sequence
//!
//! 1. Configuration check. Missing or template values stop here, without any
//!    network traffic.
//! 2. Reachability probe: `select count from <probe table> limit 1`.
//! 3. Health check.
//!
//! Each step only starts after the previous one resolved. Every failure mode is
//! folded into the state as a tagged [`ConnectionError`]; verification itself
//! never fails.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::{ConfigIssue, SupabaseConfig};
use crate::database::DatabaseClient;

pub const DATABASE_TYPE: &str = "supabase";

pub const PROBE_PROJECTION: &str = "count";
pub const PROBE_LIMIT: u32 = 1;

pub const NOT_CONFIGURED_MESSAGE: &str =
    "Supabase not configured. Please update your .env file with actual Supabase credentials.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionErrorKind {
    /// Credentials are missing or still hold template values.
    Misconfigured,
    /// The backend was reached but rejected the probe query.
    QueryFailed,
    /// The probe succeeded but the health check did not report healthy.
    Unhealthy,
    /// Transport, timeout, decoding or a panic inside the check.
    Unexpected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionError {
    kind: ConnectionErrorKind,
    detail: String,
}

impl ConnectionError {
    pub fn misconfigured(issue: ConfigIssue) -> Self {
        Self {
            kind: ConnectionErrorKind::Misconfigured,
            detail: issue.to_string(),
        }
    }

    pub fn query_failed(detail: impl Into<String>) -> Self {
        Self {
            kind: ConnectionErrorKind::QueryFailed,
            detail: detail.into(),
        }
    }

    pub fn unhealthy(detail: impl Into<String>) -> Self {
        Self {
            kind: ConnectionErrorKind::Unhealthy,
            detail: detail.into(),
        }
    }

    pub fn unexpected(detail: impl Into<String>) -> Self {
        Self {
            kind: ConnectionErrorKind::Unexpected,
            detail: detail.into(),
        }
    }

    pub fn kind(&self) -> ConnectionErrorKind {
        self.kind
    }

    /// The raw failure detail, without the user-facing prefix.
    pub fn detail(&self) -> &str {
        &self.detail
    }

    /// The user-facing message.
    pub fn message(&self) -> String {
        self.to_string()
    }
}

impl std::fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            ConnectionErrorKind::Misconfigured => write!(f, "{NOT_CONFIGURED_MESSAGE}"),
            ConnectionErrorKind::QueryFailed => {
                write!(f, "Database connection failed: {}", self.detail)
            }
            ConnectionErrorKind::Unhealthy => write!(f, "{}", self.detail),
            ConnectionErrorKind::Unexpected => {
                write!(f, "Supabase connection failed: {}", self.detail)
            }
        }
    }
}

impl std::error::Error for ConnectionError {}

/// Reachability of the backend as last observed.
///
/// Once a check has completed, exactly one of `is_connected()` and
/// `connection_error().is_some()` holds. Both are false only before the first
/// check finishes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionState {
    is_connected: bool,
    connection_error: Option<ConnectionError>,
    checked_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability<'a> {
    Available(DateTime<Utc>),
    Unavailable((DateTime<Utc>, &'a ConnectionError)),
    Unknown,
}

impl ConnectionState {
    pub fn connected(at: DateTime<Utc>) -> Self {
        Self {
            is_connected: true,
            connection_error: None,
            checked_at: Some(at),
        }
    }

    pub fn failed(error: ConnectionError, at: DateTime<Utc>) -> Self {
        Self {
            is_connected: false,
            connection_error: Some(error),
            checked_at: Some(at),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.is_connected
    }

    pub fn connection_error(&self) -> Option<&ConnectionError> {
        self.connection_error.as_ref()
    }

    pub fn checked_at(&self) -> Option<DateTime<Utc>> {
        self.checked_at
    }

    /// True until the first check completes.
    pub fn is_checking(&self) -> bool {
        !self.is_connected && self.connection_error.is_none()
    }

    pub fn availability(&self) -> Availability<'_> {
        match (self.checked_at, &self.connection_error) {
            (Some(time), None) if self.is_connected => Availability::Available(time),
            (Some(time), Some(err)) => Availability::Unavailable((time, err)),
            _ => Availability::Unknown,
        }
    }
}

/// Runs the three verification steps. Never fails; every outcome is a state.
pub async fn check_connection(
    config: SupabaseConfig,
    client: Arc<dyn DatabaseClient>,
) -> ConnectionState {
    if let Err(issue) = config.check() {
        warn!("Supabase not configured: {issue}");
        return ConnectionState::failed(ConnectionError::misconfigured(issue), Utc::now());
    }

    let table = config.probe_table();
    match client.query(table, PROBE_PROJECTION, PROBE_LIMIT).await {
        Ok(_) => debug!("Reachability probe on '{table}' succeeded"),
        Err(err) if err.is_query() => {
            warn!("Reachability probe on '{table}' failed: {err}");
            return ConnectionState::failed(
                ConnectionError::query_failed(err.to_string()),
                Utc::now(),
            );
        }
        Err(err) => {
            error!("Supabase connection error: {err}");
            return ConnectionState::failed(ConnectionError::unexpected(err.to_string()), Utc::now());
        }
    }

    match client.health_check().await {
        Ok(report) if report.is_healthy() => {
            info!("Database connection established");
            ConnectionState::connected(Utc::now())
        }
        Ok(report) => {
            warn!("Health check reported unhealthy: {}", report.message);
            ConnectionState::failed(ConnectionError::unhealthy(report.message), Utc::now())
        }
        Err(err) => {
            error!("Supabase connection error: {err}");
            ConnectionState::failed(ConnectionError::unexpected(err.to_string()), Utc::now())
        }
    }
}

#[derive(Debug)]
pub struct ConnectivityReporter {
    config: SupabaseConfig,
    client: Arc<dyn DatabaseClient>,
    state: watch::Sender<ConnectionState>,
    // Bumped at the start of every verification.
    generation: AtomicU64,
    // Generation of the last published result. Only read or written while the
    // watch lock is held.
    published: AtomicU64,
}

impl ConnectivityReporter {
    pub fn new(config: SupabaseConfig, client: Arc<dyn DatabaseClient>) -> Self {
        let (state, _) = watch::channel(ConnectionState::default());
        Self {
            config,
            client,
            state,
            generation: AtomicU64::new(0),
            published: AtomicU64::new(0),
        }
    }

    pub fn database_type(&self) -> &'static str {
        DATABASE_TYPE
    }

    pub fn config(&self) -> &SupabaseConfig {
        &self.config
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> ConnectionState {
        self.state.borrow().clone()
    }

    /// A receiver that observes every published state.
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    /// Runs verification to completion and returns the resulting state.
    ///
    /// If a newer verification already published by the time this one
    /// finished, the newer result is returned instead.
    pub async fn verify(&self) -> ConnectionState {
        match self.verify_with(&CancellationToken::new()).await {
            Some(state) => state,
            None => self.state(),
        }
    }

    /// Runs verification and publishes the result, unless `cancel` fired or a
    /// newer verification already published. In both cases the result is
    /// discarded and `None` is returned.
    ///
    /// A newer verification that is cancelled, or still running, does not
    /// supersede this one.
    pub async fn verify_with(&self, cancel: &CancellationToken) -> Option<ConnectionState> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        // Spawned so that a panicking client surfaces as a JoinError.
        let mut task = tokio::spawn(check_connection(
            self.config.clone(),
            Arc::clone(&self.client),
        ));

        let joined = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                task.abort();
                debug!("Connectivity check cancelled, result discarded");
                return None;
            }
            joined = &mut task => joined,
        };

        let state = joined.unwrap_or_else(|err| {
            error!("Supabase connection error: {err}");
            ConnectionState::failed(ConnectionError::unexpected(err.to_string()), Utc::now())
        });

        if cancel.is_cancelled() {
            debug!("Connectivity check cancelled, result discarded");
            return None;
        }

        let published = self.state.send_if_modified(|current| {
            if self.published.load(Ordering::SeqCst) > generation {
                return false;
            }
            self.published.store(generation, Ordering::SeqCst);
            *current = state.clone();
            true
        });

        if published {
            Some(state)
        } else {
            debug!("Connectivity check superseded by a newer one, result discarded");
            None
        }
    }

    /// Mounts the reporter: runs the initial verification in the background.
    pub fn spawn_verification(
        self: &Arc<Self>,
        cancel: CancellationToken,
    ) -> JoinHandle<Option<ConnectionState>> {
        let reporter = Arc::clone(self);
        tokio::spawn(async move { reporter.verify_with(&cancel).await })
    }
}
