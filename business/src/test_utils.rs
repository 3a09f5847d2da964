//! Test utilities for the business layer.
//!
//! Two kinds of doubles live here:
//! - [`TestContext`]: a wiremock server standing in for a Supabase project,
//!   with helpers to mount the PostgREST and GoTrue responses we rely on.
//! - [`ScriptedDatabase`] and [`FakeAuth`]: in-process doubles for the
//!   reporter and login form tests, which count calls and can delay answers.
//!
//! # Example
//!
//! ```ignore
//! let test_ctx = TestContext::new().await;
//! test_ctx.mock_probe_ok().await;
//! test_ctx.mock_health(200).await;
//!
//! let reporter = ConnectivityReporter::new(test_ctx.config(), Arc::new(test_ctx.client()));
//! assert!(reporter.verify().await.is_connected());
//! ```

#![cfg(all(test, not(target_arch = "wasm32")))]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path, query_param},
};

use crate::auth::{AuthError, AuthService, SupabaseAuth};
use crate::config::SupabaseConfig;
use crate::database::{DatabaseClient, DatabaseError, HealthReport};
use crate::supabase::SupabaseClient;

pub const TEST_ANON_KEY: &str = "eyJhbGciOiJIUzI1NiJ9.test-anon-key";

/// Test context that holds a mock server and a config pointing at it.
pub struct TestContext {
    pub mock_server: MockServer,
}

impl TestContext {
    pub async fn new() -> Self {
        Self {
            mock_server: MockServer::start().await,
        }
    }

    pub fn config(&self) -> SupabaseConfig {
        SupabaseConfig::new(self.mock_server.uri(), TEST_ANON_KEY)
            .with_timeout(Duration::from_secs(2))
    }

    pub fn client(&self) -> SupabaseClient {
        SupabaseClient::new(&self.config()).expect("client should build")
    }

    pub fn auth(&self) -> SupabaseAuth {
        SupabaseAuth::new(&self.config()).expect("auth should build")
    }

    pub async fn mock_probe_ok(&self) {
        Mock::given(method("GET"))
            .and(path("/rest/v1/news"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!([{ "count": 3 }])),
            )
            .mount(&self.mock_server)
            .await;
    }

    pub async fn mock_probe_error(&self, status: u16, message: &str) {
        Mock::given(method("GET"))
            .and(path("/rest/v1/news"))
            .respond_with(ResponseTemplate::new(status).set_body_json(serde_json::json!({
                "code": "42P01",
                "details": null,
                "hint": null,
                "message": message,
            })))
            .mount(&self.mock_server)
            .await;
    }

    pub async fn mock_health(&self, status: u16) {
        Mock::given(method("GET"))
            .and(path("/auth/v1/health"))
            .respond_with(ResponseTemplate::new(status).set_body_json(serde_json::json!({
                "version": "v2.150.0",
                "name": "GoTrue",
                "description": "GoTrue is a user registration and authentication API",
            })))
            .mount(&self.mock_server)
            .await;
    }

    pub async fn mock_password_grant_ok(&self) {
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .and(query_param("grant_type", "password"))
            .respond_with(ResponseTemplate::new(200).set_body_json(sample_token_response()))
            .mount(&self.mock_server)
            .await;
    }

    pub async fn mock_password_grant_rejected(&self, description: &str) {
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": "invalid_grant",
                "error_description": description,
            })))
            .mount(&self.mock_server)
            .await;
    }
}

pub fn sample_token_response() -> serde_json::Value {
    serde_json::json!({
        "access_token": "access-token-123",
        "token_type": "bearer",
        "expires_in": 3600,
        "refresh_token": "refresh-token-456",
        "user": {
            "id": "8d0fd2b3-9ca4-4b38-a1a6-0f5a0b1d9e11",
            "email": "admin@mdrrmo.gov.ph",
        },
    })
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Clone, Default)]
pub enum ProbeScript {
    #[default]
    Rows,
    QueryError(String),
    Transport(String),
    Panic,
}

#[derive(Debug, Clone, Default)]
pub enum HealthScript {
    #[default]
    Healthy,
    Unhealthy(String),
}

/// [`DatabaseClient`] that answers from a script and counts calls.
///
/// Queued probes (see [`Self::push_probe`]) are consumed first, one per
/// query; afterwards the default probe script applies.
#[derive(Debug, Default)]
pub struct ScriptedDatabase {
    probe: Mutex<ProbeScript>,
    queued: Mutex<VecDeque<(Duration, ProbeScript)>>,
    health: Mutex<HealthScript>,
    queries: AtomicUsize,
    health_checks: AtomicUsize,
    last_query: Mutex<Option<String>>,
}

impl ScriptedDatabase {
    pub fn set_probe(&self, script: ProbeScript) {
        *lock(&self.probe) = script;
    }

    pub fn push_probe(&self, delay: Duration, script: ProbeScript) {
        lock(&self.queued).push_back((delay, script));
    }

    pub fn set_unhealthy(&self, message: &str) {
        *lock(&self.health) = HealthScript::Unhealthy(message.to_owned());
    }

    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    pub fn health_check_count(&self) -> usize {
        self.health_checks.load(Ordering::SeqCst)
    }

    /// `table:projection:limit` of the last query.
    pub fn last_query(&self) -> Option<String> {
        lock(&self.last_query).clone()
    }
}

#[async_trait]
impl DatabaseClient for ScriptedDatabase {
    async fn query(
        &self,
        table: &str,
        projection: &str,
        limit: u32,
    ) -> Result<Vec<serde_json::Value>, DatabaseError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        *lock(&self.last_query) = Some(format!("{table}:{projection}:{limit}"));

        let queued = lock(&self.queued).pop_front();
        let script = match queued {
            Some((delay, script)) => {
                tokio::time::sleep(delay).await;
                script
            }
            None => lock(&self.probe).clone(),
        };

        match script {
            ProbeScript::Rows => Ok(vec![serde_json::json!({ "count": 1 })]),
            ProbeScript::QueryError(message) => Err(DatabaseError::query(400, message)),
            ProbeScript::Transport(message) => Err(DatabaseError::Decode(message)),
            ProbeScript::Panic => panic!("scripted probe panic"),
        }
    }

    async fn health_check(&self) -> Result<HealthReport, DatabaseError> {
        self.health_checks.fetch_add(1, Ordering::SeqCst);
        let script = lock(&self.health).clone();
        Ok(match script {
            HealthScript::Healthy => HealthReport::healthy("Database connection healthy"),
            HealthScript::Unhealthy(message) => HealthReport::unhealthy(message),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub enum LoginScript {
    #[default]
    Accept,
    Reject(String),
    Fail(String),
}

/// [`AuthService`] that answers from a script.
///
/// Accepting a login also flips `is_authenticated`, as a real auth context
/// would, so double-redirect bugs show up in tests.
#[derive(Debug, Default)]
pub struct FakeAuth {
    script: Mutex<LoginScript>,
    delay: Mutex<Option<Duration>>,
    loading: AtomicBool,
    authenticated: AtomicBool,
    error: Mutex<Option<String>>,
    calls: AtomicUsize,
    last_credentials: Mutex<Option<(String, String)>>,
}

impl FakeAuth {
    pub fn with_script(script: LoginScript) -> Self {
        let fake = Self::default();
        *lock(&fake.script) = script;
        fake
    }

    pub fn authenticated() -> Self {
        let fake = Self::default();
        fake.authenticated.store(true, Ordering::SeqCst);
        fake
    }

    pub fn set_delay(&self, delay: Duration) {
        *lock(&self.delay) = Some(delay);
    }

    pub fn set_loading(&self, loading: bool) {
        self.loading.store(loading, Ordering::SeqCst);
    }

    pub fn set_authenticated(&self, authenticated: bool) {
        self.authenticated.store(authenticated, Ordering::SeqCst);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_credentials(&self) -> Option<(String, String)> {
        lock(&self.last_credentials).clone()
    }
}

#[async_trait]
impl AuthService for FakeAuth {
    async fn login(&self, email: &str, password: &str) -> Result<bool, AuthError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *lock(&self.last_credentials) = Some((email.to_owned(), password.to_owned()));

        let delay = *lock(&self.delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let script = lock(&self.script).clone();
        match script {
            LoginScript::Accept => {
                self.authenticated.store(true, Ordering::SeqCst);
                *lock(&self.error) = None;
                Ok(true)
            }
            LoginScript::Reject(message) => {
                *lock(&self.error) = Some(message);
                Ok(false)
            }
            LoginScript::Fail(message) => {
                *lock(&self.error) = Some(message.clone());
                Err(AuthError::Decode(message))
            }
        }
    }

    fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    fn error(&self) -> Option<String> {
        lock(&self.error).clone()
    }

    fn is_authenticated(&self) -> bool {
        self.authenticated.load(Ordering::SeqCst)
    }

    async fn logout(&self) {
        self.authenticated.store(false, Ordering::SeqCst);
    }
}
