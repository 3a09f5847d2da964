//! Password sign-in against the Supabase auth service (GoTrue).
//!
//! The login form never talks to the network itself. It calls an
//! [`AuthService`], which owns the authentication status and the last error
//! message; the form only displays them.
//!
//! ## Flow
//!
//! 1. Sets status to `Authenticating`
//! 2. POSTs `{email, password}` to `/auth/v1/token?grant_type=password`
//! 3. On 2xx, stores the session and sets status to `Authenticated`
//! 4. On 400/401, sets status to `Failed` with the server's description
//! 5. On any other status or a network error, sets status to `Failed`

use std::fmt::Debug;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use log::{debug, error, info, warn};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::auth_state::{AuthState, AuthStatus, Session};
use crate::config::SupabaseConfig;
use crate::database::DatabaseError;
use crate::supabase::{AUTH_PATH, Endpoint};

pub const DEFAULT_REJECTION_MESSAGE: &str = "Invalid login credentials";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Failed to parse server response: {0}")]
    Decode(String),
    #[error(transparent)]
    Endpoint(#[from] DatabaseError),
}

/// The authentication capability the login form delegates to.
#[async_trait]
pub trait AuthService: Send + Sync + Debug {
    /// Attempts a sign-in. `Ok(false)` means the credentials were rejected;
    /// the reason is available from [`Self::error`].
    async fn login(&self, email: &str, password: &str) -> Result<bool, AuthError>;

    /// True while a sign-in is in flight.
    fn is_loading(&self) -> bool;

    /// Message of the last failed sign-in, if the current status is a failure.
    fn error(&self) -> Option<String>;

    fn is_authenticated(&self) -> bool;

    async fn logout(&self);
}

/// Request payload for the password grant.
#[derive(Debug, Clone, Serialize)]
pub struct PasswordGrantRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Successful response of the password grant.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<u64>,
    pub token_type: Option<String>,
    pub user: Option<AuthUser>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub email: Option<String>,
}

impl From<TokenResponse> for Session {
    fn from(token: TokenResponse) -> Self {
        Self {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            expires_in: token.expires_in,
            token_type: token.token_type,
        }
    }
}

/// Error body returned by GoTrue. Older versions use `error_description`,
/// newer ones `msg` or `message`.
#[derive(Debug, Clone, Deserialize)]
pub struct GoTrueError {
    pub error: Option<String>,
    pub error_description: Option<String>,
    pub msg: Option<String>,
    pub message: Option<String>,
}

/// Extracts an error message from a response, falling back to a default message.
fn extract_error_message(body: &[u8], default: &str) -> String {
    serde_json::from_slice::<GoTrueError>(body)
        .ok()
        .and_then(|err| err.error_description.or(err.msg).or(err.message))
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| default.to_owned())
}

/// [`AuthService`] backed by the project's GoTrue endpoint.
#[derive(Debug)]
pub struct SupabaseAuth {
    endpoint: Endpoint,
    state: Mutex<AuthState>,
}

impl SupabaseAuth {
    pub fn new(config: &SupabaseConfig) -> Result<Self, AuthError> {
        Ok(Self {
            endpoint: Endpoint::new(config)?,
            state: Mutex::new(AuthState::new()),
        })
    }

    pub fn status(&self) -> AuthStatus {
        self.lock().status.clone()
    }

    pub fn session(&self) -> Option<Session> {
        match &self.lock().status {
            AuthStatus::Authenticated { session, .. } => Some(session.clone()),
            _ => None,
        }
    }

    fn lock(&self) -> MutexGuard<'_, AuthState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn fail(&self, message: String) {
        self.lock().login_failed(message);
    }
}

/// Held for the duration of a sign-in. If the login future is dropped while
/// still `Authenticating`, the status falls back to `NotAuthenticated`.
struct PendingLogin<'a> {
    auth: &'a SupabaseAuth,
}

impl Drop for PendingLogin<'_> {
    fn drop(&mut self) {
        let mut state = self.auth.lock();
        if state.is_logging_in() {
            debug!("SupabaseAuth: sign-in abandoned before completion");
            state.logout();
        }
    }
}

#[async_trait]
impl AuthService for SupabaseAuth {
    async fn login(&self, email: &str, password: &str) -> Result<bool, AuthError> {
        let email = email.trim();
        info!("SupabaseAuth: signing in '{email}'");
        self.lock().start_login();
        let _pending = PendingLogin { auth: self };

        let url = match self.endpoint.url(&format!("{AUTH_PATH}/token")) {
            Ok(url) => url,
            Err(err) => {
                error!("SupabaseAuth: {err}");
                self.fail(err.to_string());
                return Err(err.into());
            }
        };

        let sent = self
            .endpoint
            .http()
            .post(&url)
            .query(&[("grant_type", "password")])
            .header("apikey", self.endpoint.anon_key())
            .json(&PasswordGrantRequest { email, password })
            .send()
            .await;
        let response = match sent {
            Ok(response) => response,
            Err(err) => {
                let message = format!("Network error: {err}");
                error!("SupabaseAuth: {message}");
                self.fail(message);
                return Err(AuthError::Network(err));
            }
        };

        let status = response.status();
        let body = match response.bytes().await {
            Ok(body) => body,
            Err(err) => {
                let message = format!("Network error: {err}");
                error!("SupabaseAuth: {message}");
                self.fail(message);
                return Err(AuthError::Network(err));
            }
        };

        if status.is_success() {
            match serde_json::from_slice::<TokenResponse>(&body) {
                Ok(token) => {
                    info!("SupabaseAuth: signed in '{email}'");
                    self.lock().login_success(email.to_owned(), token.into());
                    Ok(true)
                }
                Err(e) => {
                    error!("SupabaseAuth: Failed to parse token response: {e}");
                    self.fail("Failed to parse server response".to_owned());
                    Err(AuthError::Decode(e.to_string()))
                }
            }
        } else if status == StatusCode::BAD_REQUEST || status == StatusCode::UNAUTHORIZED {
            let message = extract_error_message(&body, DEFAULT_REJECTION_MESSAGE);
            info!("SupabaseAuth: sign-in rejected: {message}");
            self.fail(message);
            Ok(false)
        } else {
            let message = format!("Server error (status {})", status.as_u16());
            error!("SupabaseAuth: {message}");
            self.fail(message);
            Ok(false)
        }
    }

    fn is_loading(&self) -> bool {
        self.lock().is_logging_in()
    }

    fn error(&self) -> Option<String> {
        self.lock().status.error().map(str::to_owned)
    }

    fn is_authenticated(&self) -> bool {
        self.lock().is_logged_in()
    }

    async fn logout(&self) {
        let token = self.lock().status.token().map(str::to_owned);

        if let Some(token) = token {
            match self.endpoint.url(&format!("{AUTH_PATH}/logout")) {
                Ok(url) => {
                    let sent = self
                        .endpoint
                        .http()
                        .post(&url)
                        .header("apikey", self.endpoint.anon_key())
                        .bearer_auth(&token)
                        .send()
                        .await;
                    if let Err(err) = sent {
                        warn!("SupabaseAuth: logout request failed: {err}");
                    }
                }
                Err(err) => warn!("SupabaseAuth: {err}"),
            }
        }

        info!("SupabaseAuth: user logged out");
        self.lock().logout();
    }
}
