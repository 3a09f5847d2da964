//! Authentication state held by the auth adapter.
//!
//! This module provides the session returned by a password sign-in and the
//! status machine the login form reads through [`crate::AuthService`].

use serde::{Deserialize, Serialize};

/// Tokens issued by the auth service on sign-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: Option<String>,
    /// Lifetime of the access token in seconds.
    pub expires_in: Option<u64>,
    pub token_type: Option<String>,
}

/// Result/status of authentication.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AuthStatus {
    /// Not authenticated yet.
    #[default]
    NotAuthenticated,
    /// Authentication in progress.
    Authenticating,
    /// Successfully authenticated.
    Authenticated {
        /// The email the user signed in with.
        email: String,
        session: Session,
    },
    /// Authentication failed with an error.
    Failed(String),
}

impl AuthStatus {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Authenticating)
    }

    /// Get the email if authenticated.
    pub fn email(&self) -> Option<&str> {
        match self {
            Self::Authenticated { email, .. } => Some(email.as_str()),
            _ => None,
        }
    }

    /// Get the access token if authenticated.
    pub fn token(&self) -> Option<&str> {
        match self {
            Self::Authenticated { session, .. } => Some(session.access_token.as_str()),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed(message) => Some(message.as_str()),
            _ => None,
        }
    }
}

/// Represents the current authentication state of the user.
#[derive(Debug, Clone, Default)]
pub struct AuthState {
    pub status: AuthStatus,
}

impl AuthState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_logged_in(&self) -> bool {
        self.status.is_authenticated()
    }

    pub fn is_logging_in(&self) -> bool {
        self.status.is_loading()
    }

    /// Sets the state to logging in, clearing any previous error.
    pub fn start_login(&mut self) {
        self.status = AuthStatus::Authenticating;
    }

    pub fn login_success(&mut self, email: String, session: Session) {
        self.status = AuthStatus::Authenticated { email, session };
    }

    pub fn login_failed(&mut self, error: String) {
        self.status = AuthStatus::Failed(error);
    }

    pub fn logout(&mut self) {
        self.status = AuthStatus::NotAuthenticated;
    }
}
