//! Login form state and submission flow for the admin sign-in page.
//!
//! This module tracks:
//! - Email and password input
//! - Password visibility
//! - Whether a submission is in flight
//!
//! Authentication itself is delegated to an [`AuthService`]. The form never
//! originates an error message; it shows whatever the auth service reports.
//! After a successful sign-in, or when the page is opened with a session
//! already present, the user is sent to [`Route::Admin`] exactly once.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{debug, error, info};
use tokio_util::sync::CancellationToken;

use crate::auth::AuthService;
use crate::route::{Navigator, Route};

pub const SUBMIT_LABEL: &str = "Sign In";
pub const SUBMITTING_LABEL: &str = "Signing In...";

const PASSWORD_MASK: char = '•';

/// Input state for the login form.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct LoginFormState {
    pub email: String,
    pub password: String,
    pub show_password: bool,
    pub is_submitting: bool,
}

/// Field-level validation failure, raised before the auth service is called.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldError {
    EmailRequired,
    EmailInvalid,
    PasswordRequired,
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmailRequired => write!(f, "Email is required"),
            Self::EmailInvalid => write!(f, "Enter a valid email address"),
            Self::PasswordRequired => write!(f, "Password is required"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Controls were disabled; nothing happened.
    Ignored,
    Invalid(FieldError),
    Authenticated,
    /// The auth service answered `false`. Its `error()` holds the reason.
    Rejected,
    Failed(String),
    /// The caller went away before the auth service answered.
    Cancelled,
}

/// What the page should render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginView {
    /// A session exists; the form is never shown.
    Redirecting,
    Form(LoginFormView),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginFormView {
    pub email: String,
    /// The password as it should be displayed: masked unless visible.
    pub password: String,
    pub show_password: bool,
    pub controls_disabled: bool,
    pub submit_label: &'static str,
    pub auth_error: Option<String>,
}

#[derive(Debug, Default)]
struct FormInner {
    form: LoginFormState,
    redirected: bool,
}

/// Controller behind the admin login page.
#[derive(Debug)]
pub struct LoginForm {
    auth: Arc<dyn AuthService>,
    navigator: Arc<dyn Navigator>,
    inner: Mutex<FormInner>,
}

impl LoginForm {
    pub fn new(auth: Arc<dyn AuthService>, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            auth,
            navigator,
            inner: Mutex::new(FormInner::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, FormInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> LoginFormState {
        self.lock().form.clone()
    }

    pub fn set_email(&self, email: impl Into<String>) {
        self.lock().form.email = email.into();
    }

    pub fn set_password(&self, password: impl Into<String>) {
        self.lock().form.password = password.into();
    }

    pub fn toggle_password_visibility(&self) {
        let mut inner = self.lock();
        inner.form.show_password = !inner.form.show_password;
    }

    pub fn controls_disabled(&self) -> bool {
        self.lock().form.is_submitting || self.auth.is_loading()
    }

    /// Redirects to the admin page when the auth service reports a session.
    ///
    /// Returns `true` only for the call that actually navigated. Losing the
    /// session re-arms the redirect for the next sign-in.
    pub fn sync_auth(&self) -> bool {
        if self.auth.is_authenticated() {
            self.redirect_once()
        } else {
            self.lock().redirected = false;
            false
        }
    }

    pub fn view(&self) -> LoginView {
        self.sync_auth();
        if self.auth.is_authenticated() {
            return LoginView::Redirecting;
        }

        let loading = self.auth.is_loading();
        let auth_error = self.auth.error();
        let inner = self.lock();
        let form = &inner.form;
        let password = if form.show_password {
            form.password.clone()
        } else {
            PASSWORD_MASK.to_string().repeat(form.password.chars().count())
        };
        let controls_disabled = form.is_submitting || loading;

        LoginView::Form(LoginFormView {
            email: form.email.clone(),
            password,
            show_password: form.show_password,
            controls_disabled,
            submit_label: if form.is_submitting {
                SUBMITTING_LABEL
            } else {
                SUBMIT_LABEL
            },
            auth_error,
        })
    }

    /// Submits the current credentials.
    ///
    /// When `cancel` fires before the auth service answers, the result is
    /// dropped and the form is left as is.
    pub async fn submit(&self, cancel: &CancellationToken) -> SubmitOutcome {
        let (email, password) = {
            let mut inner = self.lock();
            if inner.form.is_submitting || self.auth.is_loading() {
                debug!("LoginForm: submission ignored while controls are disabled");
                return SubmitOutcome::Ignored;
            }
            if let Err(field) = validate(&inner.form) {
                info!("LoginForm: {field}");
                return SubmitOutcome::Invalid(field);
            }
            inner.form.is_submitting = true;
            (inner.form.email.trim().to_owned(), inner.form.password.clone())
        };

        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => None,
            result = self.auth.login(&email, &password) => Some(result),
        };
        let Some(result) = result.filter(|_| !cancel.is_cancelled()) else {
            debug!("LoginForm: submission cancelled, result dropped");
            return SubmitOutcome::Cancelled;
        };

        self.lock().form.is_submitting = false;

        match result {
            Ok(true) => {
                info!("LoginForm: signed in, redirecting to {}", Route::Admin);
                self.redirect_once();
                SubmitOutcome::Authenticated
            }
            Ok(false) => {
                info!("LoginForm: sign-in rejected");
                SubmitOutcome::Rejected
            }
            Err(err) => {
                error!("Login submission error: {err}");
                SubmitOutcome::Failed(err.to_string())
            }
        }
    }

    /// Clears the form, as when the page is left.
    pub fn reset(&self) {
        *self.lock() = FormInner::default();
    }

    fn redirect_once(&self) -> bool {
        let first = {
            let mut inner = self.lock();
            !std::mem::replace(&mut inner.redirected, true)
        };
        if first {
            self.navigator.navigate(Route::Admin);
        }
        first
    }
}

fn validate(form: &LoginFormState) -> Result<(), FieldError> {
    let email = form.email.trim();
    if email.is_empty() {
        return Err(FieldError::EmailRequired);
    }
    if !is_email_shaped(email) {
        return Err(FieldError::EmailInvalid);
    }
    if form.password.is_empty() {
        return Err(FieldError::PasswordRequired);
    }
    Ok(())
}

// `local@domain`, both parts non-empty, no whitespace.
fn is_email_shaped(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    }
}
