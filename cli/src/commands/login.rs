//! Login command implementation.

use std::sync::Arc;

use anyhow::{Context as _, Result};
use inquire::{Password, PasswordDisplayMode, Text};
use mdrrmo_business::{
    AuthService as _, DEFAULT_REJECTION_MESSAGE, LoginForm, LoginView, NOT_CONFIGURED_MESSAGE,
    Navigator, Route, SubmitOutcome, SupabaseAuth, SupabaseConfig,
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument};

use crate::commands::status::EXIT_CANCELLED;
use crate::output::Output;

/// Prints the page the user lands on.
#[derive(Debug)]
pub struct TerminalNavigator {
    out: Output,
}

impl TerminalNavigator {
    pub fn new(out: Output) -> Self {
        Self { out }
    }
}

impl Navigator for TerminalNavigator {
    fn navigate(&self, route: Route) {
        info!(path = route.path(), "Navigating");
        self.out.route(route.path());
    }
}

#[instrument(skip_all, name = "login")]
pub async fn run_login(
    config: &SupabaseConfig,
    email: Option<String>,
    cancel: &CancellationToken,
) -> Result<u8> {
    let out = Output::new();

    out.header("Sign in to MDRRMO admin");
    out.newline();

    if let Err(issue) = config.check() {
        error!("Cannot sign in: {issue}");
        out.error(NOT_CONFIGURED_MESSAGE);
        out.labeled_indent("Reason", issue, 2);
        return Ok(1);
    }

    let auth = Arc::new(SupabaseAuth::new(config).context("Failed to build auth client")?);
    let form = LoginForm::new(auth.clone(), Arc::new(TerminalNavigator::new(out.clone())));

    if form.view() == LoginView::Redirecting {
        out.success("Already signed in");
        return Ok(0);
    }

    let email = match email {
        Some(email) => email,
        None => Text::new("Email:")
            .with_help_message("The email of your admin account")
            .prompt()
            .context("Failed to read email")?,
    };
    let password = Password::new("Password:")
        .without_confirmation()
        .with_display_mode(PasswordDisplayMode::Masked)
        .with_display_toggle_enabled()
        .prompt()
        .context("Failed to read password")?;

    form.set_email(email);
    form.set_password(password);

    let outcome = form.submit(cancel).await;
    let code = match outcome {
        SubmitOutcome::Authenticated => {
            let status = auth.status();
            let who = status.email().unwrap_or_default();
            info!("Signed in as {who}");
            out.success(format!("Signed in as {who}"));
            if let Some(expires_in) = auth.session().and_then(|s| s.expires_in) {
                out.labeled_indent("Session expires in", format!("{expires_in}s"), 2);
            }
            0
        }
        SubmitOutcome::Rejected => {
            let message = auth
                .error()
                .unwrap_or_else(|| DEFAULT_REJECTION_MESSAGE.to_owned());
            out.error(format!("Login failed: {message}"));
            1
        }
        SubmitOutcome::Failed(message) => {
            out.error(format!("Login failed: {message}"));
            1
        }
        SubmitOutcome::Invalid(field) => {
            out.error(field);
            1
        }
        SubmitOutcome::Ignored => {
            out.warning("A sign-in is already in progress");
            1
        }
        SubmitOutcome::Cancelled => {
            out.warning("Sign-in cancelled");
            EXIT_CANCELLED
        }
    };

    form.reset();
    Ok(code)
}
