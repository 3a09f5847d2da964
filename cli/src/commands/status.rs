//! Connectivity status command.

use std::sync::Arc;

use anyhow::{Context as _, Result};
use mdrrmo_business::{
    Availability, ConnectionErrorKind, ConnectionState, ConnectivityReporter, SupabaseConfig,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use crate::output::Output;

/// Exit code when the check was interrupted with Ctrl-C.
pub const EXIT_CANCELLED: u8 = 130;

#[instrument(skip_all, name = "status")]
pub async fn run_status(
    reporter: &Arc<ConnectivityReporter>,
    cancel: CancellationToken,
) -> Result<u8> {
    let out = Output::new();

    out.header(format!("Backend connectivity ({})", reporter.database_type()));
    print_config(&out, reporter.config());
    out.newline();

    let published = reporter
        .spawn_verification(cancel)
        .await
        .context("Connectivity check task failed")?;

    let Some(state) = published else {
        warn!("Connectivity check cancelled");
        out.warning("Check cancelled");
        return Ok(EXIT_CANCELLED);
    };

    print_state(&out, &state);
    info!(connected = state.is_connected(), "Connectivity check finished");
    Ok(exit_code_for(&state))
}

fn print_config(out: &Output, config: &SupabaseConfig) {
    out.labeled_indent("URL", config.url().unwrap_or("(unset)"), 2);
    out.labeled_indent(
        "Anon key",
        if config.anon_key().is_some() {
            "(set)"
        } else {
            "(unset)"
        },
        2,
    );
    out.labeled_indent("Probe table", config.probe_table(), 2);
    out.labeled_indent("Timeout", format!("{}s", config.timeout().as_secs()), 2);
}

fn print_state(out: &Output, state: &ConnectionState) {
    match state.availability() {
        Availability::Available(at) => {
            out.success("Database connection established");
            out.labeled_indent("Checked", at.format("%Y-%m-%d %H:%M:%S UTC"), 2);
        }
        Availability::Unavailable((at, err)) => {
            out.error(err);
            if err.kind() == ConnectionErrorKind::Misconfigured {
                out.labeled_indent("Reason", err.detail(), 2);
                out.info("Set SUPABASE_URL and SUPABASE_ANON_KEY in your .env file");
            }
            out.labeled_indent("Checked", at.format("%Y-%m-%d %H:%M:%S UTC"), 2);
        }
        Availability::Unknown => out.dim("No check has completed"),
    }
}

pub fn exit_code_for(state: &ConnectionState) -> u8 {
    u8::from(!state.is_connected())
}
