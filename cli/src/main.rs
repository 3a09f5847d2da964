mod cli;
mod commands;
mod output;
mod timing;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use clap::Parser as _;
use mdrrmo_business::{ConnectivityReporter, DatabaseClient, SupabaseClient, SupabaseConfig};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::cli::{Cli, Commands};
use crate::commands::{generate_completions, run_login, run_status};

/// Token cancelled on the first Ctrl-C.
fn cancel_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                debug!("Ctrl-C received, cancelling");
                trigger.cancel();
            }
            Err(err) => warn!("Failed to listen for Ctrl-C: {err}"),
        }
    });
    cancel
}

fn load_config() -> Result<SupabaseConfig> {
    SupabaseConfig::from_env().context("Failed to read Supabase configuration")
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Before tracing, so RUST_LOG may come from .env too.
    let dotenv = dotenvy::dotenv();
    timing::init_tracing(cli.verbose, cli.timing);
    match dotenv {
        Ok(path) => debug!("Loaded environment from {}", path.display()),
        Err(err) => debug!("No .env file loaded: {err}"),
    }

    let code = match cli.command {
        Commands::Status => {
            let config = load_config()?;
            let client: Arc<dyn DatabaseClient> = Arc::new(
                SupabaseClient::new(&config).context("Failed to build Supabase client")?,
            );
            let reporter = Arc::new(ConnectivityReporter::new(config, client));
            run_status(&reporter, cancel_on_ctrl_c()).await?
        }
        Commands::Login { email } => {
            let config = load_config()?;
            run_login(&config, email, &cancel_on_ctrl_c()).await?
        }
        Commands::Completions { shell } => {
            generate_completions(shell);
            0
        }
    };

    Ok(ExitCode::from(code))
}
