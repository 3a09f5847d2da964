use clap::{Parser, Subcommand};
use clap_complete::Shell;

#[derive(Parser)]
#[command(name = "mdrrmo-admin")]
#[command(about = "Admin tooling for the MDRRMO Pio Duran website", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Show timing/latency information
    #[arg(long, global = true)]
    pub timing: bool,

    /// Enable verbose debug output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check that the Supabase backend is configured and reachable
    Status,
    /// Sign in to the admin area
    Login {
        /// Email to sign in with (prompted when absent)
        #[arg(long, short = 'e', env = "MDRRMO_ADMIN_EMAIL")]
        email: Option<String>,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}
