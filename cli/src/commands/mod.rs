//! Command implementations for the admin CLI.

pub mod completions;
pub mod login;
pub mod status;

pub use completions::generate_completions;
pub use login::run_login;
pub use status::run_status;
