mod auth;
mod auth_state;
mod config;
mod connection;
mod database;
mod login_state;
mod route;
mod supabase;

#[cfg(test)]
mod test_utils;

pub use auth::{AuthError, AuthService, DEFAULT_REJECTION_MESSAGE, SupabaseAuth};
pub use auth_state::{AuthState, AuthStatus, Session};
pub use config::{
    ConfigError, ConfigIssue, DEFAULT_PROBE_TABLE, DEFAULT_TIMEOUT_SECS, PLACEHOLDER_MARKERS,
    SupabaseConfig,
};
pub use connection::{
    Availability, ConnectionError, ConnectionErrorKind, ConnectionState, ConnectivityReporter,
    DATABASE_TYPE, NOT_CONFIGURED_MESSAGE, PROBE_LIMIT, PROBE_PROJECTION, check_connection,
};
pub use database::{DatabaseClient, DatabaseError, HealthReport, HealthStatus};
pub use login_state::{
    FieldError, LoginForm, LoginFormState, LoginFormView, LoginView, SUBMIT_LABEL,
    SUBMITTING_LABEL, SubmitOutcome,
};
pub use route::{ADMIN_ROUTE, HistoryNavigator, LOGIN_ROUTE, Navigator, Route};
pub use supabase::{AUTH_PATH, PostgrestError, REST_PATH, SupabaseClient};
