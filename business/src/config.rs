//! Backend configuration for the hosted Supabase project.
//!
//! The values are deployment secrets (project URL and anon key). They are read
//! once by the composition root and handed to every consumer explicitly, so the
//! business layer never looks at ambient process state.

use std::env::vars;
use std::time::Duration;

use log::info;
use serde::Deserialize;
use thiserror::Error;

/// Sentinel substrings left behind by the `.env` template.
pub const PLACEHOLDER_MARKERS: &[&str] = &["placeholder", "your-project-ref", "your-anon-key"];

/// Table used by the reachability probe when none is configured.
pub const DEFAULT_PROBE_TABLE: &str = "news";

/// Request timeout used when none is configured.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration from environment: {0}")]
    Env(#[from] serde_env::Error),
}

/// Why a configuration pair cannot be used to reach the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigIssue {
    MissingUrl,
    MissingKey,
    PlaceholderUrl,
    PlaceholderKey,
}

impl std::fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingUrl => write!(f, "SUPABASE_URL is not set"),
            Self::MissingKey => write!(f, "SUPABASE_ANON_KEY is not set"),
            Self::PlaceholderUrl => write!(f, "SUPABASE_URL still contains a template placeholder"),
            Self::PlaceholderKey => {
                write!(f, "SUPABASE_ANON_KEY still contains a template placeholder")
            }
        }
    }
}

// Shape of the environment, before defaults are applied.
#[derive(Deserialize)]
struct RawConfig {
    supabase_url: Option<String>,
    supabase_anon_key: Option<String>,
    supabase_probe_table: Option<String>,
    supabase_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    url: Option<String>,
    anon_key: Option<String>,
    probe_table: String,
    timeout: Duration,
}

impl SupabaseConfig {
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            anon_key: Some(anon_key.into()),
            probe_table: DEFAULT_PROBE_TABLE.to_owned(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// A configuration with neither value set.
    pub fn unset() -> Self {
        Self {
            url: None,
            anon_key: None,
            probe_table: DEFAULT_PROBE_TABLE.to_owned(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_probe_table(mut self, table: impl Into<String>) -> Self {
        self.probe_table = table.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Reads `SUPABASE_URL`, `SUPABASE_ANON_KEY`, `SUPABASE_PROBE_TABLE` and
    /// `SUPABASE_TIMEOUT_SECS` from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        info!("Loading Supabase configuration from environment variables");
        Self::from_vars(vars())
    }

    /// Same as [`Self::from_env`], over an arbitrary key/value source.
    pub fn from_vars<I, S>(iter: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (S, S)>,
        S: AsRef<str>,
    {
        let raw: RawConfig = serde_env::from_iter(iter)?;
        Ok(Self::from_raw(raw))
    }

    fn from_raw(raw: RawConfig) -> Self {
        let RawConfig {
            supabase_url,
            supabase_anon_key,
            supabase_probe_table,
            supabase_timeout_secs,
        } = raw;

        let probe_table = supabase_probe_table
            .filter(|table| !table.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_PROBE_TABLE.to_owned());
        let timeout = Duration::from_secs(supabase_timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS));

        Self {
            url: supabase_url,
            anon_key: supabase_anon_key,
            probe_table,
            timeout,
        }
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn anon_key(&self) -> Option<&str> {
        self.anon_key.as_deref()
    }

    pub fn probe_table(&self) -> &str {
        &self.probe_table
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// The project URL without a trailing slash, for joining endpoint paths.
    pub fn base_url(&self) -> Option<&str> {
        self.url().map(|url| url.trim_end_matches('/'))
    }

    /// Validates the pair without touching the network.
    ///
    /// A value counts as missing when it is absent or blank. Every marker is
    /// checked against both values, case-insensitively.
    pub fn check(&self) -> Result<(), ConfigIssue> {
        let url = self
            .url()
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigIssue::MissingUrl)?;
        let key = self
            .anon_key()
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigIssue::MissingKey)?;

        if contains_placeholder(url) {
            return Err(ConfigIssue::PlaceholderUrl);
        }
        if contains_placeholder(key) {
            return Err(ConfigIssue::PlaceholderKey);
        }
        Ok(())
    }

    pub fn is_configured(&self) -> bool {
        self.check().is_ok()
    }
}

fn contains_placeholder(value: &str) -> bool {
    let lowered = value.to_lowercase();
    PLACEHOLDER_MARKERS
        .iter()
        .any(|marker| lowered.contains(marker))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_env::from_iter;

    const KEY: &str = "eyJhbGciOiJIUzI1NiJ9.real-looking-key";

    #[test]
    fn reads_values_and_applies_defaults() {
        let raw: RawConfig = from_iter(vec![
            ("SUPABASE_URL", "https://abcd.supabase.co"),
            ("SUPABASE_ANON_KEY", KEY),
        ])
        .expect("RawConfig should deserialize");

        let config = SupabaseConfig::from_raw(raw);
        assert_eq!(config.url(), Some("https://abcd.supabase.co"));
        assert_eq!(config.anon_key(), Some(KEY));
        assert_eq!(config.probe_table(), DEFAULT_PROBE_TABLE);
        assert_eq!(config.timeout(), Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert!(config.is_configured());
    }

    #[test]
    fn overrides_probe_table_and_timeout() {
        let config = SupabaseConfig::from_vars(vec![
            ("SUPABASE_URL", "https://abcd.supabase.co"),
            ("SUPABASE_ANON_KEY", KEY),
            ("SUPABASE_PROBE_TABLE", "alerts"),
            ("SUPABASE_TIMEOUT_SECS", "3"),
        ])
        .expect("config should load");

        assert_eq!(config.probe_table(), "alerts");
        assert_eq!(config.timeout(), Duration::from_secs(3));
    }

    #[test]
    fn empty_environment_is_missing_url() {
        let config = SupabaseConfig::from_vars(Vec::<(&str, &str)>::new())
            .expect("an empty environment still deserializes");
        assert_eq!(config.check(), Err(ConfigIssue::MissingUrl));
    }

    #[test]
    fn missing_key_is_reported() {
        let config =
            SupabaseConfig::from_vars(vec![("SUPABASE_URL", "https://abcd.supabase.co")])
                .expect("config should load");
        assert_eq!(config.check(), Err(ConfigIssue::MissingKey));
    }

    #[test]
    fn blank_values_count_as_missing() {
        let config = SupabaseConfig::new("  ", KEY);
        assert_eq!(config.check(), Err(ConfigIssue::MissingUrl));

        let config = SupabaseConfig::new("https://abcd.supabase.co", "");
        assert_eq!(config.check(), Err(ConfigIssue::MissingKey));
    }

    #[test]
    fn template_url_is_placeholder() {
        let config = SupabaseConfig::new("https://your-project-ref.supabase.co", KEY);
        assert_eq!(config.check(), Err(ConfigIssue::PlaceholderUrl));
    }

    #[test]
    fn template_key_is_placeholder() {
        let config = SupabaseConfig::new("https://abcd.supabase.co", "your-anon-key");
        assert_eq!(config.check(), Err(ConfigIssue::PlaceholderKey));
    }

    #[test]
    fn every_marker_is_checked_in_both_fields() {
        for marker in PLACEHOLDER_MARKERS {
            let url = format!("https://{marker}.supabase.co");
            assert!(
                !SupabaseConfig::new(url, KEY).is_configured(),
                "marker {marker} in url should be rejected"
            );

            let key = format!("key-{}", marker.to_uppercase());
            assert!(
                !SupabaseConfig::new("https://abcd.supabase.co", key).is_configured(),
                "marker {marker} in key should be rejected"
            );
        }
    }

    #[test]
    fn base_url_trims_trailing_slash() {
        let config = SupabaseConfig::new("https://abcd.supabase.co/", KEY);
        assert_eq!(config.base_url(), Some("https://abcd.supabase.co"));
    }

    #[test]
    fn unset_is_not_configured() {
        assert!(!SupabaseConfig::unset().is_configured());
    }
}
