//! Configuration loaded from environment variables.
//!
//! Missing required credentials are fatal at startup — per-message
//! failure isolation never applies to configuration.

use secrecy::SecretString;

use crate::error::ConfigError;

/// Environment variable controlling the mailbox poll interval. The
/// poller reads the same variable when no explicit interval is given.
pub const POLL_INTERVAL_ENV: &str = "MAILBOX_POLL_INTERVAL_SECS";

/// Default mailbox poll interval: 5 minutes.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 300;

/// Intake service configuration.
#[derive(Debug, Clone)]
pub struct Settings {
    /// OAuth client id for the mailbox collaborator.
    pub mailbox_client_id: String,
    /// OAuth client secret for the mailbox collaborator.
    pub mailbox_client_secret: SecretString,
    /// OAuth refresh token for the mailbox collaborator.
    pub mailbox_refresh_token: SecretString,
    /// Mailbox label that marks messages for intake.
    pub mailbox_label: String,

    /// API key for the AI collaborators.
    pub ai_api_key: SecretString,

    /// API key for the record store collaborator.
    pub record_store_api_key: SecretString,
    /// Record collection id in the store.
    pub records_collection_id: String,
    /// Project collection id in the store.
    pub projects_collection_id: String,

    /// Geocoding API key; geocoding is disabled when absent.
    pub geocoding_api_key: Option<SecretString>,
    /// Object-storage folder id for uploaded attachments.
    pub storage_folder_id: String,

    /// Seconds between mailbox poll cycles.
    pub poll_interval_secs: u64,
    /// Administrator address for operational alerts.
    pub admin_email: String,

    /// Requests-per-minute budget for the AI collaborators.
    pub ai_rpm: u32,
    /// Queries-per-minute budget for the mailbox collaborator.
    pub mailbox_qpm: u32,
    /// Requests-per-minute budget for the record store.
    pub record_store_rpm: u32,
}

impl Settings {
    /// Load settings from the environment.
    ///
    /// Required variables produce a `ConfigError` when absent; intervals
    /// must be positive.
    pub fn from_env() -> Result<Self, ConfigError> {
        let poll_interval_secs = parse_env(POLL_INTERVAL_ENV, DEFAULT_POLL_INTERVAL_SECS)?;
        if poll_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: POLL_INTERVAL_ENV.into(),
                message: "interval must be positive".into(),
            });
        }

        Ok(Self {
            mailbox_client_id: require_env("MAILBOX_CLIENT_ID")?,
            mailbox_client_secret: require_secret("MAILBOX_CLIENT_SECRET")?,
            mailbox_refresh_token: require_secret("MAILBOX_REFRESH_TOKEN")?,
            mailbox_label: std::env::var("MAILBOX_LABEL")
                .unwrap_or_else(|_| "intake".to_string()),
            ai_api_key: require_secret("AI_API_KEY")?,
            record_store_api_key: require_secret("RECORD_STORE_API_KEY")?,
            records_collection_id: require_env("RECORDS_COLLECTION_ID")?,
            projects_collection_id: require_env("PROJECTS_COLLECTION_ID")?,
            geocoding_api_key: std::env::var("GEOCODING_API_KEY")
                .ok()
                .filter(|v| !v.is_empty())
                .map(SecretString::from),
            storage_folder_id: require_env("STORAGE_FOLDER_ID")?,
            poll_interval_secs,
            admin_email: require_env("ADMIN_EMAIL")?,
            ai_rpm: parse_env("AI_RPM", 50)?,
            mailbox_qpm: parse_env("MAILBOX_QPM", 250)?,
            record_store_rpm: parse_env("RECORD_STORE_RPM", 3)?,
        })
    }

    /// Whether geocoding is configured.
    pub fn geocoding_enabled(&self) -> bool {
        self.geocoding_api_key.is_some()
    }
}

fn require_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

fn require_secret(key: &str) -> Result<SecretString, ConfigError> {
    require_env(key).map(SecretString::from)
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> Result<T, ConfigError> {
    match std::env::var(key) {
        Ok(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("could not parse '{raw}'"),
        }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_required_var_is_an_error() {
        // SAFETY: tests touching MAILBOX_CLIENT_ID don't run concurrently.
        unsafe { std::env::remove_var("MAILBOX_CLIENT_ID") };
        let result = Settings::from_env();
        assert!(matches!(result, Err(ConfigError::MissingEnvVar(_))));
    }

    #[test]
    fn parse_env_falls_back_to_default() {
        unsafe { std::env::remove_var("MAILROOM_TEST_UNSET") };
        let value: u64 = parse_env("MAILROOM_TEST_UNSET", 42).unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn parse_env_rejects_garbage() {
        unsafe { std::env::set_var("MAILROOM_TEST_GARBAGE", "not-a-number") };
        let result: Result<u64, _> = parse_env("MAILROOM_TEST_GARBAGE", 0);
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
        unsafe { std::env::remove_var("MAILROOM_TEST_GARBAGE") };
    }
}
