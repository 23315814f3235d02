//! Environment-driven runtime configuration

use std::time::Duration;

use crate::error::{Error, Result};

const DEFAULT_DATABASE_PATH: &str = "wisp.db";
const DEFAULT_POLL_DEBOUNCE_SECS: u64 = 60;

/// Runtime settings shared by the CLI and the worker.
///
/// Secrets stay in the environment; nothing here is persisted.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path of the local libSQL database file
    pub database_path: String,
    /// Base URL of the remote wiki API
    pub remote_base_url: String,
    /// Pre-issued access token, if running without a credential service
    pub access_token: Option<String>,
    /// Minimum interval between poll enqueues per site
    pub poll_debounce: Duration,
}

impl Config {
    /// Read configuration from process environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let database_path =
            normalize(lookup("WISP_DB_PATH")).unwrap_or_else(|| DEFAULT_DATABASE_PATH.to_string());

        let remote_base_url = normalize(lookup("WISP_REMOTE_BASE_URL"))
            .ok_or_else(|| Error::InvalidInput("WISP_REMOTE_BASE_URL is not set".to_string()))?;

        let access_token = normalize(lookup("WISP_ACCESS_TOKEN"));

        let poll_debounce_secs = match normalize(lookup("WISP_POLL_DEBOUNCE_SECS")) {
            Some(raw) => raw.parse::<u64>().map_err(|_| {
                Error::InvalidInput(format!("invalid WISP_POLL_DEBOUNCE_SECS: {raw}"))
            })?,
            None => DEFAULT_POLL_DEBOUNCE_SECS,
        };

        Ok(Self {
            database_path,
            remote_base_url,
            access_token,
            poll_debounce: Duration::from_secs(poll_debounce_secs),
        })
    }
}

fn normalize(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty())
}
