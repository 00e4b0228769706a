use eyre::{Result, eyre};
use serde::Deserialize;
use std::env;
use std::time::Duration;

const DEFAULT_UPSTREAM_TIMEOUT_SECONDS: u64 = 5;

/// Configuration for the remote account and hospital services.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the account service (required)
    pub account_service_url: String,
    /// Base URL of the hospital service (required)
    pub hospital_service_url: String,
    /// Upper bound on each remote call, in seconds (defaults to 5)
    pub upstream_timeout_seconds: Option<u64>,
}

impl ClientConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let account_service_url = lookup("ACCOUNT_SERVICE_URL")
            .ok_or_else(|| eyre!("ACCOUNT_SERVICE_URL environment variable not set"))?;

        let hospital_service_url = lookup("HOSPITAL_SERVICE_URL")
            .ok_or_else(|| eyre!("HOSPITAL_SERVICE_URL environment variable not set"))?;

        let upstream_timeout_seconds = lookup("UPSTREAM_TIMEOUT_SECONDS")
            .map(|value| {
                value
                    .parse::<u64>()
                    .map_err(|_| eyre!("UPSTREAM_TIMEOUT_SECONDS must be a valid u64"))
            })
            .transpose()?;

        Ok(Self {
            account_service_url,
            hospital_service_url,
            upstream_timeout_seconds,
        })
    }

    /// Get the upstream timeout (defaults to 5 seconds if not set)
    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(
            self.upstream_timeout_seconds
                .unwrap_or(DEFAULT_UPSTREAM_TIMEOUT_SECONDS),
        )
    }
}
