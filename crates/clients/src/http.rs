use std::time::Duration;

use eyre::Result;
use reqwest::{Client, StatusCode};
use timetable_core::errors::TimeError;
use tracing::warn;

pub(crate) fn build_client(timeout: Duration) -> Result<Client> {
    let client = Client::builder().timeout(timeout).build()?;
    Ok(client)
}

pub(crate) fn join_url(base_url: &str, path: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), path)
}

/// Network failures, timeouts and unreadable bodies.
pub(crate) fn transport_error(service: &str, error: reqwest::Error) -> TimeError {
    let reason = if error.is_timeout() {
        "request timed out".to_string()
    } else if error.is_decode() {
        format!("unreadable response: {}", error)
    } else {
        error.to_string()
    };

    warn!("{} service call failed: {}", service, reason);
    TimeError::UpstreamUnavailable(format!("{} service: {}", service, reason))
}

/// Statuses with no domain meaning for the endpoint that returned them.
pub(crate) fn status_error(service: &str, status: StatusCode) -> TimeError {
    match status {
        StatusCode::UNAUTHORIZED => {
            TimeError::Authentication(format!("{} service rejected the token", service))
        }
        StatusCode::FORBIDDEN => {
            TimeError::Authorization(format!("{} service denied access", service))
        }
        _ => {
            warn!("{} service responded with unexpected status {}", service, status);
            TimeError::UpstreamUnavailable(format!(
                "{} service responded with {}",
                service, status
            ))
        }
    }
}
