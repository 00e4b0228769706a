use async_trait::async_trait;
use eyre::Result;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use timetable_core::{
    errors::{TimeError, TimeResult},
    models::identity::{CallerIdentity, Credential, Role},
    ports::IdentityService,
};
use tracing::debug;

use crate::config::ClientConfig;
use crate::http::{build_client, join_url, status_error, transport_error};

const SERVICE: &str = "account";

#[derive(Debug, Deserialize)]
struct DoctorResponse {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct RoleClaim {
    name: String,
}

#[derive(Debug, Deserialize)]
struct AccountResponse {
    id: i64,
    #[serde(default)]
    roles: Vec<RoleClaim>,
}

/// Client for the account service: doctor lookups and caller resolution.
#[derive(Debug, Clone)]
pub struct AccountServiceClient {
    client: Client,
    base_url: String,
}

impl AccountServiceClient {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let client = build_client(config.upstream_timeout())?;
        Ok(Self::new(client, config.account_service_url.clone()))
    }
}

#[async_trait]
impl IdentityService for AccountServiceClient {
    async fn validate_doctor(&self, doctor_id: i64, credential: &Credential) -> TimeResult<bool> {
        let url = join_url(&self.base_url, &format!("/api/Doctors/{}", doctor_id));
        debug!("Validating doctor {} via {}", doctor_id, url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(credential.as_str())
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, e))?;

        match response.status() {
            StatusCode::OK => {
                let doctor: DoctorResponse = response
                    .json()
                    .await
                    .map_err(|e| transport_error(SERVICE, e))?;
                Ok(doctor.id == doctor_id)
            }
            StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND => Ok(false),
            status => Err(status_error(SERVICE, status)),
        }
    }

    async fn resolve_caller(&self, credential: &Credential) -> TimeResult<CallerIdentity> {
        let url = join_url(&self.base_url, "/api/Accounts/Me");

        let response = self
            .client
            .get(&url)
            .bearer_auth(credential.as_str())
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, e))?;

        match response.status() {
            StatusCode::OK => {
                let account: AccountResponse = response
                    .json()
                    .await
                    .map_err(|e| transport_error(SERVICE, e))?;
                let roles = Role::parse_claims(account.roles.iter().map(|claim| &claim.name));
                debug!("Resolved caller {} with roles {:?}", account.id, roles);
                Ok(CallerIdentity {
                    user_id: account.id,
                    roles,
                })
            }
            StatusCode::NOT_FOUND => Err(TimeError::NotFound(
                "No account for the presented token".to_string(),
            )),
            status => Err(status_error(SERVICE, status)),
        }
    }
}
