use async_trait::async_trait;
use eyre::Result;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use timetable_core::{errors::TimeResult, models::identity::Credential, ports::FacilityService};
use tracing::debug;

use crate::config::ClientConfig;
use crate::http::{build_client, join_url, status_error, transport_error};

const SERVICE: &str = "hospital";

#[derive(Debug, Deserialize)]
struct RoomResponse {
    name: String,
}

#[derive(Debug, Deserialize)]
struct HospitalResponse {
    #[serde(default)]
    rooms: Vec<RoomResponse>,
}

/// Client for the hospital directory.
#[derive(Debug, Clone)]
pub struct HospitalServiceClient {
    client: Client,
    base_url: String,
}

impl HospitalServiceClient {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let client = build_client(config.upstream_timeout())?;
        Ok(Self::new(client, config.hospital_service_url.clone()))
    }
}

#[async_trait]
impl FacilityService for HospitalServiceClient {
    async fn validate_hospital_room(
        &self,
        hospital_id: i64,
        room: &str,
        credential: &Credential,
    ) -> TimeResult<bool> {
        let url = join_url(&self.base_url, &format!("/api/Hospitals/{}", hospital_id));
        debug!("Validating room '{}' of hospital {} via {}", room, hospital_id, url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(credential.as_str())
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, e))?;

        match response.status() {
            StatusCode::OK => {
                let hospital: HospitalResponse = response
                    .json()
                    .await
                    .map_err(|e| transport_error(SERVICE, e))?;
                Ok(hospital.rooms.iter().any(|candidate| candidate.name == room))
            }
            StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND => Ok(false),
            status => Err(status_error(SERVICE, status)),
        }
    }
}
