//! HTTP client for the Zenterai control plane.
//!
//! The agent only needs one endpoint: the credential exchange that turns the
//! long-lived access token into short-lived S3 credentials.

use crate::config::AgentConfig;
use crate::error::{AgentError, AgentResult};
use crate::types::SyncCredentials;
use reqwest::{Client, StatusCode};
use tracing::debug;

/// Path of the credential exchange endpoint, relative to `api_endpoint`.
pub const CREDENTIALS_PATH: &str = "/api/agent/credentials";

/// Header carrying the organization id.
pub const ORG_ID_HEADER: &str = "X-Org-ID";

/// HTTP client for the control plane.
pub struct ControlPlaneClient {
    client: Client,
    base_url: String,
    access_token: String,
    org_id: String,
}

impl ControlPlaneClient {
    pub fn new(config: &AgentConfig) -> AgentResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| AgentError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.api_endpoint.trim_end_matches('/').to_string(),
            access_token: config.access_token.clone(),
            org_id: config.org_id.clone(),
        })
    }

    /// Exchanges the bearer token for upload credentials.
    ///
    /// Any transport failure, non-200 status, or undecodable body is a
    /// `CredentialFetch` error.
    pub async fn get_upload_credentials(&self) -> AgentResult<SyncCredentials> {
        let url = format!("{}{CREDENTIALS_PATH}", self.base_url);

        let resp = self
            .client
            .get(&url)
            .bearer_auth(&self.access_token)
            .header(ORG_ID_HEADER, &self.org_id)
            .send()
            .await
            .map_err(|e| AgentError::CredentialFetch(format!("request failed: {e}")))?;

        let status = resp.status();
        if status != StatusCode::OK {
            return Err(AgentError::CredentialFetch(format!(
                "control plane returned status {status}"
            )));
        }

        let creds: SyncCredentials = resp
            .json()
            .await
            .map_err(|e| AgentError::CredentialFetch(format!("invalid response body: {e}")))?;

        debug!("received credentials for region {} ({})", creds.region, creds.bucket);
        Ok(creds)
    }
}
