//! Per-cycle credential acquisition.
//!
//! Unlike a long-running session, the agent never caches credentials: every
//! cycle asks the broker for a fresh set and drops it when the walk ends.

use crate::api_client::ControlPlaneClient;
use crate::error::AgentResult;
use crate::types::SyncCredentials;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

/// Source of short-lived storage credentials.
#[async_trait]
pub trait CredentialBroker: Send + Sync {
    /// Fetches credentials valid for at least one sync cycle.
    async fn fetch_credentials(&self) -> AgentResult<SyncCredentials>;
}

/// Broker backed by the control-plane credential endpoint.
pub struct HttpCredentialBroker {
    api: Arc<ControlPlaneClient>,
}

impl HttpCredentialBroker {
    pub fn new(api: Arc<ControlPlaneClient>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl CredentialBroker for HttpCredentialBroker {
    async fn fetch_credentials(&self) -> AgentResult<SyncCredentials> {
        let creds = self.api.get_upload_credentials().await.map_err(|e| {
            warn!("credential fetch failed: {e}");
            e
        })?;

        debug!("fetched upload credentials for region {}", creds.region);
        Ok(creds)
    }
}
