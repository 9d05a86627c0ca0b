//! Agent configuration.
//!
//! Loaded once at startup from a JSON file whose path comes from
//! `ZENTERAI_CONFIG` (default `/etc/zenterai/config.json`), then treated as
//! immutable for the lifetime of the process.

use crate::error::{AgentError, AgentResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable holding the config file path.
pub const CONFIG_ENV_VAR: &str = "ZENTERAI_CONFIG";

/// Config file location used when `ZENTERAI_CONFIG` is unset.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/zenterai/config.json";

/// Configuration for the sync agent.
#[derive(Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Base URL of the control plane (e.g., "https://api.zenterai.com").
    pub api_endpoint: String,

    /// Long-lived bearer token exchanged for upload credentials.
    pub access_token: String,

    /// Local directory tree to sync.
    pub local_path: PathBuf,

    /// Key prefix under which files are stored remotely.
    pub remote_path: String,

    /// Organization id. Also used as the S3 bucket name.
    pub org_id: String,

    /// Seconds between sync cycles.
    pub sync_interval_seconds: u64,

    /// Reserved. Accepted but not consulted by the sync loop.
    #[serde(default)]
    pub watch_enabled: bool,

    /// Optional S3 endpoint override (for MinIO in testing).
    #[serde(default)]
    pub s3_endpoint_override: Option<String>,

    /// Timeout for control-plane requests.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Timeout for a single file upload.
    #[serde(default = "default_upload_timeout_secs")]
    pub upload_timeout_secs: u64,
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_upload_timeout_secs() -> u64 {
    300
}

impl fmt::Debug for AgentConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentConfig")
            .field("api_endpoint", &self.api_endpoint)
            .field("access_token", &"<redacted>")
            .field("local_path", &self.local_path)
            .field("remote_path", &self.remote_path)
            .field("org_id", &self.org_id)
            .field("sync_interval_seconds", &self.sync_interval_seconds)
            .field("watch_enabled", &self.watch_enabled)
            .field("s3_endpoint_override", &self.s3_endpoint_override)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("upload_timeout_secs", &self.upload_timeout_secs)
            .finish()
    }
}

impl AgentConfig {
    /// Resolves the config path from the environment.
    pub fn resolve_path() -> PathBuf {
        std::env::var_os(CONFIG_ENV_VAR)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
    }

    /// Loads and validates the config from the path named by the environment.
    pub fn load() -> AgentResult<Self> {
        Self::from_file(&Self::resolve_path())
    }

    /// Loads and validates the config from a specific file.
    pub fn from_file(path: &Path) -> AgentResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AgentError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_json(&raw)
            .map_err(|e| AgentError::Config(format!("{}: {e}", path.display())))
    }

    /// Parses and validates the config from a JSON string.
    pub fn from_json(raw: &str) -> AgentResult<Self> {
        let config: AgentConfig = serde_json::from_str(raw)
            .map_err(|e| AgentError::Config(format!("failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the invariants the sync loop relies on.
    pub fn validate(&self) -> AgentResult<()> {
        reqwest::Url::parse(&self.api_endpoint).map_err(|e| {
            AgentError::Config(format!("api_endpoint {:?} is not a valid URL: {e}", self.api_endpoint))
        })?;

        if self.access_token.trim().is_empty() {
            return Err(AgentError::Config("access_token must not be empty".to_string()));
        }
        if self.org_id.trim().is_empty() {
            return Err(AgentError::Config("org_id must not be empty".to_string()));
        }
        if self.sync_interval_seconds == 0 {
            return Err(AgentError::Config(
                "sync_interval_seconds must be greater than zero".to_string(),
            ));
        }
        if self.request_timeout_secs == 0 || self.upload_timeout_secs == 0 {
            return Err(AgentError::Config("timeouts must be greater than zero".to_string()));
        }

        // read_dir proves both "is a directory" and "is readable"
        std::fs::read_dir(&self.local_path).map_err(|e| {
            AgentError::Config(format!(
                "local_path {} is not a readable directory: {e}",
                self.local_path.display()
            ))
        })?;

        Ok(())
    }

    pub fn sync_interval(&self) -> Duration {
        Duration::from_secs(self.sync_interval_seconds)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn upload_timeout(&self) -> Duration {
        Duration::from_secs(self.upload_timeout_secs)
    }
}
