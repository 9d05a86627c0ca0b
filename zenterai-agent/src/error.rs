//! Sync agent error types.

use thiserror::Error;

/// Result type for agent operations.
pub type AgentResult<T> = Result<T, AgentError>;

/// Errors that can occur while configuring or running the sync agent.
///
/// Severity follows the variant: `Config` is fatal at startup,
/// `CredentialFetch` and `Traversal` abort the current cycle,
/// `AlreadySyncing` skips a tick, and `Upload` / `S3` stay with one file.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("credential fetch failed: {0}")]
    CredentialFetch(String),

    #[error("sync already in progress")]
    AlreadySyncing,

    #[error("upload failed for {key}: {reason}")]
    Upload { key: String, reason: String },

    #[error("directory traversal failed: {0}")]
    Traversal(String),

    #[error("S3 operation failed: {0}")]
    S3(String),

    #[error("scheduler is not running")]
    SchedulerStopped,

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AgentError {
    /// Returns true for errors that end the current cycle (as opposed to a
    /// single file).
    pub fn aborts_cycle(&self) -> bool {
        matches!(
            self,
            AgentError::CredentialFetch(_) | AgentError::Traversal(_) | AgentError::AlreadySyncing
        )
    }

    pub(crate) fn upload(key: &str, reason: impl std::fmt::Display) -> Self {
        AgentError::Upload {
            key: key.to_string(),
            reason: reason.to_string(),
        }
    }
}
