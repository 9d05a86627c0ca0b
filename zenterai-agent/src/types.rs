//! Shared types for sync cycles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Short-lived S3 credentials issued by the control plane.
///
/// Fetched once per cycle and dropped when the cycle ends.
#[derive(Clone, Serialize, Deserialize)]
pub struct SyncCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
    pub region: String,
    pub bucket: String,
}

impl fmt::Debug for SyncCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &"<redacted>")
            .field("region", &self.region)
            .field("bucket", &self.bucket)
            .finish()
    }
}

/// A regular file found during the walk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileEntry {
    pub local_path: PathBuf,
    pub relative_path: PathBuf,
    pub remote_key: String,
    pub modified: DateTime<Utc>,
}

/// Remote object metadata returned by a HEAD lookup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RemoteObject {
    pub last_modified: DateTime<Utc>,
}

/// Outcome counters for a completed cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    pub files_examined: usize,
    pub files_uploaded: usize,
    pub files_failed: usize,
    pub files_up_to_date: usize,
}

/// Point-in-time view of the shared sync state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncStatus {
    pub syncing: bool,
    pub last_sync: Option<DateTime<Utc>>,
    pub last_success: Option<DateTime<Utc>>,
    pub errors: Vec<String>,
}
