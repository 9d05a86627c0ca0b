//! Sync orchestrator.
//!
//! Runs one cycle at a time:
//! - Acquire fresh credentials from the broker (abort the cycle on failure)
//! - Walk the local tree in lexicographic order
//! - For each regular file, check staleness and upload if needed
//!
//! Per-file failures are logged and collected into [`SyncState`]; only a
//! credential failure or a traversal failure ends a cycle early.

use crate::config::AgentConfig;
use crate::credential_broker::CredentialBroker;
use crate::error::{AgentError, AgentResult};
use crate::s3_transport::ObjectStore;
use crate::staleness::needs_upload;
use crate::state::{CycleGuard, SyncState};
use crate::types::{FileEntry, SyncCredentials, SyncReport};
use crate::uploader::Uploader;

use chrono::{DateTime, Utc};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::{Instrument, debug, error, info, info_span, warn};
use uuid::Uuid;
use walkdir::WalkDir;

/// Sync engine: executes single-flight sync cycles.
pub struct SyncEngine {
    broker: Arc<dyn CredentialBroker>,
    store: Arc<dyn ObjectStore>,
    uploader: Uploader,
    state: Arc<SyncState>,
    local_root: PathBuf,
    remote_prefix: String,
    /// Bucket for lookups and uploads. This is the org id, not the bucket
    /// named in the issued credentials.
    bucket: String,
}

impl SyncEngine {
    pub fn new(
        config: &AgentConfig,
        broker: Arc<dyn CredentialBroker>,
        store: Arc<dyn ObjectStore>,
        state: Arc<SyncState>,
    ) -> Self {
        let uploader = Uploader::new(Arc::clone(&store), config.upload_timeout());
        Self {
            broker,
            store,
            uploader,
            state,
            local_root: config.local_path.clone(),
            remote_prefix: config.remote_path.clone(),
            bucket: config.org_id.clone(),
        }
    }

    /// Shared state, for status readers.
    pub fn state(&self) -> &Arc<SyncState> {
        &self.state
    }

    /// Runs exactly one sync cycle.
    ///
    /// Returns `AlreadySyncing` without doing any work if another cycle holds
    /// the state. A cycle whose walk completed is `Ok` even if some uploads
    /// failed; see the report counters and [`SyncState::errors`].
    pub async fn run_cycle(&self) -> AgentResult<SyncReport> {
        let mut guard = self.state.begin_cycle()?;
        let span = info_span!("sync_cycle", cycle_id = %Uuid::now_v7());

        async {
            debug!("acquiring credentials");
            let creds = match self.broker.fetch_credentials().await {
                Ok(creds) => creds,
                Err(e) => {
                    error!("sync aborted, no credentials: {e}");
                    guard.record_error(e.to_string());
                    return Err(e);
                }
            };

            let walked = self.walk(&guard, &creds).await;
            match walked {
                Ok(report) => {
                    guard.mark_success();
                    info!(
                        examined = report.files_examined,
                        uploaded = report.files_uploaded,
                        failed = report.files_failed,
                        up_to_date = report.files_up_to_date,
                        "sync cycle complete"
                    );
                    Ok(report)
                }
                Err(e) => {
                    error!("sync aborted during walk: {e}");
                    guard.record_error(e.to_string());
                    Err(e)
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn walk(&self, guard: &CycleGuard<'_>, creds: &SyncCredentials) -> AgentResult<SyncReport> {
        let mut report = SyncReport::default();

        for item in WalkDir::new(&self.local_root).sort_by_file_name() {
            let dir_entry = item.map_err(|e| AgentError::Traversal(e.to_string()))?;
            if !dir_entry.file_type().is_file() {
                continue;
            }
            report.files_examined += 1;

            let entry = match self.file_entry(&dir_entry) {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("skipping {}: {e}", dir_entry.path().display());
                    guard.record_error(format!("{}: {e}", dir_entry.path().display()));
                    report.files_failed += 1;
                    continue;
                }
            };

            if !needs_upload(
                self.store.as_ref(),
                creds,
                &self.bucket,
                &entry.remote_key,
                entry.modified,
            )
            .await
            {
                report.files_up_to_date += 1;
                continue;
            }

            match self.uploader.upload(creds, &self.bucket, &entry).await {
                Ok(()) => report.files_uploaded += 1,
                Err(e) => {
                    warn!("failed to upload {}: {e}", entry.local_path.display());
                    guard.record_error(e.to_string());
                    report.files_failed += 1;
                }
            }
        }

        Ok(report)
    }

    fn file_entry(&self, dir_entry: &walkdir::DirEntry) -> AgentResult<FileEntry> {
        let local_path = dir_entry.path().to_path_buf();
        let relative_path = local_path
            .strip_prefix(&self.local_root)
            .map_err(|e| AgentError::Traversal(e.to_string()))?
            .to_path_buf();

        let remote_key = remote_key(&self.remote_prefix, &relative_path).ok_or_else(|| {
            AgentError::upload(&relative_path.to_string_lossy(), "path is not valid UTF-8")
        })?;

        let modified = dir_entry
            .metadata()
            .map_err(|e| AgentError::Io(e.into()))?
            .modified()?;

        Ok(FileEntry {
            local_path,
            relative_path,
            remote_key,
            modified: DateTime::<Utc>::from(modified),
        })
    }
}

/// Joins the remote prefix and a root-relative path into an object key.
///
/// Keys always use `/`. Returns `None` if a path component is not UTF-8.
pub fn remote_key(prefix: &str, relative: &Path) -> Option<String> {
    let mut parts = Vec::new();
    for component in relative.components() {
        if let Component::Normal(part) = component {
            parts.push(part.to_str()?);
        }
    }
    let relative = parts.join("/");

    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        Some(relative)
    } else {
        Some(format!("{prefix}/{relative}"))
    }
}
