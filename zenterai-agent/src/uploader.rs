//! Single-file upload with a bounded duration.

use crate::error::{AgentError, AgentResult};
use crate::s3_transport::ObjectStore;
use crate::types::{FileEntry, SyncCredentials};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Uploads one file per call. No retries: a failure is reported back to the
/// caller for that file only.
pub struct Uploader {
    store: Arc<dyn ObjectStore>,
    timeout: Duration,
}

impl Uploader {
    pub fn new(store: Arc<dyn ObjectStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    pub async fn upload(
        &self,
        creds: &SyncCredentials,
        bucket: &str,
        entry: &FileEntry,
    ) -> AgentResult<()> {
        let key = &entry.remote_key;
        let transfer = self.store.put_file(creds, bucket, key, &entry.local_path);

        // Dropping the transfer future on timeout drops the open file with it.
        match tokio::time::timeout(self.timeout, transfer).await {
            Ok(Ok(())) => {
                debug!("uploaded {}", entry.relative_path.display());
                Ok(())
            }
            Ok(Err(e @ AgentError::Upload { .. })) => Err(e),
            Ok(Err(e)) => Err(AgentError::upload(key, e)),
            Err(_) => Err(AgentError::upload(
                key,
                format!("timed out after {}s", self.timeout.as_secs()),
            )),
        }
    }
}
