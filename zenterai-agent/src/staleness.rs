//! Decides whether a local file must be (re)uploaded.
//!
//! This is a timestamp heuristic, not a content check. Clock skew between the
//! local filesystem and the store's recorded `Last-Modified` can cause either
//! a redundant upload or a missed one.

use crate::s3_transport::ObjectStore;
use crate::types::{RemoteObject, SyncCredentials};
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

/// Result of a remote metadata lookup, as seen by the comparator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RemoteLookup {
    Found(RemoteObject),
    Missing,
    Failed,
}

/// Pure upload decision.
///
/// A failed lookup counts as stale: a redundant upload is preferred over
/// silently skipping a changed file.
pub fn is_stale(local_modified: DateTime<Utc>, remote: RemoteLookup) -> bool {
    match remote {
        RemoteLookup::Missing => true,
        RemoteLookup::Failed => true,
        // Equal timestamps are treated as in sync.
        RemoteLookup::Found(obj) => local_modified > obj.last_modified,
    }
}

/// Looks up `key` and decides whether the local copy needs uploading.
pub async fn needs_upload(
    store: &dyn ObjectStore,
    creds: &SyncCredentials,
    bucket: &str,
    key: &str,
    local_modified: DateTime<Utc>,
) -> bool {
    let lookup = match store.head(creds, bucket, key).await {
        Ok(Some(obj)) => RemoteLookup::Found(obj),
        Ok(None) => RemoteLookup::Missing,
        Err(e) => {
            warn!("metadata lookup failed for {key}, treating as stale: {e}");
            RemoteLookup::Failed
        }
    };

    let stale = is_stale(local_modified, lookup);
    debug!("{key}: {lookup:?} local={local_modified} stale={stale}");
    stale
}
