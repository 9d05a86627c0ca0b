//! Process-wide sync state shared between cycles.
//!
//! Constructed once at startup and handed out by `Arc`. All access goes
//! through one `RwLock`: the engine writes, status readers take the shared
//! side.

use crate::error::{AgentError, AgentResult};
use crate::types::SyncStatus;
use chrono::{DateTime, Utc};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Default)]
struct Inner {
    syncing: bool,
    last_sync: Option<DateTime<Utc>>,
    last_success: Option<DateTime<Utc>>,
    errors: Vec<String>,
}

/// Shared sync state: in-progress flag, timestamps, and the error list of
/// the most recent cycle.
#[derive(Debug, Default)]
pub struct SyncState {
    inner: RwLock<Inner>,
}

impl SyncState {
    pub fn new() -> Self {
        Self::default()
    }

    // A panic while holding the lock must not wedge the agent; the data
    // behind it stays consistent because every write is a single assignment.
    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Marks a cycle as started, or fails if one is already running.
    ///
    /// The returned guard clears the flag and stamps `last_sync` when it is
    /// dropped, on every exit path.
    pub fn begin_cycle(&self) -> AgentResult<CycleGuard<'_>> {
        let mut inner = self.write();
        if inner.syncing {
            return Err(AgentError::AlreadySyncing);
        }
        inner.syncing = true;
        inner.errors.clear();
        Ok(CycleGuard {
            state: self,
            succeeded: false,
        })
    }

    pub fn is_syncing(&self) -> bool {
        self.read().syncing
    }

    pub fn last_sync(&self) -> Option<DateTime<Utc>> {
        self.read().last_sync
    }

    pub fn errors(&self) -> Vec<String> {
        self.read().errors.clone()
    }

    /// Returns a consistent copy of the whole state.
    pub fn snapshot(&self) -> SyncStatus {
        let inner = self.read();
        SyncStatus {
            syncing: inner.syncing,
            last_sync: inner.last_sync,
            last_success: inner.last_success,
            errors: inner.errors.clone(),
        }
    }

    fn push_error(&self, message: String) {
        self.write().errors.push(message);
    }
}

/// Scope of one running cycle. Holding it means `syncing == true`.
#[must_use = "dropping the guard immediately ends the cycle"]
pub struct CycleGuard<'a> {
    state: &'a SyncState,
    succeeded: bool,
}

impl CycleGuard<'_> {
    /// Appends an error message to the current cycle's list.
    pub fn record_error(&self, message: impl Into<String>) {
        self.state.push_error(message.into());
    }

    /// Marks the walk as completed so `last_success` is stamped on release.
    pub fn mark_success(&mut self) {
        self.succeeded = true;
    }
}

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        let now = Utc::now();
        let mut inner = self.state.write();
        inner.syncing = false;
        inner.last_sync = Some(now);
        if self.succeeded {
            inner.last_success = Some(now);
        }
    }
}
