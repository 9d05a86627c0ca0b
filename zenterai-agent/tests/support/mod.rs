//! Shared test doubles and fixtures.
//!
//! `MemoryStore` stands in for S3 and records every call; `MockBroker`
//! hands out canned credentials and can be scripted to fail or stall.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};
use tokio::sync::Notify;
use zenterai_agent::credential_broker::CredentialBroker;
use zenterai_agent::s3_transport::ObjectStore;
use zenterai_agent::state::SyncState;
use zenterai_agent::sync_engine::SyncEngine;
use zenterai_agent::{AgentConfig, AgentError, AgentResult, RemoteObject, SyncCredentials};

pub const ORG_ID: &str = "org-123";
pub const REMOTE_PREFIX: &str = "backups";
/// Bucket named in issued credentials. The engine must not use it.
pub const ISSUED_BUCKET: &str = "issued-bucket";

pub fn test_creds() -> SyncCredentials {
    SyncCredentials {
        access_key_id: "AKIA_TEST".into(),
        secret_access_key: "secret".into(),
        session_token: "session".into(),
        region: "us-east-1".into(),
        bucket: ISSUED_BUCKET.into(),
    }
}

pub fn test_config(root: &Path) -> AgentConfig {
    AgentConfig {
        api_endpoint: "http://127.0.0.1:9".into(),
        access_token: "tok-abc".into(),
        local_path: root.to_path_buf(),
        remote_path: REMOTE_PREFIX.into(),
        org_id: ORG_ID.into(),
        sync_interval_seconds: 60,
        watch_enabled: false,
        s3_endpoint_override: None,
        request_timeout_secs: 5,
        upload_timeout_secs: 5,
    }
}

pub fn ts(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 12, 0, 0).unwrap()
}

/// Writes `rel` under `root` with the given modification time.
pub fn write_file(root: &Path, rel: &str, contents: &str, modified: DateTime<Utc>) -> PathBuf {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, contents).unwrap();
    set_mtime(&path, modified);
    path
}

pub fn set_mtime(path: &Path, modified: DateTime<Utc>) {
    let file = std::fs::File::options().write(true).open(path).unwrap();
    file.set_modified(SystemTime::from(modified)).unwrap();
}

pub fn key(rel: &str) -> String {
    format!("{REMOTE_PREFIX}/{rel}")
}

// ── MemoryStore ─────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PutRecord {
    pub bucket: String,
    pub key: String,
    pub contents: String,
}

#[derive(Default)]
pub struct MemoryStore {
    objects: Mutex<HashMap<String, DateTime<Utc>>>,
    heads: Mutex<Vec<(String, String)>>,
    puts: Mutex<Vec<PutRecord>>,
    failing_puts: Mutex<HashSet<String>>,
    fail_heads: AtomicBool,
    put_delay: Mutex<Option<Duration>>,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Seeds a remote object as if it had been uploaded at `last_modified`.
    pub fn seed(&self, key: &str, last_modified: DateTime<Utc>) {
        self.objects.lock().unwrap().insert(key.to_string(), last_modified);
    }

    pub fn fail_put_for(&self, key: &str) {
        self.failing_puts.lock().unwrap().insert(key.to_string());
    }

    pub fn fail_heads(&self) {
        self.fail_heads.store(true, Ordering::SeqCst);
    }

    pub fn set_put_delay(&self, delay: Duration) {
        *self.put_delay.lock().unwrap() = Some(delay);
    }

    pub fn puts(&self) -> Vec<PutRecord> {
        self.puts.lock().unwrap().clone()
    }

    pub fn put_keys(&self) -> Vec<String> {
        self.puts().into_iter().map(|p| p.key).collect()
    }

    pub fn head_count(&self) -> usize {
        self.heads.lock().unwrap().len()
    }

    pub fn head_buckets(&self) -> Vec<String> {
        self.heads.lock().unwrap().iter().map(|(b, _)| b.clone()).collect()
    }

    pub fn clear_calls(&self) {
        self.heads.lock().unwrap().clear();
        self.puts.lock().unwrap().clear();
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn head(
        &self,
        _creds: &SyncCredentials,
        bucket: &str,
        key: &str,
    ) -> AgentResult<Option<RemoteObject>> {
        self.heads
            .lock()
            .unwrap()
            .push((bucket.to_string(), key.to_string()));
        if self.fail_heads.load(Ordering::SeqCst) {
            return Err(AgentError::S3(format!("head object failed for {key}: throttled")));
        }
        Ok(self
            .objects
            .lock()
            .unwrap()
            .get(key)
            .map(|&last_modified| RemoteObject { last_modified }))
    }

    async fn put_file(
        &self,
        _creds: &SyncCredentials,
        bucket: &str,
        key: &str,
        path: &Path,
    ) -> AgentResult<()> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| AgentError::Upload { key: key.to_string(), reason: e.to_string() })?;

        let delay = *self.put_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.puts.lock().unwrap().push(PutRecord {
            bucket: bucket.to_string(),
            key: key.to_string(),
            contents,
        });

        if self.failing_puts.lock().unwrap().contains(key) {
            return Err(AgentError::Upload {
                key: key.to_string(),
                reason: "connection reset".to_string(),
            });
        }

        self.objects.lock().unwrap().insert(key.to_string(), Utc::now());
        Ok(())
    }
}

// ── MockBroker ──────────────────────────────────────────────────

#[derive(Default)]
pub struct MockBroker {
    calls: AtomicUsize,
    /// Number of leading calls that fail.
    failures_left: AtomicUsize,
    delay: Mutex<Option<Duration>>,
    gate: Mutex<Option<Arc<Notify>>>,
}

impl MockBroker {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing(times: usize) -> Arc<Self> {
        let broker = Self::default();
        broker.failures_left.store(times, Ordering::SeqCst);
        Arc::new(broker)
    }

    pub fn with_delay(delay: Duration) -> Arc<Self> {
        let broker = Self::default();
        *broker.delay.lock().unwrap() = Some(delay);
        Arc::new(broker)
    }

    /// Blocks every fetch until the returned `Notify` is signalled.
    pub fn gated() -> (Arc<Self>, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        let broker = Self::default();
        *broker.gate.lock().unwrap() = Some(Arc::clone(&gate));
        (Arc::new(broker), gate)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CredentialBroker for MockBroker {
    async fn fetch_credentials(&self) -> AgentResult<SyncCredentials> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let failed = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            return Err(AgentError::CredentialFetch(
                "control plane returned status 500 Internal Server Error".into(),
            ));
        }
        Ok(test_creds())
    }
}

// ── Engine ──────────────────────────────────────────────────────

pub fn engine(
    config: &AgentConfig,
    broker: Arc<dyn CredentialBroker>,
    store: Arc<dyn ObjectStore>,
) -> SyncEngine {
    SyncEngine::new(config, broker, store, Arc::new(SyncState::new()))
}
