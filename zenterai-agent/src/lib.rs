//! Zenterai file sync agent.
//!
//! Periodically pushes a local directory tree to S3:
//! - Short-lived upload credentials fetched from the control plane each cycle
//! - Timestamp-based staleness checks against object metadata
//! - Streaming per-file uploads with a bounded duration
//! - Single-flight cycles with shared, lock-protected sync state

pub mod api_client;
pub mod config;
pub mod credential_broker;
pub mod error;
pub mod s3_transport;
pub mod scheduler;
pub mod staleness;
pub mod state;
pub mod sync_engine;
pub mod types;
pub mod uploader;

pub use config::AgentConfig;
pub use error::{AgentError, AgentResult};
pub use types::*;
