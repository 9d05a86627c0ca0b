//! S3 metadata lookup and streaming upload using per-cycle credentials.
//!
//! The sync engine talks to storage through [`ObjectStore`] so cycles can be
//! driven against an in-memory store in tests. [`S3Transport`] is the
//! production implementation.

use crate::error::{AgentError, AgentResult};
use crate::types::{RemoteObject, SyncCredentials};
use async_trait::async_trait;
use aws_sdk_s3::Client as S3Client;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use chrono::{DateTime, Utc};
use std::path::Path;
use tracing::debug;

/// The two storage operations the agent consumes.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Returns the object's metadata, or `None` if it does not exist.
    async fn head(
        &self,
        creds: &SyncCredentials,
        bucket: &str,
        key: &str,
    ) -> AgentResult<Option<RemoteObject>>;

    /// Streams the file at `path` to `bucket/key`.
    async fn put_file(
        &self,
        creds: &SyncCredentials,
        bucket: &str,
        key: &str,
        path: &Path,
    ) -> AgentResult<()>;
}

/// S3 transport for metadata lookups and file uploads.
pub struct S3Transport {
    endpoint_override: Option<String>,
}

impl S3Transport {
    pub fn new(endpoint_override: Option<String>) -> Self {
        Self { endpoint_override }
    }

    /// Builds an S3 client from the cycle's credentials.
    fn build_client(&self, creds: &SyncCredentials) -> S3Client {
        let credentials = aws_credential_types::Credentials::new(
            &creds.access_key_id,
            &creds.secret_access_key,
            Some(creds.session_token.clone()),
            None,
            "zenterai-agent",
        );

        let mut config_builder = aws_sdk_s3::Config::builder()
            .region(aws_types::region::Region::new(creds.region.clone()))
            .credentials_provider(credentials)
            .behavior_version_latest();

        if let Some(ref endpoint) = self.endpoint_override {
            config_builder = config_builder
                .endpoint_url(endpoint)
                .force_path_style(true);
        }

        S3Client::from_conf(config_builder.build())
    }
}

#[async_trait]
impl ObjectStore for S3Transport {
    async fn head(
        &self,
        creds: &SyncCredentials,
        bucket: &str,
        key: &str,
    ) -> AgentResult<Option<RemoteObject>> {
        let client = self.build_client(creds);

        let resp = match client.head_object().bucket(bucket).key(key).send().await {
            Ok(resp) => resp,
            Err(e) => {
                let service_err = e.into_service_error();
                if service_err.is_not_found() {
                    return Ok(None);
                }
                return Err(AgentError::S3(format!(
                    "head object failed for {key}: {service_err}"
                )));
            }
        };

        let modified = resp
            .last_modified()
            .ok_or_else(|| AgentError::S3(format!("no Last-Modified for {key}")))?;
        let last_modified = DateTime::<Utc>::from_timestamp(modified.secs(), modified.subsec_nanos())
            .ok_or_else(|| AgentError::S3(format!("Last-Modified out of range for {key}")))?;

        Ok(Some(RemoteObject { last_modified }))
    }

    async fn put_file(
        &self,
        creds: &SyncCredentials,
        bucket: &str,
        key: &str,
        path: &Path,
    ) -> AgentResult<()> {
        // The handle moves into the body and is closed when the body drops,
        // whether or not the request succeeds.
        let file = tokio::fs::File::open(path)
            .await
            .map_err(|e| AgentError::upload(key, format!("cannot open {}: {e}", path.display())))?;

        let body = ByteStream::read_from()
            .file(file)
            .build()
            .await
            .map_err(|e| AgentError::upload(key, format!("cannot read {}: {e}", path.display())))?;

        let client = self.build_client(creds);
        client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(body)
            .send()
            .await
            .map_err(|e| AgentError::upload(key, DisplayErrorContext(&e)))?;

        debug!("uploaded {} to s3://{bucket}/{key}", path.display());
        Ok(())
    }
}
