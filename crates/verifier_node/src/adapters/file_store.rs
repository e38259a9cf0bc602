//! Directory-backed claim store
//!
//! Each payload lives at `<root>/<reference>.json`. Used by the verifier
//! binary as a local stand-in for the content-addressed network store.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Instant;

use async_trait::async_trait;

use core_kernel::{DomainPort, HealthCheckResult, HealthCheckable, PortError};
use domain_claims::ClaimData;

use super::content_reference;
use crate::ports::ClaimStoragePort;

const ADAPTER_ID: &str = "file-claim-store";

/// Claim payloads stored as JSON files in a directory
#[derive(Debug, Clone)]
pub struct FileClaimStore {
    root: PathBuf,
}

impl FileClaimStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Encodes and writes a claim, returning its content reference
    pub async fn store(&self, claim: &ClaimData) -> Result<String, PortError> {
        let bytes = claim
            .to_json_vec()
            .map_err(|e| PortError::transformation(e.to_string()))?;
        let reference = content_reference(&bytes);

        tokio::fs::write(self.path_for(&reference)?, &bytes)
            .await
            .map_err(|e| PortError::connection_with_source("failed to write claim payload", e))?;

        tracing::debug!(reference = %reference, size = bytes.len(), "Stored claim payload");
        Ok(reference)
    }

    /// Resolves a reference to its file path
    ///
    /// References are plain content identifiers; anything that could escape
    /// the root directory is refused.
    fn path_for(&self, reference: &str) -> Result<PathBuf, PortError> {
        let acceptable = !reference.is_empty()
            && reference
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !acceptable {
            return Err(PortError::transformation(format!(
                "invalid storage reference: {reference:?}"
            )));
        }
        Ok(self.root.join(format!("{reference}.json")))
    }
}

impl DomainPort for FileClaimStore {}

#[async_trait]
impl ClaimStoragePort for FileClaimStore {
    async fn retrieve_payload(&self, reference: &str) -> Result<ClaimData, PortError> {
        let path = self.path_for(reference)?;

        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(PortError::not_found("ClaimPayload", reference));
            }
            Err(e) => {
                return Err(PortError::connection_with_source(
                    format!("failed to read {}", path.display()),
                    e,
                ));
            }
        };

        ClaimData::from_json_slice(&bytes).map_err(|e| PortError::transformation(e.to_string()))
    }
}

#[async_trait]
impl HealthCheckable for FileClaimStore {
    async fn health_check(&self) -> HealthCheckResult {
        let started = Instant::now();
        let metadata = tokio::fs::metadata(&self.root).await;
        let latency_ms = started.elapsed().as_millis() as u64;

        match metadata {
            Ok(meta) if meta.is_dir() => HealthCheckResult::healthy(ADAPTER_ID, latency_ms),
            Ok(_) => HealthCheckResult::unhealthy(
                ADAPTER_ID,
                latency_ms,
                format!("{} is not a directory", self.root.display()),
            ),
            Err(e) => HealthCheckResult::unhealthy(ADAPTER_ID, latency_ms, e.to_string()),
        }
    }
}
