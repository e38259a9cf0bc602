//! In-memory content-addressed claim store

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use core_kernel::{DomainPort, HealthCheckResult, HealthCheckable, PortError};
use domain_claims::ClaimData;

use super::content_reference;
use crate::ports::ClaimStoragePort;

const ADAPTER_ID: &str = "memory-claim-store";

/// Claim payloads held in process memory, keyed by content reference
///
/// Stores the encoded bytes rather than decoded claims so that a corrupt
/// payload surfaces as a decode failure on retrieval, just like a remote
/// store would.
#[derive(Debug, Default)]
pub struct InMemoryClaimStore {
    payloads: RwLock<HashMap<String, Vec<u8>>>,
    outage: RwLock<Option<String>>,
}

impl InMemoryClaimStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Encodes and stores a claim, returning its content reference
    pub async fn store(&self, claim: &ClaimData) -> Result<String, PortError> {
        let bytes = claim
            .to_json_vec()
            .map_err(|e| PortError::transformation(e.to_string()))?;
        let reference = content_reference(&bytes);
        self.payloads.write().await.insert(reference.clone(), bytes);
        Ok(reference)
    }

    /// Stores a claim under a caller-chosen reference
    pub async fn insert(
        &self,
        reference: impl Into<String>,
        claim: &ClaimData,
    ) -> Result<(), PortError> {
        let bytes = claim
            .to_json_vec()
            .map_err(|e| PortError::transformation(e.to_string()))?;
        self.insert_raw(reference, bytes).await;
        Ok(())
    }

    /// Stores raw bytes under an explicit reference
    pub async fn insert_raw(&self, reference: impl Into<String>, bytes: Vec<u8>) {
        self.payloads.write().await.insert(reference.into(), bytes);
    }

    /// Makes every retrieval fail with a connection error until [`restore`](Self::restore)
    pub async fn simulate_outage(&self, message: impl Into<String>) {
        *self.outage.write().await = Some(message.into());
    }

    pub async fn restore(&self) {
        *self.outage.write().await = None;
    }

    pub async fn len(&self) -> usize {
        self.payloads.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.payloads.read().await.is_empty()
    }
}

impl DomainPort for InMemoryClaimStore {}

#[async_trait]
impl ClaimStoragePort for InMemoryClaimStore {
    async fn retrieve_payload(&self, reference: &str) -> Result<ClaimData, PortError> {
        if let Some(message) = self.outage.read().await.as_ref() {
            return Err(PortError::connection(message.clone()));
        }

        let payloads = self.payloads.read().await;
        let bytes = payloads
            .get(reference)
            .ok_or_else(|| PortError::not_found("ClaimPayload", reference))?;

        ClaimData::from_json_slice(bytes).map_err(|e| PortError::transformation(e.to_string()))
    }
}

#[async_trait]
impl HealthCheckable for InMemoryClaimStore {
    async fn health_check(&self) -> HealthCheckResult {
        match self.outage.read().await.as_ref() {
            Some(message) => HealthCheckResult::unhealthy(ADAPTER_ID, 0, message.clone()),
            None => HealthCheckResult::healthy(ADAPTER_ID, 0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claim() -> ClaimData {
        ClaimData {
            patient_id: "p-1".to_string(),
            billed_amount: "10.00".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_store_then_retrieve() {
        let store = InMemoryClaimStore::new();
        let reference = store.store(&claim()).await.unwrap();

        assert_eq!(reference.len(), 64);
        assert_eq!(store.retrieve_payload(&reference).await.unwrap(), claim());
    }

    #[tokio::test]
    async fn test_identical_payloads_share_a_reference() {
        let store = InMemoryClaimStore::new();
        let first = store.store(&claim()).await.unwrap();
        let second = store.store(&claim()).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_insert_under_chosen_reference() {
        let store = InMemoryClaimStore::new();
        store.insert("bafyclaim", &claim()).await.unwrap();
        assert_eq!(store.retrieve_payload("bafyclaim").await.unwrap(), claim());
    }

    #[tokio::test]
    async fn test_missing_reference_is_not_found() {
        let store = InMemoryClaimStore::new();
        let err = store.retrieve_payload("missing").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_corrupt_payload_is_transformation_error() {
        let store = InMemoryClaimStore::new();
        store.insert_raw("corrupt", b"\x00\x01".to_vec()).await;

        let err = store.retrieve_payload("corrupt").await.unwrap_err();
        assert!(matches!(err, PortError::Transformation { .. }));
    }

    #[tokio::test]
    async fn test_outage_fails_retrieval_and_health() {
        let store = InMemoryClaimStore::new();
        let reference = store.store(&claim()).await.unwrap();
        store.simulate_outage("gateway unreachable").await;

        let err = store.retrieve_payload(&reference).await.unwrap_err();
        assert!(err.is_transient());
        assert!(!store.health_check().await.is_operational());

        store.restore().await;
        assert!(store.retrieve_payload(&reference).await.is_ok());
    }
}
