//! Adapter integration tests

use core_kernel::{HealthCheckable, PortError};
use test_utils::{ClaimDataBuilder, DateFixtures};
use verifier_node::adapters::{content_reference, payload_digest, FileClaimStore};
use verifier_node::ClaimStoragePort;

mod file_store_tests {
    use super::*;

    #[tokio::test]
    async fn test_store_then_retrieve() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileClaimStore::new(dir.path());
        let claim = ClaimDataBuilder::as_of(DateFixtures::reference_now())
            .with_facility("F-100")
            .build();

        let reference = store.store(&claim).await.unwrap();

        assert!(dir.path().join(format!("{reference}.json")).exists());
        assert_eq!(store.retrieve_payload(&reference).await.unwrap(), claim);
    }

    #[tokio::test]
    async fn test_reference_is_digest_of_stored_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileClaimStore::new(dir.path());
        let claim = ClaimDataBuilder::new().build();

        let reference = store.store(&claim).await.unwrap();
        let bytes = std::fs::read(dir.path().join(format!("{reference}.json"))).unwrap();

        assert_eq!(reference, content_reference(&bytes));
        assert_eq!(reference, payload_digest(&bytes).to_hex());
    }

    #[tokio::test]
    async fn test_hand_written_payload_is_readable() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("bafyclaim.json"),
            br#"{"patient_id":"p-7","procedure_codes":["99213"],"billed_amount":"80.00"}"#,
        )
        .unwrap();
        let store = FileClaimStore::new(dir.path());

        let claim = store.retrieve_payload("bafyclaim").await.unwrap();

        assert_eq!(claim.patient_id, "p-7");
        assert_eq!(claim.procedure_codes, vec!["99213".to_string()]);
        assert!(claim.diagnosis_codes.is_empty());
    }

    #[tokio::test]
    async fn test_missing_payload_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileClaimStore::new(dir.path());

        let err = store.retrieve_payload("absent").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_corrupt_payload_is_transformation_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.json"), b"{not json").unwrap();
        let store = FileClaimStore::new(dir.path());

        let err = store.retrieve_payload("broken").await.unwrap_err();
        assert!(matches!(err, PortError::Transformation { .. }));
    }

    #[tokio::test]
    async fn test_path_like_references_are_refused() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileClaimStore::new(dir.path());

        for reference in ["../etc/passwd", "a/b", "", "claim.json"] {
            let err = store.retrieve_payload(reference).await.unwrap_err();
            assert!(
                matches!(err, PortError::Transformation { .. }),
                "{reference:?} should be refused"
            );
        }
    }

    #[tokio::test]
    async fn test_health_requires_a_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert!(FileClaimStore::new(dir.path()).health_check().await.is_operational());

        let missing = FileClaimStore::new(dir.path().join("nope"));
        assert!(!missing.health_check().await.is_operational());
    }
}
