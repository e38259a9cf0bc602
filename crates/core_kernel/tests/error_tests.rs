//! Tests for core_kernel error types

use std::time::Duration;

use core_kernel::error::CoreError;
use core_kernel::PortError;

#[test]
fn test_core_error_configuration() {
    let error = CoreError::configuration("max_in_flight must be positive");

    match error {
        CoreError::Configuration(ref msg) => assert!(msg.contains("max_in_flight")),
    }
    assert_eq!(
        error.to_string(),
        "Configuration error: max_in_flight must be positive"
    );
}

#[test]
fn test_timeout_keeps_operation_and_deadline() {
    match PortError::timeout("retrieve_payload", Duration::from_millis(250)) {
        PortError::Timeout {
            operation,
            duration_ms,
        } => {
            assert_eq!(operation, "retrieve_payload");
            assert_eq!(duration_ms, 250);
        }
        other => panic!("Expected Timeout error, got {other:?}"),
    }
}

#[test]
fn test_transformation_is_neither_transient_nor_missing() {
    let error = PortError::transformation("payload is not JSON");
    assert!(!error.is_transient());
    assert!(!error.is_not_found());
}
