//! Custom Test Assertions
//!
//! Provides specialized assertion helpers for validation results that give
//! more meaningful error messages than standard assertions.

use domain_claims::{ClaimDecision, RiskLevel, ValidationResult};

/// Asserts that a claim was approved with no error reasons
pub fn assert_approved(result: &ValidationResult) {
    assert!(
        result.approved && result.valid,
        "Expected approval, got score {} with reasons {:?}",
        result.score,
        result.reasons
    );
    assert_eq!(result.decision(), ClaimDecision::Approve);
}

/// Asserts that a claim was rejected and that `rule` is among the reasons
///
/// # Panics
///
/// Panics if the claim is valid or no reason starts with `"<rule>: "`
pub fn assert_rejected_by(result: &ValidationResult, rule: &str) {
    assert!(!result.valid, "Expected rejection by {rule}, but the claim is valid");
    let prefix = format!("{rule}: ");
    assert!(
        result.reasons.iter().any(|r| r.starts_with(&prefix)),
        "Expected a reason from {rule}, got {:?}",
        result.reasons
    );
}

/// Asserts that `rule` produced exactly `message`
pub fn assert_reason(result: &ValidationResult, rule: &str, message: &str) {
    let expected = format!("{rule}: {message}");
    assert!(
        result.reasons.contains(&expected) || result.warnings.contains(&expected),
        "Expected {expected:?} among reasons {:?} / warnings {:?}",
        result.reasons,
        result.warnings
    );
}

/// Asserts that `rule` raised a warning
pub fn assert_warned_by(result: &ValidationResult, rule: &str) {
    let prefix = format!("{rule}: ");
    assert!(
        result.warnings.iter().any(|w| w.starts_with(&prefix)),
        "Expected a warning from {rule}, got {:?}",
        result.warnings
    );
}

/// Asserts the relationships every result must satisfy
///
/// Checks the score formula, its bounds, validity, approval, and the risk
/// classification against the reason and warning counts.
pub fn assert_result_consistent(result: &ValidationResult) {
    let errors = result.error_count();
    let warnings = result.warning_count();
    let expected_score = (100.0 - 15.0 * errors as f64 - 5.0 * warnings as f64).max(0.0);

    assert_eq!(result.score, expected_score, "score does not follow the formula");
    assert!((0.0..=100.0).contains(&result.score), "score {} out of bounds", result.score);
    assert_eq!(result.valid, errors == 0, "validity disagrees with {errors} errors");
    assert_eq!(
        result.approved,
        result.valid && result.score >= 60.0,
        "approval disagrees with validity and score"
    );
    assert_eq!(
        result.risk_level,
        RiskLevel::classify(errors, warnings, result.score),
        "risk level disagrees with counts"
    );
}
