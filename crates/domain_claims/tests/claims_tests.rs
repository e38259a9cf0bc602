//! Comprehensive tests for domain_claims

use std::sync::Arc;

use chrono::{DateTime, Days, Months, TimeZone, Utc};
use proptest::prelude::*;

use domain_claims::rules::{EvaluationContext, RuleOutcome, Severity, ValidationRule};
use domain_claims::{ClaimData, ClaimDecision, RiskLevel, RuleRegistry, ValidationEngine};

fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 9, 10, 14, 0, 0).unwrap()
}

fn date_string(at: DateTime<Utc>) -> String {
    at.date_naive().format("%Y-%m-%d").to_string()
}

fn clean_claim(now: DateTime<Utc>) -> ClaimData {
    ClaimData {
        patient_id: "0x9f2c7e".to_string(),
        patient_dob_hash: "0x51aa04".to_string(),
        provider_npi: "1234567890".to_string(),
        service_date: date_string(now - Days::new(1)),
        procedure_codes: vec!["99213".to_string(), "99214-25".to_string()],
        diagnosis_codes: vec!["E11.9".to_string()],
        place_of_service: "11".to_string(),
        billed_amount: "150.00".to_string(),
        claim_type: "professional".to_string(),
        ..Default::default()
    }
}

// ============================================================================
// Verdict Tests
// ============================================================================

mod verdict_tests {
    use super::*;

    #[test]
    fn test_clean_claim_is_approved_with_low_risk() {
        let engine = ValidationEngine::standard();
        let result = engine.validate(&clean_claim(Utc::now()));

        assert!(result.valid);
        assert!(result.approved);
        assert_eq!(result.score, 100.0);
        assert_eq!(result.risk_level, RiskLevel::Low);
        assert!(result.reasons.is_empty());
        assert!(result.warnings.is_empty());
        assert_eq!(result.decision(), ClaimDecision::Approve);
    }

    #[test]
    fn test_missing_codes_and_amount_are_listed_in_order() {
        let engine = ValidationEngine::standard();
        let mut claim = clean_claim(fixed_now());
        claim.procedure_codes.clear();
        claim.diagnosis_codes.clear();
        claim.billed_amount.clear();

        let result = engine.validate_at(&claim, fixed_now());

        assert!(result.reasons.contains(
            &"has_required_fields: Missing required fields: \
              procedure_codes, diagnosis_codes, billed_amount"
                .to_string()
        ));
        assert!(!result.valid);
        assert!(!result.approved);
    }

    #[test]
    fn test_service_date_one_year_and_a_day_old_fails() {
        let engine = ValidationEngine::standard();
        let now = fixed_now();
        let mut claim = clean_claim(now);
        let too_old = now.checked_sub_months(Months::new(12)).unwrap() - Days::new(1);
        claim.service_date = date_string(too_old);

        let result = engine.validate_at(&claim, now);

        assert!(result.reasons.contains(
            &"valid_service_date: Service date cannot be more than 1 year old".to_string()
        ));
        assert!(result.score <= 85.0);
        assert!(!result.valid);
    }

    #[test]
    fn test_amount_over_maximum_is_invalid() {
        let engine = ValidationEngine::standard();
        let mut claim = clean_claim(fixed_now());
        claim.billed_amount = "2000000".to_string();

        let result = engine.validate_at(&claim, fixed_now());

        assert!(result
            .reasons
            .contains(&"valid_amount: Amount exceeds maximum allowed".to_string()));
        assert!(!result.valid);
        assert!(!result.approved);
        // 2,000,000 over two procedures also trips the per-procedure warning
        assert_eq!(
            result.warnings,
            vec!["reasonable_amount_for_procedure: Amount seems high: $1000000.00 per procedure"]
        );
        assert_eq!(result.score, 80.0);
        assert_eq!(result.risk_level, RiskLevel::High);
    }

    #[test]
    fn test_digit_separators_are_not_amounts() {
        let engine = ValidationEngine::standard();
        let mut claim = clean_claim(fixed_now());

        for amount in ["1_000", "1_0_0"] {
            claim.billed_amount = amount.to_string();
            let result = engine.validate_at(&claim, fixed_now());

            assert_eq!(result.reasons, vec!["valid_amount: Invalid amount format"], "{amount}");
            assert!(!result.approved);
            assert_eq!(result.score, 85.0);
        }
    }

    #[test]
    fn test_amount_beyond_decimal_range_exceeds_maximum() {
        let engine = ValidationEngine::standard();
        let mut claim = clean_claim(fixed_now());

        for amount in ["100000000000000000000000000000", "1e30"] {
            claim.billed_amount = amount.to_string();
            let result = engine.validate_at(&claim, fixed_now());

            assert_eq!(
                result.reasons,
                vec!["valid_amount: Amount exceeds maximum allowed"],
                "{amount}"
            );
            assert_eq!(result.warnings.len(), 1, "{amount}");
            assert_eq!(result.score, 80.0);
        }
    }

    #[test]
    fn test_no_short_circuit_on_empty_claim() {
        let engine = ValidationEngine::standard();
        let result = engine.validate_at(&ClaimData::default(), fixed_now());

        assert_eq!(
            result.reasons,
            vec![
                "valid_procedure_codes: No procedure codes provided",
                "valid_diagnosis_codes: No diagnosis codes provided",
                "valid_amount: Invalid amount format",
                "valid_service_date: Service date is required",
                "valid_npi: Provider NPI is required",
                "has_required_fields: Missing required fields: patient_id, provider_npi, \
                 service_date, procedure_codes, diagnosis_codes, billed_amount, claim_type",
            ]
        );
        assert_eq!(
            result.warnings,
            vec!["diagnosis_procedure_match: Both diagnosis and procedure codes required"]
        );
        // 100 - 6*15 - 5 = 5
        assert_eq!(result.score, 5.0);
        assert_eq!(result.risk_level, RiskLevel::High);
    }

    #[test]
    fn test_single_warning_keeps_low_risk() {
        let engine = ValidationEngine::standard();
        let mut claim = clean_claim(fixed_now());
        claim.procedure_codes = vec!["99213".to_string()];
        claim.billed_amount = "12000".to_string();

        let result = engine.validate_at(&claim, fixed_now());

        assert!(result.valid);
        assert!(result.approved);
        assert_eq!(result.score, 95.0);
        assert_eq!(result.warning_count(), 1);
        assert_eq!(result.risk_level, RiskLevel::Low);
    }

    #[test]
    fn test_validation_does_not_mutate_claim() {
        let engine = ValidationEngine::standard();
        let claim = clean_claim(fixed_now());
        let before = claim.clone();

        let _ = engine.validate_at(&claim, fixed_now());

        assert_eq!(claim, before);
    }

    #[test]
    fn test_same_claim_same_instant_is_identical() {
        let engine = ValidationEngine::standard();
        let mut claim = clean_claim(fixed_now());
        claim.provider_npi = "12345".to_string();

        let first = engine.validate_at(&claim, fixed_now());
        let second = engine.validate_at(&claim, fixed_now());

        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_vec(&first).unwrap(),
            serde_json::to_vec(&second).unwrap()
        );
    }
}

// ============================================================================
// Custom Registry Tests
// ============================================================================

mod custom_registry_tests {
    use super::*;

    struct AlwaysFails(&'static str, Severity);

    impl ValidationRule for AlwaysFails {
        fn name(&self) -> &'static str {
            self.0
        }

        fn description(&self) -> &'static str {
            "Fails every claim"
        }

        fn severity(&self) -> Severity {
            self.1
        }

        fn evaluate(&self, _claim: &ClaimData, _ctx: &EvaluationContext) -> RuleOutcome {
            RuleOutcome::fail("always")
        }
    }

    #[test]
    fn test_message_order_follows_registration_order() {
        let registry = RuleRegistry::empty()
            .with_rule(AlwaysFails("second_warning", Severity::Warning))
            .unwrap()
            .with_rule(AlwaysFails("first_error", Severity::Error))
            .unwrap()
            .with_rule(AlwaysFails("first_warning", Severity::Warning))
            .unwrap();
        let engine = ValidationEngine::new(registry);

        let result = engine.validate_at(&ClaimData::default(), fixed_now());

        assert_eq!(result.reasons, vec!["first_error: always"]);
        assert_eq!(
            result.warnings,
            vec!["second_warning: always", "first_warning: always"]
        );
        assert_eq!(result.score, 75.0);
    }

    #[test]
    fn test_empty_registry_approves_everything() {
        let engine = ValidationEngine::new(RuleRegistry::empty());
        let result = engine.validate_at(&ClaimData::default(), fixed_now());
        assert!(result.approved);
        assert_eq!(result.score, 100.0);
    }
}

// ============================================================================
// Concurrency Tests
// ============================================================================

mod concurrency_tests {
    use super::*;

    #[test]
    fn test_concurrent_validation_has_no_cross_contamination() {
        let engine = Arc::new(ValidationEngine::standard());
        let now = fixed_now();

        let handles: Vec<_> = (0..128)
            .map(|i| {
                let engine = Arc::clone(&engine);
                std::thread::spawn(move || {
                    let mut claim = clean_claim(now);
                    // Every third claim carries a malformed NPI
                    if i % 3 == 0 {
                        claim.provider_npi = format!("bad-{i}");
                    }
                    (i, engine.validate_at(&claim, now))
                })
            })
            .collect();

        for handle in handles {
            let (i, result) = handle.join().unwrap();
            if i % 3 == 0 {
                assert_eq!(
                    result.reasons,
                    vec!["valid_npi: Invalid NPI format (must be 10 digits)"]
                );
                assert_eq!(result.score, 85.0);
                assert!(!result.valid);
            } else {
                assert!(result.reasons.is_empty());
                assert_eq!(result.score, 100.0);
                assert!(result.approved);
            }
        }
    }
}

// ============================================================================
// Property Tests
// ============================================================================

fn arbitrary_claim() -> impl Strategy<Value = ClaimData> {
    (
        prop::collection::vec("[0-9]{4,6}(-[0-9]{2})?", 0..4),
        prop::collection::vec("[A-Z][0-9]{2}(\\.[0-9]{1,5})?|[a-z0-9]{3}", 0..4),
        prop_oneof![
            Just(String::new()),
            "[0-9]{1,8}(\\.[0-9]{2})?",
            "-[0-9]{1,3}",
            "[a-z]{1,4}",
        ],
        prop_oneof![Just(String::new()), "[0-9]{9,11}"],
        prop_oneof![
            Just(String::new()),
            (0u64..800).prop_map(|days| date_string(fixed_now() - Days::new(days))),
            Just("2025/01/01".to_string()),
        ],
        prop_oneof![Just(String::new()), Just("professional".to_string())],
    )
        .prop_map(
            |(
                procedure_codes,
                diagnosis_codes,
                billed_amount,
                provider_npi,
                service_date,
                claim_type,
            )| {
                ClaimData {
                    patient_id: "p".to_string(),
                    procedure_codes,
                    diagnosis_codes,
                    billed_amount,
                    provider_npi,
                    service_date,
                    claim_type,
                    ..Default::default()
                }
            },
        )
}

proptest! {
    #[test]
    fn score_matches_formula(claim in arbitrary_claim()) {
        let result = ValidationEngine::standard().validate_at(&claim, fixed_now());
        let e = result.error_count() as f64;
        let w = result.warning_count() as f64;

        prop_assert!(result.score >= 0.0 && result.score <= 100.0);
        prop_assert_eq!(result.score, (100.0 - 15.0 * e - 5.0 * w).max(0.0));
    }

    #[test]
    fn validity_tracks_error_count(claim in arbitrary_claim()) {
        let result = ValidationEngine::standard().validate_at(&claim, fixed_now());

        prop_assert_eq!(result.valid, result.error_count() == 0);
        if !result.valid {
            prop_assert!(!result.approved);
        }
        prop_assert_eq!(result.approved, result.valid && result.score >= 60.0);
    }

    #[test]
    fn risk_is_a_function_of_counts_and_score(claim in arbitrary_claim()) {
        let result = ValidationEngine::standard().validate_at(&claim, fixed_now());
        prop_assert_eq!(
            result.risk_level,
            RiskLevel::classify(result.error_count(), result.warning_count(), result.score)
        );
    }

    #[test]
    fn validation_is_idempotent(claim in arbitrary_claim()) {
        let engine = ValidationEngine::standard();
        prop_assert_eq!(
            engine.validate_at(&claim, fixed_now()),
            engine.validate_at(&claim, fixed_now())
        );
    }

    #[test]
    fn risk_classification_priority(
        errors in 0usize..8,
        warnings in 0usize..4,
        score in 0.0f64..=100.0
    ) {
        let level = RiskLevel::classify(errors, warnings, score);
        let expected = if errors > 0 || score < 50.0 {
            RiskLevel::High
        } else if warnings > 1 || score < 80.0 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        };
        prop_assert_eq!(level, expected);
    }
}
