//! Property-Based Test Generators
//!
//! Provides proptest strategies for claim codes and payloads. Strategies named
//! `valid_*` only produce values the built-in rules accept.

use chrono::{DateTime, Days, Utc};
use domain_claims::ClaimData;
use proptest::prelude::*;

use crate::fixtures::{DateFixtures, StringFixtures};

/// Strategy for CPT codes, with and without modifier
pub fn valid_cpt_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "[0-9]{5}",
        "[0-9]{5}-[0-9]{2}",
    ]
}

/// Strategy for ICD-10 codes, with and without a decimal part
pub fn valid_icd10_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "[A-Z][0-9]{2}",
        "[A-Z][0-9]{2}\\.[0-9]{1,4}",
    ]
}

/// Strategy for 10-digit NPIs
pub fn valid_npi_strategy() -> impl Strategy<Value = String> {
    "[0-9]{10}"
}

/// Strategy for billed amounts in `(0, 10000]` with two decimals
pub fn valid_amount_strategy() -> impl Strategy<Value = String> {
    (1u32..=1_000_000u32).prop_map(|cents| format!("{}.{:02}", cents / 100, cents % 100))
}

/// Strategy for claims that pass every rule when validated at `now`
pub fn valid_claim_strategy(now: DateTime<Utc>) -> impl Strategy<Value = ClaimData> {
    (
        prop::collection::vec(valid_cpt_strategy(), 1..4),
        prop::collection::vec(valid_icd10_strategy(), 1..4),
        valid_npi_strategy(),
        valid_amount_strategy(),
        0u64..364u64,
    )
        .prop_map(move |(procedures, diagnoses, npi, amount, days_ago)| ClaimData {
            patient_id: StringFixtures::patient_id().to_string(),
            provider_npi: npi,
            service_date: DateFixtures::date_string(now - Days::new(days_ago)),
            procedure_codes: procedures,
            diagnosis_codes: diagnoses,
            billed_amount: amount,
            claim_type: "professional".to_string(),
            ..Default::default()
        })
}

/// Strategy for claims built from arbitrary short strings
///
/// Exercises malformed input; most generated claims fail several rules.
pub fn arbitrary_claim_strategy() -> impl Strategy<Value = ClaimData> {
    let text = || "[ -~]{0,12}";
    (
        text(),
        text(),
        text(),
        prop::collection::vec(text(), 0..3),
        prop::collection::vec(text(), 0..3),
        text(),
        text(),
    )
        .prop_map(
            |(
                patient_id,
                provider_npi,
                service_date,
                procedure_codes,
                diagnosis_codes,
                billed_amount,
                claim_type,
            )| {
                ClaimData {
                    patient_id,
                    provider_npi,
                    service_date,
                    procedure_codes,
                    diagnosis_codes,
                    billed_amount,
                    claim_type,
                    ..Default::default()
                }
            },
        )
}
