//! Pre-built Test Fixtures
//!
//! Provides ready-to-use claims, dates and identifiers. Each fixture is
//! built relative to an explicit reference time so tests stay deterministic.

use chrono::{DateTime, Days, Months, TimeZone, Utc};
use core_kernel::Hash32;
use domain_claims::ClaimData;

use crate::builders::ClaimDataBuilder;

/// Fixture for temporal test data
pub struct DateFixtures;

impl DateFixtures {
    /// Fixed reference time used by deterministic tests (2025-09-10 14:00 UTC)
    pub fn reference_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 9, 10, 14, 0, 0).unwrap()
    }

    /// Formats the calendar day of `at` as `YYYY-MM-DD`
    pub fn date_string(at: DateTime<Utc>) -> String {
        at.date_naive().format("%Y-%m-%d").to_string()
    }

    /// The date `days` days before `now`
    pub fn days_ago(now: DateTime<Utc>, days: u64) -> String {
        Self::date_string(now - Days::new(days))
    }

    /// The date one year and one day before `now`
    pub fn just_over_a_year_ago(now: DateTime<Utc>) -> String {
        let year_ago = now
            .checked_sub_months(Months::new(12))
            .expect("reference time is far from the calendar bounds");
        Self::date_string(year_ago - Days::new(1))
    }

    /// The date after `now`
    pub fn tomorrow(now: DateTime<Utc>) -> String {
        Self::date_string(now + Days::new(1))
    }
}

/// Fixture for string test data
pub struct StringFixtures;

impl StringFixtures {
    pub fn patient_id() -> &'static str {
        "0x9f2c7e41d0"
    }

    pub fn dob_hash() -> &'static str {
        "0x51aa04be77"
    }

    pub fn npi() -> &'static str {
        "1234567890"
    }

    pub fn provider_address() -> &'static str {
        "0x7a16ff8270133f063aab6c9977183d9e72835428"
    }
}

/// Fixture for ledger identifiers
pub struct IdFixtures;

impl IdFixtures {
    /// A deterministic claim id whose bytes are all `seed`
    pub fn claim_id(seed: u8) -> Hash32 {
        Hash32::from_bytes([seed; 32])
    }
}

/// Fixture for claim payloads in well-known states
pub struct ClaimFixtures;

impl ClaimFixtures {
    /// Passes every rule when validated at `now`
    pub fn clean(now: DateTime<Utc>) -> ClaimData {
        ClaimDataBuilder::as_of(now).build()
    }

    /// Lacks procedure codes, diagnosis codes and billed amount
    pub fn missing_codes_and_amount(now: DateTime<Utc>) -> ClaimData {
        ClaimDataBuilder::as_of(now)
            .without("procedure_codes")
            .without("diagnosis_codes")
            .without("billed_amount")
            .build()
    }

    /// Service date one year and one day before `now`
    pub fn stale(now: DateTime<Utc>) -> ClaimData {
        ClaimDataBuilder::as_of(now)
            .with_service_date(DateFixtures::just_over_a_year_ago(now))
            .build()
    }

    /// Billed amount above the per-claim ceiling
    pub fn excessive_amount(now: DateTime<Utc>) -> ClaimData {
        ClaimDataBuilder::as_of(now).with_billed_amount("2000000").build()
    }

    /// Valid, but billed at more than the per-procedure ceiling
    pub fn expensive_procedure(now: DateTime<Utc>) -> ClaimData {
        ClaimDataBuilder::as_of(now)
            .with_procedures(["99215"])
            .with_billed_amount("15000.00")
            .build()
    }

    /// Every field at its zero value
    pub fn empty() -> ClaimData {
        ClaimData::default()
    }
}
