//! Claim validation rules
//!
//! Each rule is a small type implementing [`ValidationRule`]. Rules are pure
//! checks over a borrowed [`ClaimData`]: a format problem in the claim is
//! reported as a [`RuleOutcome::Fail`] message, never as an error, and one
//! rule failing has no effect on whether another rule runs.
//!
//! # Built-in Rules
//!
//! | Rule | Severity |
//! |------|----------|
//! | `valid_procedure_codes` | error |
//! | `valid_diagnosis_codes` | error |
//! | `valid_amount` | error |
//! | `valid_service_date` | error |
//! | `valid_npi` | error |
//! | `has_required_fields` | error |
//! | `reasonable_amount_for_procedure` | warning |
//! | `diagnosis_procedure_match` | warning |

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::claim::ClaimData;

// `[0-9]` rather than `\d`: the regex crate's `\d` matches any Unicode digit.
static CPT_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{5}(-[0-9]{2})?$").expect("valid CPT pattern"));
static ICD10_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z][0-9]{2}(\.[0-9]{1,4})?$").expect("valid ICD-10 pattern"));
static NPI: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{10}$").expect("valid NPI pattern"));
static ISO_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").expect("valid date pattern"));
static AMOUNT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?([0-9]+\.?[0-9]*|\.[0-9]+)([eE][+-]?[0-9]+)?$")
        .expect("valid amount pattern")
});

/// Largest billed amount accepted by `valid_amount`
pub const MAX_BILLED_AMOUNT: Decimal = dec!(1000000);

/// Average billed amount per procedure above which a warning is raised
pub const MAX_AMOUNT_PER_PROCEDURE: Decimal = dec!(10000);

/// How a failed rule affects the verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Invalidates the claim
    Error,
    /// Lowers the score only
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// Result of evaluating one rule against one claim
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleOutcome {
    Pass,
    Fail(String),
}

impl RuleOutcome {
    /// Creates a failing outcome
    pub fn fail(message: impl Into<String>) -> Self {
        RuleOutcome::Fail(message.into())
    }

    pub fn passed(&self) -> bool {
        matches!(self, RuleOutcome::Pass)
    }

    /// Returns the failure message, if the rule failed
    pub fn message(&self) -> Option<&str> {
        match self {
            RuleOutcome::Pass => None,
            RuleOutcome::Fail(message) => Some(message),
        }
    }
}

/// Ambient inputs a rule may depend on besides the claim itself
#[derive(Debug, Clone, Copy)]
pub struct EvaluationContext {
    /// The instant "now" for date-relative checks
    pub now: DateTime<Utc>,
}

impl EvaluationContext {
    /// Creates a context pinned to the given instant
    pub fn at(now: DateTime<Utc>) -> Self {
        Self { now }
    }

    /// Creates a context pinned to the current time
    pub fn current() -> Self {
        Self::at(Utc::now())
    }
}

/// A single named check over a claim
///
/// Implementations must be pure: the same claim and context always produce
/// the same outcome.
pub trait ValidationRule: Send + Sync {
    /// Unique rule identity, used as the prefix of reason strings
    fn name(&self) -> &'static str;

    /// Human-readable description of what the rule enforces
    fn description(&self) -> &'static str;

    fn severity(&self) -> Severity;

    /// Evaluates the rule against a claim
    fn evaluate(&self, claim: &ClaimData, ctx: &EvaluationContext) -> RuleOutcome;
}

/// A billed amount as read by the amount-based rules
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BilledAmount {
    Exact(Decimal),
    /// Well-formed but outside the range or precision of [`Decimal`]
    Approximate(f64),
}

impl BilledAmount {
    pub fn is_positive(&self) -> bool {
        match self {
            Self::Exact(value) => *value > Decimal::ZERO,
            Self::Approximate(value) => *value > 0.0,
        }
    }

    pub fn exceeds(&self, limit: Decimal) -> bool {
        match self {
            Self::Exact(value) => *value > limit,
            Self::Approximate(value) => limit.to_f64().is_some_and(|limit| *value > limit),
        }
    }

    /// Average over `count` procedures. `count` must be non-zero.
    pub fn per_procedure(&self, count: usize) -> Self {
        match self {
            Self::Exact(value) => Self::Exact(*value / Decimal::from(count)),
            Self::Approximate(value) => Self::Approximate(*value / count as f64),
        }
    }
}

impl fmt::Display for BilledAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(value) => {
                let shown = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
                write!(f, "{:.2}", shown)
            }
            Self::Approximate(value) => write!(f, "{:.2}", value),
        }
    }
}

/// Parses a billed amount the way every amount-based rule must agree on
///
/// Accepts an optionally signed decimal with an optional exponent
/// (`"150.00"`, `".5"`, `"1.5e2"`). Digit separators, hex, `NaN` and
/// infinities are `None`, as is anything too large for an `f64`.
pub fn parse_amount(raw: &str) -> Option<BilledAmount> {
    if !AMOUNT.is_match(raw) {
        return None;
    }
    let approximate = raw.parse::<f64>().ok().filter(|value| value.is_finite())?;

    match Decimal::from_str(raw).or_else(|_| Decimal::from_scientific(raw)) {
        // Underflow past 28 decimal places rounds to zero
        Ok(exact) if !(exact.is_zero() && approximate != 0.0) => Some(BilledAmount::Exact(exact)),
        _ => Some(BilledAmount::Approximate(approximate)),
    }
}

/// All procedure codes must be valid CPT codes
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcedureCodesRule;

impl ValidationRule for ProcedureCodesRule {
    fn name(&self) -> &'static str {
        "valid_procedure_codes"
    }

    fn description(&self) -> &'static str {
        "All procedure codes must be valid CPT codes"
    }

    fn severity(&self) -> Severity {
        Severity::Error
    }

    fn evaluate(&self, claim: &ClaimData, _ctx: &EvaluationContext) -> RuleOutcome {
        if claim.procedure_codes.is_empty() {
            return RuleOutcome::fail("No procedure codes provided");
        }

        match claim.procedure_codes.iter().find(|code| !CPT_CODE.is_match(code)) {
            Some(code) => RuleOutcome::fail(format!("Invalid CPT code: {}", code)),
            None => RuleOutcome::Pass,
        }
    }
}

/// All diagnosis codes must be valid ICD-10 format
#[derive(Debug, Clone, Copy, Default)]
pub struct DiagnosisCodesRule;

impl ValidationRule for DiagnosisCodesRule {
    fn name(&self) -> &'static str {
        "valid_diagnosis_codes"
    }

    fn description(&self) -> &'static str {
        "All diagnosis codes must be valid ICD-10 format"
    }

    fn severity(&self) -> Severity {
        Severity::Error
    }

    fn evaluate(&self, claim: &ClaimData, _ctx: &EvaluationContext) -> RuleOutcome {
        if claim.diagnosis_codes.is_empty() {
            return RuleOutcome::fail("No diagnosis codes provided");
        }

        match claim.diagnosis_codes.iter().find(|code| !ICD10_CODE.is_match(code)) {
            Some(code) => RuleOutcome::fail(format!("Invalid ICD-10 code format: {}", code)),
            None => RuleOutcome::Pass,
        }
    }
}

/// Billed amount must be positive and no more than [`MAX_BILLED_AMOUNT`]
#[derive(Debug, Clone, Copy, Default)]
pub struct AmountRule;

impl ValidationRule for AmountRule {
    fn name(&self) -> &'static str {
        "valid_amount"
    }

    fn description(&self) -> &'static str {
        "Claim amount must be positive and reasonable"
    }

    fn severity(&self) -> Severity {
        Severity::Error
    }

    fn evaluate(&self, claim: &ClaimData, _ctx: &EvaluationContext) -> RuleOutcome {
        let Some(amount) = parse_amount(&claim.billed_amount) else {
            return RuleOutcome::fail("Invalid amount format");
        };

        if !amount.is_positive() {
            return RuleOutcome::fail("Amount must be positive");
        }

        if amount.exceeds(MAX_BILLED_AMOUNT) {
            return RuleOutcome::fail("Amount exceeds maximum allowed");
        }

        RuleOutcome::Pass
    }
}

/// Service date must be in the past and at most one year old
#[derive(Debug, Clone, Copy, Default)]
pub struct ServiceDateRule;

impl ValidationRule for ServiceDateRule {
    fn name(&self) -> &'static str {
        "valid_service_date"
    }

    fn description(&self) -> &'static str {
        "Service date must be in the past and not too old"
    }

    fn severity(&self) -> Severity {
        Severity::Error
    }

    fn evaluate(&self, claim: &ClaimData, ctx: &EvaluationContext) -> RuleOutcome {
        if claim.service_date.is_empty() {
            return RuleOutcome::fail("Service date is required");
        }

        let parsed = ISO_DATE
            .is_match(&claim.service_date)
            .then(|| NaiveDate::parse_from_str(&claim.service_date, "%Y-%m-%d").ok())
            .flatten();
        let Some(date) = parsed else {
            return RuleOutcome::fail("Invalid service date format (YYYY-MM-DD)");
        };

        let service_start = date.and_time(NaiveTime::MIN).and_utc();
        if service_start > ctx.now {
            return RuleOutcome::fail("Service date cannot be in the future");
        }

        if service_start < one_year_before(ctx.now) {
            return RuleOutcome::fail("Service date cannot be more than 1 year old");
        }

        RuleOutcome::Pass
    }
}

/// Same wall-clock time one calendar year earlier
///
/// Feb 29 has no counterpart in the previous year and rolls over to Mar 1.
fn one_year_before(now: DateTime<Utc>) -> DateTime<Utc> {
    let today = now.date_naive();
    let year = today.year() - 1;
    NaiveDate::from_ymd_opt(year, today.month(), today.day())
        .or_else(|| NaiveDate::from_ymd_opt(year, 3, 1))
        .map_or(DateTime::<Utc>::MIN_UTC, |day| day.and_time(now.time()).and_utc())
}

/// Provider NPI must be exactly ten digits
///
/// The NPI check digit (a Luhn variant over the `80840` prefix) is not
/// verified.
#[derive(Debug, Clone, Copy, Default)]
pub struct NpiRule;

impl ValidationRule for NpiRule {
    fn name(&self) -> &'static str {
        "valid_npi"
    }

    fn description(&self) -> &'static str {
        "Provider NPI must be valid format"
    }

    fn severity(&self) -> Severity {
        Severity::Error
    }

    fn evaluate(&self, claim: &ClaimData, _ctx: &EvaluationContext) -> RuleOutcome {
        if claim.provider_npi.is_empty() {
            return RuleOutcome::fail("Provider NPI is required");
        }

        if !NPI.is_match(&claim.provider_npi) {
            return RuleOutcome::fail("Invalid NPI format (must be 10 digits)");
        }

        RuleOutcome::Pass
    }
}

/// All required fields must be present
#[derive(Debug, Clone, Copy, Default)]
pub struct RequiredFieldsRule;

impl RequiredFieldsRule {
    /// Names of the required fields missing from the claim, in canonical order
    pub fn missing_fields(claim: &ClaimData) -> Vec<&'static str> {
        [
            ("patient_id", claim.patient_id.is_empty()),
            ("provider_npi", claim.provider_npi.is_empty()),
            ("service_date", claim.service_date.is_empty()),
            ("procedure_codes", claim.procedure_codes.is_empty()),
            ("diagnosis_codes", claim.diagnosis_codes.is_empty()),
            ("billed_amount", claim.billed_amount.is_empty()),
            ("claim_type", claim.claim_type.is_empty()),
        ]
        .into_iter()
        .filter_map(|(field, missing)| missing.then_some(field))
        .collect()
    }
}

impl ValidationRule for RequiredFieldsRule {
    fn name(&self) -> &'static str {
        "has_required_fields"
    }

    fn description(&self) -> &'static str {
        "All required fields must be present"
    }

    fn severity(&self) -> Severity {
        Severity::Error
    }

    fn evaluate(&self, claim: &ClaimData, _ctx: &EvaluationContext) -> RuleOutcome {
        let missing = Self::missing_fields(claim);
        if missing.is_empty() {
            RuleOutcome::Pass
        } else {
            RuleOutcome::fail(format!("Missing required fields: {}", missing.join(", ")))
        }
    }
}

/// Flags claims whose average billed amount per procedure is unusually high
///
/// Passes when the amount does not parse (owned by `valid_amount`) or when no
/// procedure codes are present (owned by `valid_procedure_codes` and
/// `has_required_fields`).
#[derive(Debug, Clone, Copy, Default)]
pub struct AmountReasonablenessRule;

impl ValidationRule for AmountReasonablenessRule {
    fn name(&self) -> &'static str {
        "reasonable_amount_for_procedure"
    }

    fn description(&self) -> &'static str {
        "Amount should be reasonable for the procedures"
    }

    fn severity(&self) -> Severity {
        Severity::Warning
    }

    fn evaluate(&self, claim: &ClaimData, _ctx: &EvaluationContext) -> RuleOutcome {
        let Some(amount) = parse_amount(&claim.billed_amount) else {
            return RuleOutcome::Pass;
        };
        if claim.procedure_codes.is_empty() {
            return RuleOutcome::Pass;
        }

        let per_procedure = amount.per_procedure(claim.procedure_codes.len());
        if per_procedure.exceeds(MAX_AMOUNT_PER_PROCEDURE) {
            return RuleOutcome::fail(format!(
                "Amount seems high: ${} per procedure",
                per_procedure
            ));
        }

        RuleOutcome::Pass
    }
}

/// Diagnosis and procedure codes should be compatible
///
/// Only presence of both lists is checked; there is no CPT/ICD-10
/// compatibility matrix behind this rule.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiagnosisProcedureMatchRule;

impl ValidationRule for DiagnosisProcedureMatchRule {
    fn name(&self) -> &'static str {
        "diagnosis_procedure_match"
    }

    fn description(&self) -> &'static str {
        "Diagnosis and procedure codes should be compatible"
    }

    fn severity(&self) -> Severity {
        Severity::Warning
    }

    fn evaluate(&self, claim: &ClaimData, _ctx: &EvaluationContext) -> RuleOutcome {
        if claim.diagnosis_codes.is_empty() || claim.procedure_codes.is_empty() {
            return RuleOutcome::fail("Both diagnosis and procedure codes required");
        }

        RuleOutcome::Pass
    }
}
