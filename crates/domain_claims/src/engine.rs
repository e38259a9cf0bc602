//! Validation Engine
//!
//! Runs every rule of a [`RuleRegistry`] against a claim and folds the
//! outcomes into a scored [`ValidationResult`].
//!
//! # Scoring
//!
//! ```text
//! score = max(0, 100 - 15 * errors - 5 * warnings)
//! valid    = errors == 0
//! approved = valid && score >= 60
//! ```
//!
//! # Risk Classification
//!
//! Evaluated in priority order:
//!
//! 1. `high` if any error rule failed or the score is below 50
//! 2. `medium` if more than one warning rule failed or the score is below 80
//! 3. `low` otherwise
//!
//! # Example
//!
//! ```rust,ignore
//! use domain_claims::{ClaimData, ValidationEngine};
//!
//! let engine = ValidationEngine::standard();
//! let result = engine.validate(&claim);
//! if !result.approved {
//!     for reason in &result.reasons {
//!         println!("{reason}");
//!     }
//! }
//! ```

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::claim::ClaimData;
use crate::registry::RuleRegistry;
use crate::rules::{EvaluationContext, RuleOutcome, Severity};

/// Score every claim starts from
pub const BASE_SCORE: f64 = 100.0;
/// Score deducted per failed error-severity rule
pub const ERROR_PENALTY: f64 = 15.0;
/// Score deducted per failed warning-severity rule
pub const WARNING_PENALTY: f64 = 5.0;
/// Minimum score for a valid claim to be approved
pub const APPROVAL_THRESHOLD: f64 = 60.0;

const HIGH_RISK_BELOW: f64 = 50.0;
const MEDIUM_RISK_BELOW: f64 = 80.0;

/// Coarse summary of a verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Classifies a verdict from its failure counts and score
    ///
    /// # Arguments
    ///
    /// * `errors` - Number of failed error-severity rules
    /// * `warnings` - Number of failed warning-severity rules
    /// * `score` - The computed score
    pub fn classify(errors: usize, warnings: usize, score: f64) -> Self {
        if errors > 0 || score < HIGH_RISK_BELOW {
            RiskLevel::High
        } else if warnings > 1 || score < MEDIUM_RISK_BELOW {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What should happen to a claim given its verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimDecision {
    /// Valid and scored at or above the approval threshold
    Approve,
    /// At least one error-severity rule failed
    Reject,
    /// Valid, but scored below the approval threshold
    Review,
}

/// The verdict for one claim
///
/// Built fresh for every validation call; the engine never stores it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// True iff no error-severity rule failed
    pub valid: bool,
    /// True iff valid and the score reached the approval threshold
    pub approved: bool,
    /// Score in `[0, 100]`
    pub score: f64,
    /// `"<rule>: <message>"` for each failed error rule, in registry order
    pub reasons: Vec<String>,
    /// `"<rule>: <message>"` for each failed warning rule, in registry order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    pub risk_level: RiskLevel,
}

impl ValidationResult {
    /// Builds a verdict from collected failure messages
    ///
    /// # Arguments
    ///
    /// * `reasons` - Failure strings from error-severity rules
    /// * `warnings` - Failure strings from warning-severity rules
    pub fn from_failures(reasons: Vec<String>, warnings: Vec<String>) -> Self {
        let errors = reasons.len();
        let warned = warnings.len();

        let score = (BASE_SCORE - ERROR_PENALTY * errors as f64 - WARNING_PENALTY * warned as f64)
            .max(0.0);
        let valid = errors == 0;

        Self {
            valid,
            approved: valid && score >= APPROVAL_THRESHOLD,
            score,
            reasons,
            warnings,
            risk_level: RiskLevel::classify(errors, warned, score),
        }
    }

    pub fn error_count(&self) -> usize {
        self.reasons.len()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    /// Maps the verdict onto approve / reject / review
    pub fn decision(&self) -> ClaimDecision {
        if self.approved {
            ClaimDecision::Approve
        } else if !self.valid {
            ClaimDecision::Reject
        } else {
            ClaimDecision::Review
        }
    }
}

/// Runs a fixed rule registry against claims
///
/// The engine holds no mutable state, so a single instance can be shared
/// behind an `Arc` by any number of concurrent callers.
#[derive(Debug)]
pub struct ValidationEngine {
    registry: RuleRegistry,
}

impl ValidationEngine {
    /// Creates an engine over the given registry
    pub fn new(registry: RuleRegistry) -> Self {
        Self { registry }
    }

    /// Creates an engine over [`RuleRegistry::standard`]
    pub fn standard() -> Self {
        Self::new(RuleRegistry::standard())
    }

    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    /// Validates a claim against the current time
    pub fn validate(&self, claim: &ClaimData) -> ValidationResult {
        self.validate_with(claim, &EvaluationContext::current())
    }

    /// Validates a claim as of a fixed instant
    ///
    /// Two calls with the same claim and instant produce identical results.
    ///
    /// # Arguments
    ///
    /// * `claim` - The claim to validate
    /// * `now` - The instant date-relative rules are evaluated against
    pub fn validate_at(&self, claim: &ClaimData, now: DateTime<Utc>) -> ValidationResult {
        self.validate_with(claim, &EvaluationContext::at(now))
    }

    /// Validates a claim with an explicit evaluation context
    ///
    /// Every rule runs; an earlier failure never prevents a later rule from
    /// being evaluated.
    pub fn validate_with(&self, claim: &ClaimData, ctx: &EvaluationContext) -> ValidationResult {
        let mut reasons = Vec::new();
        let mut warnings = Vec::new();

        for rule in self.registry.iter() {
            if let RuleOutcome::Fail(message) = rule.evaluate(claim, ctx) {
                let entry = format!("{}: {}", rule.name(), message);
                match rule.severity() {
                    Severity::Error => reasons.push(entry),
                    Severity::Warning => warnings.push(entry),
                }
            }
        }

        let result = ValidationResult::from_failures(reasons, warnings);

        tracing::debug!(
            valid = result.valid,
            approved = result.approved,
            score = result.score,
            errors = result.error_count(),
            warnings = result.warning_count(),
            risk_level = %result.risk_level,
            "Claim validated"
        );

        result
    }
}

impl Default for ValidationEngine {
    fn default() -> Self {
        Self::standard()
    }
}
