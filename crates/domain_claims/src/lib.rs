//! Claims Verification Domain
//!
//! This crate owns the decision logic applied to submitted healthcare claims:
//! the rule set, the registry that orders it, and the engine that turns rule
//! outcomes into a scored verdict.
//!
//! # Verification Flow
//!
//! ```text
//! ClaimData -> RuleRegistry (every rule runs) -> ValidationResult -> Approve/Reject/Review
//! ```
//!
//! Everything here is synchronous and free of I/O; fetching payloads and
//! consuming ledger events belongs to the verifier node.

pub mod claim;
pub mod rules;
pub mod registry;
pub mod engine;
pub mod error;

pub use claim::ClaimData;
pub use rules::{EvaluationContext, RuleOutcome, Severity, ValidationRule};
pub use registry::RuleRegistry;
pub use engine::{ClaimDecision, RiskLevel, ValidationEngine, ValidationResult};
pub use error::ClaimError;
