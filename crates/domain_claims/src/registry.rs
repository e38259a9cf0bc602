//! Ordered registry of validation rules

use std::fmt;

use crate::error::ClaimError;
use crate::rules::{
    AmountReasonablenessRule, AmountRule, DiagnosisCodesRule, DiagnosisProcedureMatchRule,
    NpiRule, ProcedureCodesRule, RequiredFieldsRule, ServiceDateRule, ValidationRule,
};

/// An ordered set of uniquely named rules
///
/// Iteration order is registration order and is what orders the reasons and
/// warnings of a validation result. The registry is immutable once handed to
/// an engine.
#[derive(Default)]
pub struct RuleRegistry {
    rules: Vec<Box<dyn ValidationRule>>,
}

impl RuleRegistry {
    /// Creates a registry with no rules
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates the standard claim verification rule set
    pub fn standard() -> Self {
        let rules: Vec<Box<dyn ValidationRule>> = vec![
            Box::new(ProcedureCodesRule),
            Box::new(DiagnosisCodesRule),
            Box::new(AmountRule),
            Box::new(ServiceDateRule),
            Box::new(NpiRule),
            Box::new(RequiredFieldsRule),
            Box::new(AmountReasonablenessRule),
            Box::new(DiagnosisProcedureMatchRule),
        ];
        Self { rules }
    }

    /// Appends a rule
    ///
    /// # Errors
    ///
    /// Returns `ClaimError::DuplicateRule` if a rule with the same name is
    /// already registered.
    pub fn register(&mut self, rule: impl ValidationRule + 'static) -> Result<(), ClaimError> {
        if self.get(rule.name()).is_some() {
            return Err(ClaimError::DuplicateRule(rule.name().to_string()));
        }
        self.rules.push(Box::new(rule));
        Ok(())
    }

    /// Builder-style variant of [`register`](Self::register)
    pub fn with_rule(mut self, rule: impl ValidationRule + 'static) -> Result<Self, ClaimError> {
        self.register(rule)?;
        Ok(self)
    }

    /// Looks up a rule by name
    pub fn get(&self, name: &str) -> Option<&dyn ValidationRule> {
        self.rules
            .iter()
            .find(|rule| rule.name() == name)
            .map(|rule| rule.as_ref())
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn ValidationRule> {
        self.rules.iter().map(|rule| rule.as_ref())
    }

    /// Rule names in evaluation order
    pub fn names(&self) -> Vec<&'static str> {
        self.iter().map(|rule| rule.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
