//! Test Data Builders
//!
//! Provides builder patterns for constructing test data with sensible defaults.
//! These builders allow tests to specify only the relevant fields while using
//! defaults for everything else.

use chrono::{DateTime, Days, Utc};
use domain_claims::ClaimData;

use crate::fixtures::{DateFixtures, StringFixtures};

/// Builder for claim payloads
///
/// Starts from a claim that passes every built-in rule when validated at
/// the builder's reference time.
#[derive(Debug, Clone)]
pub struct ClaimDataBuilder {
    claim: ClaimData,
}

impl Default for ClaimDataBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ClaimDataBuilder {
    /// Creates a builder whose service date is yesterday relative to now
    pub fn new() -> Self {
        Self::as_of(Utc::now())
    }

    /// Creates a builder whose service date is the day before `now`
    pub fn as_of(now: DateTime<Utc>) -> Self {
        Self {
            claim: ClaimData {
                patient_id: StringFixtures::patient_id().to_string(),
                patient_dob_hash: StringFixtures::dob_hash().to_string(),
                provider_npi: StringFixtures::npi().to_string(),
                facility_id: None,
                service_date: DateFixtures::date_string(now - Days::new(1)),
                procedure_codes: vec!["99213".to_string(), "99214-25".to_string()],
                diagnosis_codes: vec!["E11.9".to_string()],
                place_of_service: "11".to_string(),
                billed_amount: "150.00".to_string(),
                claim_type: "professional".to_string(),
                ..Default::default()
            },
        }
    }

    /// Starts from an entirely empty claim
    pub fn empty() -> Self {
        Self {
            claim: ClaimData::default(),
        }
    }

    pub fn with_patient_id(mut self, patient_id: impl Into<String>) -> Self {
        self.claim.patient_id = patient_id.into();
        self
    }

    pub fn with_npi(mut self, npi: impl Into<String>) -> Self {
        self.claim.provider_npi = npi.into();
        self
    }

    pub fn with_facility(mut self, facility_id: impl Into<String>) -> Self {
        self.claim.facility_id = Some(facility_id.into());
        self
    }

    /// Sets the service date from a `YYYY-MM-DD` (or deliberately malformed) string
    pub fn with_service_date(mut self, service_date: impl Into<String>) -> Self {
        self.claim.service_date = service_date.into();
        self
    }

    /// Sets the service date to the calendar day of `at`
    pub fn with_service_date_at(mut self, at: DateTime<Utc>) -> Self {
        self.claim.service_date = DateFixtures::date_string(at);
        self
    }

    /// Replaces the procedure codes
    pub fn with_procedures<I, S>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.claim.procedure_codes = codes.into_iter().map(Into::into).collect();
        self
    }

    /// Replaces the diagnosis codes
    pub fn with_diagnoses<I, S>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.claim.diagnosis_codes = codes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_billed_amount(mut self, amount: impl Into<String>) -> Self {
        self.claim.billed_amount = amount.into();
        self
    }

    pub fn with_claim_type(mut self, claim_type: impl Into<String>) -> Self {
        self.claim.claim_type = claim_type.into();
        self
    }

    pub fn with_supporting_document(mut self, reference: impl Into<String>) -> Self {
        self.claim.supporting_documents.push(reference.into());
        self
    }

    /// Marks fields as encrypted under the given key
    pub fn encrypted_with(mut self, key_id: impl Into<String>, fields: &[&str]) -> Self {
        self.claim.encryption_key_id = Some(key_id.into());
        self.claim.encrypted_fields = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn submitted_at(mut self, at: DateTime<Utc>) -> Self {
        self.claim = self.claim.stamp_submission(at);
        self
    }

    /// Clears the named field; unknown names are ignored
    pub fn without(mut self, field: &str) -> Self {
        match field {
            "patient_id" => self.claim.patient_id.clear(),
            "provider_npi" => self.claim.provider_npi.clear(),
            "service_date" => self.claim.service_date.clear(),
            "procedure_codes" => self.claim.procedure_codes.clear(),
            "diagnosis_codes" => self.claim.diagnosis_codes.clear(),
            "billed_amount" => self.claim.billed_amount.clear(),
            "claim_type" => self.claim.claim_type.clear(),
            "place_of_service" => self.claim.place_of_service.clear(),
            _ => {}
        }
        self
    }

    pub fn build(self) -> ClaimData {
        self.claim
    }

    /// Builds the claim and encodes it as stored JSON
    pub fn build_json(self) -> Vec<u8> {
        serde_json::to_vec(&self.claim).expect("claim data always serializes")
    }
}
