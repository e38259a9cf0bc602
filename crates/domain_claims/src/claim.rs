//! Claim payload under evaluation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ClaimError;

/// The off-ledger claim payload retrieved from content-addressed storage
///
/// Patient identifiers arrive already hashed; the engine never interprets
/// them beyond presence checks. Monetary amounts are kept as the decimal
/// strings the provider submitted so that format problems surface as rule
/// failures rather than deserialization errors.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClaimData {
    /// Hashed patient identifier
    pub patient_id: String,
    /// Hashed date of birth used for identity verification
    pub patient_dob_hash: String,

    /// National Provider Identifier (10 digits)
    pub provider_npi: String,
    /// Facility identifier, if the service was rendered at a facility
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facility_id: Option<String>,

    /// Date of service (`YYYY-MM-DD`)
    pub service_date: String,
    /// CPT procedure codes, in submission order
    pub procedure_codes: Vec<String>,
    /// ICD-10 diagnosis codes, in submission order
    pub diagnosis_codes: Vec<String>,
    /// Place-of-service code
    pub place_of_service: String,

    pub billed_amount: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub allowed_amount: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub copay_amount: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub deductible_amount: String,

    /// Storage references of supporting documents
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub supporting_documents: Vec<String>,

    /// Epoch seconds, set by the ingesting boundary
    pub submission_timestamp: i64,
    /// Claim category (professional, institutional, ...)
    pub claim_type: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub encryption_key_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub encrypted_fields: Vec<String>,
}

impl ClaimData {
    /// Decodes a claim from its stored JSON form
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, ClaimError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Encodes the claim in its stored JSON form
    pub fn to_json_vec(&self) -> Result<Vec<u8>, ClaimError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Stamps the submission time; called by the ingesting boundary, never by the submitter
    pub fn stamp_submission(mut self, at: DateTime<Utc>) -> Self {
        self.submission_timestamp = at.timestamp();
        self
    }

    /// Returns the submission time, if one has been stamped
    pub fn submitted_at(&self) -> Option<DateTime<Utc>> {
        if self.submission_timestamp == 0 {
            return None;
        }
        DateTime::from_timestamp(self.submission_timestamp, 0)
    }

    /// Returns true if any fields are declared as encrypted at rest
    pub fn has_encrypted_fields(&self) -> bool {
        !self.encrypted_fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_missing_fields_deserialize_as_empty() {
        let claim: ClaimData = serde_json::from_str(r#"{"patient_id":"p-1"}"#).unwrap();
        assert_eq!(claim.patient_id, "p-1");
        assert!(claim.provider_npi.is_empty());
        assert!(claim.procedure_codes.is_empty());
        assert!(claim.facility_id.is_none());
        assert_eq!(claim.submission_timestamp, 0);
    }

    #[test]
    fn test_optional_fields_omitted_when_empty() {
        let json = serde_json::to_value(ClaimData::default()).unwrap();
        assert!(json.get("facility_id").is_none());
        assert!(json.get("copay_amount").is_none());
        assert!(json.get("supporting_documents").is_none());
        assert!(json.get("billed_amount").is_some());
    }

    #[test]
    fn test_from_json_slice_rejects_garbage() {
        let err = ClaimData::from_json_slice(b"not json").unwrap_err();
        assert!(matches!(err, ClaimError::InvalidPayload(_)));
    }

    #[test]
    fn test_stamp_submission() {
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let claim = ClaimData::default().stamp_submission(at);
        assert_eq!(claim.submission_timestamp, at.timestamp());
        assert_eq!(claim.submitted_at(), Some(at));
        assert_eq!(ClaimData::default().submitted_at(), None);
    }
}
