//! Identifiers for verifier nodes and the decisions they issue
//!
//! Both wrap a UUID and render with a short tag (`VRF-…`, `DEC-…`) so log
//! lines and decision payloads say which kind of id they carry. Parsing
//! accepts the tagged form or a bare UUID and refuses the other kind's tag.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;
use uuid::Uuid;

/// Failure to parse a [`VerifierId`] or [`DecisionId`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdError {
    #[error("expected a {expected} identifier, got {found:?}")]
    WrongTag { expected: &'static str, found: String },

    #[error("decision ids must be time-ordered (UUIDv7), got version {0}")]
    NotTimeOrdered(usize),

    #[error("invalid identifier: {0}")]
    InvalidUuid(#[from] uuid::Error),
}

/// Strips `tag-` from `s`, or takes `s` as a bare UUID
fn parse_tagged(s: &str, tag: &'static str) -> Result<Uuid, IdError> {
    let body = match s.split_once('-') {
        // A UUID's first group is eight hex digits, never three letters.
        Some((head, rest)) if head.len() == 3 && head.bytes().all(|b| b.is_ascii_uppercase()) => {
            if head != tag {
                return Err(IdError::WrongTag {
                    expected: tag,
                    found: s.to_string(),
                });
            }
            rest
        }
        _ => s,
    };
    Ok(Uuid::parse_str(body)?)
}

/// Identity of a verifier node
///
/// Generated once at startup unless configured, then stamped on every
/// decision the node records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VerifierId(Uuid);

impl VerifierId {
    pub const TAG: &'static str = "VRF";

    /// Creates a random verifier identity
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for VerifierId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for VerifierId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", Self::TAG, self.0)
    }
}

impl FromStr for VerifierId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_tagged(s, Self::TAG).map(Self)
    }
}

/// Identifier of one recorded decision
///
/// Always a UUIDv7: ids sort by the millisecond they were issued in, and the
/// issue time can be read back with [`issued_at`](Self::issued_at).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DecisionId(Uuid);

impl DecisionId {
    pub const TAG: &'static str = "DEC";

    /// Issues a decision id stamped with the current time
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Time the id was issued, to the millisecond
    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        let (secs, nanos) = self.0.get_timestamp()?.to_unix();
        DateTime::from_timestamp(i64::try_from(secs).ok()?, nanos)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for DecisionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DecisionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", Self::TAG, self.0)
    }
}

impl FromStr for DecisionId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let uuid = parse_tagged(s, Self::TAG)?;
        match uuid.get_version_num() {
            7 => Ok(Self(uuid)),
            other => Err(IdError::NotTimeOrdered(other)),
        }
    }
}

// Both ids travel in their tagged display form.

impl Serialize for VerifierId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for VerifierId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer)?
            .parse()
            .map_err(de::Error::custom)
    }
}

impl Serialize for DecisionId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DecisionId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer)?
            .parse()
            .map_err(de::Error::custom)
    }
}
