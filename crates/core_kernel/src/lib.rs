//! Core Kernel - Foundational types shared by the claims verifier crates
//!
//! This crate provides the building blocks used across the workspace:
//! - Port error taxonomy and health-check contracts for collaborator adapters
//! - Strongly-typed identifiers for verifier-issued records
//! - Fixed-width ledger hashes (claim ids, data hashes)

pub mod error;
pub mod hash;
pub mod identifiers;
pub mod ports;

pub use error::CoreError;
pub use hash::{Hash32, HashError};
pub use identifiers::{DecisionId, IdError, VerifierId};
pub use ports::{
    AdapterHealth, DomainPort, HealthCheckResult, HealthCheckable, PortError,
};
