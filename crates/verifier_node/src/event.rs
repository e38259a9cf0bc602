//! Ledger claim events

use std::fmt;

use core_kernel::Hash32;
use serde::{Deserialize, Serialize};

/// Claim lifecycle events emitted by the claims ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClaimEventKind {
    /// A provider submitted a new claim; the only kind the verifier acts on
    ClaimSubmitted,
    ClaimApproved,
    ClaimRejected,
    ClaimDisputed,
}

impl fmt::Display for ClaimEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ClaimEventKind::ClaimSubmitted => "ClaimSubmitted",
            ClaimEventKind::ClaimApproved => "ClaimApproved",
            ClaimEventKind::ClaimRejected => "ClaimRejected",
            ClaimEventKind::ClaimDisputed => "ClaimDisputed",
        };
        f.write_str(name)
    }
}

/// A parsed ledger notification about one claim
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimEvent {
    pub kind: ClaimEventKind,
    /// Ledger claim identifier
    pub claim_id: Hash32,
    /// Ledger address of the submitting provider
    pub provider: String,
    /// Integrity hash of the stored payload
    pub data_hash: Hash32,
    /// Content identifier of the stored claim payload
    pub storage_ref: String,
    /// Claimed amount in the ledger's smallest unit
    pub amount: u128,
    pub block_number: u64,
    pub tx_hash: String,
}

impl ClaimEvent {
    /// Creates a `ClaimSubmitted` event for the given claim and payload reference
    pub fn submitted(
        claim_id: Hash32,
        provider: impl Into<String>,
        storage_ref: impl Into<String>,
    ) -> Self {
        Self {
            kind: ClaimEventKind::ClaimSubmitted,
            claim_id,
            provider: provider.into(),
            data_hash: Hash32::ZERO,
            storage_ref: storage_ref.into(),
            amount: 0,
            block_number: 0,
            tx_hash: String::new(),
        }
    }

    /// Sets the payload integrity hash
    pub fn with_data_hash(mut self, data_hash: Hash32) -> Self {
        self.data_hash = data_hash;
        self
    }

    /// Sets the claimed amount
    pub fn with_amount(mut self, amount: u128) -> Self {
        self.amount = amount;
        self
    }

    /// Sets the ledger position
    pub fn at_block(mut self, block_number: u64, tx_hash: impl Into<String>) -> Self {
        self.block_number = block_number;
        self.tx_hash = tx_hash.into();
        self
    }

    pub fn is_submission(&self) -> bool {
        self.kind == ClaimEventKind::ClaimSubmitted
    }
}
