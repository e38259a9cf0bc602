//! Verifier Collaborator Ports
//!
//! The verifier consumes three collaborators through narrow contracts:
//!
//! - **`ClaimStoragePort`**: retrieves a claim payload by storage reference
//! - **`ClaimEventSource`**: produces the live stream of ledger claim events
//! - **`DecisionSink`**: records the verdict reached for a claim event
//!
//! # Usage
//!
//! ```rust,ignore
//! use verifier_node::ports::ClaimStoragePort;
//! use std::sync::Arc;
//!
//! let storage: Arc<dyn ClaimStoragePort> = Arc::new(InMemoryClaimStore::new());
//! let claim = storage.retrieve_payload("bafy...").await?;
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use core_kernel::{DecisionId, DomainPort, HealthCheckable, PortError, VerifierId};
use domain_claims::{ClaimData, ClaimDecision, ValidationResult};

use crate::event::ClaimEvent;

/// Content-addressed claim payload storage
///
/// Failures are `PortError::NotFound` when nothing is stored under the
/// reference, `PortError::Connection` for transport problems, and
/// `PortError::Transformation` when the stored bytes do not decode to a claim.
#[async_trait]
pub trait ClaimStoragePort: DomainPort + HealthCheckable {
    /// Retrieves and decodes the claim payload stored under `reference`
    async fn retrieve_payload(&self, reference: &str) -> Result<ClaimData, PortError>;
}

/// One item delivered by a subscription
#[derive(Debug)]
pub enum SubscriptionMessage {
    /// A ledger claim event
    Event(ClaimEvent),
    /// The subscription itself has died; no further messages follow
    Failed(PortError),
}

/// A live subscription to ledger claim events
///
/// Messages arrive on a bounded channel; the bound is the queue-depth limit
/// of the pipeline. Dropping or unsubscribing stops the producer.
#[derive(Debug)]
pub struct Subscription {
    receiver: mpsc::Receiver<SubscriptionMessage>,
    stop: CancellationToken,
}

impl Subscription {
    /// Wraps a receiver and the token its producer watches
    pub fn new(receiver: mpsc::Receiver<SubscriptionMessage>, stop: CancellationToken) -> Self {
        Self { receiver, stop }
    }

    /// Waits for the next message; `None` once the producer has gone away
    pub async fn next(&mut self) -> Option<SubscriptionMessage> {
        self.receiver.recv().await
    }

    /// Signals the producer to stop and closes the channel
    pub fn unsubscribe(mut self) {
        self.stop.cancel();
        self.receiver.close();
    }

    /// Returns true if the producer has been told to stop
    pub fn is_unsubscribed(&self) -> bool {
        self.stop.is_cancelled()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.stop.cancel();
    }
}

/// Source of ledger claim events
#[async_trait]
pub trait ClaimEventSource: DomainPort {
    /// Opens a subscription to claim events
    async fn subscribe(&self) -> Result<Subscription, PortError>;
}

/// The verdict reached by a verifier for one claim event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub id: DecisionId,
    pub verifier: VerifierId,
    pub event: ClaimEvent,
    pub result: ValidationResult,
    pub decision: ClaimDecision,
    /// Failure reasons joined with `"; "`, empty when approved
    pub reason: String,
    pub decided_at: DateTime<Utc>,
}

impl DecisionRecord {
    /// Builds the record for a verdict reached now
    pub fn new(verifier: VerifierId, event: ClaimEvent, result: ValidationResult) -> Self {
        let decision = result.decision();
        let reason = if result.approved {
            String::new()
        } else {
            result.reasons.join("; ")
        };

        let id = DecisionId::new();
        Self {
            id,
            verifier,
            event,
            result,
            decision,
            reason,
            decided_at: id.issued_at().unwrap_or_else(Utc::now),
        }
    }
}

/// Destination for verifier decisions
///
/// Recording is not a failure point of the pipeline: implementations deal
/// with their own delivery problems.
#[async_trait]
pub trait DecisionSink: DomainPort {
    /// Records one decision
    async fn record(&self, decision: DecisionRecord);
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::Hash32;

    #[test]
    fn test_decision_record_for_rejection_joins_reasons() {
        let result = ValidationResult::from_failures(
            vec!["valid_npi: bad".to_string(), "valid_amount: bad".to_string()],
            vec![],
        );
        let event = ClaimEvent::submitted(Hash32::ZERO, "0xp", "ref");
        let record = DecisionRecord::new(VerifierId::new(), event, result);

        assert_eq!(record.decision, ClaimDecision::Reject);
        assert_eq!(record.reason, "valid_npi: bad; valid_amount: bad");
    }

    #[test]
    fn test_decision_record_for_approval_has_no_reason() {
        let result = ValidationResult::from_failures(vec![], vec!["w: x".to_string()]);
        let event = ClaimEvent::submitted(Hash32::ZERO, "0xp", "ref");
        let record = DecisionRecord::new(VerifierId::new(), event, result);

        assert_eq!(record.decision, ClaimDecision::Approve);
        assert!(record.reason.is_empty());
        assert_eq!(record.id.issued_at(), Some(record.decided_at));
    }

    #[tokio::test]
    async fn test_unsubscribe_cancels_producer_token() {
        let (_tx, rx) = mpsc::channel(1);
        let token = CancellationToken::new();
        let subscription = Subscription::new(rx, token.clone());

        subscription.unsubscribe();

        assert!(token.is_cancelled());
    }
}
