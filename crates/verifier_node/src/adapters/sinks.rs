//! Decision sinks

use async_trait::async_trait;
use tokio::sync::{watch, Mutex};

use core_kernel::DomainPort;

use crate::ports::{DecisionRecord, DecisionSink};

/// Writes every decision to the tracing log
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingDecisionSink;

impl DomainPort for LoggingDecisionSink {}

#[async_trait]
impl DecisionSink for LoggingDecisionSink {
    async fn record(&self, decision: DecisionRecord) {
        tracing::info!(
            decision_id = %decision.id,
            verifier = %decision.verifier,
            claim_id = %decision.event.claim_id,
            decision = ?decision.decision,
            score = decision.result.score,
            risk_level = %decision.result.risk_level,
            reason = %decision.reason,
            "Claim decision recorded"
        );
    }
}

/// Keeps decisions in memory so callers can inspect them
#[derive(Debug)]
pub struct InMemoryDecisionSink {
    records: Mutex<Vec<DecisionRecord>>,
    count: watch::Sender<usize>,
}

impl Default for InMemoryDecisionSink {
    fn default() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            count: watch::Sender::new(0),
        }
    }
}

impl InMemoryDecisionSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of every decision recorded so far
    pub async fn records(&self) -> Vec<DecisionRecord> {
        self.records.lock().await.clone()
    }

    pub fn len(&self) -> usize {
        *self.count.borrow()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Waits until at least `n` decisions have been recorded
    pub async fn wait_for(&self, n: usize) {
        let mut count = self.count.subscribe();
        // The sender lives in `self`, so the channel cannot close while borrowed.
        let _ = count.wait_for(|recorded| *recorded >= n).await;
    }
}

impl DomainPort for InMemoryDecisionSink {}

#[async_trait]
impl DecisionSink for InMemoryDecisionSink {
    async fn record(&self, decision: DecisionRecord) {
        let mut records = self.records.lock().await;
        records.push(decision);
        self.count.send_replace(records.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::ClaimEvent;
    use core_kernel::{Hash32, VerifierId};
    use domain_claims::ValidationResult;
    use std::sync::Arc;
    use std::time::Duration;

    fn record() -> DecisionRecord {
        DecisionRecord::new(
            VerifierId::new(),
            ClaimEvent::submitted(Hash32::ZERO, "0xp", "ref"),
            ValidationResult::from_failures(vec![], vec![]),
        )
    }

    #[tokio::test]
    async fn test_wait_for_returns_once_enough_recorded() {
        let sink = Arc::new(InMemoryDecisionSink::new());

        let writer = {
            let sink = Arc::clone(&sink);
            tokio::spawn(async move {
                sink.record(record()).await;
                sink.record(record()).await;
            })
        };

        tokio::time::timeout(Duration::from_secs(5), sink.wait_for(2))
            .await
            .expect("decisions never arrived");
        writer.await.unwrap();

        assert_eq!(sink.len(), 2);
        assert_eq!(sink.records().await.len(), 2);
    }

    #[tokio::test]
    async fn test_logging_sink_accepts_records() {
        LoggingDecisionSink.record(record()).await;
    }
}
