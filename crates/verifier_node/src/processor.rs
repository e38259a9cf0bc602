//! Event-driven claim verification
//!
//! The [`EventProcessor`] consumes ledger claim events, fetches each claim's
//! payload, runs the validation engine over it and hands the verdict to a
//! decision sink.
//!
//! # Concurrency
//!
//! A single consumption task reads the subscription. Each `ClaimSubmitted`
//! event is processed on its own task, gated by a semaphore of
//! `max_in_flight` permits. When every permit is held the consumption task
//! waits, the bounded subscription channel fills, and the producer is slowed
//! down in turn. Events have no ordering relative to each other.
//!
//! # Per-event stages
//!
//! ```text
//! Received -> Fetched -> Validated -> Reported
//!     |
//!     +-> fetch failure: logged, event dropped
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use core_kernel::{HealthCheckResult, PortError, VerifierId};
use domain_claims::{ClaimData, ValidationEngine, ValidationResult};

use crate::error::ProcessorError;
use crate::event::ClaimEvent;
use crate::ports::{
    ClaimEventSource, ClaimStoragePort, DecisionRecord, DecisionSink, Subscription,
    SubscriptionMessage,
};

/// Default number of claim events validated at once.
pub const DEFAULT_MAX_IN_FLIGHT: usize = 32;

/// Largest pool a processor can run: the semaphore's limit, and `u32` for
/// [`EventProcessor::wait_idle`].
pub const MAX_IN_FLIGHT_LIMIT: usize = if Semaphore::MAX_PERMITS < u32::MAX as usize {
    Semaphore::MAX_PERMITS
} else {
    u32::MAX as usize
};

/// Default deadline for a single payload fetch.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings for an [`EventProcessor`]
#[derive(Debug, Clone, Copy)]
pub struct ProcessorConfig {
    pub verifier_id: VerifierId,
    pub max_in_flight: usize,
    /// A fetch still pending after this long fails with `PortError::Timeout`
    pub fetch_timeout: Duration,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            verifier_id: VerifierId::new(),
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }
}

/// Why the consumption loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// The cancellation token fired
    Cancelled,
    /// The subscription reported a failure
    SubscriptionFailed,
    /// The producer went away
    SourceClosed,
}

/// Processing stage of a single claim event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventStage {
    Received,
    Fetched,
    Validated,
    Reported,
}

impl fmt::Display for EventStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventStage::Received => "received",
            EventStage::Fetched => "fetched",
            EventStage::Validated => "validated",
            EventStage::Reported => "reported",
        };
        f.write_str(name)
    }
}

/// Consumes claim events and reports a verdict for each submitted claim
pub struct EventProcessor {
    engine: Arc<ValidationEngine>,
    storage: Arc<dyn ClaimStoragePort>,
    source: Arc<dyn ClaimEventSource>,
    sink: Arc<dyn DecisionSink>,
    verifier_id: VerifierId,
    permits: Arc<Semaphore>,
    max_in_flight: usize,
    fetch_timeout: Duration,
}

impl fmt::Debug for EventProcessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventProcessor")
            .field("verifier_id", &self.verifier_id)
            .field("max_in_flight", &self.max_in_flight)
            .field("fetch_timeout", &self.fetch_timeout)
            .field("available_permits", &self.permits.available_permits())
            .finish_non_exhaustive()
    }
}

impl EventProcessor {
    /// Wires a processor to its collaborators
    ///
    /// `max_in_flight` is clamped to `1..=MAX_IN_FLIGHT_LIMIT`.
    pub fn new(
        engine: Arc<ValidationEngine>,
        storage: Arc<dyn ClaimStoragePort>,
        source: Arc<dyn ClaimEventSource>,
        sink: Arc<dyn DecisionSink>,
        config: ProcessorConfig,
    ) -> Self {
        let max_in_flight = config.max_in_flight.clamp(1, MAX_IN_FLIGHT_LIMIT);
        Self {
            engine,
            storage,
            source,
            sink,
            verifier_id: config.verifier_id,
            permits: Arc::new(Semaphore::new(max_in_flight)),
            max_in_flight,
            fetch_timeout: config.fetch_timeout,
        }
    }

    pub fn verifier_id(&self) -> VerifierId {
        self.verifier_id
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight
    }

    /// Number of events currently being processed
    pub fn in_flight(&self) -> usize {
        self.max_in_flight - self.permits.available_permits()
    }

    /// Subscribes to the event source and spawns the consumption loop
    ///
    /// Returns once the loop is running. The loop stops when `cancel` fires,
    /// when the subscription fails, or when the source closes.
    ///
    /// # Errors
    ///
    /// Returns `ProcessorError::Subscribe` if the source refuses the
    /// subscription; nothing is spawned in that case.
    pub async fn start(
        self: &Arc<Self>,
        cancel: CancellationToken,
    ) -> Result<JoinHandle<LoopExit>, ProcessorError> {
        let subscription = self
            .source
            .subscribe()
            .await
            .map_err(ProcessorError::Subscribe)?;

        tracing::info!(
            verifier_id = %self.verifier_id,
            max_in_flight = self.max_in_flight,
            "Verification node started"
        );

        let processor = Arc::clone(self);
        Ok(tokio::spawn(async move {
            processor.run(subscription, cancel).await
        }))
    }

    /// Consumes a subscription until cancelled, failed, or closed
    ///
    /// Cancellation does not wait for in-flight events; their tasks observe
    /// the same token and abandon their work.
    pub async fn run(
        self: Arc<Self>,
        mut subscription: Subscription,
        cancel: CancellationToken,
    ) -> LoopExit {
        loop {
            let message = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::info!("Verification node stopping");
                    subscription.unsubscribe();
                    return LoopExit::Cancelled;
                }
                message = subscription.next() => message,
            };

            let event = match message {
                Some(SubscriptionMessage::Event(event)) => event,
                Some(SubscriptionMessage::Failed(error)) => {
                    tracing::error!(error = %error, "Claim event subscription failed");
                    return LoopExit::SubscriptionFailed;
                }
                None => {
                    tracing::info!("Claim event source closed");
                    return LoopExit::SourceClosed;
                }
            };

            if !event.is_submission() {
                tracing::debug!(
                    kind = %event.kind,
                    claim_id = %event.claim_id,
                    "Ignoring non-submission claim event"
                );
                continue;
            }

            let permit = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::info!("Verification node stopping");
                    subscription.unsubscribe();
                    return LoopExit::Cancelled;
                }
                permit = Arc::clone(&self.permits).acquire_owned() => match permit {
                    Ok(permit) => permit,
                    // The semaphore is never closed.
                    Err(_) => return LoopExit::Cancelled,
                },
            };

            let processor = Arc::clone(&self);
            let cancel = cancel.clone();
            tokio::spawn(async move {
                let _permit = permit;
                tokio::select! {
                    _ = cancel.cancelled() => {}
                    _ = processor.process_event(event) => {}
                }
            });
        }
    }

    /// Runs one claim event through fetch, validation and reporting
    ///
    /// Returns the stage the event reached. A fetch failure leaves the event
    /// at [`EventStage::Received`]; it is logged and not retried.
    pub async fn process_event(&self, event: ClaimEvent) -> EventStage {
        let span = tracing::info_span!(
            "claim_event",
            claim_id = %event.claim_id,
            provider = %event.provider,
        );

        async move {
            tracing::info!(
                stage = %EventStage::Received,
                storage_ref = %event.storage_ref,
                "Processing claim"
            );

            let claim = match self.fetch(&event.storage_ref).await {
                Ok(claim) => claim,
                Err(error) => {
                    tracing::error!(
                        storage_ref = %event.storage_ref,
                        error = %error,
                        "Failed to fetch claim data"
                    );
                    // TODO: submit a rejection to the ledger once the decision write exists
                    return EventStage::Received;
                }
            };

            tracing::debug!(stage = %EventStage::Fetched, "Claim payload retrieved");

            let result = self.engine.validate(&claim);
            tracing::info!(
                stage = %EventStage::Validated,
                approved = result.approved,
                score = result.score,
                reasons = ?result.reasons,
                risk_level = %result.risk_level,
                "Claim validated"
            );

            let record = DecisionRecord::new(self.verifier_id, event, result);
            self.sink.record(record).await;
            tracing::debug!(stage = %EventStage::Reported, "Claim decision reported");
            EventStage::Reported
        }
        .instrument(span)
        .await
    }

    /// Fetches a stored claim and validates it
    ///
    /// Used for manual re-validation outside the event stream.
    pub async fn validate_reference(
        &self,
        reference: &str,
    ) -> Result<ValidationResult, ProcessorError> {
        let claim = self
            .fetch(reference)
            .await
            .map_err(|source| ProcessorError::Fetch {
                reference: reference.to_string(),
                source,
            })?;

        Ok(self.engine.validate(&claim))
    }

    async fn fetch(&self, reference: &str) -> Result<ClaimData, PortError> {
        tokio::time::timeout(self.fetch_timeout, self.storage.retrieve_payload(reference))
            .await
            .unwrap_or_else(|_| Err(PortError::timeout("retrieve_payload", self.fetch_timeout)))
    }

    /// Validates claim data supplied directly by the caller
    pub fn validate_claim(&self, claim: &ClaimData) -> ValidationResult {
        self.engine.validate(claim)
    }

    /// Reports the health of the payload store
    pub async fn health_check(&self) -> HealthCheckResult {
        self.storage.health_check().await
    }

    /// Waits until no event is being processed
    pub async fn wait_idle(&self) {
        let Ok(permits) = u32::try_from(self.max_in_flight) else {
            return;
        };
        // Fails only on a closed semaphore.
        if let Ok(all) = self.permits.acquire_many(permits).await {
            drop(all);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{ChannelEventSource, InMemoryClaimStore, InMemoryDecisionSink};
    use core_kernel::Hash32;

    fn processor(
        store: Arc<InMemoryClaimStore>,
        sink: Arc<InMemoryDecisionSink>,
    ) -> Arc<EventProcessor> {
        let (source, _publisher) = ChannelEventSource::new(4);
        Arc::new(EventProcessor::new(
            Arc::new(ValidationEngine::standard()),
            store,
            Arc::new(source),
            sink,
            ProcessorConfig {
                max_in_flight: 2,
                ..ProcessorConfig::default()
            },
        ))
    }

    #[tokio::test]
    async fn test_fetch_failure_stops_at_received() {
        let sink = Arc::new(InMemoryDecisionSink::new());
        let processor = processor(Arc::new(InMemoryClaimStore::new()), Arc::clone(&sink));

        let event = ClaimEvent::submitted(Hash32::ZERO, "0xp", "missing");
        assert_eq!(processor.process_event(event).await, EventStage::Received);
        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn test_stored_claim_is_reported() {
        let store = Arc::new(InMemoryClaimStore::new());
        let sink = Arc::new(InMemoryDecisionSink::new());
        let reference = store.store(&ClaimData::default()).await.unwrap();
        let processor = processor(store, Arc::clone(&sink));

        let event = ClaimEvent::submitted(Hash32::ZERO, "0xp", reference);
        assert_eq!(processor.process_event(event).await, EventStage::Reported);

        let records = sink.records().await;
        assert_eq!(records.len(), 1);
        assert!(!records[0].result.valid);
        assert_eq!(records[0].verifier, processor.verifier_id());
    }

    #[test]
    fn test_zero_pool_size_is_raised_to_one() {
        let (source, _publisher) = ChannelEventSource::new(1);
        let processor = EventProcessor::new(
            Arc::new(ValidationEngine::standard()),
            Arc::new(InMemoryClaimStore::new()),
            Arc::new(source),
            Arc::new(InMemoryDecisionSink::new()),
            ProcessorConfig {
                max_in_flight: 0,
                ..ProcessorConfig::default()
            },
        );
        assert_eq!(processor.max_in_flight(), 1);
        assert_eq!(processor.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_oversized_pool_is_clamped() {
        let (source, _publisher) = ChannelEventSource::new(1);
        let processor = EventProcessor::new(
            Arc::new(ValidationEngine::standard()),
            Arc::new(InMemoryClaimStore::new()),
            Arc::new(source),
            Arc::new(InMemoryDecisionSink::new()),
            ProcessorConfig {
                max_in_flight: usize::MAX,
                ..ProcessorConfig::default()
            },
        );
        assert_eq!(processor.max_in_flight(), MAX_IN_FLIGHT_LIMIT);

        // Returns at once: every permit is free.
        processor.wait_idle().await;
        assert_eq!(processor.in_flight(), 0);
    }

    #[test]
    fn test_stage_names() {
        assert_eq!(EventStage::Fetched.to_string(), "fetched");
        assert_eq!(EventStage::Reported.to_string(), "reported");
    }
}
