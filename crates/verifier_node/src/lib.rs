//! Claims Verifier Node
//!
//! Listens for claim submissions on the ledger, validates each submitted
//! claim with the [`domain_claims`] engine and records a decision.
//!
//! # Components
//!
//! - [`processor::EventProcessor`]: subscription loop and bounded worker pool
//! - [`ports`]: collaborator contracts (payload storage, event source, decision sink)
//! - [`adapters`]: in-process implementations of those contracts
//! - [`config::VerifierConfig`]: environment-driven settings
//!
//! # Example
//!
//! ```rust,ignore
//! let (source, publisher) = ChannelEventSource::new(config.event_buffer);
//! let processor = Arc::new(EventProcessor::new(
//!     Arc::new(ValidationEngine::standard()),
//!     Arc::new(FileClaimStore::new(&config.payload_dir)),
//!     Arc::new(source),
//!     Arc::new(LoggingDecisionSink),
//!     config.processor(),
//! ));
//! let handle = processor.start(cancel.clone()).await?;
//! publisher.publish(event).await?;
//! ```

pub mod adapters;
pub mod config;
pub mod error;
pub mod event;
pub mod ports;
pub mod processor;
pub mod telemetry;

pub use config::{LogFormat, VerifierConfig};
pub use error::ProcessorError;
pub use event::{ClaimEvent, ClaimEventKind};
pub use ports::{
    ClaimEventSource, ClaimStoragePort, DecisionRecord, DecisionSink, Subscription,
    SubscriptionMessage,
};
pub use processor::{
    EventProcessor, EventStage, LoopExit, ProcessorConfig, DEFAULT_FETCH_TIMEOUT,
    DEFAULT_MAX_IN_FLIGHT, MAX_IN_FLIGHT_LIMIT,
};
