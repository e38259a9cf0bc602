//! In-process claim event source backed by a bounded `tokio::sync::mpsc` channel
//!
//! [`ChannelEventSource`] hands out a single [`Subscription`]; the paired
//! [`ChannelEventPublisher`] feeds it. A real ledger client plays the
//! publisher role by pushing parsed log entries.

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;

use core_kernel::{DomainPort, PortError};

use crate::event::ClaimEvent;
use crate::ports::{ClaimEventSource, Subscription, SubscriptionMessage};

/// Default buffer capacity for the event channel.
pub const DEFAULT_EVENT_BUFFER: usize = 100;

/// Event source that yields whatever its publisher sends
#[derive(Debug)]
pub struct ChannelEventSource {
    receiver: Mutex<Option<mpsc::Receiver<SubscriptionMessage>>>,
    stop: CancellationToken,
}

/// Sending half of a [`ChannelEventSource`]
#[derive(Debug, Clone)]
pub struct ChannelEventPublisher {
    sender: mpsc::Sender<SubscriptionMessage>,
    stop: CancellationToken,
}

impl ChannelEventSource {
    /// Creates a source whose channel holds at most `capacity` undelivered messages
    ///
    /// When the buffer is full, [`ChannelEventPublisher::publish`] waits.
    pub fn new(capacity: usize) -> (Self, ChannelEventPublisher) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let stop = CancellationToken::new();

        let source = Self {
            receiver: Mutex::new(Some(receiver)),
            stop: stop.clone(),
        };
        let publisher = ChannelEventPublisher { sender, stop };

        (source, publisher)
    }
}

impl DomainPort for ChannelEventSource {}

#[async_trait]
impl ClaimEventSource for ChannelEventSource {
    async fn subscribe(&self) -> Result<Subscription, PortError> {
        let receiver = self
            .receiver
            .lock()
            .await
            .take()
            .ok_or_else(|| PortError::ServiceUnavailable {
                service: "claim event channel (already subscribed)".to_string(),
            })?;

        Ok(Subscription::new(receiver, self.stop.clone()))
    }
}

impl ChannelEventPublisher {
    /// Publishes an event, waiting for buffer space if necessary
    ///
    /// # Errors
    ///
    /// Returns `PortError::ServiceUnavailable` once the subscriber has
    /// unsubscribed or gone away.
    pub async fn publish(&self, event: ClaimEvent) -> Result<(), PortError> {
        self.send(SubscriptionMessage::Event(event)).await
    }

    /// Tells the subscriber the subscription has died
    pub async fn fail(&self, error: PortError) -> Result<(), PortError> {
        self.send(SubscriptionMessage::Failed(error)).await
    }

    /// Returns true once the subscriber has unsubscribed
    pub fn is_closed(&self) -> bool {
        self.stop.is_cancelled() || self.sender.is_closed()
    }

    async fn send(&self, message: SubscriptionMessage) -> Result<(), PortError> {
        let unavailable = || PortError::ServiceUnavailable {
            service: "claim event subscriber".to_string(),
        };

        if self.stop.is_cancelled() {
            return Err(unavailable());
        }

        tokio::select! {
            _ = self.stop.cancelled() => Err(unavailable()),
            sent = self.sender.send(message) => sent.map_err(|_| unavailable()),
        }
    }
}
