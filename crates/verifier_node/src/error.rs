//! Verifier node errors

use core_kernel::PortError;
use thiserror::Error;

/// Errors surfaced by the event processor's synchronous operations
#[derive(Debug, Error)]
pub enum ProcessorError {
    /// The event source refused the subscription
    #[error("Failed to subscribe to claim events: {0}")]
    Subscribe(#[source] PortError),

    /// The claim payload could not be fetched or decoded
    #[error("Failed to fetch claim data for {reference}: {source}")]
    Fetch {
        reference: String,
        #[source]
        source: PortError,
    },
}

impl ProcessorError {
    /// Returns true if retrying the operation could succeed
    pub fn is_transient(&self) -> bool {
        match self {
            ProcessorError::Subscribe(e) => e.is_transient(),
            ProcessorError::Fetch { source, .. } => source.is_transient(),
        }
    }

    /// Returns the underlying port error
    pub fn port_error(&self) -> &PortError {
        match self {
            ProcessorError::Subscribe(e) => e,
            ProcessorError::Fetch { source, .. } => source,
        }
    }
}
