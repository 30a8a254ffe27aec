//! Dispatcher error types

use contracts::{ContractError, ObjectLocation};
use thiserror::Error;

/// Dispatcher-specific errors
///
/// Per-target failures never appear here; they are recorded as outcomes.
#[derive(Debug, Error)]
pub enum DispatcherError {
    /// Trigger event did not name an artifact
    #[error("invalid event: {0}")]
    InvalidEvent(#[source] ContractError),

    /// Source artifact could not be read; no target was dispatched
    #[error("failed to fetch artifact {location}: {source}")]
    Fetch {
        location: ObjectLocation,
        #[source]
        source: ContractError,
    },

    /// Aggregate response could not be encoded
    #[error("failed to encode response: {0}")]
    Response(#[source] ContractError),
}

impl DispatcherError {
    /// Whether the run failed because the artifact does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Fetch { source, .. } if source.is_not_found())
    }
}
