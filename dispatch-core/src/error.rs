//! Core error types
//!
//! Everything is recovered at the mutation boundary; none of these are fatal
//! to the process. A missing id in an optimistic patch target is a silent
//! no-op, not an error (the slot may simply not be populated yet).

use dispatch_client::ClientError;
use thiserror::Error;

/// Step of the three-step order creation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateStep {
    Contact,
    Location,
    Order,
}

impl std::fmt::Display for CreateStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CreateStep::Contact => write!(f, "contact"),
            CreateStep::Location => write!(f, "location"),
            CreateStep::Order => write!(f, "order"),
        }
    }
}

/// Core error type
#[derive(Debug, Error)]
pub enum CoreError {
    /// Request failed or the store answered non-2xx
    #[error("Network error: {0}")]
    Network(#[from] ClientError),

    /// Input rejected before any network call was made
    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    /// Multi-step create aborted; later steps were never attempted
    #[error("Order creation aborted at the {step} step: {source}")]
    PartialCreate {
        step: CreateStep,
        #[source]
        source: ClientError,
    },

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for core operations
pub type CoreResult<T> = Result<T, CoreError>;
