//! Error types for tola-htmldiff.
//!
//! Only contract violations are fatal. Malformed-but-parseable input is
//! reported through [`Diagnostics`](crate::diagnostics::Diagnostics) instead,
//! unless strict mode turns structural faults into errors.

use thiserror::Error;

use crate::algo::Operation;
use crate::diagnostics::Diagnostic;

/// Fatal errors that abort a diff.
#[derive(Debug, Error)]
pub enum DiffError {
    /// The unit cursor was asked to step back more than once in a row
    #[error("cursor can only rewind one step")]
    RewindDepth,

    /// A diff marker was requested for an operation that has no marker element
    #[error("no marker element exists for {0} operation; only insert and delete can be marked")]
    UnsupportedMarker(Operation),

    /// A processor invariant was broken
    #[error("processor invariant violated: {0}")]
    Invariant(String),

    /// Configuration that cannot produce a valid diff
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Structural fault escalated by strict mode
    #[error("structural fault: {0}")]
    Structural(Diagnostic),
}

/// Result type alias for diff operations.
pub type DiffResult<T> = Result<T, DiffError>;

impl DiffError {
    /// Create an invariant error with a message.
    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::Invariant(msg.into())
    }

    /// Create a configuration error with a message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
