//! Error types for the synchronization engine.

use csbind_codec::CodecError;
use std::sync::Arc;
use thiserror::Error;

/// Result type for engine operations.
pub type CsbindResult<T> = Result<T, CsbindError>;

/// Per-call recovery hook.
///
/// When supplied to an operation, failures are handed to the hook instead
/// of being returned.
pub type ErrorHandler = Arc<dyn Fn(&CsbindError) + Send + Sync>;

/// Errors that can occur while guarding, applying or relaying a mutation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CsbindError {
    /// One or more argument rules failed.
    #[error("{}", messages.join(","))]
    ContractViolation {
        /// Failure messages in argument, then rule order.
        messages: Vec<String>,
    },

    /// The authority failed to read or apply a mutation.
    #[error("authority error: {0}")]
    Authority(String),

    /// The transport failed to publish or subscribe.
    #[error("transport error: {0}")]
    Transport(String),

    /// The mutation left the authoritative snapshot unchanged.
    #[error("mutation produced no change")]
    Unchanged,

    /// A mutation arrived before `start`.
    #[error("observable has not been started")]
    NotStarted,

    /// `start` was called on an active observable.
    #[error("observable has already been started")]
    AlreadyStarted,

    /// Inbound delivery for the future model needs a Tokio runtime.
    #[error("no async runtime available for inbound delivery")]
    NoRuntime,

    /// Payload codec error.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
}

impl CsbindError {
    /// Creates a contract violation from failure messages.
    pub fn contract_violation(messages: Vec<String>) -> Self {
        Self::ContractViolation { messages }
    }

    /// Creates an authority error.
    pub fn authority(message: impl Into<String>) -> Self {
        Self::Authority(message.into())
    }

    /// Creates a transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// Returns true for argument validation failures.
    pub fn is_contract_violation(&self) -> bool {
        matches!(self, Self::ContractViolation { .. })
    }

    /// Returns the rule failure messages of a contract violation.
    pub fn violations(&self) -> &[String] {
        match self {
            Self::ContractViolation { messages } => messages,
            _ => &[],
        }
    }
}

/// Runs the fail-soft boundary over a finished call.
///
/// With a handler, a failure is passed to it and `Ok(None)` is returned.
/// Without one, the failure is returned unchanged.
pub fn fail_soft<T>(result: CsbindResult<T>, on_error: Option<&ErrorHandler>) -> CsbindResult<Option<T>> {
    match (result, on_error) {
        (Ok(value), _) => Ok(Some(value)),
        (Err(err), Some(handler)) => {
            handler(&err);
            Ok(None)
        }
        (Err(err), None) => Err(err),
    }
}
