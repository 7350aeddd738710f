use serde::{Deserialize, Serialize};

/// Error category enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCategory {
    /// Invalid or contradictory operator configuration. Never retried.
    ConfigurationError,
    /// Malformed request input (missing document, unknown method).
    ValidationError,
    /// An operator-authored expression failed to compile or threw.
    ExpressionError,
    /// An operator-authored expression returned the wrong shape.
    ContractError,
    /// A collaborator call (file storage, signature store, events) failed.
    StorageError,
    SerializationError,
    InternalError,
    Unknown,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Error severity enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorSeverity {
    Error,
    Warning,
    Info,
    Debug,
}
