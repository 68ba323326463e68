use super::{CallId, Interface, ModemPath};

/// Cellular service errors
#[derive(thiserror::Error, Debug)]
pub enum CellularError {
    /// D-Bus communication error
    #[error("D-Bus operation failed: {0}")]
    DbusError(#[from] zbus::Error),

    /// Service initialization failed (bus connection or modem enumeration)
    #[error("Failed to initialize cellular service: {0}")]
    InitializationFailed(String),

    /// No modem with this path is known
    #[error("Modem {0} not found")]
    ModemNotFound(ModemPath),

    /// The modem does not expose the interface needed for the request
    #[error("Modem {modem} has no {interface} interface")]
    CapabilityUnavailable {
        /// Modem the request was made against.
        modem: ModemPath,
        /// Missing interface.
        interface: Interface,
    },

    /// No outstanding call with this id
    #[error("Call {0} not found")]
    CallNotFound(CallId),

    /// The subscription token does not belong to any observer list
    #[error("Observer not found")]
    ObserverNotFound,

    /// A remote operation was rejected
    #[error("Cellular operation failed: {operation} - {reason}")]
    OperationFailed {
        /// The operation that failed
        operation: &'static str,
        /// The reason the operation failed
        reason: String,
    },

    /// A code or number was rejected before reaching the modem
    #[error("Invalid {field}: {reason}")]
    InvalidInput {
        /// What was being validated.
        field: &'static str,
        /// Why it was rejected.
        reason: String,
    },

    /// A response arrived in a shape this crate does not understand
    #[error("Response not recognized: {0}")]
    NotRecognized(String),

    /// The call was cancelled before it completed
    #[error("Operation canceled")]
    Canceled,

    /// A security-code session is already running
    #[error("A security code session is already active")]
    SessionActive,
}

impl CellularError {
    /// Wrap a remote failure for `operation`.
    pub fn operation(operation: &'static str, reason: impl std::fmt::Display) -> Self {
        Self::OperationFailed {
            operation,
            reason: reason.to_string(),
        }
    }
}
