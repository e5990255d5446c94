//! Error types module
//!
//! All controller-facing failures are unified under `ScanError`. Transport
//! failures keep their HTTP status so the presentation layer can show a
//! retryable banner scoped to the phase that failed.

use serde::Serialize;

use crate::phase::{Phase, PhaseKind};

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues like a backend hiccup
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error presentation - defines how an error should be shown
pub trait ErrorMetadata {
    /// Machine-readable error code (e.g., "TRANSPORT_ERROR")
    fn error_code(&self) -> &'static str;

    /// Whether this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Suggested action for the user
    fn suggested_action(&self) -> Option<&'static str>;

    /// User-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

/// Network failure or non-2xx response from the analysis backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransportError {
    /// HTTP status, `None` when no response was received.
    pub status: Option<u16>,
    pub message: String,
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.status {
            Some(status) => write!(f, "backend returned {}: {}", status, self.message),
            None => write!(f, "request failed: {}", self.message),
        }
    }
}

impl std::error::Error for TransportError {}

impl TransportError {
    pub const UNKNOWN_MESSAGE: &'static str = "unknown error";

    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
        }
    }

    /// Non-success status whose body did not carry a readable `error`.
    pub fn unknown(status: u16) -> Self {
        Self::status(status, Self::UNKNOWN_MESSAGE)
    }

    pub fn is_server_error(&self) -> bool {
        self.status.is_some_and(|s| s >= 500)
    }
}

/// Malformed GPS payload. Recovered locally by hiding the map.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid coordinate: {0}")]
pub struct InvalidCoordinate(pub String);

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScanError {
    #[error("{phase} failed: {source}")]
    Transport {
        phase: PhaseKind,
        #[source]
        source: TransportError,
    },

    #[error(transparent)]
    InvalidCoordinate(#[from] InvalidCoordinate),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Cannot run {action} while session is {phase}")]
    InvalidTransition { action: PhaseKind, phase: Phase },

    #[error("{0} is already in flight")]
    AlreadyInFlight(PhaseKind),

    #[error("Session was superseded before {0} completed")]
    Superseded(PhaseKind),

    #[error("No file selected")]
    NoSession,
}

impl ScanError {
    pub fn transport(phase: PhaseKind, source: TransportError) -> Self {
        ScanError::Transport { phase, source }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ScanError::Validation(message.into())
    }

    /// Phase the error is scoped to, when it belongs to one.
    pub fn phase(&self) -> Option<PhaseKind> {
        match self {
            ScanError::Transport { phase, .. } => Some(*phase),
            ScanError::InvalidTransition { action, .. } => Some(*action),
            ScanError::AlreadyInFlight(kind) | ScanError::Superseded(kind) => Some(*kind),
            ScanError::InvalidCoordinate(_) | ScanError::Validation(_) | ScanError::NoSession => {
                None
            }
        }
    }
}

/// Static metadata for each variant: (error_code, recoverable, suggested_action, log_level).
fn scan_error_static_metadata(
    err: &ScanError,
) -> (&'static str, bool, Option<&'static str>, LogLevel) {
    match err {
        ScanError::Transport { source, .. } if source.is_server_error() => (
            "TRANSPORT_ERROR",
            true,
            Some("Retry after a short delay"),
            LogLevel::Error,
        ),
        ScanError::Transport { source, .. } if source.status.is_none() => (
            "TRANSPORT_ERROR",
            true,
            Some("Check the connection to the analysis service and retry"),
            LogLevel::Warn,
        ),
        ScanError::Transport { .. } => (
            "BACKEND_REJECTED",
            true,
            Some("Check the image and try again"),
            LogLevel::Warn,
        ),
        ScanError::InvalidCoordinate(_) => ("INVALID_COORDINATE", false, None, LogLevel::Debug),
        ScanError::Validation(_) => (
            "VALIDATION_ERROR",
            false,
            Some("Adjust the selection and try again"),
            LogLevel::Debug,
        ),
        ScanError::InvalidTransition { .. } => (
            "INVALID_TRANSITION",
            false,
            Some("Wait for the scan to finish"),
            LogLevel::Debug,
        ),
        ScanError::AlreadyInFlight(_) => (
            "ALREADY_IN_FLIGHT",
            false,
            Some("Wait for the running action to finish"),
            LogLevel::Debug,
        ),
        ScanError::Superseded(_) => ("SUPERSEDED", false, None, LogLevel::Debug),
        ScanError::NoSession => (
            "NO_SESSION",
            false,
            Some("Select an image first"),
            LogLevel::Debug,
        ),
    }
}

impl ErrorMetadata for ScanError {
    fn error_code(&self) -> &'static str {
        scan_error_static_metadata(self).0
    }

    fn is_recoverable(&self) -> bool {
        scan_error_static_metadata(self).1
    }

    fn suggested_action(&self) -> Option<&'static str> {
        scan_error_static_metadata(self).2
    }

    fn client_message(&self) -> String {
        match self {
            ScanError::Transport { source, .. } => source.message.clone(),
            ScanError::InvalidCoordinate(_) => "Location data could not be read".to_string(),
            ScanError::Validation(msg) => msg.clone(),
            ScanError::InvalidTransition { action, .. } => {
                format!("{} is not available right now", action)
            }
            ScanError::AlreadyInFlight(kind) => format!("{} is already running", kind),
            ScanError::Superseded(_) => "A new image was selected".to_string(),
            ScanError::NoSession => "No image selected".to_string(),
        }
    }

    fn log_level(&self) -> LogLevel {
        scan_error_static_metadata(self).3
    }
}
