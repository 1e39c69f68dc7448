//! Observability
//!
//! Two concerns:
//! - diagnostic logging through `tracing`, initialised once per binary
//! - the critical-section audit trail, one line per entry and exit
//!
//! Observability never affects protocol decisions. A failed audit append is
//! logged and otherwise ignored.

pub mod audit;

pub use audit::{AuditAction, AuditLog, AuditRecord, FileAuditLog, MemoryAuditLog};

use std::fmt;
use std::io;

use tracing_subscriber::EnvFilter;

/// Observability error code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObservabilityErrorCode {
    /// Logging could not be initialised
    MaekawaLoggingInit,

    /// Audit trail could not be opened or written
    MaekawaAuditFailed,
}

impl ObservabilityErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObservabilityErrorCode::MaekawaLoggingInit => "MAEKAWA_LOGGING_INIT",
            ObservabilityErrorCode::MaekawaAuditFailed => "MAEKAWA_AUDIT_FAILED",
        }
    }
}

impl fmt::Display for ObservabilityErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Observability error
///
/// Never fatal to the protocol; callers decide whether to surface it.
#[derive(Debug)]
pub struct ObservabilityError {
    code: ObservabilityErrorCode,
    message: String,
    source: Option<io::Error>,
}

impl ObservabilityError {
    pub fn new(code: ObservabilityErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Audit failure caused by an I/O error
    pub fn audit(message: impl Into<String>, source: io::Error) -> Self {
        Self {
            code: ObservabilityErrorCode::MaekawaAuditFailed,
            message: message.into(),
            source: Some(source),
        }
    }

    pub fn code(&self) -> ObservabilityErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ObservabilityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)?;
        if let Some(ref source) = self.source {
            write!(f, " (caused by: {})", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for ObservabilityError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Result type for observability operations
pub type ObservabilityResult<T> = Result<T, ObservabilityError>;

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` wins over `default_level` when set. Output goes to stderr so
/// stdout stays free for command results.
pub fn init_logging(default_level: &str) -> ObservabilityResult<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_level).map_err(|e| {
            ObservabilityError::new(
                ObservabilityErrorCode::MaekawaLoggingInit,
                format!("invalid log level '{}': {}", default_level, e),
            )
        })?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init()
        .map_err(|e| ObservabilityError::new(ObservabilityErrorCode::MaekawaLoggingInit, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ObservabilityError::new(ObservabilityErrorCode::MaekawaLoggingInit, "boom");
        let display = err.to_string();
        assert!(display.contains("MAEKAWA_LOGGING_INIT"));
        assert!(display.contains("boom"));
    }

    #[test]
    fn test_error_with_source() {
        let err = ObservabilityError::audit(
            "cannot open audit file",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(err.code(), ObservabilityErrorCode::MaekawaAuditFailed);
        assert!(err.to_string().contains("caused by: denied"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
