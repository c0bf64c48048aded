//! Error types for apctl

use std::fmt;
use std::io;

#[derive(Debug)]
pub enum ApctlError {
    /// IO error
    Io(io::Error),
    /// Command execution failed
    CommandFailed { cmd: String, code: Option<i32>, stderr: String },
    /// Invalid parameter
    InvalidParameter(String),
    /// The capability adapter does not provide this operation
    NotSupported(String),
    /// The operation requires a running access point
    NotEnabled,
    /// Parse error
    ParseError(String),
    /// Service error (hostapd)
    ServiceError(String),
    /// Timeout
    Timeout(String),
    /// The operation was cancelled before completing
    Cancelled,
}

impl fmt::Display for ApctlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApctlError::Io(e) => write!(f, "IO error: {}", e),
            ApctlError::CommandFailed { cmd, code, stderr } => {
                if let Some(code) = code {
                    write!(f, "Command '{}' failed with code {}: {}", cmd, code, stderr)
                } else {
                    write!(f, "Command '{}' failed: {}", cmd, stderr)
                }
            }
            ApctlError::InvalidParameter(msg) => write!(f, "Invalid parameter: {}", msg),
            ApctlError::NotSupported(msg) => write!(f, "Not supported: {}", msg),
            ApctlError::NotEnabled => write!(f, "Access point is not enabled"),
            ApctlError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            ApctlError::ServiceError(msg) => write!(f, "Service error: {}", msg),
            ApctlError::Timeout(msg) => write!(f, "Timeout: {}", msg),
            ApctlError::Cancelled => write!(f, "Operation cancelled"),
        }
    }
}

impl std::error::Error for ApctlError {}

impl From<io::Error> for ApctlError {
    fn from(error: io::Error) -> Self {
        ApctlError::Io(error)
    }
}

impl From<serde_json::Error> for ApctlError {
    fn from(error: serde_json::Error) -> Self {
        ApctlError::ParseError(error.to_string())
    }
}

pub type ApctlResult<T> = Result<T, ApctlError>;
