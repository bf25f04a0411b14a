//! Error types for routepick
//!
//! One error enum covers the whole crate. Every variant maps onto an
//! [`ErrorKind`] so callers can decide how to recover without matching on
//! individual variants.

use std::fmt;

/// Broad classification of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The user picked something that cannot advance the selection
    Validation,
    /// No response was received from the compute service
    Transport,
    /// A response was received but did not have the expected shape
    Protocol,
    /// The compute service reported an explicit failure
    Application,
    /// Start-up problems: bad catalog, bad URL, file I/O
    Configuration,
}

/// Main error type for routepick operations
#[derive(Debug)]
pub enum Error {
    /// Point id not present in the catalog
    UnknownPoint(u32),

    /// Point name not present in the catalog, with an optional close match
    UnknownName {
        name: String,
        suggestion: Option<String>,
    },

    /// Destination picked with the same id as the source
    SamePoint(u32),

    /// Both endpoints are chosen and the request has been answered
    SelectionComplete,

    /// Both endpoints are chosen and the request is still in flight
    RequestInFlight,

    /// Network connectivity issues (no response received)
    NetworkError(String),

    /// Response received but not well-formed
    MalformedResponse(String),

    /// Compute service reported an application-level failure
    ServerError(String),

    /// Catalog could not be loaded or is inconsistent
    CatalogError(String),

    /// Invalid configuration or parameters
    InvalidInput(String),

    /// File I/O error
    IoError(std::io::Error),
}

impl Error {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::UnknownPoint(_)
            | Error::UnknownName { .. }
            | Error::SamePoint(_)
            | Error::SelectionComplete
            | Error::RequestInFlight => ErrorKind::Validation,
            Error::NetworkError(_) => ErrorKind::Transport,
            Error::MalformedResponse(_) => ErrorKind::Protocol,
            Error::ServerError(_) => ErrorKind::Application,
            Error::CatalogError(_) | Error::InvalidInput(_) | Error::IoError(_) => {
                ErrorKind::Configuration
            }
        }
    }

    /// Whether the user can simply try another pick without resetting
    pub fn is_validation(&self) -> bool {
        self.kind() == ErrorKind::Validation
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnknownPoint(id) => {
                write!(f, "Airport {} not found", id)
            }
            Error::UnknownName { name, suggestion } => match suggestion {
                Some(s) => write!(f, "Airport '{}' not found. Did you mean '{}'?", name, s),
                None => write!(f, "Airport '{}' not found", name),
            },
            Error::SamePoint(_) => {
                write!(f, "Source and destination must differ")
            }
            Error::SelectionComplete => {
                write!(f, "Selection already complete, reset to restart")
            }
            Error::RequestInFlight => {
                write!(f, "Route computation already in progress, wait or reset")
            }
            Error::NetworkError(msg) => {
                write!(f, "Network error: {}", msg)
            }
            Error::MalformedResponse(msg) => {
                write!(f, "Malformed server response: {}", msg)
            }
            Error::ServerError(msg) => {
                write!(f, "Server error: {}", msg)
            }
            Error::CatalogError(msg) => {
                write!(f, "Catalog error: {}", msg)
            }
            Error::InvalidInput(msg) => {
                write!(f, "Invalid input: {}", msg)
            }
            Error::IoError(err) => {
                write!(f, "I/O error: {}", err)
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IoError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::IoError(err)
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() || err.is_request() {
            Error::NetworkError(err.to_string())
        } else if err.is_decode() {
            Error::MalformedResponse(err.to_string())
        } else {
            Error::ServerError(err.to_string())
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::MalformedResponse(err.to_string())
    }
}

/// Convenience result type for routepick operations
pub type Result<T> = std::result::Result<T, Error>;
