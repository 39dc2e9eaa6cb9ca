//! Remote resolution error types.

use crate::model::Coordinate;
use thiserror::Error;

/// Remote resolution error codes.
pub mod codes {
    pub const RESOLVE_NOT_FOUND: &str = "RESOLVE_NOT_FOUND";
    pub const RESOLVE_NETWORK: &str = "RESOLVE_NETWORK";
    pub const RESOLVE_MALFORMED: &str = "RESOLVE_MALFORMED";
    pub const RESOLVE_CANCELLED: &str = "RESOLVE_CANCELLED";
}

/// Coarse classification of a resolution failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The coordinate does not exist in the source.
    NotFound,
    /// Transport failure or unexpected status. Worth trying the next source.
    Network,
    /// The source answered with something unparsable.
    Malformed,
    /// The session was cancelled.
    Cancelled,
}

/// Failure to resolve a coordinate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("{code}: {coordinate} not found", code = codes::RESOLVE_NOT_FOUND)]
    NotFound { coordinate: Coordinate },

    #[error("{code}: {target}: {message}", code = codes::RESOLVE_NETWORK)]
    Network { target: String, message: String },

    #[error("{code}: {target}: {message}", code = codes::RESOLVE_MALFORMED)]
    Malformed { target: String, message: String },

    #[error("{code}: resolution cancelled", code = codes::RESOLVE_CANCELLED)]
    Cancelled,
}

impl ResolveError {
    #[must_use]
    pub fn not_found(coordinate: &Coordinate) -> Self {
        Self::NotFound {
            coordinate: coordinate.clone(),
        }
    }

    pub fn network(target: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Network {
            target: target.into(),
            message: message.into(),
        }
    }

    pub fn malformed(target: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Malformed {
            target: target.into(),
            message: message.into(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Network { .. } => ErrorKind::Network,
            Self::Malformed { .. } => ErrorKind::Malformed,
            Self::Cancelled => ErrorKind::Cancelled,
        }
    }

    /// Get the stable error code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self.kind() {
            ErrorKind::NotFound => codes::RESOLVE_NOT_FOUND,
            ErrorKind::Network => codes::RESOLVE_NETWORK,
            ErrorKind::Malformed => codes::RESOLVE_MALFORMED,
            ErrorKind::Cancelled => codes::RESOLVE_CANCELLED,
        }
    }

    /// Whether retrying the same source later could give a different answer.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self.kind(), ErrorKind::Network | ErrorKind::Cancelled)
    }
}

impl From<reqwest::Error> for ResolveError {
    fn from(e: reqwest::Error) -> Self {
        let target = e
            .url()
            .map_or_else(|| "<unknown url>".to_string(), ToString::to_string);
        if e.is_timeout() {
            Self::network(target, format!("Request timed out: {e}"))
        } else if e.is_connect() {
            Self::network(target, format!("Connection failed: {e}"))
        } else if e.is_decode() {
            Self::malformed(target, format!("Invalid response body: {e}"))
        } else {
            Self::network(target, e.to_string())
        }
    }
}
