//! Error types for the KITE forwarding stack

use thiserror::Error;

use crate::face::FaceId;
use crate::name::Name;

/// Top-level error type for KITE
#[derive(Debug, Error)]
pub enum KiteError {
    #[error("Name error: {0}")]
    Name(#[from] NameError),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Forwarding error: {0}")]
    Forwarding(#[from] ForwardingError),
}

/// Errors related to name parsing
#[derive(Debug, Error)]
pub enum NameError {
    #[error("Invalid name URI: {0}")]
    InvalidUri(String),

    #[error("Invalid version component: {0}")]
    InvalidVersion(String),
}

/// Errors raised while decoding wire-level mobility messages
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Truncated TLV: needed {expected} bytes, {actual} available")]
    Truncated { expected: usize, actual: usize },

    #[error("Unexpected TLV type: expected {expected}, got {actual}")]
    UnexpectedType { expected: u64, actual: u64 },

    #[error("Invalid NonNegativeInteger length: {0}")]
    InvalidInteger(usize),

    #[error("Name component is not valid UTF-8")]
    InvalidComponent,

    #[error("Wrong content type: expected mobility ack, got {0}")]
    WrongContentType(u64),

    #[error("Missing KITE marker in request name {0}")]
    MissingMarker(String),

    #[error("Unexpected {0} trailing bytes")]
    TrailingBytes(usize),
}

/// Faults the strategy resolves locally
///
/// None of these ever cross a strategy entry point. `NoRoute` becomes a
/// single NACK downstream, the others are logged.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ForwardingError {
    #[error("No eligible next hop")]
    NoRoute,

    #[error("Mobility route {name} via {face} is stale")]
    StaleMobilityRoute { name: Name, face: FaceId },

    #[error("Pending interest {0} has already been reclaimed")]
    DanglingReference(Name),

    #[error("Control plane {operation} for {name} failed: {result}")]
    AsyncControlPlaneFailure {
        operation: &'static str,
        name: Name,
        result: String,
    },
}

/// Result type alias for KITE operations
pub type KiteResult<T> = Result<T, KiteError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_error_display() {
        let err = ProtocolError::Truncated {
            expected: 8,
            actual: 3,
        };
        let msg = format!("{}", err);
        assert!(msg.contains("8"));
        assert!(msg.contains("3"));

        let err = ProtocolError::WrongContentType(0);
        assert!(format!("{}", err).contains("mobility ack"));
    }

    #[test]
    fn test_forwarding_error_display() {
        assert!(format!("{}", ForwardingError::NoRoute).contains("No eligible"));

        let err = ForwardingError::StaleMobilityRoute {
            name: Name::from_components(["mp"]),
            face: FaceId(7),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("/mp"));
        assert!(msg.contains("7"));

        let err = ForwardingError::AsyncControlPlaneFailure {
            operation: "announce",
            name: Name::from_components(["mp"]),
            result: "expired".to_string(),
        };
        assert!(format!("{}", err).contains("expired"));
    }

    #[test]
    fn test_error_conversions() {
        let err: KiteError = NameError::InvalidUri("x".to_string()).into();
        assert!(matches!(err, KiteError::Name(_)));

        let err: KiteError = ProtocolError::InvalidComponent.into();
        assert!(matches!(err, KiteError::Protocol(_)));

        let err: KiteError = ForwardingError::NoRoute.into();
        assert!(matches!(err, KiteError::Forwarding(_)));
        assert!(format!("{}", err).contains("Forwarding error"));
    }
}
