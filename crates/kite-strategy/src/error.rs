//! Strategy error types
//!
//! Only construction and control-plane plumbing can fail. The strategy entry
//! points themselves resolve every fault locally (see
//! [`ForwardingError`](kite_core::ForwardingError)).

use thiserror::Error;

// Re-export the core forwarding taxonomy
pub use kite_core::ForwardingError;

/// Errors from configuring or wiring up the strategy
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StrategyError {
    /// Instance name is not under the strategy name
    #[error("Invalid strategy instance name: {0}")]
    InvalidInstanceName(String),

    /// Instance name carries parameters after the version
    #[error("KiteStrategy does not accept parameters: {0}")]
    ParametersNotAccepted(String),

    /// Instance name asks for a version this build does not implement
    #[error("KiteStrategy does not support version {0}")]
    UnsupportedVersion(u64),

    /// The control-plane task is gone
    #[error("RIB control plane is closed")]
    ControlPlaneClosed,
}

/// Result type for strategy operations
pub type StrategyResult<T> = Result<T, StrategyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert!(
            StrategyError::UnsupportedVersion(2)
                .to_string()
                .contains("version 2")
        );
        assert!(
            StrategyError::ParametersNotAccepted("/x".to_string())
                .to_string()
                .contains("parameters")
        );
        assert!(StrategyError::ControlPlaneClosed.to_string().contains("closed"));
    }
}
