//! Error types for kite-tables

use kite_core::{Name, PitToken};
use thiserror::Error;

/// Errors raised by table lookups
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TableError {
    /// The token's slot was reclaimed or reused
    #[error("Stale PIT token: {0}")]
    StaleToken(PitToken),

    /// No measurements entry exists for the name
    #[error("No measurements entry for {0}")]
    NoEntry(Name),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stale_token_display() {
        let err = TableError::StaleToken(PitToken::new(4, 2));
        assert!(err.to_string().contains("pit#4.2"));
    }

    #[test]
    fn test_no_entry_display() {
        let err = TableError::NoEntry(Name::from_components(["mp"]));
        assert!(err.to_string().contains("/mp"));
    }
}
