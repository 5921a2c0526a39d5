//! # KITE Tables
//!
//! The forwarder tables the KITE strategy reads and writes.
//!
//! ## Features
//!
//! - **Pit**: Pending Interest Table with generation-checked [`PitToken`] handles
//! - **Fib**: Forwarding Information Base with longest-prefix match
//! - **Measurements**: Expiring per-prefix strategy state carrying
//!   [`MobileProducerInfo`]
//!
//! Tables are plain single-owner structures. The forwarder drives them from
//! one event loop, so none of them lock.
//!
//! ## Example
//!
//! ```rust
//! use kite_core::{Interest, Name};
//! use kite_tables::Pit;
//!
//! let mut pit = Pit::new();
//! let (token, created) = pit.insert(&Interest::new(Name::parse("/mp/1").unwrap()));
//! assert!(created);
//!
//! pit.remove(token).unwrap();
//! assert!(pit.get(token).is_none());
//! ```
//!
//! [`PitToken`]: kite_core::PitToken
//! [`MobileProducerInfo`]: kite_core::MobileProducerInfo

pub mod error;
pub mod fib;
pub mod measurements;
pub mod pit;

// Re-exports
pub use error::TableError;
pub use fib::{Fib, FibEntry, NextHop};
pub use measurements::{DEFAULT_MEASUREMENTS_LIFETIME, Measurements, MeasurementsEntry};
pub use pit::{InRecord, OutRecord, Pit, PitEntry};
