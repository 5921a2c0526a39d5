//! # KITE Core
//!
//! Core types, wire codec, and errors for the KITE producer-mobility
//! forwarding strategy.
//!
//! This crate holds everything the strategy and its collaborators agree on,
//! without depending on any particular table implementation or runtime.
//!
//! ## Key Types
//!
//! - [`Name`]: Hierarchical NDN name used for every lookup
//! - [`Interest`], [`Data`], [`Nack`]: Network-layer packets the strategy reacts to
//! - [`ForwardingHint`]: Delegation list that may carry the mobility hint
//! - [`PrefixAnnouncement`], [`MobilityAck`], [`MobilityRequest`]: The mobility protocol
//! - [`InterestStatus`], [`MobileProducerInfo`]: Per-record strategy tags
//! - [`PitToken`]: Generation-checked handle into the pending interest table
//!
//! ## Wire Format
//!
//! The mobility acknowledgment payload and request parameters are encoded
//! with NDN TLV (see [`tlv`]) so they interoperate with existing peers.

pub mod announcement;
pub mod error;
pub mod face;
pub mod name;
pub mod packet;
pub mod tag;
pub mod tlv;

// Re-export main types
pub use announcement::*;
pub use error::*;
pub use face::*;
pub use name::*;
pub use packet::*;
pub use tag::*;
