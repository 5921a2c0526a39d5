//! # KITE Strategy
//!
//! Producer-mobility forwarding strategy for a named-data forwarder.
//!
//! When a mobile producer moves, it re-registers with a rendezvous point.
//! Interests that carry a mobility hint are first sent straight toward the
//! producer's advertised prefix; when that path NACKs they are escalated
//! toward the rendezvous, and once the producer's acknowledgment flows back
//! the strategy installs a route to the new location and replays whatever
//! was still pending.
//!
//! ## Core Components
//!
//! - [`KiteStrategy`]: The decision logic, one method per forwarder event
//! - [`StrategyHost`]: What the strategy needs from a forwarding engine
//! - [`Forwarder`]: In-process forwarding engine over `kite-tables`
//! - [`RibHandle`] / [`RibTask`]: Asynchronous route announce and withdraw
//! - [`classify`]: NACK aggregation across upstreams
//!
//! ## Retransmission Stages
//!
//! Records on the mobility path are tagged with an
//! [`InterestStatus`](kite_core::InterestStatus):
//!
//! 1. **StraightForward**: sent along the FIB route for the Interest name
//! 2. **Rv**: retransmitted toward the rendezvous after a NACK
//!
//! The transition is one-way. A NACK on an `Rv` record is propagated
//! downstream without further escalation.
//!
//! ## Example
//!
//! ```rust
//! use kite_core::{Delegation, Face, FaceId, ForwardingHint, Interest, Name};
//! use kite_strategy::{Forwarder, KiteStrategy, RecordingEgress, RibHandle};
//!
//! let (rib, _commands) = RibHandle::channel();
//! let mut forwarder = Forwarder::new(KiteStrategy::new(rib), RecordingEgress::new());
//! forwarder.add_face(Face::remote(1));
//! forwarder.add_face(Face::remote(2));
//! forwarder.add_route(Name::parse("/rv").unwrap(), FaceId(2), 0);
//!
//! let hint = ForwardingHint::from(vec![Delegation::mobility(Name::parse("/rv").unwrap())]);
//! let interest = Interest::new(Name::parse("/mp/1").unwrap()).with_forwarding_hint(hint);
//! forwarder.on_incoming_interest(FaceId(1), interest.clone());
//!
//! assert_eq!(forwarder.egress().interest_faces(&interest.name), vec![FaceId(2)]);
//! ```

pub mod config;
pub mod error;
pub mod forwarder;
pub mod host;
pub mod nack;
pub mod rib;
pub mod strategy;

// Re-export main types
pub use config::{
    ParsedInstanceName, STRATEGY_NAME, STRATEGY_VERSION, StrategyConfig, make_instance_name,
    parse_instance_name, strategy_name,
};
pub use error::{StrategyError, StrategyResult};
pub use forwarder::{Dataplane, Egress, Forwarder, RecordingEgress, Sent};
pub use host::StrategyHost;
pub use nack::{NackDisposition, classify};
pub use rib::{AnnounceResult, MemoryRib, RibCommand, RibHandle, RibRoute, RibService, RibTask};
pub use strategy::KiteStrategy;
