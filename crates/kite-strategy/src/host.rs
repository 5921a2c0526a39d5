//! The forwarder as seen by a strategy
//!
//! A strategy never owns tables or faces. It reads and tags records through
//! a [`StrategyHost`] and asks the host to send packets on its behalf.

use std::time::Instant;

use kite_core::{FaceId, Interest, Name, NackReason, PitToken};
use kite_tables::{FibEntry, Measurements, NextHop, Pit};

/// Forwarding engine operations available to a strategy
pub trait StrategyHost {
    /// Current time on the forwarder clock
    fn now(&self) -> Instant;

    /// Longest-prefix FIB match for `name`
    fn lookup_fib(&self, name: &Name) -> FibEntry;

    /// Whether `interest` may be forwarded to `next_hop`
    fn is_next_hop_eligible(
        &self,
        ingress: FaceId,
        interest: &Interest,
        next_hop: &NextHop,
        token: PitToken,
    ) -> bool;

    /// Send `interest` upstream on `face`, creating or refreshing its
    /// out-record. Returns false if the entry is gone.
    fn send_interest(&mut self, token: PitToken, face: FaceId, interest: &Interest) -> bool;

    /// NACK the downstream on `face` and drop its in-record
    fn send_nack(&mut self, token: PitToken, face: FaceId, reason: NackReason);

    /// NACK every downstream
    fn send_nacks(&mut self, token: PitToken, reason: NackReason) {
        let faces: Vec<FaceId> = match self.pit().get(token) {
            Some(entry) => entry.in_records().iter().map(|r| r.face_id()).collect(),
            None => return,
        };
        for face in faces {
            self.send_nack(token, face, reason);
        }
    }

    /// Give up on the pending Interest
    fn reject_pending_interest(&mut self, token: PitToken);

    fn pit(&self) -> &Pit;

    fn pit_mut(&mut self) -> &mut Pit;

    fn measurements(&self) -> &Measurements;

    fn measurements_mut(&mut self) -> &mut Measurements;
}
