//! In-process forwarder driving the strategy
//!
//! [`Forwarder`] owns the faces and tables, runs the incoming Interest,
//! NACK and Data pipelines, and hands each decision to [`KiteStrategy`].
//! Outgoing packets go to an [`Egress`] sink.

use std::collections::HashMap;
use std::time::Instant;

use kite_core::{Data, Face, FaceId, Interest, Nack, NackReason, Name, PitToken};
use kite_tables::{Fib, FibEntry, Measurements, NextHop, Pit};
use tracing::{debug, trace, warn};

use crate::host::StrategyHost;
use crate::strategy::KiteStrategy;

/// Where the forwarder puts outgoing packets
pub trait Egress {
    fn send_interest(&mut self, face: FaceId, interest: &Interest);
    fn send_data(&mut self, face: FaceId, data: &Data);
    fn send_nack(&mut self, face: FaceId, nack: &Nack);
}

/// A packet that left the forwarder
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Interest { face: FaceId, interest: Interest },
    Data { face: FaceId, data: Data },
    Nack { face: FaceId, nack: Nack },
}

impl Sent {
    pub fn face(&self) -> FaceId {
        match self {
            Self::Interest { face, .. } | Self::Data { face, .. } | Self::Nack { face, .. } => {
                *face
            }
        }
    }
}

/// [`Egress`] that keeps every packet in order
#[derive(Debug, Default)]
pub struct RecordingEgress {
    sent: Vec<Sent>,
}

impl RecordingEgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> &[Sent] {
        &self.sent
    }

    /// Drain everything recorded so far
    pub fn take(&mut self) -> Vec<Sent> {
        std::mem::take(&mut self.sent)
    }

    /// Faces an Interest named `name` went out on
    pub fn interest_faces(&self, name: &Name) -> Vec<FaceId> {
        self.sent
            .iter()
            .filter_map(|sent| match sent {
                Sent::Interest { face, interest } if &interest.name == name => Some(*face),
                _ => None,
            })
            .collect()
    }

    /// NACKs sent, as (face, reason)
    pub fn nacks(&self) -> Vec<(FaceId, NackReason)> {
        self.sent
            .iter()
            .filter_map(|sent| match sent {
                Sent::Nack { face, nack } => Some((*face, nack.reason)),
                _ => None,
            })
            .collect()
    }

    /// Faces Data went out on
    pub fn data_faces(&self) -> Vec<FaceId> {
        self.sent
            .iter()
            .filter_map(|sent| match sent {
                Sent::Data { face, .. } => Some(*face),
                _ => None,
            })
            .collect()
    }
}

impl Egress for RecordingEgress {
    fn send_interest(&mut self, face: FaceId, interest: &Interest) {
        self.sent.push(Sent::Interest {
            face,
            interest: interest.clone(),
        });
    }

    fn send_data(&mut self, face: FaceId, data: &Data) {
        self.sent.push(Sent::Data {
            face,
            data: data.clone(),
        });
    }

    fn send_nack(&mut self, face: FaceId, nack: &Nack) {
        self.sent.push(Sent::Nack {
            face,
            nack: nack.clone(),
        });
    }
}

/// Faces, tables and egress: everything a strategy may touch
#[derive(Debug)]
pub struct Dataplane<E: Egress> {
    faces: HashMap<FaceId, Face>,
    pit: Pit,
    fib: Fib,
    measurements: Measurements,
    egress: E,
}

impl<E: Egress> Dataplane<E> {
    pub fn new(egress: E) -> Self {
        Self {
            faces: HashMap::new(),
            pit: Pit::new(),
            fib: Fib::new(),
            measurements: Measurements::new(),
            egress,
        }
    }

    pub fn face(&self, id: FaceId) -> Option<Face> {
        self.faces.get(&id).copied()
    }

    pub fn fib(&self) -> &Fib {
        &self.fib
    }

    pub fn fib_mut(&mut self) -> &mut Fib {
        &mut self.fib
    }

    pub fn egress(&self) -> &E {
        &self.egress
    }

    pub fn egress_mut(&mut self) -> &mut E {
        &mut self.egress
    }
}

impl<E: Egress> StrategyHost for Dataplane<E> {
    fn now(&self) -> Instant {
        tokio::time::Instant::now().into_std()
    }

    fn lookup_fib(&self, name: &Name) -> FibEntry {
        self.fib.find_longest_prefix_match(name)
    }

    fn is_next_hop_eligible(
        &self,
        ingress: FaceId,
        interest: &Interest,
        next_hop: &NextHop,
        token: PitToken,
    ) -> bool {
        if next_hop.face == ingress {
            return false;
        }
        let Some(face) = self.face(next_hop.face) else {
            return false;
        };
        if interest.name.is_localhost() && !face.is_local() {
            return false;
        }
        let now = self.now();
        !self
            .pit
            .get(token)
            .and_then(|entry| entry.out_record(next_hop.face))
            .is_some_and(|record| record.is_pending(now))
    }

    fn send_interest(&mut self, token: PitToken, face: FaceId, interest: &Interest) -> bool {
        let now = self.now();
        let Some(entry) = self.pit.get_mut(token) else {
            return false;
        };
        entry.insert_or_update_out_record(face, interest, now);
        self.egress.send_interest(face, interest);
        true
    }

    fn send_nack(&mut self, token: PitToken, face: FaceId, reason: NackReason) {
        let Some(entry) = self.pit.get_mut(token) else {
            return;
        };
        let Some(record) = entry.remove_in_record(face) else {
            trace!(face = %face, "No in-record to NACK");
            return;
        };
        let nack = Nack::new(record.interest().clone(), reason);
        self.egress.send_nack(face, &nack);
    }

    fn reject_pending_interest(&mut self, token: PitToken) {
        if let Ok(entry) = self.pit.remove(token) {
            debug!(name = %entry.name(), "Pending interest rejected");
        }
    }

    fn pit(&self) -> &Pit {
        &self.pit
    }

    fn pit_mut(&mut self) -> &mut Pit {
        &mut self.pit
    }

    fn measurements(&self) -> &Measurements {
        &self.measurements
    }

    fn measurements_mut(&mut self) -> &mut Measurements {
        &mut self.measurements
    }
}

/// A forwarder running [`KiteStrategy`] for every name
#[derive(Debug)]
pub struct Forwarder<E: Egress> {
    dataplane: Dataplane<E>,
    strategy: KiteStrategy,
}

impl<E: Egress> Forwarder<E> {
    pub fn new(strategy: KiteStrategy, egress: E) -> Self {
        Self {
            dataplane: Dataplane::new(egress),
            strategy,
        }
    }

    pub fn strategy(&self) -> &KiteStrategy {
        &self.strategy
    }

    pub fn dataplane(&self) -> &Dataplane<E> {
        &self.dataplane
    }

    pub fn dataplane_mut(&mut self) -> &mut Dataplane<E> {
        &mut self.dataplane
    }

    pub fn egress(&self) -> &E {
        &self.dataplane.egress
    }

    pub fn egress_mut(&mut self) -> &mut E {
        &mut self.dataplane.egress
    }

    pub fn add_face(&mut self, face: Face) {
        self.dataplane.faces.insert(face.id, face);
    }

    /// Remove a face and every route through it
    pub fn remove_face(&mut self, id: FaceId) -> Option<Face> {
        self.dataplane.fib.remove_face(id);
        self.dataplane.faces.remove(&id)
    }

    /// Add a FIB route
    pub fn add_route(&mut self, prefix: Name, face: FaceId, cost: u64) {
        self.dataplane.fib.insert(prefix, face, cost);
    }

    /// Incoming Interest pipeline
    pub fn on_incoming_interest(&mut self, ingress: FaceId, interest: Interest) {
        let Some(face) = self.dataplane.face(ingress) else {
            warn!(face = %ingress, "Interest from unknown face");
            return;
        };
        if interest.name.is_localhost() && !face.is_local() {
            debug!(interest = %interest, face = %ingress, "Dropping /localhost Interest from non-local face");
            return;
        }

        let now = self.dataplane.now();
        let (token, created) = self.dataplane.pit.insert(&interest);
        let Some(entry) = self.dataplane.pit.get_mut(token) else {
            return;
        };
        if entry.has_duplicate_nonce(interest.nonce, ingress) {
            debug!(interest = %interest, face = %ingress, "Duplicate nonce");
            let nack = Nack::new(interest, NackReason::Duplicate);
            self.dataplane.egress.send_nack(ingress, &nack);
            return;
        }
        let aggregated = !created && entry.out_records().iter().any(|r| r.is_pending(now));
        entry.insert_or_update_in_record(face, &interest, now);
        if aggregated {
            debug!(interest = %interest, face = %ingress, "Aggregated into pending entry");
            return;
        }

        trace!(interest = %interest, face = %ingress, token = %token, "Dispatching Interest");
        self.strategy
            .after_receive_interest(&mut self.dataplane, ingress, &interest, token);
    }

    /// Incoming NACK pipeline
    pub fn on_incoming_nack(&mut self, ingress: FaceId, nack: Nack) {
        let Some(token) = self.dataplane.pit.find(&nack.interest) else {
            debug!(interest = %nack.interest, "NACK with no PIT entry");
            return;
        };
        let accepted = self
            .dataplane
            .pit
            .get_mut(token)
            .and_then(|entry| entry.out_record_mut(ingress))
            .is_some_and(|record| record.set_incoming_nack(nack.interest.nonce, nack.reason));
        if !accepted {
            debug!(interest = %nack.interest, face = %ingress, "NACK does not match an out-record");
            return;
        }

        self.strategy
            .after_receive_nack(&mut self.dataplane, ingress, &nack, token);
    }

    /// Incoming Data pipeline
    pub fn on_incoming_data(&mut self, ingress: FaceId, data: Data) {
        let tokens = self.dataplane.pit.find_matching(&data);
        if tokens.is_empty() {
            debug!(name = %data.name, face = %ingress, "Unsolicited Data");
            return;
        }

        for token in tokens {
            self.strategy
                .before_satisfy_interest(&mut self.dataplane, token, ingress, &data);

            let now = self.dataplane.now();
            let Ok(entry) = self.dataplane.pit.remove(token) else {
                continue;
            };
            for record in entry.in_records() {
                if record.face_id() == ingress || record.is_expired(now) {
                    continue;
                }
                self.dataplane.egress.send_data(record.face_id(), &data);
            }
        }
    }

    /// Drop expired PIT entries and measurements
    pub fn cleanup(&mut self) {
        let now = self.dataplane.now();
        for token in self.dataplane.pit.expired(now) {
            if let Ok(entry) = self.dataplane.pit.remove(token) {
                trace!(name = %entry.name(), "PIT entry expired");
            }
        }
        self.dataplane.measurements.cleanup(now);
    }
}
