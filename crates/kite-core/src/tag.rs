//! Strategy metadata attached to pending-interest records and measurements
//!
//! In-records and out-records created on the mobility path carry an
//! [`InterestStatus`]. Per-producer bookkeeping lives in a
//! [`MobileProducerInfo`] stored on the measurements entry of the producer
//! prefix.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::face::FaceId;
use crate::name::Name;

/// Handle to a pending-interest table slot
///
/// The table bumps a slot's generation when the entry is removed, so a
/// token held past that point no longer resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PitToken {
    pub index: u32,
    pub generation: u32,
}

impl PitToken {
    pub fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }
}

impl fmt::Display for PitToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pit#{}.{}", self.index, self.generation)
    }
}

/// How far a mobility interest has been escalated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RetransmissionStage {
    /// Sent toward the producer's advertised prefix
    StraightForward,
    /// Retransmitted toward the rendezvous name
    Rv,
}

/// Mobility state of one in-record or out-record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterestStatus {
    pub stage: RetransmissionStage,
    pub rv_name: Name,
    pub mp_name: Name,
}

impl InterestStatus {
    pub fn straight_forward(rv_name: Name, mp_name: Name) -> Self {
        Self {
            stage: RetransmissionStage::StraightForward,
            rv_name,
            mp_name,
        }
    }

    pub fn is_straight_forward(&self) -> bool {
        self.stage == RetransmissionStage::StraightForward
    }

    /// Move to the `Rv` stage. Returns true only on the actual transition.
    pub fn escalate(&mut self) -> bool {
        match self.stage {
            RetransmissionStage::StraightForward => {
                self.stage = RetransmissionStage::Rv;
                true
            }
            RetransmissionStage::Rv => false,
        }
    }
}

/// Bookkeeping for one mobile producer prefix
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MobileProducerInfo {
    pub mp_name: Name,
    pending: HashMap<Name, PitToken>,
    faces: HashSet<FaceId>,
}

impl MobileProducerInfo {
    pub fn new(mp_name: Name) -> Self {
        Self {
            mp_name,
            ..Default::default()
        }
    }

    /// Remember a pending interest for replay
    ///
    /// A name is tracked at most once. The newest token replaces an older
    /// one, which may already point at a reclaimed entry.
    pub fn track(&mut self, interest_name: Name, token: PitToken) {
        self.pending.insert(interest_name, token);
    }

    pub fn untrack(&mut self, interest_name: &Name) -> Option<PitToken> {
        self.pending.remove(interest_name)
    }

    pub fn pending(&self, interest_name: &Name) -> Option<PitToken> {
        self.pending.get(interest_name).copied()
    }

    /// Snapshot of every tracked (name, token) pair
    pub fn pending_tokens(&self) -> Vec<(Name, PitToken)> {
        self.pending
            .iter()
            .map(|(name, token)| (name.clone(), *token))
            .collect()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Add a face with an active route. Returns true if it was not known.
    pub fn add_face(&mut self, face: FaceId) -> bool {
        self.faces.insert(face)
    }

    pub fn remove_face(&mut self, face: FaceId) -> bool {
        self.faces.remove(&face)
    }

    pub fn has_face(&self, face: FaceId) -> bool {
        self.faces.contains(&face)
    }

    pub fn faces(&self) -> impl Iterator<Item = FaceId> + '_ {
        self.faces.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escalation_is_one_way() {
        let mut status = InterestStatus::straight_forward(
            Name::from_components(["rv"]),
            Name::from_components(["mp"]),
        );
        assert!(status.is_straight_forward());
        assert!(status.escalate());
        assert_eq!(status.stage, RetransmissionStage::Rv);
        assert!(!status.escalate());
        assert_eq!(status.stage, RetransmissionStage::Rv);
    }

    #[test]
    fn test_track_keeps_newest_token() {
        let mut info = MobileProducerInfo::new(Name::from_components(["mp"]));
        let name = Name::from_components(["mp", "1"]);

        info.track(name.clone(), PitToken::new(0, 0));
        info.track(name.clone(), PitToken::new(0, 1));
        assert_eq!(info.pending_len(), 1);
        assert_eq!(info.pending(&name), Some(PitToken::new(0, 1)));

        assert_eq!(info.untrack(&name), Some(PitToken::new(0, 1)));
        assert_eq!(info.pending_len(), 0);
    }

    #[test]
    fn test_faces() {
        let mut info = MobileProducerInfo::new(Name::from_components(["mp"]));
        assert!(info.add_face(FaceId(2)));
        assert!(!info.add_face(FaceId(2)));
        assert!(info.has_face(FaceId(2)));
        assert!(info.remove_face(FaceId(2)));
        assert!(!info.has_face(FaceId(2)));
        assert_eq!(info.faces().count(), 0);
    }
}
