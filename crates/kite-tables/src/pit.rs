//! Pending Interest Table
//!
//! Entries live in a slot arena addressed by [`PitToken`]. Removing an entry
//! bumps its slot generation, so tokens held elsewhere (for example in a
//! producer's replay map) stop resolving instead of pointing at whatever
//! entry reuses the slot.

use std::collections::HashMap;
use std::time::Instant;

use kite_core::{Data, Face, FaceId, Interest, InterestStatus, Name, NackReason, PitToken};
use tracing::trace;

use crate::error::TableError;

/// Downstream record: a face that asked for the Interest
#[derive(Debug, Clone)]
pub struct InRecord {
    face: Face,
    last_nonce: u32,
    last_renewed: Instant,
    expiry: Instant,
    interest: Interest,
    /// Mobility tag, present only on records created by the mobility path
    pub status: Option<InterestStatus>,
}

impl InRecord {
    pub fn face(&self) -> Face {
        self.face
    }

    pub fn face_id(&self) -> FaceId {
        self.face.id
    }

    pub fn last_nonce(&self) -> u32 {
        self.last_nonce
    }

    pub fn last_renewed(&self) -> Instant {
        self.last_renewed
    }

    pub fn expiry(&self) -> Instant {
        self.expiry
    }

    /// The Interest as last received on this face
    pub fn interest(&self) -> &Interest {
        &self.interest
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        self.expiry <= now
    }
}

/// Upstream record: a face the Interest was forwarded to
#[derive(Debug, Clone)]
pub struct OutRecord {
    face: FaceId,
    last_nonce: u32,
    last_renewed: Instant,
    expiry: Instant,
    incoming_nack: Option<NackReason>,
    /// Mobility tag, present only on records created by the mobility path
    pub status: Option<InterestStatus>,
}

impl OutRecord {
    pub fn face(&self) -> FaceId {
        self.face
    }

    pub fn last_nonce(&self) -> u32 {
        self.last_nonce
    }

    pub fn last_renewed(&self) -> Instant {
        self.last_renewed
    }

    pub fn expiry(&self) -> Instant {
        self.expiry
    }

    /// Reason of the NACK received on this face, if any
    pub fn incoming_nack(&self) -> Option<NackReason> {
        self.incoming_nack
    }

    /// Record a NACK. Only accepted when it answers the last sent nonce.
    pub fn set_incoming_nack(&mut self, nonce: u32, reason: NackReason) -> bool {
        if nonce != self.last_nonce {
            return false;
        }
        self.incoming_nack = Some(reason);
        true
    }

    /// Sent, not yet expired and not NACKed
    pub fn is_pending(&self, now: Instant) -> bool {
        self.incoming_nack.is_none() && self.expiry > now
    }
}

/// One pending Interest with its downstream and upstream records
#[derive(Debug, Clone)]
pub struct PitEntry {
    interest: Interest,
    in_records: Vec<InRecord>,
    out_records: Vec<OutRecord>,
}

impl PitEntry {
    fn new(interest: Interest) -> Self {
        Self {
            interest,
            in_records: Vec::new(),
            out_records: Vec::new(),
        }
    }

    /// Representative Interest (the one that created the entry)
    pub fn interest(&self) -> &Interest {
        &self.interest
    }

    pub fn name(&self) -> &Name {
        &self.interest.name
    }

    pub fn in_records(&self) -> &[InRecord] {
        &self.in_records
    }

    pub fn out_records(&self) -> &[OutRecord] {
        &self.out_records
    }

    pub fn has_in_records(&self) -> bool {
        !self.in_records.is_empty()
    }

    pub fn in_record(&self, face: FaceId) -> Option<&InRecord> {
        self.in_records.iter().find(|r| r.face.id == face)
    }

    pub fn in_record_mut(&mut self, face: FaceId) -> Option<&mut InRecord> {
        self.in_records.iter_mut().find(|r| r.face.id == face)
    }

    pub fn out_record(&self, face: FaceId) -> Option<&OutRecord> {
        self.out_records.iter().find(|r| r.face == face)
    }

    pub fn out_record_mut(&mut self, face: FaceId) -> Option<&mut OutRecord> {
        self.out_records.iter_mut().find(|r| r.face == face)
    }

    /// Insert or refresh the downstream record for `face`
    ///
    /// A refreshed record keeps its mobility tag.
    pub fn insert_or_update_in_record(
        &mut self,
        face: Face,
        interest: &Interest,
        now: Instant,
    ) -> &mut InRecord {
        let expiry = now + interest.lifetime;
        match self.in_records.iter().position(|r| r.face.id == face.id) {
            Some(i) => {
                let record = &mut self.in_records[i];
                record.face = face;
                record.last_nonce = interest.nonce;
                record.last_renewed = now;
                record.expiry = expiry;
                record.interest = interest.clone();
                record
            }
            None => {
                self.in_records.push(InRecord {
                    face,
                    last_nonce: interest.nonce,
                    last_renewed: now,
                    expiry,
                    interest: interest.clone(),
                    status: None,
                });
                let last = self.in_records.len() - 1;
                &mut self.in_records[last]
            }
        }
    }

    /// Insert or refresh the upstream record for `face`
    ///
    /// Refreshing clears any earlier NACK and keeps the mobility tag.
    pub fn insert_or_update_out_record(
        &mut self,
        face: FaceId,
        interest: &Interest,
        now: Instant,
    ) -> &mut OutRecord {
        let expiry = now + interest.lifetime;
        match self.out_records.iter().position(|r| r.face == face) {
            Some(i) => {
                let record = &mut self.out_records[i];
                record.last_nonce = interest.nonce;
                record.last_renewed = now;
                record.expiry = expiry;
                record.incoming_nack = None;
                record
            }
            None => {
                self.out_records.push(OutRecord {
                    face,
                    last_nonce: interest.nonce,
                    last_renewed: now,
                    expiry,
                    incoming_nack: None,
                    status: None,
                });
                let last = self.out_records.len() - 1;
                &mut self.out_records[last]
            }
        }
    }

    pub fn remove_in_record(&mut self, face: FaceId) -> Option<InRecord> {
        let i = self.in_records.iter().position(|r| r.face.id == face)?;
        Some(self.in_records.remove(i))
    }

    pub fn clear_in_records(&mut self) {
        self.in_records.clear();
    }

    /// Whether `nonce` was already seen on a face other than `face`
    pub fn has_duplicate_nonce(&self, nonce: u32, face: FaceId) -> bool {
        self.in_records
            .iter()
            .any(|r| r.last_nonce == nonce && r.face.id != face)
            || self.out_records.iter().any(|r| r.last_nonce == nonce)
    }

    /// Latest expiry among the in-records
    pub fn expiry(&self) -> Option<Instant> {
        self.in_records.iter().map(|r| r.expiry).max()
    }
}

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    entry: Option<PitEntry>,
}

type PitKey = (Name, bool, bool);

fn key_of(interest: &Interest) -> PitKey {
    (
        interest.name.clone(),
        interest.can_be_prefix,
        interest.must_be_fresh,
    )
}

/// The Pending Interest Table
#[derive(Debug, Default)]
pub struct Pit {
    slots: Vec<Slot>,
    free: Vec<u32>,
    index: HashMap<PitKey, u32>,
}

impl Pit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Find or create the entry for `interest`
    ///
    /// Returns the entry token and whether the entry was created.
    pub fn insert(&mut self, interest: &Interest) -> (PitToken, bool) {
        let key = key_of(interest);
        if let Some(&index) = self.index.get(&key) {
            let generation = self.slots[index as usize].generation;
            return (PitToken::new(index, generation), false);
        }

        let index = match self.free.pop() {
            Some(index) => index,
            None => {
                self.slots.push(Slot::default());
                (self.slots.len() - 1) as u32
            }
        };
        let slot = &mut self.slots[index as usize];
        slot.entry = Some(PitEntry::new(interest.clone()));
        self.index.insert(key, index);

        let token = PitToken::new(index, slot.generation);
        trace!(interest = %interest, token = %token, "PIT entry created");
        (token, true)
    }

    pub fn get(&self, token: PitToken) -> Option<&PitEntry> {
        let slot = self.slots.get(token.index as usize)?;
        if slot.generation != token.generation {
            return None;
        }
        slot.entry.as_ref()
    }

    pub fn get_mut(&mut self, token: PitToken) -> Option<&mut PitEntry> {
        let slot = self.slots.get_mut(token.index as usize)?;
        if slot.generation != token.generation {
            return None;
        }
        slot.entry.as_mut()
    }

    pub fn contains(&self, token: PitToken) -> bool {
        self.get(token).is_some()
    }

    /// Remove an entry, invalidating every outstanding token for it
    pub fn remove(&mut self, token: PitToken) -> Result<PitEntry, TableError> {
        let slot = self
            .slots
            .get_mut(token.index as usize)
            .filter(|slot| slot.generation == token.generation)
            .ok_or(TableError::StaleToken(token))?;
        let entry = slot.entry.take().ok_or(TableError::StaleToken(token))?;
        slot.generation = slot.generation.wrapping_add(1);

        self.index.remove(&key_of(&entry.interest));
        self.free.push(token.index);
        trace!(name = %entry.name(), token = %token, "PIT entry removed");
        Ok(entry)
    }

    /// Token of the entry that `interest` would aggregate into
    pub fn find(&self, interest: &Interest) -> Option<PitToken> {
        let index = *self.index.get(&key_of(interest))?;
        let generation = self.slots[index as usize].generation;
        Some(PitToken::new(index, generation))
    }

    /// Tokens of every entry satisfied by `data`
    pub fn find_matching(&self, data: &Data) -> Vec<PitToken> {
        self.tokens()
            .filter(|(_, entry)| entry.interest.matches_data(data))
            .map(|(token, _)| token)
            .collect()
    }

    /// Entries whose in-records have all expired
    pub fn expired(&self, now: Instant) -> Vec<PitToken> {
        self.tokens()
            .filter(|(_, entry)| entry.expiry().is_none_or(|expiry| expiry <= now))
            .map(|(token, _)| token)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    fn tokens(&self) -> impl Iterator<Item = (PitToken, &PitEntry)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.entry
                .as_ref()
                .map(|entry| (PitToken::new(index as u32, slot.generation), entry))
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn interest(uri: &str, nonce: u32) -> Interest {
        Interest::new(Name::parse(uri).unwrap()).with_nonce(nonce)
    }

    #[test]
    fn test_insert_aggregates_by_name() {
        let mut pit = Pit::new();
        let (a, created) = pit.insert(&interest("/mp/1", 1));
        assert!(created);
        let (b, created) = pit.insert(&interest("/mp/1", 2));
        assert!(!created);
        assert_eq!(a, b);

        let (c, created) = pit.insert(&interest("/mp/1", 3).with_can_be_prefix(true));
        assert!(created);
        assert_ne!(a, c);
        assert_eq!(pit.len(), 2);
    }

    #[test]
    fn test_removed_token_goes_stale() {
        let mut pit = Pit::new();
        let (old, _) = pit.insert(&interest("/mp/1", 1));
        pit.remove(old).unwrap();

        assert!(pit.get(old).is_none());
        assert_eq!(pit.remove(old).unwrap_err(), TableError::StaleToken(old));

        // Slot is reused with a new generation
        let (new, _) = pit.insert(&interest("/mp/2", 2));
        assert_eq!(new.index, old.index);
        assert_ne!(new.generation, old.generation);
        assert!(pit.get(old).is_none());
        assert_eq!(pit.get(new).unwrap().name().to_string(), "/mp/2");
    }

    #[test]
    fn test_in_record_refresh_keeps_tag() {
        let now = Instant::now();
        let mut entry = PitEntry::new(interest("/mp/1", 1));
        let record = entry.insert_or_update_in_record(Face::remote(1), &interest("/mp/1", 1), now);
        record.status = Some(InterestStatus::straight_forward(
            Name::from_components(["rv"]),
            Name::from_components(["mp"]),
        ));

        let later = now + Duration::from_secs(1);
        let record = entry.insert_or_update_in_record(Face::remote(1), &interest("/mp/1", 9), later);
        assert_eq!(record.last_nonce(), 9);
        assert!(record.status.is_some());
        assert_eq!(entry.in_records().len(), 1);
    }

    #[test]
    fn test_out_record_nack() {
        let now = Instant::now();
        let mut entry = PitEntry::new(interest("/mp/1", 1));
        let record = entry.insert_or_update_out_record(FaceId(2), &interest("/mp/1", 7), now);
        assert!(record.is_pending(now));

        assert!(!record.set_incoming_nack(8, NackReason::NoRoute));
        assert!(record.set_incoming_nack(7, NackReason::NoRoute));
        assert!(!record.is_pending(now));
        assert_eq!(record.incoming_nack(), Some(NackReason::NoRoute));

        // Resending clears the NACK
        let record = entry.insert_or_update_out_record(FaceId(2), &interest("/mp/1", 7), now);
        assert!(record.incoming_nack().is_none());
    }

    #[test]
    fn test_duplicate_nonce() {
        let now = Instant::now();
        let mut entry = PitEntry::new(interest("/mp/1", 1));
        entry.insert_or_update_in_record(Face::remote(1), &interest("/mp/1", 5), now);

        assert!(!entry.has_duplicate_nonce(5, FaceId(1)));
        assert!(entry.has_duplicate_nonce(5, FaceId(2)));
        assert!(!entry.has_duplicate_nonce(6, FaceId(2)));
    }

    #[test]
    fn test_find_matching() {
        let mut pit = Pit::new();
        let (exact, _) = pit.insert(&interest("/mp/video/1", 1));
        let (prefix, _) = pit.insert(&interest("/mp/video", 2).with_can_be_prefix(true));
        pit.insert(&interest("/mp/video", 3));

        let data = Data::new(Name::parse("/mp/video/1").unwrap(), "x");
        let mut found = pit.find_matching(&data);
        found.sort_by_key(|t| t.index);
        assert_eq!(found, vec![exact, prefix]);
    }

    #[test]
    fn test_expired_entries() {
        let now = Instant::now();
        let mut pit = Pit::new();
        let (token, _) = pit.insert(&interest("/mp/1", 1));
        pit.get_mut(token).unwrap().insert_or_update_in_record(
            Face::remote(1),
            &interest("/mp/1", 1).with_lifetime(Duration::from_millis(100)),
            now,
        );

        assert!(pit.expired(now).is_empty());
        assert_eq!(pit.expired(now + Duration::from_millis(100)), vec![token]);
    }
}
