//! Measurements table: expiring per-prefix strategy state

use std::collections::HashMap;
use std::time::{Duration, Instant};

use kite_core::{MobileProducerInfo, Name};
use tracing::trace;

use crate::error::TableError;

/// Lifetime of a freshly created measurements entry
pub const DEFAULT_MEASUREMENTS_LIFETIME: Duration = Duration::from_secs(4);

/// Strategy state for one name prefix
#[derive(Debug, Clone)]
pub struct MeasurementsEntry {
    name: Name,
    expiry: Instant,
    producer: Option<MobileProducerInfo>,
}

impl MeasurementsEntry {
    fn new(name: Name, now: Instant) -> Self {
        Self {
            name,
            expiry: now + DEFAULT_MEASUREMENTS_LIFETIME,
            producer: None,
        }
    }

    pub fn name(&self) -> &Name {
        &self.name
    }

    pub fn expiry(&self) -> Instant {
        self.expiry
    }

    pub fn producer(&self) -> Option<&MobileProducerInfo> {
        self.producer.as_ref()
    }

    pub fn producer_mut(&mut self) -> Option<&mut MobileProducerInfo> {
        self.producer.as_mut()
    }

    /// Producer bookkeeping, created on first use
    pub fn producer_info_mut(&mut self) -> &mut MobileProducerInfo {
        let name = &self.name;
        self.producer
            .get_or_insert_with(|| MobileProducerInfo::new(name.clone()))
    }
}

/// Measurements keyed by exact name
#[derive(Debug, Default)]
pub struct Measurements {
    entries: HashMap<Name, MeasurementsEntry>,
}

impl Measurements {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &Name) -> Option<&MeasurementsEntry> {
        self.entries.get(name)
    }

    pub fn get_mut(&mut self, name: &Name) -> Option<&mut MeasurementsEntry> {
        self.entries.get_mut(name)
    }

    /// Find or create the entry for `name`
    pub fn get_or_insert(&mut self, name: &Name, now: Instant) -> &mut MeasurementsEntry {
        self.entries.entry(name.clone()).or_insert_with(|| {
            trace!(name = %name, "Measurements entry created");
            MeasurementsEntry::new(name.clone(), now)
        })
    }

    /// Push the entry's expiry to at least `now + lifetime`. Never shortens it.
    pub fn extend_lifetime(
        &mut self,
        name: &Name,
        lifetime: Duration,
        now: Instant,
    ) -> Result<Instant, TableError> {
        let entry = self
            .entries
            .get_mut(name)
            .ok_or_else(|| TableError::NoEntry(name.clone()))?;
        entry.expiry = entry.expiry.max(now + lifetime);
        Ok(entry.expiry)
    }

    pub fn remove(&mut self, name: &Name) -> Option<MeasurementsEntry> {
        self.entries.remove(name)
    }

    /// Drop expired entries, returning how many were removed
    pub fn cleanup(&mut self, now: Instant) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.expiry > now);
        let removed = before - self.entries.len();
        if removed > 0 {
            trace!(removed, "Expired measurements entries dropped");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
