//! KITE forwarding strategy
//!
//! The strategy reacts to three forwarder events:
//!
//! 1. **Interest**: forward toward the producer prefix when the Interest
//!    carries a mobility hint, falling back to the rendezvous name; plain
//!    Interests go to every eligible FIB next hop
//! 2. **NACK**: withdraw the route a `StraightForward` record used, then
//!    either wait, retransmit toward the rendezvous, or NACK downstream
//! 3. **Data**: a mobility acknowledgment installs a route toward the
//!    producer's new location and replays Interests queued for it; other
//!    Data clears the producer's replay map
//!
//! Every entry point is total. It forwards, or it answers downstream with
//! exactly one NACK, and route changes are only ever queued on the
//! [`RibHandle`].

use std::collections::HashSet;

use kite_core::{
    ContentType, Data, FaceId, ForwardingError, Interest, InterestStatus, MobilityAck, Nack,
    NackReason, Name, PitToken,
};
use tracing::{debug, trace, warn};

use crate::config::{StrategyConfig, strategy_name, validate_instance_name};
use crate::error::StrategyError;
use crate::host::StrategyHost;
use crate::nack::{NackDisposition, classify};
use crate::rib::RibHandle;

/// Producer-mobility forwarding strategy
#[derive(Debug, Clone)]
pub struct KiteStrategy {
    instance_name: Name,
    config: StrategyConfig,
    rib: RibHandle,
}

impl KiteStrategy {
    /// Create a strategy with default configuration
    pub fn new(rib: RibHandle) -> Self {
        Self {
            instance_name: strategy_name(),
            config: StrategyConfig::default(),
            rib,
        }
    }

    /// Create a strategy for a requested instance name
    ///
    /// Rejects parameters and versions other than the one implemented.
    pub fn with_instance_name(rib: RibHandle, name: &Name) -> Result<Self, StrategyError> {
        let instance_name = validate_instance_name(name)?;
        Ok(Self {
            instance_name,
            config: StrategyConfig::default(),
            rib,
        })
    }

    /// Replace the configuration
    pub fn with_config(mut self, config: StrategyConfig) -> Self {
        self.config = config;
        self
    }

    /// The normalized strategy instance name
    pub fn instance_name(&self) -> &Name {
        &self.instance_name
    }

    /// Route validity settings
    pub fn config(&self) -> &StrategyConfig {
        &self.config
    }

    // ========================================================================
    // Interest
    // ========================================================================

    /// Decide where a newly received Interest goes
    pub fn after_receive_interest<H: StrategyHost + ?Sized>(
        &self,
        host: &mut H,
        ingress: FaceId,
        interest: &Interest,
        token: PitToken,
    ) {
        if let Some(hint) = interest.forwarding_hint.mobility_hint() {
            debug!(interest = %interest, rv = %hint.name, "Mobility hint found");
            let rv_name = hint.name.clone();
            self.forward_mobility(host, ingress, interest, token, rv_name);
            return;
        }
        self.forward_plain(host, ingress, interest, token);
    }

    fn forward_mobility<H: StrategyHost + ?Sized>(
        &self,
        host: &mut H,
        ingress: FaceId,
        interest: &Interest,
        token: PitToken,
        rv_name: Name,
    ) {
        let Some(entry) = host.pit().get(token) else {
            return;
        };
        let fib_entry = host.lookup_fib(entry.name());
        let mp_name = fib_entry.prefix().clone();
        let mut found = false;

        for next_hop in fib_entry.next_hops() {
            if !host.is_next_hop_eligible(ingress, interest, next_hop, token) {
                trace!(interest = %interest, face = %next_hop.face, "Next hop not eligible");
                continue;
            }
            if !found {
                found = true;
                if let Some(record) = host
                    .pit_mut()
                    .get_mut(token)
                    .and_then(|entry| entry.in_record_mut(ingress))
                {
                    record.status = Some(InterestStatus::straight_forward(
                        rv_name.clone(),
                        mp_name.clone(),
                    ));
                }
            }

            debug!(interest = %interest, from = %ingress, to = %next_hop.face, "Forwarding toward producer");
            if host.send_interest(token, next_hop.face, interest)
                && let Some(record) = host
                    .pit_mut()
                    .get_mut(token)
                    .and_then(|entry| entry.out_record_mut(next_hop.face))
            {
                record.status = Some(InterestStatus::straight_forward(
                    rv_name.clone(),
                    mp_name.clone(),
                ));
            }
        }

        if found {
            let now = host.now();
            host.measurements_mut()
                .get_or_insert(&mp_name, now)
                .producer_info_mut()
                .track(interest.name.clone(), token);
            return;
        }

        debug!(rv = %rv_name, "No producer route, looking up rendezvous");
        let rv_entry = host.lookup_fib(&rv_name);
        for next_hop in rv_entry.next_hops() {
            if !host.is_next_hop_eligible(ingress, interest, next_hop, token) {
                trace!(interest = %interest, face = %next_hop.face, "Next hop not eligible");
                continue;
            }
            found = true;
            debug!(interest = %interest, from = %ingress, to = %next_hop.face, "Forwarding toward rendezvous");
            host.send_interest(token, next_hop.face, interest);
        }

        if !found {
            self.reject_no_route(host, ingress, interest, token);
        }
    }

    fn forward_plain<H: StrategyHost + ?Sized>(
        &self,
        host: &mut H,
        ingress: FaceId,
        interest: &Interest,
        token: PitToken,
    ) {
        let Some(entry) = host.pit().get(token) else {
            return;
        };
        let fib_entry = host.lookup_fib(entry.name());
        if !fib_entry.has_next_hops() {
            self.reject_no_route(host, ingress, interest, token);
            return;
        }

        let mut found = false;
        for next_hop in fib_entry.next_hops() {
            if !host.is_next_hop_eligible(ingress, interest, next_hop, token) {
                trace!(interest = %interest, face = %next_hop.face, "Next hop not eligible");
                continue;
            }
            found = true;
            debug!(interest = %interest, from = %ingress, to = %next_hop.face, "Forwarding");
            host.send_interest(token, next_hop.face, interest);
        }

        if !found {
            self.reject_no_route(host, ingress, interest, token);
        }
    }

    fn reject_no_route<H: StrategyHost + ?Sized>(
        &self,
        host: &mut H,
        ingress: FaceId,
        interest: &Interest,
        token: PitToken,
    ) {
        debug!(interest = %interest, from = %ingress, error = %ForwardingError::NoRoute, "NACK");
        host.send_nack(token, ingress, NackReason::NoRoute);
        host.reject_pending_interest(token);
    }

    // ========================================================================
    // NACK
    // ========================================================================

    /// React to a NACK received on the out-record for `ingress`
    ///
    /// The host has already recorded the NACK on that out-record.
    pub fn after_receive_nack<H: StrategyHost + ?Sized>(
        &self,
        host: &mut H,
        ingress: FaceId,
        nack: &Nack,
        token: PitToken,
    ) {
        let stale_route = host
            .pit()
            .get(token)
            .and_then(|entry| entry.out_record(ingress))
            .and_then(|record| record.status.as_ref())
            .filter(|status| status.is_straight_forward())
            .map(|status| status.mp_name.clone());

        if let Some(mp_name) = stale_route {
            self.remove_prefix(host, mp_name, ingress);
        }

        self.process_nack(host, ingress, nack, token);
    }

    /// Withdraw the mobility route for `mp_name` via `face`
    fn remove_prefix<H: StrategyHost + ?Sized>(&self, host: &mut H, mp_name: Name, face: FaceId) {
        let error = ForwardingError::StaleMobilityRoute {
            name: mp_name.clone(),
            face,
        };
        debug!(error = %error, "Withdrawing mobility route");

        if let Some(info) = host
            .measurements_mut()
            .get_mut(&mp_name)
            .and_then(|entry| entry.producer_mut())
        {
            info.remove_face(face);
        }
        self.rib
            .withdraw(mp_name, face, self.config.withdraw_validity);
    }

    fn process_nack<H: StrategyHost + ?Sized>(
        &self,
        host: &mut H,
        ingress: FaceId,
        nack: &Nack,
        token: PitToken,
    ) {
        let Some(entry) = host.pit().get(token) else {
            return;
        };

        match classify(entry) {
            NackDisposition::Wait { pending } => {
                debug!(interest = %nack.interest, nack_from = %ingress, reason = %nack.reason, pending, "Waiting for other upstreams");
            }
            NackDisposition::Bidirectional { face, reason } => {
                debug!(interest = %nack.interest, nack_from = %ingress, nack_to = %face, out_nack = %reason, "Bidirectional NACK");
                self.nack_bidirectional(host, face, reason, token);
            }
            NackDisposition::All { reason } => {
                debug!(interest = %nack.interest, nack_from = %ingress, out_nack = %reason, "All upstreams NACKed");
                self.nack_all(host, reason, token);
            }
        }
    }

    fn nack_bidirectional<H: StrategyHost + ?Sized>(
        &self,
        host: &mut H,
        face: FaceId,
        reason: NackReason,
        token: PitToken,
    ) {
        if self.deal_nack(host, face, token) {
            return;
        }

        debug!(face = %face, "No rendezvous face to retransmit on");
        let mp_name = tagged_mp_name(host, token, face);
        host.send_nack(token, face, reason);
        if let Some(mp_name) = mp_name {
            self.erase_measurement(host, &mp_name, token);
        }

        let exhausted = host
            .pit()
            .get(token)
            .is_some_and(|entry| !entry.has_in_records());
        if exhausted {
            host.reject_pending_interest(token);
        }
    }

    fn nack_all<H: StrategyHost + ?Sized>(&self, host: &mut H, reason: NackReason, token: PitToken) {
        let Some(entry) = host.pit().get(token) else {
            return;
        };
        let downstreams: Vec<FaceId> = entry.in_records().iter().map(|r| r.face_id()).collect();

        if downstreams
            .into_iter()
            .any(|face| self.deal_nack(host, face, token))
        {
            return;
        }

        debug!(reason = %reason, "No rendezvous face to retransmit on, NACKing all downstreams");
        let mp_names: Vec<Name> = host
            .pit()
            .get(token)
            .map(|entry| {
                entry
                    .out_records()
                    .iter()
                    .filter_map(|r| r.status.as_ref().map(|s| s.mp_name.clone()))
                    .collect()
            })
            .unwrap_or_default();

        host.send_nacks(token, reason);
        for mp_name in &mp_names {
            self.erase_measurement(host, mp_name, token);
        }
        host.reject_pending_interest(token);
    }

    /// Escalate the in-record on `face` to the rendezvous stage and
    /// retransmit toward the rendezvous name
    ///
    /// Returns whether any new upstream was tried. Records already at the
    /// rendezvous stage are not escalated again.
    fn deal_nack<H: StrategyHost + ?Sized>(&self, host: &mut H, face: FaceId, token: PitToken) -> bool {
        let Some(entry) = host.pit_mut().get_mut(token) else {
            return false;
        };
        let Some(status) = entry
            .in_record_mut(face)
            .and_then(|record| record.status.as_mut())
        else {
            return false;
        };
        if !status.escalate() {
            return false;
        }
        let rv_name = status.rv_name.clone();

        let used: HashSet<FaceId> = entry
            .in_records()
            .iter()
            .map(|r| r.face_id())
            .chain(entry.out_records().iter().map(|r| r.face()))
            .collect();
        let interest = entry.interest().clone();

        let rv_entry = host.lookup_fib(&rv_name);
        let mut found = false;
        for next_hop in rv_entry.next_hops() {
            if used.contains(&next_hop.face) {
                continue;
            }
            found = true;
            debug!(interest = %interest, from = %face, to = %next_hop.face, "Retransmitting toward rendezvous");
            host.send_interest(token, next_hop.face, &interest);
        }
        found
    }

    // ========================================================================
    // Data
    // ========================================================================

    /// React to Data about to satisfy the entry, received on `ingress`
    pub fn before_satisfy_interest<H: StrategyHost + ?Sized>(
        &self,
        host: &mut H,
        token: PitToken,
        ingress: FaceId,
        data: &Data,
    ) {
        if data.content_type == ContentType::KiteAck {
            match MobilityAck::from_data(data) {
                Ok(ack) => self.register_prefix(host, token, &ack),
                Err(e) => warn!(name = %data.name, error = %e, "Malformed mobility ack"),
            }
            return;
        }

        if let Some(mp_name) = satisfied_mp_name(host, token, ingress) {
            self.erase_measurement(host, &mp_name, token);
        }
    }

    fn register_prefix<H: StrategyHost + ?Sized>(&self, host: &mut H, token: PitToken, ack: &MobilityAck) {
        let announcement = ack.announcement();
        let mp_name = &announcement.announced_name;
        debug!(name = %mp_name, "Mobility ack received, registering route");

        let now = host.now();
        let Some(entry) = host.pit().get(token) else {
            return;
        };
        let faces: Vec<FaceId> = entry
            .in_records()
            .iter()
            .filter(|r| !r.face().is_local() && !r.is_expired(now))
            .map(|r| r.face_id())
            .collect();

        for face in faces {
            self.rib
                .announce(announcement.clone(), face, self.config.announce_validity);

            let measurements = host.measurements_mut();
            measurements.get_or_insert(mp_name, now);
            if let Err(e) = measurements.extend_lifetime(mp_name, announcement.expiration, now) {
                warn!(name = %mp_name, error = %e, "Cannot extend producer lifetime");
            }
            let Some(entry) = measurements.get_mut(mp_name) else {
                continue;
            };
            let info = entry.producer_info_mut();
            if !info.add_face(face) {
                continue;
            }
            let pending = info.pending_tokens();
            self.replay(host, mp_name, face, pending);
        }
    }

    /// Send every still-pending Interest queued for `mp_name` to `face`
    fn replay<H: StrategyHost + ?Sized>(
        &self,
        host: &mut H,
        mp_name: &Name,
        face: FaceId,
        pending: Vec<(Name, PitToken)>,
    ) {
        let mut done = Vec::with_capacity(pending.len());
        for (name, pending_token) in pending {
            match host.pit().get(pending_token) {
                Some(entry) => {
                    let interest = entry.interest().clone();
                    debug!(interest = %interest, to = %face, "Replaying toward new producer face");
                    host.send_interest(pending_token, face, &interest);
                }
                None => {
                    trace!(error = %ForwardingError::DanglingReference(name.clone()), "Skipping");
                }
            }
            done.push(name);
        }

        if let Some(info) = host
            .measurements_mut()
            .get_mut(mp_name)
            .and_then(|entry| entry.producer_mut())
        {
            for name in &done {
                info.untrack(name);
            }
        }
    }

    /// Forget the entry's Interest in the replay map of `mp_name`
    fn erase_measurement<H: StrategyHost + ?Sized>(&self, host: &mut H, mp_name: &Name, token: PitToken) {
        let Some(interest_name) = host.pit().get(token).map(|entry| entry.name().clone()) else {
            return;
        };
        if let Some(info) = host
            .measurements_mut()
            .get_mut(mp_name)
            .and_then(|entry| entry.producer_mut())
        {
            info.untrack(&interest_name);
        }
    }
}

/// Producer prefix tagged on the out-record for `face`
fn tagged_mp_name<H: StrategyHost + ?Sized>(host: &H, token: PitToken, face: FaceId) -> Option<Name> {
    host.pit()
        .get(token)?
        .out_record(face)?
        .status
        .as_ref()
        .map(|status| status.mp_name.clone())
}

/// Producer prefix whose replay entry Data for the entry settles
///
/// Data arriving over the rendezvous path lands on an untagged out-record,
/// so fall back to any tagged out-record, then to the downstream tags.
fn satisfied_mp_name<H: StrategyHost + ?Sized>(host: &H, token: PitToken, ingress: FaceId) -> Option<Name> {
    if let Some(mp_name) = tagged_mp_name(host, token, ingress) {
        return Some(mp_name);
    }
    let entry = host.pit().get(token)?;
    entry
        .out_records()
        .iter()
        .filter_map(|record| record.status.as_ref())
        .chain(entry.in_records().iter().filter_map(|record| record.status.as_ref()))
        .map(|status| status.mp_name.clone())
        .next()
}
