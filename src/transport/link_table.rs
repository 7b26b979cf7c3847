//! Link (virtual-circuit) forwarding table, §3/§4.3.2/§4.3.6. A transport hop that relays
//! a LINK-REQUEST remembers enough to route the matching PROOF — and every subsequent
//! packet on that link — back the way the request came, without re-running path lookup.
//! Grounded on the teacher's `transport/link_table.rs`; the forward/backward interface
//! resolution in [`LinkTable::resolve_forward`] follows §4.3.2's symmetric- vs.
//! asymmetric-interface cases verbatim, since those are wire-rule details the teacher's
//! simpler two-endpoint model doesn't need to distinguish.

use crate::hash::TruncatedHash;
use crate::iface::InterfaceId;
use std::collections::HashMap;
use std::time::{Duration, Instant};

pub struct LinkEntry {
    pub last_used_at: Instant,
    pub proof_deadline: Instant,
    pub next_hop_transport_id: TruncatedHash,
    pub next_hop_interface: InterfaceId,
    pub receiving_interface: InterfaceId,
    pub original_destination: TruncatedHash,
    pub taken_hops: u8,
    pub remaining_hops: u8,
    pub validated: bool,
}

pub struct LinkTable {
    entries: HashMap<TruncatedHash, LinkEntry>,
    proof_timeout: Duration,
    idle_timeout: Duration,
}

impl LinkTable {
    pub fn new(proof_timeout: Duration, idle_timeout: Duration) -> Self {
        Self { entries: HashMap::new(), proof_timeout, idle_timeout }
    }

    pub fn contains(&self, link_id: &TruncatedHash) -> bool {
        self.entries.contains_key(link_id)
    }

    /// `remaining_hops` is the Destination-Table hop count already known for
    /// `original_destination` at the moment the LINK-REQUEST is forwarded — §4.3.1 looks
    /// this up before creating the entry, so forwarding doesn't have to wait for the
    /// LINK-REQUEST-PROOF to learn it.
    pub fn add(
        &mut self,
        link_id: TruncatedHash,
        original_destination: TruncatedHash,
        receiving_interface: InterfaceId,
        next_hop_transport_id: TruncatedHash,
        next_hop_interface: InterfaceId,
        taken_hops: u8,
        remaining_hops: u8,
        now: Instant,
    ) {
        if self.entries.contains_key(&link_id) {
            return;
        }

        self.entries.insert(
            link_id,
            LinkEntry {
                last_used_at: now,
                proof_deadline: now + self.proof_timeout,
                next_hop_transport_id,
                next_hop_interface,
                receiving_interface,
                original_destination,
                taken_hops,
                remaining_hops,
                validated: false,
            },
        );
    }

    pub fn next_hop_transport_id(&self, link_id: &TruncatedHash) -> Option<TruncatedHash> {
        self.entries.get(link_id).map(|e| e.next_hop_transport_id)
    }

    pub fn original_destination(&self, link_id: &TruncatedHash) -> Option<TruncatedHash> {
        self.entries.get(link_id).filter(|e| e.validated).map(|e| e.original_destination)
    }

    /// Validate a LINK-REQUEST-PROOF against an entry we relayed: only accepted if it
    /// arrived on the interface we forwarded the request towards. Records the hop count
    /// seen on the far side and returns `(outbound_interface, new_hop_count)` for the
    /// caller to rewrite and emit back towards the requester. `proof_hops` is already the
    /// post-decode incremented hop count — forwarding never adds a second increment.
    pub fn handle_proof(
        &mut self,
        link_id: &TruncatedHash,
        arrived_on: InterfaceId,
        proof_hops: u8,
        now: Instant,
    ) -> Option<(InterfaceId, u8)> {
        let entry = self.entries.get_mut(link_id)?;
        if arrived_on != entry.next_hop_interface {
            return None;
        }
        entry.remaining_hops = proof_hops;
        entry.validated = true;
        entry.last_used_at = now;
        Some((entry.receiving_interface, proof_hops))
    }

    /// Resolve the outbound interface for a link's keepalive/data/proof packet, per
    /// §4.3.2 — purely an interface/hop-count match against the entry, independent of
    /// whether the LINK-REQUEST-PROOF has transited this node yet. Returns
    /// `(outbound_interface, new_hop_count)`; `packet_hops` is already the post-decode
    /// incremented hop count.
    pub fn resolve_forward(
        &mut self,
        link_id: &TruncatedHash,
        arrived_on: InterfaceId,
        packet_hops: u8,
        now: Instant,
    ) -> Option<(InterfaceId, u8)> {
        let entry = self.entries.get_mut(link_id)?;

        let outbound = if entry.next_hop_interface == entry.receiving_interface {
            // Link is symmetric through a single interface: accept either direction's
            // hop count and bounce back out the same interface.
            if packet_hops == entry.remaining_hops || packet_hops == entry.taken_hops {
                Some(entry.next_hop_interface)
            } else {
                None
            }
        } else if arrived_on == entry.next_hop_interface && packet_hops == entry.remaining_hops {
            Some(entry.receiving_interface)
        } else if arrived_on == entry.receiving_interface && packet_hops == entry.taken_hops {
            Some(entry.next_hop_interface)
        } else {
            None
        };

        let outbound_interface = outbound?;
        entry.last_used_at = now;
        Some((outbound_interface, packet_hops))
    }

    /// Evict links whose proof never arrived in time, or whose validated circuit has gone
    /// idle past the keepalive-derived timeout. Collects victims first, then removes.
    pub fn evict_stale(&mut self, now: Instant) {
        let victims: Vec<TruncatedHash> = self
            .entries
            .iter()
            .filter(|(_, entry)| {
                if entry.validated {
                    now.duration_since(entry.last_used_at) > self.idle_timeout
                } else {
                    now >= entry.proof_deadline
                }
            })
            .map(|(id, _)| *id)
            .collect();

        for id in victims {
            self.entries.remove(&id);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
