//! Reverse path table, §3/§4.3.1/§4.3.6. Keyed by the truncated hash of a packet we
//! forwarded, so a PROOF whose destination hash matches that truncated hash (per
//! Reticulum's convention that a proof addresses the packet it proves) can find its way
//! back to the interface it arrived on — without re-running path lookup for the reply leg.
//! Modeled on the reverse-table bookkeeping in the original `Transport.py`, which the
//! teacher workspace folds into its link/path tables rather than keeping standalone; kept
//! separate here per SPEC_FULL.md §3.

use crate::hash::TruncatedHash;
use crate::iface::InterfaceId;
use std::collections::HashMap;
use std::time::{Duration, Instant};

pub struct ReverseEntry {
    pub created_at: Instant,
    pub received_on_interface: InterfaceId,
    pub outbound_interface: InterfaceId,
}

pub struct ReverseTable {
    entries: HashMap<TruncatedHash, ReverseEntry>,
}

impl ReverseTable {
    pub fn new() -> Self {
        Self { entries: HashMap::new() }
    }

    pub fn record(
        &mut self,
        forwarded_packet_hash: TruncatedHash,
        received_on_interface: InterfaceId,
        outbound_interface: InterfaceId,
        now: Instant,
    ) {
        self.entries.insert(
            forwarded_packet_hash,
            ReverseEntry { created_at: now, received_on_interface, outbound_interface },
        );
    }

    /// Look up the reverse route for a proof whose destination hash is `forwarded_packet_hash`,
    /// if it arrived on the stored outbound interface (reverse symmetry, property 5).
    /// Consumes the entry — a reverse route is single-use.
    pub fn take_if_matching(
        &mut self,
        forwarded_packet_hash: &TruncatedHash,
        arrived_on: InterfaceId,
    ) -> Option<ReverseEntry> {
        if self.entries.get(forwarded_packet_hash)?.outbound_interface != arrived_on {
            return None;
        }
        self.entries.remove(forwarded_packet_hash)
    }

    pub fn contains(&self, forwarded_packet_hash: &TruncatedHash) -> bool {
        self.entries.contains_key(forwarded_packet_hash)
    }

    /// Evict entries older than REVERSE_TIMEOUT whose proof never arrived. Collects
    /// victims first, then removes.
    pub fn evict_stale(&mut self, now: Instant, timeout: Duration) {
        let victims: Vec<TruncatedHash> = self
            .entries
            .iter()
            .filter(|(_, entry)| now.duration_since(entry.created_at) > timeout)
            .map(|(hash, _)| *hash)
            .collect();

        for hash in victims {
            self.entries.remove(&hash);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ReverseTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::TRUNCATED_HASH_LEN;

    #[test]
    fn s5_proof_matching_the_stored_outbound_interface_is_taken_and_removed() {
        let mut table = ReverseTable::new();
        let forwarded_hash = TruncatedHash::new([7u8; TRUNCATED_HASH_LEN]);
        let inbound_interface = InterfaceId::next();
        let outbound_interface = InterfaceId::next();
        let now = Instant::now();

        table.record(forwarded_hash, inbound_interface, outbound_interface, now);

        let entry = table.take_if_matching(&forwarded_hash, outbound_interface).expect("reverse route found");
        assert_eq!(entry.received_on_interface, inbound_interface);
        assert!(!table.contains(&forwarded_hash));
    }

    #[test]
    fn proof_arriving_on_the_wrong_interface_is_not_taken() {
        let mut table = ReverseTable::new();
        let forwarded_hash = TruncatedHash::new([7u8; TRUNCATED_HASH_LEN]);
        let inbound_interface = InterfaceId::next();
        let outbound_interface = InterfaceId::next();
        let wrong_interface = InterfaceId::next();

        table.record(forwarded_hash, inbound_interface, outbound_interface, Instant::now());

        assert!(table.take_if_matching(&forwarded_hash, wrong_interface).is_none());
        assert!(table.contains(&forwarded_hash), "entry is still pending, not consumed");
    }

    #[test]
    fn evict_stale_drops_entries_past_the_reverse_timeout() {
        let mut table = ReverseTable::new();
        let forwarded_hash = TruncatedHash::new([7u8; TRUNCATED_HASH_LEN]);
        let now = Instant::now();
        table.record(forwarded_hash, InterfaceId::next(), InterfaceId::next(), now);

        table.evict_stale(now + Duration::from_secs(31 * 60), Duration::from_secs(30 * 60));
        assert!(!table.contains(&forwarded_hash));
    }
}
