//! Pending-rebroadcast table for announces awaiting retransmission, per §3/§4.3.3/§4.4.
//! An entry sits here between "we decided to rebroadcast this announce" and "we've
//! retransmitted it past the retry limit or given up early because peers beat us to it" —
//! mirrors the teacher's `AnnounceTable`/`AnnounceEntry` retry bookkeeping in
//! `transport/announce_table.rs`, generalized to this crate's hash/interface types and the
//! exact PATHFINDER retry schedule read out of the original `Transport.py`.

use crate::config::{PATHFINDER_C, PATHFINDER_RW, PATHFINDER_T};
use crate::hash::TruncatedHash;
use crate::iface::InterfaceId;
use crate::packet::Packet;
use rand_core::CryptoRngCore;
use std::collections::HashMap;
use std::time::{Duration, Instant};

pub struct AnnounceEntry {
    pub received_at: Instant,
    pub next_retransmit_at: Instant,
    pub retries_used: u8,
    /// Transport id the announce arrived via, or the destination hash itself if it
    /// arrived directly (no transport id on the wire).
    pub received_from: TruncatedHash,
    pub advertised_hops: u8,
    pub original_packet: Packet,
    pub local_rebroadcasts_heard: u8,
    /// Set when this entry was enqueued to answer a path request: its single retransmit
    /// carries context PATH-RESPONSE instead of NONE.
    pub block_rebroadcasts: bool,
}

/// Jittered retransmit delay: `C^advertised_hops + T + U(0, RW)`.
fn retransmit_delay<R: CryptoRngCore>(advertised_hops: u8, rng: &mut R) -> Duration {
    let base = PATHFINDER_C.powi(advertised_hops as i32) + PATHFINDER_T;
    let jitter = (rng.next_u32() as f64 / u32::MAX as f64) * PATHFINDER_RW;
    Duration::from_secs_f64(base + jitter)
}

pub struct AnnounceTable {
    entries: HashMap<TruncatedHash, AnnounceEntry>,
    retry_limit: u8,
    local_rebroadcasts_max: u8,
}

impl AnnounceTable {
    pub fn new(retry_limit: u8, local_rebroadcasts_max: u8) -> Self {
        Self { entries: HashMap::new(), retry_limit, local_rebroadcasts_max }
    }

    pub fn get(&self, destination: &TruncatedHash) -> Option<&AnnounceEntry> {
        self.entries.get(destination)
    }

    pub fn contains(&self, destination: &TruncatedHash) -> bool {
        self.entries.contains_key(destination)
    }

    /// Schedule a freshly-admitted announce for rebroadcast, per the admission rule in
    /// §4.3.3: retries-used starts at 0, the first deadline follows the same jittered
    /// schedule as every subsequent retry.
    pub fn insert<R: CryptoRngCore>(
        &mut self,
        destination: TruncatedHash,
        original_packet: Packet,
        received_from: TruncatedHash,
        advertised_hops: u8,
        block_rebroadcasts: bool,
        now: Instant,
        rng: &mut R,
    ) {
        self.entries.insert(
            destination,
            AnnounceEntry {
                received_at: now,
                next_retransmit_at: now + retransmit_delay(advertised_hops, rng),
                retries_used: 0,
                received_from,
                advertised_hops,
                original_packet,
                local_rebroadcasts_heard: 0,
                block_rebroadcasts,
            },
        );
    }

    /// A path-request reply reuses an already-known announce, enqueued with retries
    /// pre-set so it is emitted exactly once, after `PATH_REQUEST_GRACE`.
    pub fn insert_path_response(
        &mut self,
        destination: TruncatedHash,
        original_packet: Packet,
        received_from: TruncatedHash,
        advertised_hops: u8,
        now: Instant,
        grace: Duration,
    ) {
        self.entries.insert(
            destination,
            AnnounceEntry {
                received_at: now,
                next_retransmit_at: now + grace,
                retries_used: self.retry_limit,
                received_from,
                advertised_hops,
                original_packet,
                local_rebroadcasts_heard: 0,
                block_rebroadcasts: true,
            },
        );
    }

    /// Record that a peer has been heard repeating an announce we have pending for the
    /// same destination — either our own rebroadcast (`hops - 1 == advertised_hops`) or a
    /// carry-forward of it by the next hop. Returns `true` if the entry was dropped
    /// because the rebroadcast cap was reached.
    pub fn note_local_rebroadcast(&mut self, destination: &TruncatedHash) -> bool {
        if let Some(entry) = self.entries.get_mut(destination) {
            entry.local_rebroadcasts_heard += 1;
            if entry.local_rebroadcasts_heard >= self.local_rebroadcasts_max {
                self.entries.remove(destination);
                return true;
            }
        }
        false
    }

    pub fn remove(&mut self, destination: &TruncatedHash) -> Option<AnnounceEntry> {
        self.entries.remove(destination)
    }

    /// Drain entries whose retransmit deadline has passed: returns rebuilt retransmit
    /// packets `(destination, advertised_hops, context_is_path_response)` ready for
    /// emission via the Outbound Path, with `retries-used` incremented and the next
    /// deadline re-jittered. Entries whose `retries-used > R` are removed instead of
    /// retransmitted. Collects victims first, then mutates.
    pub fn drain_due<R: CryptoRngCore>(
        &mut self,
        now: Instant,
        rng: &mut R,
    ) -> Vec<(TruncatedHash, Packet, u8, bool)> {
        let exhausted: Vec<TruncatedHash> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.retries_used > self.retry_limit)
            .map(|(hash, _)| *hash)
            .collect();
        for destination in exhausted {
            self.entries.remove(&destination);
        }

        let due: Vec<TruncatedHash> = self
            .entries
            .iter()
            .filter(|(_, entry)| now > entry.next_retransmit_at)
            .map(|(hash, _)| *hash)
            .collect();

        let mut ready = Vec::with_capacity(due.len());
        for destination in due {
            if let Some(entry) = self.entries.get_mut(&destination) {
                let packet = entry.original_packet.clone();
                let hops = entry.advertised_hops;
                let path_response = entry.block_rebroadcasts;
                entry.retries_used += 1;
                entry.next_retransmit_at = now + retransmit_delay(hops, rng);
                ready.push((destination, packet, hops, path_response));
            }
        }
        ready
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::TRUNCATED_HASH_LEN;
    use rand_core::OsRng;

    fn dummy_packet() -> Packet {
        let mut raw = vec![1u8, 0];
        raw.extend_from_slice(&[0u8; TRUNCATED_HASH_LEN]);
        raw.push(0);
        Packet::decode(&raw).unwrap()
    }

    #[test]
    fn insert_starts_at_zero_retries() {
        let mut table = AnnounceTable::new(1, 2);
        let destination = TruncatedHash::new([1u8; TRUNCATED_HASH_LEN]);
        let mut rng = OsRng;

        table.insert(destination, dummy_packet(), destination, 3, false, Instant::now(), &mut rng);

        assert_eq!(table.get(&destination).unwrap().retries_used, 0);
    }

    #[test]
    fn s6_rebroadcast_cap_drops_the_entry() {
        let mut table = AnnounceTable::new(1, 2);
        let destination = TruncatedHash::new([1u8; TRUNCATED_HASH_LEN]);
        let mut rng = OsRng;
        table.insert(destination, dummy_packet(), destination, 3, false, Instant::now(), &mut rng);

        assert!(!table.note_local_rebroadcast(&destination));
        assert!(table.contains(&destination));

        assert!(table.note_local_rebroadcast(&destination));
        assert!(!table.contains(&destination));
    }

    #[test]
    fn i7_retries_used_is_monotonic_and_bounded_by_retry_limit_plus_one() {
        let mut table = AnnounceTable::new(1, 2);
        let destination = TruncatedHash::new([1u8; TRUNCATED_HASH_LEN]);
        let mut rng = OsRng;
        let start = Instant::now();
        table.insert(destination, dummy_packet(), destination, 0, false, start, &mut rng);

        // Force the deadline into the past so the next drain considers it due.
        table.entries.get_mut(&destination).unwrap().next_retransmit_at = start;

        let due_at = start + Duration::from_secs(1);
        let ready = table.drain_due(due_at, &mut rng);
        assert_eq!(ready.len(), 1);
        assert_eq!(table.get(&destination).unwrap().retries_used, 1);

        table.entries.get_mut(&destination).unwrap().next_retransmit_at = due_at;
        let ready = table.drain_due(due_at + Duration::from_secs(1), &mut rng);
        assert_eq!(ready.len(), 1);
        assert_eq!(table.get(&destination).unwrap().retries_used, 2);

        // retries_used (2) now exceeds retry_limit (1); the next drain removes it instead
        // of retransmitting again.
        let ready = table.drain_due(due_at + Duration::from_secs(2), &mut rng);
        assert!(ready.is_empty());
        assert!(!table.contains(&destination));
    }

    #[test]
    fn path_response_entries_fire_exactly_once_after_the_grace_period() {
        let mut table = AnnounceTable::new(1, 2);
        let destination = TruncatedHash::new([1u8; TRUNCATED_HASH_LEN]);
        let now = Instant::now();
        let mut rng = OsRng;

        table.insert_path_response(destination, dummy_packet(), destination, 4, now, Duration::from_millis(250));

        let ready = table.drain_due(now, &mut rng);
        assert!(ready.is_empty(), "not due yet");

        let fired_at = now + Duration::from_millis(300);
        let ready = table.drain_due(fired_at, &mut rng);
        assert_eq!(ready.len(), 1);
        assert!(ready[0].3, "path-response retransmit carries the block-rebroadcasts flag");
        assert_eq!(table.get(&destination).unwrap().retries_used, 2);

        // Next sweep finds retries_used (2) past the limit (1) and drops the entry instead
        // of firing it again.
        let ready = table.drain_due(fired_at + Duration::from_secs(1), &mut rng);
        assert!(ready.is_empty());
        assert!(!table.contains(&destination));
    }
}
