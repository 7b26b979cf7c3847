//! Destination (path) table — §3, keyed by destination hash. Tracks the best known route
//! to a remote destination, learned from announces.

use crate::hash::{RandomBlob, TruncatedHash};
use crate::iface::InterfaceId;
use crate::packet::Packet;
use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

pub struct PathEntry {
    pub last_used_at: Instant,
    pub next_hop_transport_id: TruncatedHash,
    pub hop_count: u8,
    pub expires_at: Instant,
    pub seen_random_blobs: HashSet<RandomBlob>,
    pub learned_on_interface: InterfaceId,
    pub original_announce_packet: Packet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnounceAcceptance {
    /// Admit: either the destination was unknown, or this is an equal-or-shorter path
    /// with a fresh random blob, or the stored path expired and this blob is fresh.
    Admit,
    /// Reject: the random blob is a replay of one we've already recorded.
    Replay,
    /// Reject: a longer path arrived while the current one hasn't expired yet.
    LongerPathNotYetExpired,
}

pub struct PathTable {
    map: HashMap<TruncatedHash, PathEntry>,
}

impl PathTable {
    pub fn new() -> Self {
        Self { map: HashMap::new() }
    }

    pub fn get(&self, destination: &TruncatedHash) -> Option<&PathEntry> {
        self.map.get(destination)
    }

    pub fn contains(&self, destination: &TruncatedHash) -> bool {
        self.map.contains_key(destination)
    }

    pub fn refresh(&mut self, destination: &TruncatedHash, now: Instant) {
        if let Some(entry) = self.map.get_mut(destination) {
            entry.last_used_at = now;
        }
    }

    /// Decide whether a newly-seen announce for `destination` should be admitted,
    /// following the acceptance rules in SPEC_FULL.md §4.3.3. Does not mutate state —
    /// callers apply the admission via [`PathTable::admit`].
    pub fn evaluate(
        &self,
        destination: &TruncatedHash,
        new_hops: u8,
        random_blob: &RandomBlob,
        now: Instant,
    ) -> AnnounceAcceptance {
        let Some(existing) = self.map.get(destination) else {
            return AnnounceAcceptance::Admit;
        };

        let seen = existing.seen_random_blobs.contains(random_blob);

        if new_hops <= existing.hop_count {
            if seen {
                AnnounceAcceptance::Replay
            } else {
                AnnounceAcceptance::Admit
            }
        } else if now <= existing.expires_at {
            AnnounceAcceptance::LongerPathNotYetExpired
        } else if seen {
            // Expired path, but this is a blob we've already recorded — treat as a loop,
            // not a fresh admission.
            AnnounceAcceptance::Replay
        } else {
            AnnounceAcceptance::Admit
        }
    }

    /// Apply an admitted announce: carry forward the seen-blob set (growing it, per I6),
    /// update hop count / next hop / interface, and push expiry forward.
    pub fn admit(
        &mut self,
        destination: TruncatedHash,
        next_hop_transport_id: TruncatedHash,
        hop_count: u8,
        random_blob: RandomBlob,
        learned_on_interface: InterfaceId,
        announce_packet: Packet,
        now: Instant,
        expiry: Duration,
    ) {
        let mut seen_random_blobs = self
            .map
            .remove(&destination)
            .map(|entry| entry.seen_random_blobs)
            .unwrap_or_default();
        seen_random_blobs.insert(random_blob);

        self.map.insert(
            destination,
            PathEntry {
                last_used_at: now,
                next_hop_transport_id,
                hop_count,
                expires_at: now + expiry,
                seen_random_blobs,
                learned_on_interface,
                original_announce_packet: announce_packet,
            },
        );
    }

    /// Evict entries unused for longer than `timeout` (DESTINATION_TIMEOUT). Collects
    /// victims first, then removes — never mutates the map mid-iteration.
    pub fn evict_stale(&mut self, now: Instant, timeout: Duration) {
        let victims: Vec<TruncatedHash> = self
            .map
            .iter()
            .filter(|(_, entry)| now.duration_since(entry.last_used_at) > timeout)
            .map(|(hash, _)| *hash)
            .collect();

        for hash in victims {
            self.map.remove(&hash);
        }
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl Default for PathTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::TRUNCATED_HASH_LEN;

    fn blob(byte: u8) -> RandomBlob {
        RandomBlob::new_from_slice(&[byte; TRUNCATED_HASH_LEN]).unwrap()
    }

    fn dummy_announce() -> Packet {
        let mut raw = vec![1u8, 0]; // flags: packet_type=Announce(1)
        raw.extend_from_slice(&[0u8; TRUNCATED_HASH_LEN]); // destination hash
        raw.push(0); // context
        raw.extend_from_slice(&[0u8; TRUNCATED_HASH_LEN]); // random blob
        Packet::decode(&raw).unwrap()
    }

    #[test]
    fn s1_unknown_destination_is_always_admitted() {
        let table = PathTable::new();
        let destination = TruncatedHash::new([1u8; TRUNCATED_HASH_LEN]);
        assert_eq!(table.evaluate(&destination, 3, &blob(0x11), Instant::now()), AnnounceAcceptance::Admit);
    }

    #[test]
    fn s2_shorter_path_replaces_the_stored_one() {
        let mut table = PathTable::new();
        let destination = TruncatedHash::new([1u8; TRUNCATED_HASH_LEN]);
        let iface = InterfaceId::next();
        let now = Instant::now();

        table.admit(destination, TruncatedHash::new([0xAA; TRUNCATED_HASH_LEN]), 3, blob(0x11), iface, dummy_announce(), now, Duration::from_secs(900));

        let acceptance = table.evaluate(&destination, 2, &blob(0x22), now);
        assert_eq!(acceptance, AnnounceAcceptance::Admit);

        table.admit(destination, TruncatedHash::new([0xBB; TRUNCATED_HASH_LEN]), 2, blob(0x22), InterfaceId::next(), dummy_announce(), now, Duration::from_secs(900));

        let entry = table.get(&destination).unwrap();
        assert_eq!(entry.hop_count, 2);
        assert_eq!(entry.next_hop_transport_id, TruncatedHash::new([0xBB; TRUNCATED_HASH_LEN]));
        assert!(entry.seen_random_blobs.contains(&blob(0x11)));
        assert!(entry.seen_random_blobs.contains(&blob(0x22)));
    }

    #[test]
    fn s3_replayed_random_blob_is_rejected() {
        let mut table = PathTable::new();
        let destination = TruncatedHash::new([1u8; TRUNCATED_HASH_LEN]);
        let iface = InterfaceId::next();
        let now = Instant::now();

        table.admit(destination, TruncatedHash::new([0xAA; TRUNCATED_HASH_LEN]), 3, blob(0x11), iface, dummy_announce(), now, Duration::from_secs(900));

        assert_eq!(table.evaluate(&destination, 3, &blob(0x11), now), AnnounceAcceptance::Replay);
    }

    #[test]
    fn longer_path_rejected_before_expiry_admitted_after() {
        let mut table = PathTable::new();
        let destination = TruncatedHash::new([1u8; TRUNCATED_HASH_LEN]);
        let iface = InterfaceId::next();
        let now = Instant::now();

        table.admit(destination, TruncatedHash::new([0xAA; TRUNCATED_HASH_LEN]), 2, blob(0x11), iface, dummy_announce(), now, Duration::from_secs(900));

        assert_eq!(
            table.evaluate(&destination, 5, &blob(0x22), now),
            AnnounceAcceptance::LongerPathNotYetExpired
        );

        // Past expiry, a longer path with a fresh blob is admitted.
        let past_expiry = now + Duration::from_secs(901);
        assert_eq!(
            table.evaluate(&destination, 5, &blob(0x22), past_expiry),
            AnnounceAcceptance::Admit
        );
    }

    #[test]
    fn evict_stale_removes_only_entries_past_timeout() {
        let mut table = PathTable::new();
        let fresh = TruncatedHash::new([1u8; TRUNCATED_HASH_LEN]);
        let stale = TruncatedHash::new([2u8; TRUNCATED_HASH_LEN]);
        let now = Instant::now();

        table.admit(fresh, TruncatedHash::new_empty(), 1, blob(0x01), InterfaceId::next(), dummy_announce(), now, Duration::from_secs(900));
        table.admit(stale, TruncatedHash::new_empty(), 1, blob(0x02), InterfaceId::next(), dummy_announce(), now, Duration::from_secs(900));

        let later = now + Duration::from_secs(10);
        table.refresh(&fresh, later);

        table.evict_stale(later, Duration::from_secs(5));

        assert!(table.contains(&fresh));
        assert!(!table.contains(&stale));
    }
}
