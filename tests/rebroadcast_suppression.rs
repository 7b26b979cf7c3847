//! S6: once enough peers have been heard repeating our own pending announce rebroadcast,
//! the entry is dropped instead of retransmitted again — exercised through the full
//! `inbound()` pipeline rather than the table directly, so the "is this a peer repeating
//! our rebroadcast" detection in `handle_announce` is covered too.

use mesh_transport::hash::{TruncatedHash, TRUNCATED_HASH_LEN};
use mesh_transport::iface::InterfaceId;
use mesh_transport::identity::Identity;
use mesh_transport::packet::{DestinationType, Packet, PacketContext, PacketType};
use mesh_transport::transport::inbound::inbound;
use mesh_transport::transport::TransportState;
use mesh_transport::TransportConfig;
use std::sync::Arc;

struct AcceptingIdentity;

impl Identity for AcceptingIdentity {
    fn validate_announce(&self, _packet: &Packet) -> bool {
        true
    }

    fn recall(&self, _destination_hash: TruncatedHash) -> Option<Self>
    where
        Self: Sized,
    {
        None
    }

    fn sign_proof(&self, _packet: &Packet) -> Option<Vec<u8>> {
        None
    }
}

fn flags(packet_type: PacketType, destination_type: DestinationType) -> u8 {
    ((destination_type as u8) << 2) | packet_type as u8
}

fn announce_raw(raw_hops: u8, destination: [u8; TRUNCATED_HASH_LEN], random_blob: [u8; TRUNCATED_HASH_LEN]) -> Vec<u8> {
    let mut raw = vec![flags(PacketType::Announce, DestinationType::Single), raw_hops];
    raw.extend_from_slice(&destination);
    raw.push(PacketContext::None.as_byte());
    raw.extend_from_slice(&random_blob);
    raw
}

fn fresh_state() -> TransportState {
    TransportState::new(
        TruncatedHash::new([0xAA; TRUNCATED_HASH_LEN]),
        Arc::new(AcceptingIdentity),
        TransportConfig::new("node-x"),
    )
}

#[test]
fn s6_two_peers_repeating_our_rebroadcast_drops_the_pending_announce_entry() {
    let mut state = fresh_state();
    let destination = [0x01; TRUNCATED_HASH_LEN];
    let key = TruncatedHash::new(destination);

    // We learn the path at 3 hops; our own pending rebroadcast is stored as advertised_hops=3.
    inbound(&mut state, &announce_raw(2, destination, [0x11; TRUNCATED_HASH_LEN]), InterfaceId::next());
    let pending = state.announce_table.get(&key).expect("rebroadcast scheduled after admission");
    assert_eq!(pending.advertised_hops, 3);
    assert_eq!(pending.local_rebroadcasts_heard, 0);

    // A peer one hop further out repeats the announce we're about to rebroadcast
    // ourselves: packet.hops - 1 == advertised_hops.
    inbound(&mut state, &announce_raw(3, destination, [0x22; TRUNCATED_HASH_LEN]), InterfaceId::next());
    let pending = state.announce_table.get(&key).expect("one repeat is under the cap");
    assert_eq!(pending.local_rebroadcasts_heard, 1);
    assert_eq!(state.path_table.get(&key).unwrap().hop_count, 3, "a suppression repeat never touches the path table");

    // A second peer repeats it too: the rebroadcast cap (2) is now reached and the entry
    // is dropped rather than kept for a third retransmit.
    inbound(&mut state, &announce_raw(3, destination, [0x33; TRUNCATED_HASH_LEN]), InterfaceId::next());
    assert!(state.announce_table.get(&key).is_none(), "rebroadcast cap reached, pending entry dropped");

    // The path itself is unaffected — only the pending-rebroadcast bookkeeping was dropped.
    assert!(state.path_table.contains(&key));
}
