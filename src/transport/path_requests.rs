//! Path Request, §4.5. A destination whose path is unknown can be asked for explicitly
//! by broadcasting to the well-known `(APP_NAME, "path", "request")` destination; any node
//! that already knows the path answers with a path-response announce.

use crate::config::{APP_NAME, PATH_REQUEST_GRACE};
use crate::hash::{FullHash, TruncatedHash, TRUNCATED_HASH_LEN};
use crate::packet::{DestinationType, Packet, PacketContext, PacketType};
use crate::transport::TransportState;
use rand_core::{CryptoRngCore, OsRng};
use std::time::Instant;

/// Destination hash of the well-known path-request endpoint, derived the same way any
/// named plain destination's hash is derived from its name components.
pub fn well_known_destination_hash() -> TruncatedHash {
    FullHash::from_data(format!("{APP_NAME}.path.request").as_bytes()).truncate()
}

/// Build the broadcast DATA packet `request_path` sends: body is the target destination
/// hash followed by a fresh random nonce, addressed to the well-known path-request
/// destination.
pub fn build_request_packet(destination_hash: TruncatedHash) -> Packet {
    let mut rng = OsRng;
    let mut nonce = [0u8; TRUNCATED_HASH_LEN];
    rng.fill_bytes(&mut nonce);

    let flags = (PacketType::Data as u8) | ((DestinationType::Plain as u8) << 2);
    let mut raw = Vec::with_capacity(2 + TRUNCATED_HASH_LEN + 1 + TRUNCATED_HASH_LEN * 2);
    raw.push(flags);
    raw.push(0); // hops
    raw.extend_from_slice(well_known_destination_hash().as_slice());
    raw.push(PacketContext::None.as_byte());
    raw.extend_from_slice(destination_hash.as_slice());
    raw.extend_from_slice(&nonce);

    Packet::decode(&raw).expect("hand-built request packet is well-formed")
}

/// Server-side handler: called when an inbound DATA packet addressed to the well-known
/// path-request destination is delivered. Extracts the requested destination hash from
/// the body and either triggers a local announce or schedules a path-response rebroadcast
/// from the stored path.
pub fn handle_request(state: &mut TransportState, packet: &Packet) {
    let Some(requested) = TruncatedHash::new_from_slice(packet.body()) else {
        return;
    };

    if let Some(destination) = state.destinations.iter().find(|d| d.hash == requested) {
        destination.callbacks.announce(true);
        return;
    }

    if let Some(entry) = state.path_table.get(&requested) {
        let original_packet = entry.original_announce_packet.clone();
        let received_from = entry.next_hop_transport_id;
        let advertised_hops = entry.hop_count;
        state.announce_table.insert_path_response(
            requested,
            original_packet,
            received_from,
            advertised_hops,
            Instant::now(),
            PATH_REQUEST_GRACE,
        );
    }
    // Else: path unknown too — ignore.
}
