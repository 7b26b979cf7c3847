//! Packet filter / dedup, §4.1. The first gate every inbound packet passes through before
//! any table is touched.

use crate::packet::{Packet, PacketContext};
use crate::transport::hashlist::Hashlist;

/// Whether `packet` should be admitted for further processing. Keepalives and resource
/// handshake packets always pass (they carry their own higher-level flow control);
/// announces always pass (replay defense is the random-blob check in the path table, not
/// the hashlist); everything else is admitted only if its hash hasn't been seen.
pub fn admit(packet: &Packet, hashlist: &Hashlist) -> bool {
    match packet.context {
        PacketContext::KeepAlive | PacketContext::ResourceRequest | PacketContext::ResourceProof => {
            return true;
        }
        _ => {}
    }

    if packet.is_announce() {
        return true;
    }

    !hashlist.contains(&packet.hash())
}

/// Record an admitted packet's hash, trimming the hashlist down to capacity afterward.
pub fn record(packet: &Packet, hashlist: &mut Hashlist) {
    hashlist.push(packet.hash());
}
