//! Outbound Path, §4.2. Takes an application-constructed packet and either routes it
//! along a known path or floods it on every transmitting interface.

use crate::destination::Direction;
use crate::hash::TRUNCATED_HASH_LEN;
use crate::iface::InterfaceId;
use crate::link::LinkStatus;
use crate::packet::{DestinationType, Packet, PacketType};
use crate::receipt::PacketReceipt;
use crate::transport::filter;
use crate::transport::TransportState;
use crate::wire;
use std::sync::Arc;
use std::time::Instant;

/// Send `packet`. `receipt`, if supplied, is registered for proof tracking when the send
/// succeeds and the packet is a DATA packet addressed to a non-plain destination.
/// `explicit_interface` restricts emission to a single interface when the caller already
/// knows which one to use (e.g. a reply tied to a specific link).
pub fn outbound(
    state: &mut TransportState,
    packet: &Packet,
    receipt: Option<Arc<dyn PacketReceipt>>,
    explicit_interface: Option<InterfaceId>,
) -> bool {
    let now = Instant::now();
    let mut sent = false;

    if !packet.is_announce() {
        if let Some(entry) = state.path_table.get(&packet.destination_hash) {
            let learned_interface = entry.learned_on_interface;
            let next_hop = entry.next_hop_transport_id;
            let hop_count = entry.hop_count;

            if let Some(iface) = state.interfaces.get(&learned_interface) {
                if iface.may_transmit() {
                    if hop_count > 1 {
                        let next_hop_bytes: [u8; TRUNCATED_HASH_LEN] =
                            next_hop.as_slice().try_into().expect("truncated hash is fixed-width");
                        iface.emit(&wire::insert_into_transport(&packet.raw, &next_hop_bytes));
                    } else {
                        iface.emit(&packet.raw);
                    }
                    sent = true;
                }
            }
            state.path_table.refresh(&packet.destination_hash, now);
        }
    }

    if !sent {
        sent = flood(state, packet, explicit_interface);
    }

    if sent {
        if packet.packet_type == PacketType::Data && packet.destination_type != DestinationType::Plain {
            if let Some(receipt) = receipt {
                state.receipts.push(receipt);
            }
        }
        filter::record(packet, &mut state.hashlist);
    }

    sent
}

/// Unknown path, or the packet is an announce: emit on every `may_transmit` interface,
/// honoring link-attachment and explicit-interface restrictions.
fn flood(state: &TransportState, packet: &Packet, explicit_interface: Option<InterfaceId>) -> bool {
    let link_restriction = if packet.destination_type == DestinationType::Link {
        match state.links.get(&packet.destination_hash) {
            Some(link) if link.status == LinkStatus::Closed => return false,
            Some(link) => Some(link.attached_interface),
            None => None,
        }
    } else {
        None
    };

    let mut sent = false;
    for (id, iface) in state.interfaces.iter() {
        if !iface.may_transmit() {
            continue;
        }
        if let Some(attached) = link_restriction {
            if *id != attached {
                continue;
            }
        }
        if let Some(explicit) = explicit_interface {
            if *id != explicit {
                continue;
            }
        }
        iface.emit(&packet.raw);
        sent = true;
    }
    sent
}

/// True if `direction == Out` destinations registered locally claim this hash (used by
/// inbound delivery to decide whether an arriving packet is addressed locally).
pub(crate) fn is_locally_registered(state: &TransportState, destination_hash: &crate::hash::TruncatedHash, direction: Direction) -> bool {
    state
        .destinations
        .iter()
        .any(|d| &d.hash == destination_hash && d.direction == direction)
}
