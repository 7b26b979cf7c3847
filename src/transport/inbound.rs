//! Inbound Path, §4.3. Decodes raw bytes from an interface and dispatches them through
//! the four tables. Classification is a tagged match on `PacketType`/`PacketContext`
//! rather than nested `if`/`else`, per the Design Notes.

use crate::config::PATHFINDER_M;
use crate::destination::{Direction, ProofStrategy};
use crate::hash::{RandomBlob, TruncatedHash, TRUNCATED_HASH_LEN};
use crate::iface::InterfaceId;
use crate::link::LinkStatus;
use crate::packet::{DestinationType, Packet, PacketContext, PacketType};
use crate::transport::path_table::AnnounceAcceptance;
use crate::transport::{filter, outbound, TransportState};
use crate::wire;
use rand_core::OsRng;
use std::time::Instant;

pub fn inbound(state: &mut TransportState, raw: &[u8], receiving_interface: InterfaceId) {
    let mut packet = match Packet::decode(raw) {
        Ok(packet) => packet,
        Err(reason) => {
            log::trace!("dropping undecodable packet from {receiving_interface}: {reason}");
            return;
        }
    };
    packet.receiving_interface = Some(receiving_interface);
    packet.hops = packet.hops.saturating_add(1);

    if !filter::admit(&packet, &state.hashlist) {
        log::trace!("dropping duplicate packet {packet}");
        return;
    }
    filter::record(&packet, &mut state.hashlist);

    if try_transport_forward(state, &packet, receiving_interface) {
        return;
    }

    match packet.packet_type {
        PacketType::Announce => handle_announce(state, &packet, receiving_interface),
        PacketType::LinkRequest => handle_link_request_delivery(state, &packet),
        PacketType::Proof => handle_proof(state, &packet, receiving_interface),
        PacketType::Data => {
            if state.link_table.contains(&packet.destination_hash) {
                handle_link_forward(state, &packet, receiving_interface);
            } else {
                handle_data_delivery(state, &packet);
            }
        }
    }
}

/// §4.3.1. Returns `true` if the packet was absorbed by the transport-forwarding gate
/// (forwarded, dropped for lacking a path, or ignored as addressed to another transport)
/// and no further dispatch should run.
fn try_transport_forward(state: &mut TransportState, packet: &Packet, receiving_interface: InterfaceId) -> bool {
    let Some(transport_id) = packet.transport_id else { return false };
    if packet.is_announce() {
        return false;
    }
    if transport_id != state.own_transport_id {
        return true;
    }

    if let Some(entry) = state.path_table.get(&packet.destination_hash) {
        let next_hop = entry.next_hop_transport_id;
        let remaining_hops = entry.hop_count;
        let outbound_interface = entry.learned_on_interface;
        let next_hop_bytes: [u8; TRUNCATED_HASH_LEN] =
            next_hop.as_slice().try_into().expect("truncated hash is fixed-width");

        let rewritten = if remaining_hops > 1 {
            wire::forward_transport_hop(&packet.raw, packet.hops, &next_hop_bytes)
        } else {
            wire::strip_transport(&packet.raw, packet.hops)
        };

        if let Some(iface) = state.interfaces.get(&outbound_interface) {
            if iface.may_transmit() {
                iface.emit(&rewritten);
            }
        }
        state.path_table.refresh(&packet.destination_hash, Instant::now());

        let forwarded_hash = packet.truncated_hash();
        if packet.packet_type == PacketType::LinkRequest {
            state.link_table.add(
                forwarded_hash,
                packet.destination_hash,
                receiving_interface,
                next_hop,
                outbound_interface,
                packet.hops,
                remaining_hops,
                Instant::now(),
            );
        } else {
            state.reverse_table.record(forwarded_hash, receiving_interface, outbound_interface, Instant::now());
        }
    }
    // else: no path known for this destination — drop silently.

    true
}

/// §4.3.3.
fn handle_announce(state: &mut TransportState, packet: &Packet, receiving_interface: InterfaceId) {
    if outbound::is_locally_registered(state, &packet.destination_hash, Direction::In) {
        return;
    }
    if !state.identity.validate_announce(packet) {
        log::debug!("dropping announce for {} with invalid signature", packet.destination_hash);
        return;
    }

    let received_from = packet.transport_id.unwrap_or(packet.destination_hash);
    let now = Instant::now();

    if let Some(entry) = state.announce_table.get(&packet.destination_hash) {
        if packet.hops >= 1 && packet.hops - 1 == entry.advertised_hops {
            // A peer is repeating our own pending rebroadcast.
            state.announce_table.note_local_rebroadcast(&packet.destination_hash);
            return;
        }
        if packet.hops >= 1
            && packet.hops - 1 == entry.advertised_hops + 1
            && entry.retries_used > 0
            && now <= entry.next_retransmit_at
        {
            // The next hop already carried our rebroadcast forward; ours is redundant.
            state.announce_table.remove(&packet.destination_hash);
            return;
        }
    }

    if packet.hops >= PATHFINDER_M + 1 {
        log::trace!("dropping announce for {} past max hop count", packet.destination_hash);
        return;
    }

    let Some(random_blob) = RandomBlob::new_from_slice(packet.body()) else {
        log::trace!("dropping announce for {} with short payload", packet.destination_hash);
        return;
    };

    match state.path_table.evaluate(&packet.destination_hash, packet.hops, &random_blob, now) {
        AnnounceAcceptance::Admit => {
            state.path_table.admit(
                packet.destination_hash,
                received_from,
                packet.hops,
                random_blob,
                receiving_interface,
                packet.clone(),
                now,
                crate::config::PATHFINDER_E,
            );
            log::info!("learned path to {} via {} ({} hops)", packet.destination_hash, received_from, packet.hops);

            if packet.context != PacketContext::PathResponse {
                let mut rng = OsRng;
                state.announce_table.insert(
                    packet.destination_hash,
                    packet.clone(),
                    received_from,
                    packet.hops,
                    false,
                    now,
                    &mut rng,
                );
            }
        }
        AnnounceAcceptance::Replay => {
            log::trace!("dropping replayed announce for {}", packet.destination_hash);
        }
        AnnounceAcceptance::LongerPathNotYetExpired => {
            log::trace!("dropping longer-path announce for {} before expiry", packet.destination_hash);
        }
    }
}

/// §4.3.4.
fn handle_link_request_delivery(state: &TransportState, packet: &Packet) {
    for destination in state.destinations.iter().filter(|d| {
        d.direction == Direction::In
            && d.hash == packet.destination_hash
            && d.destination_type == packet.destination_type
    }) {
        destination.callbacks.receive(packet);
    }
}

/// §4.3.2, for packets belonging to an already-validated link rather than a fresh
/// transport-level relay.
fn handle_link_forward(state: &mut TransportState, packet: &Packet, receiving_interface: InterfaceId) {
    if let Some((outbound_interface, new_hops)) =
        state.link_table.resolve_forward(&packet.destination_hash, receiving_interface, packet.hops, Instant::now())
    {
        let rewritten = wire::rewrite_hop_only(&packet.raw, new_hops);
        if let Some(iface) = state.interfaces.get(&outbound_interface) {
            if iface.may_transmit() {
                iface.emit(&rewritten);
            }
        }
    }
}

/// §4.3.5.
fn handle_data_delivery(state: &mut TransportState, packet: &Packet) {
    if packet.destination_hash == crate::transport::path_requests::well_known_destination_hash() {
        crate::transport::path_requests::handle_request(state, packet);
        return;
    }

    if packet.destination_type == DestinationType::Link {
        let matching: Vec<_> = state
            .links
            .values()
            .filter(|l| l.link_id == packet.destination_hash && l.status == LinkStatus::Active)
            .cloned()
            .collect();
        for link in matching {
            link.callbacks.receive(packet);
        }
        return;
    }

    let matching: Vec<_> = state
        .destinations
        .iter()
        .filter(|d| {
            d.direction == Direction::In
                && d.hash == packet.destination_hash
                && d.destination_type == packet.destination_type
        })
        .cloned()
        .collect();

    for destination in matching {
        destination.callbacks.receive(packet);

        let should_prove = match destination.proof_strategy {
            ProofStrategy::ProveAll => true,
            ProofStrategy::ProveApp => destination.callbacks.proof_requested(packet),
            ProofStrategy::None => false,
        };
        if !should_prove {
            continue;
        }

        let Some(proof_raw) = state.identity.sign_proof(packet) else { continue };
        if let Some(iface_id) = packet.receiving_interface {
            if let Some(iface) = state.interfaces.get(&iface_id) {
                if iface.may_transmit() {
                    iface.emit(&proof_raw);
                }
            }
        }
    }
}

/// §4.3.6.
fn handle_proof(state: &mut TransportState, packet: &Packet, receiving_interface: InterfaceId) {
    match packet.context {
        PacketContext::LinkRequestProof => {
            if let Some((outbound_interface, new_hops)) = state.link_table.handle_proof(
                &packet.destination_hash,
                receiving_interface,
                packet.hops,
                Instant::now(),
            ) {
                let rewritten = wire::rewrite_hop_only(&packet.raw, new_hops);
                if let Some(iface) = state.interfaces.get(&outbound_interface) {
                    if iface.may_transmit() {
                        iface.emit(&rewritten);
                    }
                }
            } else if let Some(link) = state.links.get(&packet.destination_hash) {
                if link.initiator {
                    link.callbacks.validate_proof(packet);
                }
            }
        }
        PacketContext::ResourceProof => {
            if let Some(link) = state.links.get(&packet.destination_hash) {
                if link.status == LinkStatus::Active {
                    link.callbacks.receive(packet);
                }
            }
        }
        _ => handle_generic_proof(state, packet, receiving_interface),
    }
}

fn handle_generic_proof(state: &mut TransportState, packet: &Packet, receiving_interface: InterfaceId) {
    if let Some(entry) = state.reverse_table.take_if_matching(&packet.destination_hash, receiving_interface) {
        let rewritten = wire::rewrite_hop_only(&packet.raw, packet.hops);
        if let Some(iface) = state.interfaces.get(&entry.received_on_interface) {
            if iface.may_transmit() {
                iface.emit(&rewritten);
            }
        }
    }

    let explicit_receipt_hash = TruncatedHash::new_from_slice(packet.body());

    state.receipts.retain(|receipt| {
        let is_target = match explicit_receipt_hash {
            Some(hash) => receipt.hash().truncate() == hash,
            None => true,
        };
        if is_target && receipt.validate_proof_packet(packet) {
            false
        } else {
            true
        }
    });
}
