//! Bit-exact wire rewrites as pure functions over raw bytes, per the Design Notes'
//! guidance to keep these unit-testable in isolation without constructing a `Transport`.
//!
//! Byte layout (see SPEC_FULL.md §6):
//!   byte 0       flags  (ifac | header_type | context_flag | propagation_type | dest_type | packet_type)
//!   byte 1       hops
//!   bytes 2..18  next-hop transport id, only present when header_type == Type2
//!   bytes 18..   destination hash, context byte, payload (or bytes 2.. when header_type == Type1)

use crate::hash::TRUNCATED_HASH_LEN;

const HEADER_TYPE_MASK: u8 = 0b0100_0000;
const TRANSPORT_TYPE_MASK: u8 = 0b0011_0000;
const LOW_NIBBLE_MASK: u8 = 0b0000_1111;

const HEADER_TYPE_2_BITS: u8 = 0b0100_0000;
const HEADER_TYPE_1_BITS: u8 = 0b0000_0000;
const TRANSPORT_TYPE_TRANSPORT_BITS: u8 = 0b0001_0000;
const TRANSPORT_TYPE_BROADCAST_BITS: u8 = 0b0000_0000;

/// Outbound: insert a directly-addressed packet into transport form so a multi-hop next
/// hop knows where to forward it. `raw[0]` keeps its low nibble (context/propagation bits
/// below bit 4... actually destination-type/packet-type bits), header type becomes 2,
/// transport type becomes TRANSPORT, and the next-hop id is spliced in right after the
/// hop byte.
pub fn insert_into_transport(raw: &[u8], next_hop: &[u8; TRUNCATED_HASH_LEN]) -> Vec<u8> {
    debug_assert!(raw.len() >= 2, "packet must have at least flags+hops");

    let original_flags = raw[0];
    let new_flags =
        HEADER_TYPE_2_BITS | TRANSPORT_TYPE_TRANSPORT_BITS | (original_flags & LOW_NIBBLE_MASK);

    let mut out = Vec::with_capacity(raw.len() + TRUNCATED_HASH_LEN);
    out.push(new_flags);
    out.push(raw[1]);
    out.extend_from_slice(next_hop);
    out.extend_from_slice(&raw[2..]);
    out
}

/// Forwarding a transport packet with more than one hop remaining: bump the hop byte and
/// replace the transport-id field with the new next hop. Flags byte 0 is untouched.
pub fn forward_transport_hop(
    raw: &[u8],
    new_hops: u8,
    next_hop: &[u8; TRUNCATED_HASH_LEN],
) -> Vec<u8> {
    debug_assert!(raw.len() >= 2 + TRUNCATED_HASH_LEN, "packet must carry a transport id field");

    let mut out = Vec::with_capacity(raw.len());
    out.push(raw[0]);
    out.push(new_hops);
    out.extend_from_slice(next_hop);
    out.extend_from_slice(&raw[2 + TRUNCATED_HASH_LEN..]);
    out
}

/// Final transport hop: strip the transport-id field, demote header type to 1 and
/// transport type to BROADCAST, keep the low flag nibble.
pub fn strip_transport(raw: &[u8], new_hops: u8) -> Vec<u8> {
    debug_assert!(raw.len() >= 2 + TRUNCATED_HASH_LEN, "packet must carry a transport id field");

    let original_flags = raw[0];
    let new_flags =
        HEADER_TYPE_1_BITS | TRANSPORT_TYPE_BROADCAST_BITS | (original_flags & LOW_NIBBLE_MASK);

    let mut out = Vec::with_capacity(raw.len() - TRUNCATED_HASH_LEN);
    out.push(new_flags);
    out.push(new_hops);
    out.extend_from_slice(&raw[2 + TRUNCATED_HASH_LEN..]);
    out
}

/// Link/proof forwarding: only the hop byte changes, everything else is untouched.
pub fn rewrite_hop_only(raw: &[u8], new_hops: u8) -> Vec<u8> {
    debug_assert!(raw.len() >= 2);

    let mut out = raw.to_vec();
    out[1] = new_hops;
    out
}

/// Rebuild an announce for maintenance-loop retransmission: HEADER-2, TRANSPORT type,
/// this node's transport id spliced in, the stored advertised-hops count, and context set
/// to PATH-RESPONSE or NONE depending on whether this retransmit answers a path request.
/// The destination hash and body (including the random blob) are carried over unchanged.
pub fn rebuild_for_retransmit(
    original_flags: u8,
    destination_hash: &[u8; TRUNCATED_HASH_LEN],
    body: &[u8],
    own_transport_id: &[u8; TRUNCATED_HASH_LEN],
    hops: u8,
    context: u8,
) -> Vec<u8> {
    let mut out = Vec::with_capacity(2 + TRUNCATED_HASH_LEN * 2 + 1 + body.len());
    out.push(HEADER_TYPE_2_BITS | TRANSPORT_TYPE_TRANSPORT_BITS | (original_flags & LOW_NIBBLE_MASK));
    out.push(hops);
    out.extend_from_slice(own_transport_id);
    out.extend_from_slice(destination_hash);
    out.push(context);
    out.extend_from_slice(body);
    out
}
