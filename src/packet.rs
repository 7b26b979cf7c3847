//! Decoded packet representation and the flag-byte encoding the core rewrites packets at.
//!
//! The meta byte layout (`ifac:1 | header_type:1 | context_flag:1 | propagation_type:1 |
//! destination_type:2 | packet_type:2`) and the packet hash definition (SHA-256 over the
//! low nibble of the flags, the destination hash, the context byte, and the payload) match
//! `reticulum-legacy::packet::{Header, Packet}` in the teacher workspace.

use crate::hash::{FullHash, TruncatedHash, TRUNCATED_HASH_LEN};
use crate::iface::InterfaceId;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderType {
    Type1 = 0,
    Type2 = 1,
}

impl From<u8> for HeaderType {
    fn from(v: u8) -> Self {
        if v & 1 == 1 {
            HeaderType::Type2
        } else {
            HeaderType::Type1
        }
    }
}

/// Propagation type: the teacher's `PropagationType` only names Broadcast/Transport, but
/// the distilled spec's data model also names Relay/Tunnel as protocol constants the wire
/// format reserves — carried here as the full four-value enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportType {
    Broadcast = 0,
    Transport = 1,
    Relay = 2,
    Tunnel = 3,
}

impl From<u8> for TransportType {
    fn from(v: u8) -> Self {
        match v & 0b11 {
            0 => TransportType::Broadcast,
            1 => TransportType::Transport,
            2 => TransportType::Relay,
            _ => TransportType::Tunnel,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DestinationType {
    Single = 0,
    Group = 1,
    Plain = 2,
    Link = 3,
}

impl From<u8> for DestinationType {
    fn from(v: u8) -> Self {
        match v & 0b11 {
            0 => DestinationType::Single,
            1 => DestinationType::Group,
            2 => DestinationType::Plain,
            _ => DestinationType::Link,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketType {
    Data = 0,
    Announce = 1,
    LinkRequest = 2,
    Proof = 3,
}

impl From<u8> for PacketType {
    fn from(v: u8) -> Self {
        match v & 0b11 {
            0 => PacketType::Data,
            1 => PacketType::Announce,
            2 => PacketType::LinkRequest,
            _ => PacketType::Proof,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketContext {
    None = 0x00,
    Resource = 0x01,
    ResourceRequest = 0x03,
    ResourceProof = 0x05,
    CacheRequest = 0x08,
    PathResponse = 0x0B,
    KeepAlive = 0xFA,
    LinkRequestProof = 0xFF,
    /// Any context byte this core doesn't branch on by name, kept verbatim for
    /// round-tripping through rewrites.
    Other(u8),
}

impl From<u8> for PacketContext {
    fn from(v: u8) -> Self {
        match v {
            0x00 => PacketContext::None,
            0x01 => PacketContext::Resource,
            0x03 => PacketContext::ResourceRequest,
            0x05 => PacketContext::ResourceProof,
            0x08 => PacketContext::CacheRequest,
            0x0B => PacketContext::PathResponse,
            0xFA => PacketContext::KeepAlive,
            0xFF => PacketContext::LinkRequestProof,
            other => PacketContext::Other(other),
        }
    }
}

impl PacketContext {
    pub fn as_byte(&self) -> u8 {
        match self {
            PacketContext::None => 0x00,
            PacketContext::Resource => 0x01,
            PacketContext::ResourceRequest => 0x03,
            PacketContext::ResourceProof => 0x05,
            PacketContext::CacheRequest => 0x08,
            PacketContext::PathResponse => 0x0B,
            PacketContext::KeepAlive => 0xFA,
            PacketContext::LinkRequestProof => 0xFF,
            PacketContext::Other(b) => *b,
        }
    }
}

/// Minimum bytes needed to decode a Type1 packet: flags, hops, destination, context.
const MIN_LEN_TYPE1: usize = 1 + 1 + TRUNCATED_HASH_LEN + 1;

#[derive(Debug, Clone)]
pub struct Packet {
    pub header_type: HeaderType,
    pub transport_type: TransportType,
    pub destination_type: DestinationType,
    pub packet_type: PacketType,
    pub context: PacketContext,
    pub hops: u8,
    pub transport_id: Option<TruncatedHash>,
    pub destination_hash: TruncatedHash,
    /// The undecoded wire bytes, kept around so the forwarder can rewrite them in place
    /// without re-encoding from the decoded fields.
    pub raw: Vec<u8>,
    pub receiving_interface: Option<InterfaceId>,
}

impl Packet {
    /// Decode raw wire bytes. Mirrors `Transport.inbound`'s `packet.unpack()` step.
    pub fn decode(raw: &[u8]) -> Result<Self, &'static str> {
        if raw.len() < MIN_LEN_TYPE1 {
            return Err("packet shorter than minimum header");
        }

        let flags = raw[0];
        let header_type = HeaderType::from(flags >> 6);
        let transport_type = TransportType::from(flags >> 4);
        let destination_type = DestinationType::from(flags >> 2);
        let packet_type = PacketType::from(flags);
        let hops = raw[1];

        let mut idx = 2usize;
        let transport_id = if header_type == HeaderType::Type2 {
            if raw.len() < idx + TRUNCATED_HASH_LEN {
                return Err("type-2 packet missing transport id field");
            }
            let id = TruncatedHash::new_from_slice(&raw[idx..idx + TRUNCATED_HASH_LEN]).unwrap();
            idx += TRUNCATED_HASH_LEN;
            Some(id)
        } else {
            None
        };

        if raw.len() < idx + TRUNCATED_HASH_LEN + 1 {
            return Err("packet missing destination hash or context byte");
        }

        let destination_hash =
            TruncatedHash::new_from_slice(&raw[idx..idx + TRUNCATED_HASH_LEN]).unwrap();
        idx += TRUNCATED_HASH_LEN;
        let context = PacketContext::from(raw[idx]);

        Ok(Self {
            header_type,
            transport_type,
            destination_type,
            packet_type,
            context,
            hops,
            transport_id,
            destination_hash,
            raw: raw.to_vec(),
            receiving_interface: None,
        })
    }

    /// Offset of the payload body: right after the context byte.
    pub fn body_offset(&self) -> usize {
        2 + if self.header_type == HeaderType::Type2 { TRUNCATED_HASH_LEN } else { 0 }
            + TRUNCATED_HASH_LEN
            + 1
    }

    pub fn body(&self) -> &[u8] {
        &self.raw[self.body_offset().min(self.raw.len())..]
    }

    /// SHA-256 over the low flag nibble, the destination hash, the context byte, and the
    /// payload — this is the packet identity used for dedup and reverse-table keys, and
    /// deliberately excludes the transport id and hop count so the same logical packet
    /// hashes the same at every hop.
    pub fn hash(&self) -> FullHash {
        let flags = self.raw.first().copied().unwrap_or(0) & 0b0000_1111;
        let mut data = Vec::with_capacity(1 + TRUNCATED_HASH_LEN + 1 + self.body().len());
        data.push(flags);
        data.extend_from_slice(self.destination_hash.as_slice());
        data.push(self.context.as_byte());
        data.extend_from_slice(self.body());
        FullHash::from_data(&data)
    }

    pub fn truncated_hash(&self) -> TruncatedHash {
        self.hash().truncate()
    }

    pub fn is_announce(&self) -> bool {
        self.packet_type == PacketType::Announce
    }
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:?}.{:?} hops={} dst={}]",
            self.packet_type, self.context, self.hops, self.destination_hash
        )
    }
}
