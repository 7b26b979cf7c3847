//! Cryptographic identity is an external collaborator — this core only needs the two
//! operations it calls out to: announce signature validation, and recalling an identity
//! to rebuild an announce packet for retransmission. No cryptography is implemented here.

use crate::hash::TruncatedHash;
use crate::packet::Packet;

pub trait Identity: Send + Sync {
    /// Validate an announce packet's embedded signature. Returns `false` on any failure;
    /// the core never distinguishes signature-invalid from malformed.
    fn validate_announce(&self, packet: &Packet) -> bool;

    /// Recall the identity owning `destination_hash`, if known locally. Used by the
    /// maintenance loop to rebuild an announce packet for retransmission.
    fn recall(&self, destination_hash: TruncatedHash) -> Option<Self>
    where
        Self: Sized;

    /// Sign a proof for `packet` on behalf of whichever local destination/identity is
    /// addressed by it, returning ready-to-emit wire bytes. Returns `None` if this
    /// collaborator holds no key capable of proving it.
    fn sign_proof(&self, packet: &Packet) -> Option<Vec<u8>>;
}
