//! The `Destination` object model is an external collaborator; the core only needs its
//! identity (hash/type/direction) and two callbacks. Mirrors the shape of `receive`
//! dispatch in the teacher's `jobs.rs` packet task.

use crate::hash::TruncatedHash;
use crate::packet::{DestinationType, Packet};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    In,
    Out,
}

/// Strategy for answering inbound DATA packets with a proof, per §4.3.5.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProofStrategy {
    None,
    ProveAll,
    ProveApp,
}

pub trait DestinationCallbacks: Send + Sync {
    fn receive(&self, packet: &Packet);

    /// Only consulted under `ProofStrategy::ProveApp`; returns whether to prove.
    fn proof_requested(&self, _packet: &Packet) -> bool {
        false
    }

    /// Invoked by the server side of a path request when this destination is local.
    fn announce(&self, _path_response: bool) {}
}

#[derive(Clone)]
pub struct Destination {
    pub hash: TruncatedHash,
    pub direction: Direction,
    pub destination_type: DestinationType,
    pub proof_strategy: ProofStrategy,
    pub callbacks: Arc<dyn DestinationCallbacks>,
}

impl Destination {
    pub fn new(
        hash: TruncatedHash,
        direction: Direction,
        destination_type: DestinationType,
        callbacks: Arc<dyn DestinationCallbacks>,
    ) -> Self {
        Self { hash, direction, destination_type, proof_strategy: ProofStrategy::None, callbacks }
    }

    pub fn with_proof_strategy(mut self, strategy: ProofStrategy) -> Self {
        self.proof_strategy = strategy;
        self
    }
}
