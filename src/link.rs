//! Virtual-circuit link object model — external collaborator, specified only by the
//! contract the core calls. `LinkStatus` collapses the teacher's `Handshake`/`Stale`
//! sub-states into `Pending`/`Active` at this boundary, per SPEC_FULL.md §3.

use crate::hash::TruncatedHash;
use crate::iface::InterfaceId;
use crate::packet::Packet;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStatus {
    Pending,
    Active,
    Closed,
}

pub trait LinkCallbacks: Send + Sync {
    fn receive(&self, packet: &Packet);

    /// Only called on the initiator side, when a link-request proof arrives that the
    /// link table couldn't match to a transported request.
    fn validate_proof(&self, packet: &Packet) -> bool;
}

#[derive(Clone)]
pub struct Link {
    pub link_id: TruncatedHash,
    pub initiator: bool,
    pub status: LinkStatus,
    pub attached_interface: InterfaceId,
    pub callbacks: Arc<dyn LinkCallbacks>,
}

impl Link {
    pub fn new(
        link_id: TruncatedHash,
        initiator: bool,
        attached_interface: InterfaceId,
        callbacks: Arc<dyn LinkCallbacks>,
    ) -> Self {
        Self {
            link_id,
            initiator,
            status: LinkStatus::Pending,
            attached_interface,
            callbacks,
        }
    }
}
