//! The Transport core: a single `Arc<tokio::sync::Mutex<TransportState>>` guarding the
//! four routing tables, the hashlist, and the registration lists, per the REDESIGN FLAG
//! resolution in SPEC_FULL.md §5 — the teacher's `jobs_running`/`jobs_locked` busy-wait
//! pair is gone, replaced outright by the mutex itself.

pub mod announce_table;
pub mod filter;
pub mod hashlist;
pub mod inbound;
pub mod link_table;
pub mod maintenance;
pub mod outbound;
pub mod path_requests;
pub mod path_table;
pub mod reverse_table;

use crate::config::TransportConfig;
use crate::destination::Destination;
use crate::error::TransportError;
use crate::hash::TruncatedHash;
use crate::iface::{Interface, InterfaceId};
use crate::identity::Identity;
use crate::link::{Link, LinkStatus};
use crate::packet::Packet;
use crate::receipt::PacketReceipt;
use announce_table::AnnounceTable;
use hashlist::Hashlist;
use link_table::LinkTable;
use path_table::PathTable;
use reverse_table::ReverseTable;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Everything the four tables and the registration lists need, bundled into one value
/// instead of the teacher's module-level singletons — owned inside the `Transport`
/// handle's mutex.
pub struct TransportState {
    pub config: TransportConfig,
    pub own_transport_id: TruncatedHash,
    pub identity: Arc<dyn Identity>,
    pub interfaces: HashMap<InterfaceId, Arc<dyn Interface>>,
    pub destinations: Vec<Destination>,
    pub links: HashMap<TruncatedHash, Link>,
    pub announce_table: AnnounceTable,
    pub path_table: PathTable,
    pub reverse_table: ReverseTable,
    pub link_table: LinkTable,
    pub hashlist: Hashlist,
    pub receipts: Vec<Arc<dyn PacketReceipt>>,
}

impl TransportState {
    pub fn new(own_transport_id: TruncatedHash, identity: Arc<dyn Identity>, config: TransportConfig) -> Self {
        let link_timeout = config.link_timeout();
        Self {
            announce_table: AnnounceTable::new(config.announce_retry_limit, crate::config::LOCAL_REBROADCASTS_MAX),
            path_table: PathTable::new(),
            reverse_table: ReverseTable::new(),
            link_table: LinkTable::new(crate::config::LINK_REQUEST_PROOF_TIMEOUT, link_timeout),
            hashlist: Hashlist::new(config.hashlist_maxsize),
            receipts: Vec::new(),
            interfaces: HashMap::new(),
            destinations: Vec::new(),
            links: HashMap::new(),
            own_transport_id,
            identity,
            config,
        }
    }
}

/// The public handle applications and interface drivers hold. Cloning shares the same
/// underlying state, the same shape as `Arc<Mutex<TransportHandler>>` in the teacher's
/// `jobs.rs`.
#[derive(Clone)]
pub struct Transport {
    pub(crate) state: Arc<Mutex<TransportState>>,
    cancel: CancellationToken,
}

impl Transport {
    pub fn new(own_transport_id: TruncatedHash, identity: Arc<dyn Identity>, config: TransportConfig) -> Self {
        Self {
            state: Arc::new(Mutex::new(TransportState::new(own_transport_id, identity, config))),
            cancel: CancellationToken::new(),
        }
    }

    /// Restore a transport whose hashlist should be seeded from persisted state, e.g.
    /// loaded via [`crate::storage::load_hashlist`] at startup.
    pub async fn restore_hashlist(&self, hashes: Vec<crate::hash::FullHash>) {
        let mut state = self.state.lock().await;
        let capacity = state.config.hashlist_maxsize;
        state.hashlist = Hashlist::from_hashes(capacity, hashes);
    }

    pub async fn register_interface(&self, interface: Arc<dyn Interface>) {
        let mut state = self.state.lock().await;
        state.interfaces.insert(interface.id(), interface);
    }

    pub async fn register_destination(&self, destination: Destination) {
        let mut state = self.state.lock().await;
        state.destinations.push(destination);
    }

    /// Classifies by initiator flag into pending vs. active, matching the teacher's
    /// `register_link`.
    pub async fn register_link(&self, link: Link) {
        let mut state = self.state.lock().await;
        state.links.insert(link.link_id, link);
    }

    /// Promote a pending link to active. Errors if the link is unknown or not pending.
    pub async fn activate_link(&self, link_id: TruncatedHash) -> Result<(), TransportError> {
        let mut state = self.state.lock().await;
        let link = state.links.get_mut(&link_id).ok_or(TransportError::LinkNotPending)?;
        if link.status != LinkStatus::Pending {
            return Err(TransportError::LinkNotPending);
        }
        link.status = LinkStatus::Active;
        Ok(())
    }

    pub async fn outbound(&self, packet: &Packet, receipt: Option<Arc<dyn PacketReceipt>>) -> bool {
        let mut state = self.state.lock().await;
        outbound::outbound(&mut state, packet, receipt, None)
    }

    pub async fn inbound(&self, raw: &[u8], receiving_interface: InterfaceId) {
        let mut state = self.state.lock().await;
        inbound::inbound(&mut state, raw, receiving_interface);
    }

    pub async fn has_path(&self, destination_hash: &TruncatedHash) -> bool {
        let state = self.state.lock().await;
        state.path_table.contains(destination_hash)
    }

    pub async fn request_path(&self, destination_hash: TruncatedHash) {
        let packet = path_requests::build_request_packet(destination_hash);
        let mut state = self.state.lock().await;
        outbound::outbound(&mut state, &packet, None, None);
    }

    /// Persist the hashlist and return it so the caller can write it to disk via
    /// [`crate::storage::save_hashlist`]. Does not itself touch the filesystem — I/O stays
    /// out of the locked section.
    pub async fn exit_handler(&self) -> Vec<crate::hash::FullHash> {
        let state = self.state.lock().await;
        state.hashlist.iter().copied().collect()
    }

    /// Spawn the maintenance loop as a background task, matching the teacher's
    /// `manage_transport` — one `tokio::spawn`ed task acquiring the same state mutex on a
    /// fixed tick.
    pub fn spawn_maintenance(&self) -> JoinHandle<()> {
        let transport = self.clone();
        let cancel = self.cancel.clone();
        tokio::spawn(async move { maintenance::run(transport, cancel).await })
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}
