//! Mesh packet transport core: flood-routed path discovery, reverse/link forwarding
//! tables, packet dedup, and the maintenance loop that ages all of it out.
//!
//! Surrounding concerns — cryptographic identity, interface drivers, the application-
//! facing `Destination`/`Link` object model, and packet receipts — are external
//! collaborators, specified here only as the traits this core calls into.

pub mod config;
pub mod destination;
pub mod error;
pub mod hash;
pub mod iface;
pub mod identity;
pub mod link;
pub mod packet;
pub mod receipt;
pub mod storage;
pub mod transport;
pub mod wire;

pub use config::TransportConfig;
pub use destination::{Destination, DestinationCallbacks, Direction, ProofStrategy};
pub use error::TransportError;
pub use hash::{FullHash, RandomBlob, TruncatedHash};
pub use iface::{Interface, InterfaceId};
pub use identity::Identity;
pub use link::{Link, LinkCallbacks, LinkStatus};
pub use packet::Packet;
pub use receipt::{PacketReceipt, ReceiptStatus};
pub use transport::{Transport, TransportState};
