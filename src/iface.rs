//! The interface boundary. Interface drivers (radio, serial, TCP, ...) are external
//! collaborators — the core only ever touches them through this trait, and holds them
//! by a stable, non-owning [`InterfaceId`] inside table entries rather than by reference,
//! so link/destination teardown never has to reach back into the routing tables.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InterfaceId(u64);

impl InterfaceId {
    pub fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for InterfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "iface#{}", self.0)
    }
}

/// Contract an interface driver must satisfy. `emit` must be safe to call while the
/// transport's table lock is held — packets produced during `inbound`/`outbound` are
/// flushed synchronously inside the critical section.
pub trait Interface: Send + Sync {
    fn id(&self) -> InterfaceId;

    /// Whether this interface currently accepts outbound traffic.
    fn may_transmit(&self) -> bool;

    fn emit(&self, raw: &[u8]);
}
