//! Tunable constants, grouped into a `TransportConfig` the way `transport/config.rs` in
//! the teacher workspace groups `TransportConfig`'s fields — named fields with the spec's
//! defaults, builder-style setters, no file-based config management (out of scope).

use std::time::Duration;

pub const APP_NAME: &str = "rnstransport";

/// Max hops a path is allowed to have before an announce is refused admission (M).
pub const PATHFINDER_M: u8 = 18;
/// Decay constant for the exponential retransmit backoff (C).
pub const PATHFINDER_C: f64 = 2.0;
/// Bounded retransmit retries for a pending announce (R).
pub const PATHFINDER_R: u8 = 1;
/// Retry grace period added to the backoff on each maintenance retransmit (T), seconds.
pub const PATHFINDER_T: f64 = 10.0;
/// Random jitter window added to every retransmit deadline (RW), seconds.
pub const PATHFINDER_RW: f64 = 10.0;
/// Path expiration window (E), seconds.
pub const PATHFINDER_E: Duration = Duration::from_secs(900);

/// How many times a peer may be heard repeating our own pending rebroadcast before we
/// drop it from the announce table.
pub const LOCAL_REBROADCASTS_MAX: u8 = 2;

/// Grace period before a server-side path-response announce is sent, giving directly
/// reachable peers a chance to answer first.
pub const PATH_REQUEST_GRACE: Duration = Duration::from_millis(250);

pub const REVERSE_TIMEOUT: Duration = Duration::from_secs(30 * 60);
pub const DESTINATION_TIMEOUT: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// How long a relayed link request waits for its proof before the link-table entry is
/// considered abandoned.
pub const LINK_REQUEST_PROOF_TIMEOUT: Duration = Duration::from_secs(15);

/// Nominal maintenance tick period.
pub const JOB_INTERVAL: Duration = Duration::from_millis(250);
pub const RECEIPTS_CHECK_INTERVAL: Duration = Duration::from_secs(1);
pub const ANNOUNCES_CHECK_INTERVAL: Duration = Duration::from_secs(1);
pub const TABLES_CULL_INTERVAL: Duration = Duration::from_secs(5);

pub const HASHLIST_MAXSIZE: usize = 1_000_000;

#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub name: String,
    /// Keepalive interval used by links; link-table entries are culled after
    /// `2 * keepalive_interval` (LINK_TIMEOUT).
    pub link_keepalive_interval: Duration,
    pub hashlist_maxsize: usize,
    pub announce_retry_limit: u8,
}

impl TransportConfig {
    pub fn new<T: Into<String>>(name: T) -> Self {
        Self {
            name: name.into(),
            link_keepalive_interval: Duration::from_secs(360),
            hashlist_maxsize: HASHLIST_MAXSIZE,
            announce_retry_limit: PATHFINDER_R,
        }
    }

    pub fn with_link_keepalive_interval(mut self, interval: Duration) -> Self {
        self.link_keepalive_interval = interval;
        self
    }

    pub fn with_hashlist_maxsize(mut self, size: usize) -> Self {
        self.hashlist_maxsize = size;
        self
    }

    pub fn link_timeout(&self) -> Duration {
        self.link_keepalive_interval * 2
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self::new("tp")
    }
}
