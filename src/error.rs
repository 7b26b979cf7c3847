use thiserror::Error;

/// Error taxonomy surfaced by the transport core.
///
/// Routing decisions (no path, replay, interface mismatch, retry exhaustion, decode
/// failure) are never propagated as errors — they are drops, logged at `trace` and
/// silently absorbed per §4.3's decode-failure rule. `TransportError` only covers
/// failures a caller must react to: misuse of the public API (activating a link that was
/// never registered as pending), or persistence I/O.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("link is not pending, cannot activate")]
    LinkNotPending,

    #[error("failed to persist hashlist: {0}")]
    Persistence(#[from] std::io::Error),

    #[error("failed to pack hashlist: {0}")]
    PackFailure(#[from] rmp_serde::encode::Error),

    #[error("failed to unpack hashlist: {0}")]
    UnpackFailure(#[from] rmp_serde::decode::Error),
}
