//! Maintenance Loop, §4.4. A single periodic task holding the table lock just long enough
//! to mutate state; packets it decides to (re)transmit are collected and flushed only
//! after the lock is released, mirroring `manage_transport`'s "collect then send after
//! drop" pattern in the teacher's `jobs.rs`.

use crate::hash::TRUNCATED_HASH_LEN;
use crate::packet::{Packet, PacketContext};
use crate::transport::outbound::outbound;
use crate::transport::{Transport, TransportState};
use rand_core::OsRng;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

const TICK: Duration = Duration::from_millis(250);

/// Runs until `cancel` fires. Spawned via [`Transport::spawn_maintenance`].
pub async fn run(transport: Transport, cancel: CancellationToken) {
    let mut last_receipts_check = Instant::now();
    let mut last_announces_check = Instant::now();
    let mut last_tables_cull = Instant::now();

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                log::info!("maintenance loop cancelled");
                return;
            }
            _ = tokio::time::sleep(TICK) => {}
        }

        tick(&transport, &mut last_receipts_check, &mut last_announces_check, &mut last_tables_cull).await;
    }
}

async fn tick(
    transport: &Transport,
    last_receipts_check: &mut Instant,
    last_announces_check: &mut Instant,
    last_tables_cull: &mut Instant,
) {
    let now = Instant::now();
    let mut retransmit_queue: Vec<Packet> = Vec::new();

    {
        let mut state = transport.state.lock().await;

        if now.duration_since(*last_receipts_check) >= crate::config::RECEIPTS_CHECK_INTERVAL {
            check_receipts(&mut state);
            *last_receipts_check = now;
        }

        if now.duration_since(*last_announces_check) >= crate::config::ANNOUNCES_CHECK_INTERVAL {
            let mut rng = OsRng;
            let own_transport_id: [u8; TRUNCATED_HASH_LEN] = state
                .own_transport_id
                .as_slice()
                .try_into()
                .expect("truncated hash is fixed-width");

            for (_destination, original, hops, path_response) in state.announce_table.drain_due(now, &mut rng) {
                let context =
                    if path_response { PacketContext::PathResponse.as_byte() } else { PacketContext::None.as_byte() };
                let destination_hash: [u8; TRUNCATED_HASH_LEN] = original
                    .destination_hash
                    .as_slice()
                    .try_into()
                    .expect("truncated hash is fixed-width");
                let raw = crate::wire::rebuild_for_retransmit(
                    original.raw[0],
                    &destination_hash,
                    original.body(),
                    &own_transport_id,
                    hops,
                    context,
                );
                if let Ok(rebuilt) = Packet::decode(&raw) {
                    retransmit_queue.push(rebuilt);
                }
            }
            *last_announces_check = now;
        }

        state.hashlist.trim();

        if now.duration_since(*last_tables_cull) >= crate::config::TABLES_CULL_INTERVAL {
            state.reverse_table.evict_stale(now, crate::config::REVERSE_TIMEOUT);
            state.link_table.evict_stale(now);
            state.path_table.evict_stale(now, crate::config::DESTINATION_TIMEOUT);
            *last_tables_cull = now;
        }
    }

    // Flushed after the lock is released, per §5's reentrancy guidance.
    if !retransmit_queue.is_empty() {
        let mut state = transport.state.lock().await;
        for packet in retransmit_queue {
            outbound(&mut state, &packet, None, None);
        }
    }
}

fn check_receipts(state: &mut TransportState) {
    for receipt in &state.receipts {
        receipt.check_timeout();
    }
    state.receipts.retain(|r| r.status() == crate::receipt::ReceiptStatus::Sent);
}
