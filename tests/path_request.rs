//! Path Request handling, §4.5: a locally-registered destination answers immediately via
//! its `announce` callback; a destination this node only knows a path for schedules a
//! path-response rebroadcast instead; an unknown destination is silently ignored. The last
//! test drives the same flow through the async `Transport` handle end to end.

use mesh_transport::destination::{Destination, DestinationCallbacks, Direction};
use mesh_transport::hash::{RandomBlob, TruncatedHash, TRUNCATED_HASH_LEN};
use mesh_transport::iface::{Interface, InterfaceId};
use mesh_transport::identity::Identity;
use mesh_transport::packet::{DestinationType, Packet, PacketContext, PacketType};
use mesh_transport::transport::inbound::inbound;
use mesh_transport::transport::path_requests::{build_request_packet, handle_request};
use mesh_transport::transport::{Transport, TransportState};
use mesh_transport::TransportConfig;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

struct AcceptingIdentity;

impl Identity for AcceptingIdentity {
    fn validate_announce(&self, _packet: &Packet) -> bool {
        true
    }

    fn recall(&self, _destination_hash: TruncatedHash) -> Option<Self>
    where
        Self: Sized,
    {
        None
    }

    fn sign_proof(&self, _packet: &Packet) -> Option<Vec<u8>> {
        None
    }
}

#[derive(Default)]
struct RecordingDestinationCallbacks {
    announced_with: Mutex<Vec<bool>>,
}

impl DestinationCallbacks for RecordingDestinationCallbacks {
    fn receive(&self, _packet: &Packet) {}

    fn announce(&self, path_response: bool) {
        self.announced_with.lock().unwrap().push(path_response);
    }
}

fn state() -> TransportState {
    TransportState::new(
        TruncatedHash::new([0xAA; TRUNCATED_HASH_LEN]),
        Arc::new(AcceptingIdentity),
        TransportConfig::new("node-x"),
    )
}

fn dummy_announce() -> Packet {
    let mut raw = vec![PacketType::Announce as u8, 0];
    raw.extend_from_slice(&[0u8; TRUNCATED_HASH_LEN]);
    raw.push(0);
    raw.extend_from_slice(&[0u8; TRUNCATED_HASH_LEN]);
    Packet::decode(&raw).unwrap()
}

fn request_for(destination_hash: [u8; TRUNCATED_HASH_LEN]) -> Packet {
    build_request_packet(TruncatedHash::new(destination_hash))
}

#[test]
fn request_for_a_locally_registered_destination_invokes_its_announce_callback() {
    let mut state = state();
    let target = [0x01; TRUNCATED_HASH_LEN];
    let callbacks = Arc::new(RecordingDestinationCallbacks::default());

    state.destinations.push(Destination::new(
        TruncatedHash::new(target),
        Direction::In,
        DestinationType::Single,
        callbacks.clone(),
    ));

    handle_request(&mut state, &request_for(target));

    assert_eq!(*callbacks.announced_with.lock().unwrap(), vec![true]);
    assert!(state.announce_table.is_empty(), "a local destination answers directly, no rebroadcast scheduled");
}

#[test]
fn request_for_a_destination_we_only_have_a_path_for_schedules_a_path_response() {
    let mut state = state();
    let target = TruncatedHash::new([0x02; TRUNCATED_HASH_LEN]);
    let next_hop = TruncatedHash::new([0xCC; TRUNCATED_HASH_LEN]);

    state.path_table.admit(
        target,
        next_hop,
        4,
        RandomBlob::new_from_slice(&[0u8; TRUNCATED_HASH_LEN]).unwrap(),
        InterfaceId::next(),
        dummy_announce(),
        Instant::now(),
        Duration::from_secs(900),
    );

    let target_bytes: [u8; TRUNCATED_HASH_LEN] = target.as_slice().try_into().unwrap();
    handle_request(&mut state, &request_for(target_bytes));

    let entry = state.announce_table.get(&target).expect("path-response rebroadcast scheduled");
    assert_eq!(entry.advertised_hops, 4);
}

#[test]
fn request_for_a_fully_unknown_destination_is_silently_ignored() {
    let mut state = state();
    let target = [0x03; TRUNCATED_HASH_LEN];

    handle_request(&mut state, &request_for(target));

    assert!(state.announce_table.is_empty());
    assert!(state.path_table.is_empty());
}

struct NullInterface(InterfaceId);

impl Interface for NullInterface {
    fn id(&self) -> InterfaceId {
        self.0
    }

    fn may_transmit(&self) -> bool {
        true
    }

    fn emit(&self, _raw: &[u8]) {}
}

#[tokio::test]
async fn end_to_end_request_path_through_the_transport_handle_reaches_the_local_callback() {
    let transport = Transport::new(TruncatedHash::new([0xAA; TRUNCATED_HASH_LEN]), Arc::new(AcceptingIdentity), TransportConfig::new("node-x"));

    let iface_id = InterfaceId::next();
    transport.register_interface(Arc::new(NullInterface(iface_id))).await;

    let target = TruncatedHash::new([0x09; TRUNCATED_HASH_LEN]);
    let callbacks = Arc::new(RecordingDestinationCallbacks::default());
    transport
        .register_destination(Destination::new(target, Direction::In, DestinationType::Single, callbacks.clone()))
        .await;

    assert!(!transport.has_path(&target).await);

    transport.request_path(target).await;

    // `request_path` sends the broadcast request through the outbound path; here we
    // complete the loop by feeding that request straight back in, as a peer echoing it
    // back to us would.
    let raw = build_request_packet(target);
    transport.inbound(raw_bytes_of(&raw), iface_id).await;

    assert_eq!(*callbacks.announced_with.lock().unwrap(), vec![true]);
}

fn raw_bytes_of(packet: &Packet) -> &[u8] {
    &packet.raw
}
