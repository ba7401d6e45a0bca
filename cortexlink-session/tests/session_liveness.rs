/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 19/10/26
******************************************************************************/

//! Connection state machine driven one iteration at a time.

mod common;

use common::Harness;
use cortexlink_core::types::{LinkState, PeerAddress};
use cortexlink_session::{SessionConfig, SessionSnapshot};

#[tokio::test]
async fn test_never_connected() {
    let harness = Harness::ready(SessionConfig::new()).await;

    for t in [0, 3000, 6000, 60_000] {
        harness.clock.set(t);
        harness.send_line("HB");
        let state = harness.session.poll_once().await.unwrap();
        assert_eq!(state, LinkState::Disconnected);
    }

    assert!(!harness.session.is_connected());
    assert!(harness.session.peer_address().is_unknown());
    assert_eq!(harness.session.snapshot(), SessionSnapshot::DISCONNECTED);
    assert_eq!(harness.session.stats().connects, 0);
    assert_eq!(harness.ticks(), 0);
}

#[tokio::test]
async fn test_connect_then_silence() {
    let harness = Harness::ready(SessionConfig::new()).await;
    harness.connect().await;
    assert_eq!(harness.ticks(), 1);

    harness.clock.set(4999);
    assert_eq!(
        harness.session.poll_once().await.unwrap(),
        LinkState::Connected
    );

    harness.clock.set(5001);
    assert_eq!(
        harness.session.poll_once().await.unwrap(),
        LinkState::Disconnected
    );
    assert!(harness.session.peer_address().is_unknown());

    // init plus the expiry
    assert_eq!(harness.framer.inits(), 2);
    assert_eq!(harness.session.stats().resets, 2);
}

#[tokio::test]
async fn test_heartbeat_at_timeout_boundary_keeps_link() {
    let harness = Harness::ready(SessionConfig::new()).await;
    harness.connect().await;

    harness.clock.set(5000);
    assert_eq!(
        harness.session.poll_once().await.unwrap(),
        LinkState::Connected
    );
}

#[tokio::test]
async fn test_steady_heartbeats_keep_link() {
    let harness = Harness::ready(SessionConfig::new()).await;
    harness.connect().await;

    for t in (1000..=6000).step_by(1000) {
        harness.clock.set(t);
        harness.send_line("HB");
        assert_eq!(
            harness.session.poll_once().await.unwrap(),
            LinkState::Connected,
            "dropped at {t}ms"
        );
    }

    harness.clock.set(10_999);
    assert!(harness.session.poll_once().await.unwrap().is_connected());
    harness.clock.set(11_001);
    assert!(!harness.session.poll_once().await.unwrap().is_connected());
}

#[tokio::test]
async fn test_input_is_processed_before_expiry_check() {
    let harness = Harness::ready(SessionConfig::new()).await;
    harness.connect().await;

    // Well past the timeout, but the heartbeat arrives in the same iteration.
    harness.clock.set(9000);
    harness.send_line("HB");

    assert_eq!(
        harness.session.poll_once().await.unwrap(),
        LinkState::Connected
    );
    assert_eq!(harness.session.stats().connects, 1);
}

#[tokio::test]
async fn test_heartbeat_behind_other_packets_in_same_read() {
    let harness = Harness::ready(SessionConfig::new()).await;
    harness.connect().await;

    harness.clock.set(6000);
    harness.peer.send(b"PING\nHB\n").unwrap();

    assert_eq!(
        harness.session.poll_once().await.unwrap(),
        LinkState::Connected
    );
    assert_eq!(harness.peer.drain(), b"PONG\n");

    let stats = harness.session.stats();
    assert_eq!(stats.messages_dispatched, 2);
    assert_eq!(stats.resets, 1);
    assert_eq!(stats.connects, 1);

    // The refreshed heartbeat now governs expiry.
    harness.clock.set(11_000);
    assert!(harness.session.poll_once().await.unwrap().is_connected());
    harness.clock.set(11_001);
    assert!(!harness.session.poll_once().await.unwrap().is_connected());
}

#[tokio::test]
async fn test_heartbeat_expiry_survives_counter_wrap() {
    let harness = Harness::ready(SessionConfig::new()).await;
    harness.clock.set(u32::MAX - 1000);
    harness.connect().await;

    harness.clock.set(3000);
    assert!(harness.session.poll_once().await.unwrap().is_connected());

    harness.clock.set(4002);
    assert!(!harness.session.poll_once().await.unwrap().is_connected());
}

#[tokio::test]
async fn test_peer_announcement_and_reset_invariant() {
    let harness = Harness::ready(SessionConfig::new()).await;
    harness.connect().await;

    harness.send_line("IP 192.168.1.42");
    harness.session.poll_once().await.unwrap();

    let snapshot = harness.session.snapshot();
    assert_eq!(snapshot.state, LinkState::Connected);
    assert_eq!(snapshot.peer, PeerAddress::new([192, 168, 1, 42]));
    assert_eq!(snapshot.sequence_id, 1);
    assert_eq!(harness.session.peer_address().to_string(), "192.168.1.42");

    harness.framer.drop_link();
    harness.session.poll_once().await.unwrap();

    let snapshot = harness.session.snapshot();
    assert_eq!(snapshot, SessionSnapshot::DISCONNECTED);
    assert!(harness.session.peer_address().is_unknown());
}

#[tokio::test]
async fn test_reconnect_after_link_loss() {
    let harness = Harness::ready(SessionConfig::new()).await;
    harness.connect().await;
    harness.framer.drop_link();
    harness.session.poll_once().await.unwrap();
    assert!(!harness.session.is_connected());

    harness.clock.set(20_000);
    harness.connect().await;

    harness.clock.set(24_000);
    assert!(harness.session.poll_once().await.unwrap().is_connected());
    assert_eq!(harness.session.stats().connects, 2);
}

#[tokio::test]
async fn test_ping_reply_reaches_companion() {
    let harness = Harness::ready(SessionConfig::new()).await;
    harness.connect().await;

    harness.send_line("PING");
    harness.session.poll_once().await.unwrap();

    assert_eq!(harness.peer.drain(), b"PONG\n");
    assert_eq!(harness.session.stats().messages_dispatched, 1);
}

#[tokio::test]
async fn test_undecodable_packet_is_dropped() {
    let harness = Harness::ready(SessionConfig::new()).await;
    harness.connect().await;

    harness.send_line("?garbage");
    harness.send_line("IP not-an-address");
    assert!(harness.session.poll_once().await.unwrap().is_connected());

    let stats = harness.session.stats();
    assert_eq!(stats.packets_delivered, 2);
    assert_eq!(stats.deserialize_failures, 2);
    assert_eq!(stats.messages_dispatched, 0);
    assert!(harness.session.peer_address().is_unknown());
}

#[tokio::test]
async fn test_init_configures_line_and_resets() {
    let harness = Harness::ready(SessionConfig::new()).await;
    let line = harness.peer.line_config().unwrap();
    assert!(line.is_8n1());
    assert_eq!(line.baud_rate, 115_200);

    harness.connect().await;
    harness.send_line("IP 10.1.1.1");
    harness.session.poll_once().await.unwrap();

    harness.session.init().await.unwrap();
    assert!(!harness.session.is_connected());
    assert_eq!(harness.session.snapshot(), SessionSnapshot::DISCONNECTED);
    assert_eq!(harness.framer.inits(), 2);
}

#[tokio::test]
async fn test_init_is_idempotent() {
    let harness = Harness::ready(SessionConfig::new()).await;
    harness.session.init().await.unwrap();
    harness.session.init().await.unwrap();

    assert_eq!(harness.session.snapshot(), SessionSnapshot::DISCONNECTED);
    assert_eq!(harness.session.stats().resets, 3);
}

#[tokio::test]
async fn test_subscriber_sees_transitions() {
    let harness = Harness::ready(SessionConfig::new()).await;
    let mut changes = harness.session.subscribe();
    assert!(!changes.has_changed().unwrap());

    harness.connect().await;
    assert!(changes.has_changed().unwrap());
    assert!(changes.borrow_and_update().is_connected());

    harness.session.poll_once().await.unwrap();
    assert!(!changes.has_changed().unwrap());

    harness.clock.set(6000);
    harness.session.poll_once().await.unwrap();
    assert!(changes.has_changed().unwrap());
    assert_eq!(*changes.borrow_and_update(), SessionSnapshot::DISCONNECTED);
}

#[tokio::test(start_paused = true)]
async fn test_stalled_transport_resets_session() {
    let harness = Harness::ready(SessionConfig::new().with_max_write_stalls(3)).await;
    harness.connect().await;

    harness.peer.set_stalled(true);
    harness.send_line("PING");
    let state = harness.session.poll_once().await.unwrap();

    assert_eq!(state, LinkState::Disconnected);
    let stats = harness.session.stats();
    assert_eq!(stats.write_timeouts, 1);
    assert_eq!(stats.write_retries, 2);
    assert!(harness.peer.drain().is_empty());
}
