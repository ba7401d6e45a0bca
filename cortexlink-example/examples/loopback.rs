//! Loopback Session Example
//!
//! Runs a controller-side session over an in-memory serial line against a
//! simulated companion computer. The companion handshakes, announces its
//! address and sends heartbeats, then goes quiet long enough for the session
//! to time out, then reconnects. A display task polls the session the way
//! the controller's status screen would.

use std::net::Ipv4Addr;
use std::time::Duration;

use tokio::time::{Instant, interval, sleep};
use tracing::{debug, info, warn};

use cortexlink_core::error::{FramerError, RpcError};
use cortexlink_core::types::PeerAddress;
use cortexlink_session::{
    FrameSink, Framer, RpcContext, RpcDispatcher, SessionManager, SessionSnapshot, SessionStatus,
};
use cortexlink_transport::{MemoryPeer, MemoryTransport};

mod common;
use common::{ExampleConfig, FrameDecoder, MAX_PAYLOAD, encode_frame, init_logging};

const TAG_HEARTBEAT: u8 = 0x01;
const TAG_ANNOUNCE: u8 = 0x02;
const TAG_PING: u8 = 0x03;
const TAG_PONG: u8 = 0x04;
const TAG_STATUS: u8 = 0x05;

/// Checksummed framer; an empty frame is the handshake.
struct DemoFramer {
    decoder: FrameDecoder,
    connected: bool,
}

impl DemoFramer {
    fn new() -> Self {
        Self {
            decoder: FrameDecoder::new(),
            connected: false,
        }
    }
}

impl Framer for DemoFramer {
    fn init(&mut self) {
        self.decoder.reset();
        self.connected = false;
    }

    fn deliver_octet(&mut self, octet: u8, sink: &mut dyn FrameSink) {
        let Some(payload) = self.decoder.push(octet) else {
            return;
        };

        if payload.is_empty() {
            if !self.connected {
                debug!("framer handshake complete");
            }
            self.connected = true;
            if let Err(e) = sink.write(&encode_frame(&[])) {
                warn!("Handshake reply failed: {}", e);
            }
        } else if self.connected {
            sink.deliver(&payload);
        }
    }

    fn write_packet(
        &mut self,
        packet: &[u8],
        sink: &mut dyn FrameSink,
    ) -> Result<usize, FramerError> {
        if !self.connected {
            return Err(FramerError::NotConnected);
        }
        if packet.len() > MAX_PAYLOAD {
            return Err(FramerError::PacketTooLarge {
                size: packet.len(),
                max_size: MAX_PAYLOAD,
            });
        }
        sink.write(&encode_frame(packet))
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}

enum DemoMessage {
    Heartbeat,
    Announce(PeerAddress),
    Ping(u32),
}

/// Answers pings and publishes a status packet every `status_period` ms.
struct DemoRpc {
    status_period: u32,
}

impl RpcDispatcher for DemoRpc {
    type Message = DemoMessage;

    fn deserialize(&mut self, raw: &[u8]) -> Result<DemoMessage, RpcError> {
        match *raw {
            [TAG_HEARTBEAT] => Ok(DemoMessage::Heartbeat),
            [TAG_ANNOUNCE, a, b, c, d] => Ok(DemoMessage::Announce(PeerAddress::new([a, b, c, d]))),
            [TAG_PING, a, b, c, d] => Ok(DemoMessage::Ping(u32::from_be_bytes([a, b, c, d]))),
            [tag, ..] => Err(RpcError::Deserialize(format!("unknown tag {tag:#04x}"))),
            [] => Err(RpcError::Deserialize("empty packet".to_string())),
        }
    }

    fn recv(&mut self, ctx: &mut RpcContext, message: DemoMessage) {
        ctx.touch_message();
        match message {
            DemoMessage::Heartbeat => ctx.touch_heartbeat(),
            DemoMessage::Announce(peer) => {
                info!("Companion announced {}", peer);
                ctx.set_peer_address(peer);
            }
            DemoMessage::Ping(token) => {
                let seq = ctx.next_sequence_id();
                let mut pong = vec![TAG_PONG];
                pong.extend_from_slice(&token.to_be_bytes());
                pong.extend_from_slice(&seq.to_be_bytes());
                if let Err(e) = ctx.write_packet(pong) {
                    warn!("Pong dropped: {}", e);
                }
            }
        }
    }

    fn tick(&mut self, ctx: &mut RpcContext) {
        if ctx.now().since(ctx.liveness().last_stats) < self.status_period {
            return;
        }
        ctx.touch_stats();

        let mut status = vec![TAG_STATUS];
        status.extend_from_slice(&ctx.sequence_id().to_be_bytes());
        if let Err(e) = ctx.write_packet(status) {
            warn!("Status dropped: {}", e);
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let cfg = ExampleConfig::from_env();
    info!("Starting loopback session: {:?}", cfg);

    let (transport, peer) = MemoryTransport::pair();
    let mut session = SessionManager::new(
        cfg.session_config(),
        DemoFramer::new(),
        DemoRpc {
            status_period: 1000,
        },
    );
    session.setup(transport).await?;
    session.init().await?;
    session.start()?;

    let display = tokio::spawn(display(session.status()));
    let silence = Duration::from_millis(u64::from(cfg.heartbeat_timeout) + 1500);
    let companion = tokio::spawn(companion(peer, cfg.companion_address, silence));

    sleep(cfg.run_for).await;

    session.shutdown().await;
    companion.abort();
    display.abort();

    info!("Session finished: {:?}", session.stats());
    Ok(())
}

/// Polls the session and prints its state whenever it changes.
async fn display(status: SessionStatus) {
    let mut ticker = interval(Duration::from_millis(500));
    let mut shown: Option<SessionSnapshot> = None;

    loop {
        ticker.tick().await;
        let snapshot = status.snapshot();
        if shown != Some(snapshot) {
            info!("[display] {} {}", snapshot.state, snapshot.peer);
            shown = Some(snapshot);
        }
    }
}

/// Simulated companion: heartbeats for five seconds, `silence` of nothing, then reconnects.
async fn companion(peer: MemoryPeer, address: Ipv4Addr, silence: Duration) {
    let started = Instant::now();
    let quiet_from = Duration::from_secs(5);
    let quiet_until = quiet_from + silence;

    let mut decoder = FrameDecoder::new();
    let mut ticker = interval(Duration::from_millis(100));
    let mut synced = false;
    let mut next_sync = Duration::ZERO;
    let mut next_heartbeat = Duration::ZERO;
    let mut token = 0u32;

    loop {
        ticker.tick().await;
        let elapsed = started.elapsed();

        for octet in peer.drain() {
            let Some(payload) = decoder.push(octet) else {
                continue;
            };
            match payload.first() {
                None if !synced => {
                    info!("[companion] link acknowledged");
                    synced = true;
                    let mut announce = vec![TAG_ANNOUNCE];
                    announce.extend_from_slice(&address.octets());
                    if peer.send(&encode_frame(&announce)).is_err() {
                        return;
                    }
                }
                Some(&TAG_PONG) => debug!("[companion] pong {:02x?}", &payload[1..]),
                Some(&TAG_STATUS) => debug!("[companion] status {:02x?}", &payload[1..]),
                _ => {}
            }
        }

        if elapsed >= quiet_from && elapsed < quiet_until {
            if synced {
                info!("[companion] going quiet for {:?}", silence);
                synced = false;
            }
            continue;
        }

        if !synced && elapsed >= next_sync {
            next_sync = elapsed + Duration::from_secs(1);
            if peer.send(&encode_frame(&[])).is_err() {
                return;
            }
        }

        if synced && elapsed >= next_heartbeat {
            next_heartbeat = elapsed + Duration::from_secs(1);
            token = token.wrapping_add(1);
            let mut ping = vec![TAG_PING];
            ping.extend_from_slice(&token.to_be_bytes());
            if peer.send(&encode_frame(&[TAG_HEARTBEAT])).is_err()
                || peer.send(&encode_frame(&ping)).is_err()
            {
                return;
            }
        }
    }
}
