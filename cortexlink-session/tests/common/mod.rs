/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 19/10/26
******************************************************************************/

//! Shared fixtures for session integration tests.
//!
//! The framer here is line based: packets end at `\n`, and a `SYN` line from
//! the companion completes the handshake (answered with `ACK`). The
//! dispatcher understands `HB`, `IP a.b.c.d`, `PING` and rejects anything
//! starting with `?`.

#![allow(dead_code)]

use cortexlink_core::error::{FramerError, RpcError};
use cortexlink_core::types::PeerAddress;
use cortexlink_session::{
    FrameSink, Framer, ManualClock, RpcContext, RpcDispatcher, SessionConfig, SessionManager,
};
use cortexlink_transport::{MemoryPeer, MemoryTransport};
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// Test-side handle on a [`LineFramer`].
#[derive(Debug, Default)]
pub struct FramerControl {
    connected: AtomicBool,
    inits: AtomicU32,
}

impl FramerControl {
    /// Drops the link as if the framer had lost sync.
    pub fn drop_link(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }

    pub fn inits(&self) -> u32 {
        self.inits.load(Ordering::SeqCst)
    }
}

/// Newline-delimited framer with a `SYN`/`ACK` handshake.
#[derive(Debug, Default)]
pub struct LineFramer {
    control: Arc<FramerControl>,
    line: Vec<u8>,
}

impl Framer for LineFramer {
    fn init(&mut self) {
        self.line.clear();
        self.control.connected.store(false, Ordering::SeqCst);
        self.control.inits.fetch_add(1, Ordering::SeqCst);
    }

    fn deliver_octet(&mut self, octet: u8, sink: &mut dyn FrameSink) {
        if octet != b'\n' {
            self.line.push(octet);
            return;
        }

        let line = std::mem::take(&mut self.line);
        if line == b"SYN" {
            self.control.connected.store(true, Ordering::SeqCst);
            let _ = sink.write(b"ACK\n");
        } else if self.is_connected() {
            sink.deliver(&line);
        }
    }

    fn write_packet(
        &mut self,
        packet: &[u8],
        sink: &mut dyn FrameSink,
    ) -> Result<usize, FramerError> {
        if !self.is_connected() {
            return Err(FramerError::NotConnected);
        }
        let mut framed = packet.to_vec();
        framed.push(b'\n');
        sink.write(&framed)
    }

    fn is_connected(&self) -> bool {
        self.control.connected.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptMessage {
    Heartbeat,
    Announce(PeerAddress),
    Ping,
    Other(Vec<u8>),
}

/// Dispatcher for the line protocol, counting its ticks.
#[derive(Debug, Default)]
pub struct ScriptDispatcher {
    ticks: Arc<AtomicU32>,
}

impl RpcDispatcher for ScriptDispatcher {
    type Message = ScriptMessage;

    fn deserialize(&mut self, raw: &[u8]) -> Result<ScriptMessage, RpcError> {
        match raw {
            b"HB" => Ok(ScriptMessage::Heartbeat),
            b"PING" => Ok(ScriptMessage::Ping),
            [b'?', ..] => Err(RpcError::Deserialize("unknown message".to_string())),
            [b'I', b'P', b' ', addr @ ..] => std::str::from_utf8(addr)
                .ok()
                .and_then(|addr| addr.parse::<Ipv4Addr>().ok())
                .map(|addr| ScriptMessage::Announce(addr.into()))
                .ok_or_else(|| RpcError::Deserialize("bad address".to_string())),
            other => Ok(ScriptMessage::Other(other.to_vec())),
        }
    }

    fn recv(&mut self, ctx: &mut RpcContext, message: ScriptMessage) {
        ctx.touch_message();
        match message {
            ScriptMessage::Heartbeat => ctx.touch_heartbeat(),
            ScriptMessage::Announce(peer) => {
                ctx.set_peer_address(peer);
                ctx.next_sequence_id();
            }
            ScriptMessage::Ping => {
                let _ = ctx.write_packet(&b"PONG"[..]);
            }
            ScriptMessage::Other(_) => {}
        }
    }

    fn tick(&mut self, _ctx: &mut RpcContext) {
        self.ticks.fetch_add(1, Ordering::SeqCst);
    }
}

pub type ScriptSession = SessionManager<LineFramer, ScriptDispatcher>;

/// A session wired to an in-memory companion.
pub struct Harness {
    pub session: ScriptSession,
    pub peer: MemoryPeer,
    pub clock: Arc<ManualClock>,
    pub framer: Arc<FramerControl>,
    pub ticks: Arc<AtomicU32>,
}

impl Harness {
    /// Builds a session on a manual clock at zero, without a transport.
    pub fn unbound(config: SessionConfig) -> (Self, MemoryTransport) {
        let clock = Arc::new(ManualClock::new(0));
        let framer = LineFramer::default();
        let control = Arc::clone(&framer.control);
        let dispatcher = ScriptDispatcher::default();
        let ticks = Arc::clone(&dispatcher.ticks);
        let session = SessionManager::with_clock(config, framer, dispatcher, clock.clone());
        let (transport, peer) = MemoryTransport::pair();

        (
            Self {
                session,
                peer,
                clock,
                framer: control,
                ticks,
            },
            transport,
        )
    }

    /// Builds a session with the transport bound and the line initialized.
    pub async fn ready(config: SessionConfig) -> Self {
        let (mut harness, transport) = Self::unbound(config);
        harness.session.setup(transport).await.unwrap();
        harness.session.init().await.unwrap();
        harness
    }

    /// Completes the handshake at the current clock value.
    pub async fn connect(&self) {
        self.peer.send(b"SYN\n").unwrap();
        self.session.poll_once().await.unwrap();
        assert!(self.session.is_connected());
        assert_eq!(self.peer.drain(), b"ACK\n");
    }

    /// Sends one line from the companion.
    pub fn send_line(&self, line: &str) {
        self.peer.send(line.as_bytes()).unwrap();
        self.peer.send(b"\n").unwrap();
    }

    pub fn ticks(&self) -> u32 {
        self.ticks.load(Ordering::SeqCst)
    }
}
