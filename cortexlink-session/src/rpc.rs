/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 19/10/26
******************************************************************************/

//! RPC dispatcher interface.
//!
//! The dispatcher sits above the framer: it decodes packets into application
//! messages, reacts to them, and does periodic protocol work while the link
//! is up. It shares an [`RpcContext`] with the session, through which it
//! refreshes liveness timestamps, allocates sequence ids, records the peer
//! address and queues outbound packets.

use crate::clock::Clock;
use crate::heartbeat::Liveness;
use crate::sequence::SequenceCounter;
use bytes::Bytes;
use cortexlink_core::error::{RpcError, SessionError};
use cortexlink_core::types::{PeerAddress, Ticks};
use std::collections::VecDeque;
use std::sync::Arc;

/// Application message protocol consumer.
pub trait RpcDispatcher: Send {
    /// Decoded application message.
    type Message;

    /// Decodes one packet.
    ///
    /// # Errors
    /// Returns `RpcError::Deserialize` if the packet is not a valid message;
    /// the session then drops it without calling [`recv`](Self::recv).
    fn deserialize(&mut self, raw: &[u8]) -> Result<Self::Message, RpcError>;

    /// Handles one decoded message.
    fn recv(&mut self, ctx: &mut RpcContext, message: Self::Message);

    /// Performs one unit of periodic work. Only called while connected.
    fn tick(&mut self, ctx: &mut RpcContext);
}

/// Protocol state shared between a session and its dispatcher.
#[derive(Debug)]
pub struct RpcContext {
    sequence: SequenceCounter,
    peer: PeerAddress,
    liveness: Liveness,
    outbox: VecDeque<Bytes>,
    writer_bound: bool,
    clock: Arc<dyn Clock>,
}

impl RpcContext {
    /// Creates a context with fresh timestamps and no packet writer bound.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        let now = clock.now();
        Self {
            sequence: SequenceCounter::new(),
            peer: PeerAddress::UNKNOWN,
            liveness: Liveness::new(now),
            outbox: VecDeque::new(),
            writer_bound: false,
            clock,
        }
    }

    /// Returns the current tick count.
    #[inline]
    #[must_use]
    pub fn now(&self) -> Ticks {
        self.clock.now()
    }

    /// Returns the last allocated sequence id.
    #[inline]
    #[must_use]
    pub const fn sequence_id(&self) -> u32 {
        self.sequence.current()
    }

    /// Allocates the next sequence id.
    #[inline]
    pub fn next_sequence_id(&mut self) -> u32 {
        self.sequence.allocate()
    }

    /// Overwrites the sequence id.
    #[inline]
    pub fn set_sequence_id(&mut self, id: u32) {
        self.sequence.set(id);
    }

    /// Returns the peer address.
    #[inline]
    #[must_use]
    pub const fn peer_address(&self) -> PeerAddress {
        self.peer
    }

    /// Records the peer address announced by the companion computer.
    #[inline]
    pub fn set_peer_address(&mut self, peer: PeerAddress) {
        self.peer = peer;
    }

    /// Returns the liveness timestamps.
    #[inline]
    #[must_use]
    pub const fn liveness(&self) -> &Liveness {
        &self.liveness
    }

    /// Returns the liveness timestamps for direct update.
    #[inline]
    pub fn liveness_mut(&mut self) -> &mut Liveness {
        &mut self.liveness
    }

    /// Stamps the last-message time with now.
    pub fn touch_message(&mut self) {
        let now = self.now();
        self.liveness.on_message(now);
    }

    /// Stamps the heartbeat time with now.
    pub fn touch_heartbeat(&mut self) {
        let now = self.now();
        self.liveness.on_heartbeat(now);
    }

    /// Stamps the published time with now.
    pub fn touch_published(&mut self) {
        let now = self.now();
        self.liveness.on_published(now);
    }

    /// Stamps the stats time with now.
    pub fn touch_stats(&mut self) {
        let now = self.now();
        self.liveness.on_stats(now);
    }

    /// Queues one outbound packet for the framer.
    ///
    /// Packets queued during `recv` or `tick` are framed and transmitted by
    /// the session before it moves on to the next input octet or iteration.
    ///
    /// # Errors
    /// Returns `SessionError::NotSetUp` if the session has no transport bound.
    pub fn write_packet(&mut self, packet: impl Into<Bytes>) -> Result<(), SessionError> {
        if !self.writer_bound {
            return Err(SessionError::NotSetUp);
        }
        self.outbox.push_back(packet.into());
        Ok(())
    }

    /// Returns the number of queued outbound packets.
    #[must_use]
    pub fn pending_packets(&self) -> usize {
        self.outbox.len()
    }

    pub(crate) fn bind_writer(&mut self) {
        self.writer_bound = true;
    }

    pub(crate) fn take_packet(&mut self) -> Option<Bytes> {
        self.outbox.pop_front()
    }

    /// Zeroes sequence id and peer, restamps liveness and drops queued output.
    pub(crate) fn reset(&mut self) {
        let now = self.now();
        self.sequence.reset();
        self.peer = PeerAddress::UNKNOWN;
        self.liveness.reset(now);
        self.outbox.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn context_at(start: u32) -> (Arc<ManualClock>, RpcContext) {
        let clock = Arc::new(ManualClock::new(start));
        let ctx = RpcContext::new(clock.clone());
        (clock, ctx)
    }

    #[test]
    fn test_write_packet_requires_bound_writer() {
        let (_clock, mut ctx) = context_at(0);
        assert_eq!(ctx.write_packet(&b"hello"[..]), Err(SessionError::NotSetUp));

        ctx.bind_writer();
        assert!(ctx.write_packet(&b"hello"[..]).is_ok());
        assert_eq!(ctx.pending_packets(), 1);
        assert_eq!(ctx.take_packet().as_deref(), Some(&b"hello"[..]));
    }

    #[test]
    fn test_touch_uses_clock() {
        let (clock, mut ctx) = context_at(100);
        clock.set(250);

        ctx.touch_heartbeat();
        ctx.touch_stats();
        assert_eq!(ctx.liveness().last_heartbeat, Ticks::new(250));
        assert_eq!(ctx.liveness().last_stats, Ticks::new(250));
        assert_eq!(ctx.liveness().last_message, Ticks::new(100));
    }

    #[test]
    fn test_reset_clears_identity() {
        let (clock, mut ctx) = context_at(0);
        ctx.bind_writer();
        ctx.set_peer_address(PeerAddress::new([192, 168, 0, 7]));
        ctx.next_sequence_id();
        ctx.write_packet(&b"x"[..]).unwrap();

        clock.set(900);
        ctx.reset();

        assert_eq!(ctx.sequence_id(), 0);
        assert!(ctx.peer_address().is_unknown());
        assert_eq!(ctx.pending_packets(), 0);
        assert_eq!(*ctx.liveness(), Liveness::new(Ticks::new(900)));
    }
}
