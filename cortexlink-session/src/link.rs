/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 19/10/26
******************************************************************************/

//! Session core: connection state machine and paced serial I/O.
//!
//! One [`SessionLink`] owns everything the session task touches: the
//! transport, the framer, the dispatcher and the [`RpcContext`] they share.
//! Each call to [`SessionLink::run_iteration`] performs, in order:
//!
//! 1. read every buffered input octet,
//! 2. feed them one by one to the framer, dispatching completed packets,
//! 3. evaluate connectivity,
//! 4. tick the dispatcher if connected.
//!
//! The caller sleeps one pacing interval between iterations.

use crate::clock::Clock;
use crate::config::SessionConfig;
use crate::framer::{FrameSink, Framer};
use crate::rpc::{RpcContext, RpcDispatcher};
use crate::state::{ResetReason, SessionSnapshot, SnapshotCell};
use crate::stats::SessionStats;
use bytes::BytesMut;
use cortexlink_core::error::{FramerError, SessionError};
use cortexlink_core::types::LinkState;
use cortexlink_transport::Transport;
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

/// State visible outside the session task.
#[derive(Debug, Default)]
pub struct SessionShared {
    /// Latest published snapshot.
    pub snapshot: SnapshotCell,
    /// Traffic counters.
    pub stats: SessionStats,
}

/// Framer callbacks bound to the session for the duration of one call.
struct LinkSink<'a, R: RpcDispatcher> {
    dispatcher: &'a mut R,
    ctx: &'a mut RpcContext,
    tx_pending: &'a mut BytesMut,
    stats: &'a SessionStats,
    delivered: usize,
}

impl<R: RpcDispatcher> FrameSink for LinkSink<'_, R> {
    fn deliver(&mut self, packet: &[u8]) {
        self.delivered += 1;
        self.stats.inc_packets_delivered();

        match self.dispatcher.deserialize(packet) {
            Ok(message) => {
                self.dispatcher.recv(self.ctx, message);
                self.stats.inc_messages_dispatched();
            }
            Err(err) => {
                debug!(len = packet.len(), error = %err, "dropping undecodable packet");
                self.stats.inc_deserialize_failures();
            }
        }
    }

    fn write(&mut self, octets: &[u8]) -> Result<usize, FramerError> {
        self.tx_pending.extend_from_slice(octets);
        Ok(octets.len())
    }
}

/// The serial session: state machine, framer and dispatcher over one transport.
pub struct SessionLink<F, R> {
    config: SessionConfig,
    transport: Option<Box<dyn Transport>>,
    framer: F,
    dispatcher: R,
    ctx: RpcContext,
    state: LinkState,
    rx_buf: Vec<u8>,
    tx_pending: BytesMut,
    write_fault: bool,
    shared: Arc<SessionShared>,
}

impl<F: Framer, R: RpcDispatcher> SessionLink<F, R> {
    /// Creates an unbound, disconnected session.
    #[must_use]
    pub fn new(
        config: SessionConfig,
        framer: F,
        dispatcher: R,
        clock: Arc<dyn Clock>,
        shared: Arc<SessionShared>,
    ) -> Self {
        let rx_buf = vec![0; config.max_packet_size.max(1)];
        Self {
            config,
            transport: None,
            framer,
            dispatcher,
            ctx: RpcContext::new(clock),
            state: LinkState::Disconnected,
            rx_buf,
            tx_pending: BytesMut::new(),
            write_fault: false,
            shared,
        }
    }

    /// Binds the transport and enables the dispatcher's packet writer.
    pub fn bind(&mut self, transport: Box<dyn Transport>) {
        self.transport = Some(transport);
        self.ctx.bind_writer();
    }

    /// Returns true once a transport is bound.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.transport.is_some()
    }

    /// Resets the session and applies the configured line parameters.
    ///
    /// # Errors
    /// Returns `SessionError::NotSetUp` if no transport is bound, or
    /// `SessionError::Transport` if the transport rejects the line settings.
    pub fn init(&mut self) -> Result<(), SessionError> {
        self.reset(ResetReason::Init);

        let line = self.config.line;
        let transport = self.transport.as_mut().ok_or(SessionError::NotSetUp)?;
        transport.configure(&line)?;
        info!(line = %line, "session initialized");
        Ok(())
    }

    /// Returns the connection state.
    #[inline]
    #[must_use]
    pub const fn state(&self) -> LinkState {
        self.state
    }

    /// Returns the shared RPC context.
    #[must_use]
    pub const fn context(&self) -> &RpcContext {
        &self.ctx
    }

    /// Returns the dispatcher.
    #[must_use]
    pub const fn dispatcher(&self) -> &R {
        &self.dispatcher
    }

    /// Returns the framer.
    #[must_use]
    pub const fn framer(&self) -> &F {
        &self.framer
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Runs one loop iteration: read, deliver, check, tick.
    pub async fn run_iteration(&mut self) {
        let mut buf = std::mem::take(&mut self.rx_buf);
        let len = self.read_available(&mut buf);

        for &octet in &buf[..len] {
            self.deliver_octet(octet).await;
        }
        self.rx_buf = buf;

        self.check_connection();

        if self.state.is_connected() {
            self.dispatcher.tick(&mut self.ctx);
            self.flush().await;
            self.publish();
        }
    }

    /// Reads whatever the transport has buffered, up to the max packet size.
    ///
    /// Transport errors count as zero octets read.
    fn read_available(&mut self, buf: &mut [u8]) -> usize {
        let Some(transport) = self.transport.as_mut() else {
            return 0;
        };

        match transport.read_available(buf) {
            Ok(len) => {
                if len > 0 {
                    trace!(len, "read from transport");
                    self.shared.stats.add_bytes_read(len);
                }
                len
            }
            Err(err) => {
                trace!(error = %err, "transport read failed");
                0
            }
        }
    }

    /// Feeds one octet to the framer and handles everything it produced.
    async fn deliver_octet(&mut self, octet: u8) {
        let delivered = {
            let mut sink = LinkSink {
                dispatcher: &mut self.dispatcher,
                ctx: &mut self.ctx,
                tx_pending: &mut self.tx_pending,
                stats: &self.shared.stats,
                delivered: 0,
            };
            self.framer.deliver_octet(octet, &mut sink);
            sink.delivered
        };

        self.flush().await;

        if delivered > 0 {
            self.check_link();
            self.publish();
        }
    }

    /// Frames queued packets and transmits all pending octets.
    async fn flush(&mut self) {
        while let Some(packet) = self.ctx.take_packet() {
            let mut sink = LinkSink {
                dispatcher: &mut self.dispatcher,
                ctx: &mut self.ctx,
                tx_pending: &mut self.tx_pending,
                stats: &self.shared.stats,
                delivered: 0,
            };
            if let Err(err) = self.framer.write_packet(&packet, &mut sink) {
                warn!(len = packet.len(), error = %err, "framer rejected packet");
            }
        }

        if self.tx_pending.is_empty() {
            return;
        }

        let pending = self.tx_pending.split().freeze();
        if let Err(err) = self.transmit(&pending).await {
            warn!(error = %err, "transmit abandoned");
            self.write_fault = true;
        }
        self.check_link();
    }

    /// Writes all of `octets` to the transport, pacing between attempts.
    ///
    /// The transport may accept any number of octets per attempt. After an
    /// attempt that leaves octets pending, the session sleeps one pacing
    /// interval and retries with the remainder. Attempts that accept nothing
    /// count as stalls; `max_write_stalls` consecutive stalls abandon the write.
    ///
    /// # Returns
    /// The number of octets written, always `octets.len()` on success.
    ///
    /// # Errors
    /// Returns `SessionError::NotSetUp` without a transport, or
    /// `SessionError::WriteTimedOut` when the transport stalls too long.
    pub async fn transmit(&mut self, octets: &[u8]) -> Result<usize, SessionError> {
        let pacing = self.config.pacing_interval;
        let max_stalls = self.config.max_write_stalls;
        let transport = self.transport.as_mut().ok_or(SessionError::NotSetUp)?;

        let mut written = 0;
        let mut attempts = 0u32;
        let mut stalls = 0u32;

        while written < octets.len() {
            if attempts > 0 {
                self.shared.stats.inc_write_retries();
                tokio::time::sleep(pacing).await;
            }
            attempts += 1;

            let accepted = match transport.write_some(&octets[written..]) {
                Ok(n) => n.min(octets.len() - written),
                Err(err) => {
                    debug!(error = %err, "transport write failed");
                    0
                }
            };
            written += accepted;
            self.shared.stats.add_bytes_written(accepted);

            if accepted > 0 {
                stalls = 0;
                continue;
            }

            stalls += 1;
            if stalls >= max_stalls {
                self.shared.stats.inc_write_timeouts();
                return Err(SessionError::WriteTimedOut {
                    written,
                    remaining: octets.len() - written,
                    attempts,
                });
            }
        }

        trace!(written, attempts, "transmit complete");
        Ok(written)
    }

    /// Evaluates connectivity and liveness and performs the resulting state transition.
    pub fn check_connection(&mut self) -> LinkState {
        self.evaluate(true)
    }

    /// Evaluates framer connectivity and write faults only.
    ///
    /// Used while input is still being delivered: heartbeat age is only
    /// judged once the whole read buffer has reached the dispatcher.
    fn check_link(&mut self) -> LinkState {
        self.evaluate(false)
    }

    /// This is the only place the connection state changes after init.
    fn evaluate(&mut self, expiry: bool) -> LinkState {
        match self.state {
            LinkState::Disconnected => {
                // Output that failed while down belongs to the dead link.
                self.write_fault = false;

                if self.framer.is_connected() {
                    let now = self.ctx.now();
                    self.ctx.liveness_mut().reset(now);
                    self.state = LinkState::Connected;
                    self.shared.stats.inc_connects();
                    info!(at = %now, "session connected");
                    self.publish();
                }
            }
            LinkState::Connected => {
                if let Some(reason) = self.fault(expiry) {
                    self.reset(reason);
                }
            }
        }
        self.state
    }

    fn fault(&self, expiry: bool) -> Option<ResetReason> {
        if !self.framer.is_connected() {
            return Some(ResetReason::LinkLost);
        }
        if self.write_fault {
            return Some(ResetReason::WriteTimedOut);
        }
        if !expiry {
            return None;
        }
        self.ctx.liveness().expiry(
            self.ctx.now(),
            self.config.heartbeat_timeout,
            self.config.message_timeout,
        )
    }

    /// Returns the session to its initial disconnected state.
    fn reset(&mut self, reason: ResetReason) {
        let was = self.state;
        let heartbeat_age = self.ctx.liveness().heartbeat_age(self.ctx.now());

        self.state = LinkState::Disconnected;
        self.ctx.reset();
        self.framer.init();
        self.tx_pending.clear();
        self.write_fault = false;
        self.shared.stats.inc_resets();
        self.publish();

        match reason {
            ResetReason::Init => debug!(%reason, "session reset"),
            _ => warn!(%reason, from = %was, heartbeat_age, "session reset"),
        }
    }

    /// Publishes the current state, peer and sequence id.
    fn publish(&self) {
        let snapshot = SessionSnapshot::new(
            self.state,
            self.ctx.peer_address(),
            self.ctx.sequence_id(),
        );
        if self.shared.snapshot.publish(snapshot) {
            debug!(%snapshot, "session snapshot updated");
        }
    }
}
