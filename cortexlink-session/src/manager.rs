/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 19/10/26
******************************************************************************/

//! Session lifecycle management.
//!
//! [`SessionManager`] is the public face of a session: it binds the
//! transport, initializes the line, and runs the processing loop as a single
//! background task. State queries never touch the task; they read the
//! atomically published [`SessionSnapshot`].

use crate::clock::{Clock, TokioClock};
use crate::config::SessionConfig;
use crate::framer::Framer;
use crate::link::{SessionLink, SessionShared};
use crate::rpc::RpcDispatcher;
use crate::state::SessionSnapshot;
use crate::stats::StatsSnapshot;
use cortexlink_core::error::SessionError;
use cortexlink_core::types::{LinkState, PeerAddress};
use cortexlink_transport::Transport;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Owner of one serial session and its processing task.
pub struct SessionManager<F, R> {
    link: Arc<Mutex<SessionLink<F, R>>>,
    shared: Arc<SessionShared>,
    pacing_interval: Duration,
    bound: bool,
    task: Option<JoinHandle<()>>,
    cancel: Option<CancellationToken>,
}

impl<F, R> SessionManager<F, R>
where
    F: Framer + 'static,
    R: RpcDispatcher + 'static,
{
    /// Creates a session on tokio's clock.
    ///
    /// # Arguments
    /// * `config` - Session configuration
    /// * `framer` - Framing protocol for the link
    /// * `dispatcher` - Application message consumer
    #[must_use]
    pub fn new(config: SessionConfig, framer: F, dispatcher: R) -> Self {
        Self::with_clock(config, framer, dispatcher, Arc::new(TokioClock::new()))
    }

    /// Creates a session measuring liveness on `clock`.
    #[must_use]
    pub fn with_clock(
        config: SessionConfig,
        framer: F,
        dispatcher: R,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let shared = Arc::new(SessionShared::default());
        let pacing_interval = config.pacing_interval;
        let link = SessionLink::new(config, framer, dispatcher, clock, Arc::clone(&shared));

        Self {
            link: Arc::new(Mutex::new(link)),
            shared,
            pacing_interval,
            bound: false,
            task: None,
            cancel: None,
        }
    }

    /// Binds the transport and installs the packet writer used by the dispatcher.
    ///
    /// Performs no I/O.
    ///
    /// # Errors
    /// Returns `SessionError::AlreadyRunning` if the processing task is running;
    /// the transport cannot be swapped under a live loop.
    pub async fn setup<T: Transport + 'static>(&mut self, transport: T) -> Result<(), SessionError> {
        if self.is_running() {
            return Err(SessionError::AlreadyRunning);
        }
        self.link.lock().await.bind(Box::new(transport));
        self.bound = true;
        debug!("session transport bound");
        Ok(())
    }

    /// Resets the session and configures the transport's line parameters.
    ///
    /// Safe to call repeatedly and before any traffic exists.
    ///
    /// # Errors
    /// Returns `SessionError::NotSetUp` before [`setup`](Self::setup), or the
    /// transport's error if it rejects the line configuration.
    pub async fn init(&self) -> Result<(), SessionError> {
        self.link.lock().await.init()
    }

    /// Launches the processing loop as a background task.
    ///
    /// Does nothing if the task is already running.
    ///
    /// # Errors
    /// Returns `SessionError::NotSetUp` before [`setup`](Self::setup).
    pub fn start(&mut self) -> Result<(), SessionError> {
        if !self.bound {
            return Err(SessionError::NotSetUp);
        }
        if self.is_running() {
            debug!("session task already running");
            return Ok(());
        }

        let token = CancellationToken::new();
        let link = Arc::clone(&self.link);
        let pacing = self.pacing_interval;

        self.task = Some(tokio::spawn(run(link, token.clone(), pacing)));
        self.cancel = Some(token);
        info!(pacing_ms = pacing.as_millis() as u64, "session task started");
        Ok(())
    }

    /// Signals the processing loop to exit and releases the task handle.
    ///
    /// The loop observes the signal at its next iteration boundary. State
    /// queries remain valid afterwards.
    ///
    /// # Returns
    /// `true` if a task was running.
    pub fn stop(&mut self) -> bool {
        if let Some(token) = self.cancel.take() {
            token.cancel();
        }
        let was_running = self.task.take().is_some();
        if was_running {
            info!("session task stopping");
        }
        was_running
    }

    /// Stops the processing loop and waits for it to exit.
    pub async fn shutdown(&mut self) {
        if let Some(token) = self.cancel.take() {
            token.cancel();
        }
        if let Some(task) = self.task.take() {
            if let Err(err) = task.await {
                debug!(error = %err, "session task ended abnormally");
            }
            info!("session task stopped");
        }
    }

    /// Runs exactly one loop iteration on the caller's task, without pacing.
    ///
    /// # Errors
    /// Returns `SessionError::AlreadyRunning` while the background task runs,
    /// or `SessionError::NotSetUp` before [`setup`](Self::setup).
    pub async fn poll_once(&self) -> Result<LinkState, SessionError> {
        if self.is_running() {
            return Err(SessionError::AlreadyRunning);
        }
        if !self.bound {
            return Err(SessionError::NotSetUp);
        }
        let mut link = self.link.lock().await;
        link.run_iteration().await;
        Ok(link.state())
    }

    /// Returns true while the background task is alive.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Returns true if the session is connected.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.shared.snapshot.load().is_connected()
    }

    /// Returns the peer address, all-zero when disconnected.
    #[must_use]
    pub fn peer_address(&self) -> PeerAddress {
        self.shared.snapshot.load().peer
    }

    /// Returns state, peer and sequence id as one consistent value.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.shared.snapshot.load()
    }

    /// Returns a receiver notified whenever the snapshot changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.shared.snapshot.subscribe()
    }

    /// Returns the traffic counters.
    #[must_use]
    pub fn stats(&self) -> StatsSnapshot {
        self.shared.stats.snapshot()
    }

    /// Returns a handle for reading session state from other tasks.
    #[must_use]
    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<F, R> Drop for SessionManager<F, R> {
    fn drop(&mut self) {
        if let Some(token) = self.cancel.take() {
            token.cancel();
        }
    }
}

/// Cloneable read-only view of a session, for display and telemetry tasks.
#[derive(Debug, Clone)]
pub struct SessionStatus {
    shared: Arc<SessionShared>,
}

impl SessionStatus {
    /// Returns true if the session is connected.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.shared.snapshot.load().is_connected()
    }

    /// Returns the peer address, all-zero when disconnected.
    #[must_use]
    pub fn peer_address(&self) -> PeerAddress {
        self.shared.snapshot.load().peer
    }

    /// Returns state, peer and sequence id as one consistent value.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.shared.snapshot.load()
    }

    /// Returns the traffic counters.
    #[must_use]
    pub fn stats(&self) -> StatsSnapshot {
        self.shared.stats.snapshot()
    }
}

/// The processing loop: one iteration, then one pacing interval, until cancelled.
///
/// The link is locked per iteration so `init` can interleave with a running loop.
async fn run<F, R>(link: Arc<Mutex<SessionLink<F, R>>>, cancel: CancellationToken, pacing: Duration)
where
    F: Framer,
    R: RpcDispatcher,
{
    debug!("session loop running");

    while !cancel.is_cancelled() {
        link.lock().await.run_iteration().await;

        tokio::select! {
            () = cancel.cancelled() => break,
            () = tokio::time::sleep(pacing) => {}
        }
    }

    let state = link.lock().await.state();
    debug!(%state, "session loop exited");
}
