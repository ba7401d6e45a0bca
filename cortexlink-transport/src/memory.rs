/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 19/10/26
******************************************************************************/

//! In-memory serial transport.
//!
//! This module provides a pair of connected endpoints backed by `crossbeam`
//! channels, suitable for testing and for running a session without hardware.
//! The controller side implements [`Transport`]; the companion side is a
//! [`MemoryPeer`] that injects input, collects output and can throttle or
//! stall the line.

use crate::line::LineConfig;
use crate::traits::Transport;
use cortexlink_core::error::TransportError;
use crossbeam_channel::{Receiver, Sender, TryRecvError};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use tracing::debug;

/// Line state shared between a transport and its peer.
#[derive(Debug, Default)]
struct LineControl {
    /// Octets accepted per write call; zero means unlimited.
    accept_limit: AtomicUsize,
    /// When set, every write accepts nothing.
    stalled: AtomicBool,
    /// Number of `write_some` calls made.
    write_calls: AtomicU64,
    /// Last line configuration applied.
    line: Mutex<Option<LineConfig>>,
}

/// Controller side of an in-memory serial line.
#[derive(Debug)]
pub struct MemoryTransport {
    rx: Receiver<u8>,
    tx: Sender<u8>,
    control: Arc<LineControl>,
}

/// Companion side of an in-memory serial line.
#[derive(Debug, Clone)]
pub struct MemoryPeer {
    rx: Receiver<u8>,
    tx: Sender<u8>,
    control: Arc<LineControl>,
}

impl MemoryTransport {
    /// Creates a connected transport and peer.
    #[must_use]
    pub fn pair() -> (Self, MemoryPeer) {
        let (to_controller, from_peer) = crossbeam_channel::unbounded();
        let (to_peer, from_controller) = crossbeam_channel::unbounded();
        let control = Arc::new(LineControl::default());

        (
            Self {
                rx: from_peer,
                tx: to_peer,
                control: Arc::clone(&control),
            },
            MemoryPeer {
                rx: from_controller,
                tx: to_controller,
                control,
            },
        )
    }
}

impl Transport for MemoryTransport {
    fn configure(&mut self, line: &LineConfig) -> Result<(), TransportError> {
        debug!(line = %line, "memory line configured");
        *self.control.line.lock() = Some(*line);
        Ok(())
    }

    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        let mut len = 0;
        while len < buf.len() {
            match self.rx.try_recv() {
                Ok(octet) => {
                    buf[len] = octet;
                    len += 1;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) if len == 0 => {
                    return Err(TransportError::Closed);
                }
                Err(TryRecvError::Disconnected) => break,
            }
        }
        Ok(len)
    }

    fn write_some(&mut self, octets: &[u8]) -> Result<usize, TransportError> {
        self.control.write_calls.fetch_add(1, Ordering::SeqCst);

        if self.control.stalled.load(Ordering::SeqCst) {
            return Ok(0);
        }

        let limit = match self.control.accept_limit.load(Ordering::SeqCst) {
            0 => octets.len(),
            limit => limit.min(octets.len()),
        };

        for &octet in &octets[..limit] {
            self.tx.send(octet).map_err(|_| TransportError::Closed)?;
        }
        Ok(limit)
    }
}

impl MemoryPeer {
    /// Sends octets towards the controller.
    ///
    /// # Errors
    /// Returns `TransportError::Closed` if the transport has been dropped.
    pub fn send(&self, octets: &[u8]) -> Result<(), TransportError> {
        for &octet in octets {
            self.tx.send(octet).map_err(|_| TransportError::Closed)?;
        }
        Ok(())
    }

    /// Takes every octet the controller has written so far.
    #[must_use]
    pub fn drain(&self) -> Vec<u8> {
        self.rx.try_iter().collect()
    }

    /// Limits how many octets each write call accepts; `None` removes the limit.
    pub fn set_accept_limit(&self, limit: Option<usize>) {
        self.control
            .accept_limit
            .store(limit.unwrap_or(0), Ordering::SeqCst);
    }

    /// Makes every subsequent write accept nothing until cleared.
    pub fn set_stalled(&self, stalled: bool) {
        self.control.stalled.store(stalled, Ordering::SeqCst);
    }

    /// Returns the number of write calls the controller made.
    #[must_use]
    pub fn write_calls(&self) -> u64 {
        self.control.write_calls.load(Ordering::SeqCst)
    }

    /// Returns the line configuration the controller applied, if any.
    #[must_use]
    pub fn line_config(&self) -> Option<LineConfig> {
        *self.control.line.lock()
    }
}
