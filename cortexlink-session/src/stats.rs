/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 19/10/26
******************************************************************************/

//! Session traffic counters.
//!
//! Counters are plain atomics: the session task increments them, anyone may
//! read them.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic counters for one session.
#[derive(Debug, Default)]
pub struct SessionStats {
    bytes_read: AtomicU64,
    bytes_written: AtomicU64,
    packets_delivered: AtomicU64,
    messages_dispatched: AtomicU64,
    deserialize_failures: AtomicU64,
    connects: AtomicU64,
    resets: AtomicU64,
    write_retries: AtomicU64,
    write_timeouts: AtomicU64,
}

/// Point-in-time copy of [`SessionStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    /// Octets read from the transport.
    pub bytes_read: u64,
    /// Octets accepted by the transport.
    pub bytes_written: u64,
    /// Packets the framer delivered.
    pub packets_delivered: u64,
    /// Packets that deserialized and reached the dispatcher.
    pub messages_dispatched: u64,
    /// Packets dropped because they did not deserialize.
    pub deserialize_failures: u64,
    /// Disconnected to connected transitions.
    pub connects: u64,
    /// Resets, including the one performed by `init`.
    pub resets: u64,
    /// Write attempts that had to be repeated.
    pub write_retries: u64,
    /// Writes abandoned after too many stalls.
    pub write_timeouts: u64,
}

impl SessionStats {
    /// Creates zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub(crate) fn add_bytes_read(&self, n: usize) {
        self.bytes_read.fetch_add(n as u64, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn add_bytes_written(&self, n: usize) {
        self.bytes_written.fetch_add(n as u64, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn inc_packets_delivered(&self) {
        self.packets_delivered.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn inc_messages_dispatched(&self) {
        self.messages_dispatched.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn inc_deserialize_failures(&self) {
        self.deserialize_failures.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn inc_connects(&self) {
        self.connects.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn inc_resets(&self) {
        self.resets.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn inc_write_retries(&self) {
        self.write_retries.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn inc_write_timeouts(&self) {
        self.write_timeouts.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns a copy of all counters.
    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            bytes_read: self.bytes_read.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
            packets_delivered: self.packets_delivered.load(Ordering::Relaxed),
            messages_dispatched: self.messages_dispatched.load(Ordering::Relaxed),
            deserialize_failures: self.deserialize_failures.load(Ordering::Relaxed),
            connects: self.connects.load(Ordering::Relaxed),
            resets: self.resets.load(Ordering::Relaxed),
            write_retries: self.write_retries.load(Ordering::Relaxed),
            write_timeouts: self.write_timeouts.load(Ordering::Relaxed),
        }
    }
}
