/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 19/10/26
******************************************************************************/

//! Liveness timestamps and timeout detection.
//!
//! The RPC layer refreshes these timestamps as traffic flows; the session
//! only reads them to decide whether a connected link has gone silent:
//! - heartbeat older than the heartbeat timeout
//! - last message older than the message timeout

use crate::state::ResetReason;
use cortexlink_core::types::Ticks;
use serde::{Deserialize, Serialize};

/// Protocol liveness timestamps for one session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Liveness {
    /// Time of the last message received.
    pub last_message: Ticks,
    /// Time of the last heartbeat received.
    pub last_heartbeat: Ticks,
    /// Time telemetry was last published.
    pub last_published: Ticks,
    /// Time statistics were last sent.
    pub last_stats: Ticks,
}

impl Liveness {
    /// Creates timestamps all reading `now`.
    #[must_use]
    pub const fn new(now: Ticks) -> Self {
        Self {
            last_message: now,
            last_heartbeat: now,
            last_published: now,
            last_stats: now,
        }
    }

    /// Sets all four timestamps to `now`.
    pub fn reset(&mut self, now: Ticks) {
        *self = Self::new(now);
    }

    /// Records that a message was received.
    #[inline]
    pub fn on_message(&mut self, now: Ticks) {
        self.last_message = now;
    }

    /// Records that a heartbeat was received.
    #[inline]
    pub fn on_heartbeat(&mut self, now: Ticks) {
        self.last_heartbeat = now;
    }

    /// Records that telemetry was published.
    #[inline]
    pub fn on_published(&mut self, now: Ticks) {
        self.last_published = now;
    }

    /// Records that statistics were sent.
    #[inline]
    pub fn on_stats(&mut self, now: Ticks) {
        self.last_stats = now;
    }

    /// Returns the ticks since the last heartbeat.
    #[must_use]
    pub const fn heartbeat_age(&self, now: Ticks) -> u32 {
        now.since(self.last_heartbeat)
    }

    /// Returns the ticks since the last message.
    #[must_use]
    pub const fn message_age(&self, now: Ticks) -> u32 {
        now.since(self.last_message)
    }

    /// Checks the timestamps against both timeouts.
    ///
    /// Ages equal to a timeout are still alive; only strictly older expires.
    #[must_use]
    pub fn expiry(
        &self,
        now: Ticks,
        heartbeat_timeout: u32,
        message_timeout: u32,
    ) -> Option<ResetReason> {
        if self.heartbeat_age(now) > heartbeat_timeout {
            Some(ResetReason::HeartbeatExpired)
        } else if self.message_age(now) > message_timeout {
            Some(ResetReason::MessageExpired)
        } else {
            None
        }
    }
}
