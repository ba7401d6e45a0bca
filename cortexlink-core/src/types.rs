/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 19/10/26
******************************************************************************/

//! Core types for serial session operations.
//!
//! This module provides fundamental types used throughout CortexLink:
//! - [`Ticks`]: Wrapping millisecond timestamp from a free-running counter
//! - [`PeerAddress`]: IPv4 address reported by the companion computer
//! - [`LinkState`]: Logical connection state of a session

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;

/// Millisecond timestamp from a free-running 32-bit counter.
///
/// The counter wraps after roughly 49.7 days; elapsed time is always computed
/// with wrapping subtraction so a wrap never produces a spurious timeout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(transparent)]
#[serde(transparent)]
pub struct Ticks(u32);

impl Ticks {
    /// The zero timestamp.
    pub const ZERO: Self = Self(0);

    /// Creates a timestamp from a raw millisecond count.
    #[inline]
    #[must_use]
    pub const fn new(millis: u32) -> Self {
        Self(millis)
    }

    /// Returns the raw millisecond count.
    #[inline]
    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }

    /// Returns the ticks elapsed from `earlier` to `self`.
    #[inline]
    #[must_use]
    pub const fn since(self, earlier: Self) -> u32 {
        self.0.wrapping_sub(earlier.0)
    }

    /// Returns this timestamp advanced by `millis`.
    #[inline]
    #[must_use]
    pub const fn wrapping_add(self, millis: u32) -> Self {
        Self(self.0.wrapping_add(millis))
    }
}

impl From<u32> for Ticks {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl fmt::Display for Ticks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

/// IPv4 address of the companion computer.
///
/// The all-zero address means the peer is unknown or not connected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct PeerAddress([u8; 4]);

impl PeerAddress {
    /// The unknown peer, `0.0.0.0`.
    pub const UNKNOWN: Self = Self([0; 4]);

    /// Creates an address from its four octets.
    #[inline]
    #[must_use]
    pub const fn new(octets: [u8; 4]) -> Self {
        Self(octets)
    }

    /// Returns the four octets.
    #[inline]
    #[must_use]
    pub const fn octets(self) -> [u8; 4] {
        self.0
    }

    /// Returns true if the address is `0.0.0.0`.
    #[inline]
    #[must_use]
    pub const fn is_unknown(self) -> bool {
        u32::from_be_bytes(self.0) == 0
    }
}

impl From<[u8; 4]> for PeerAddress {
    fn from(octets: [u8; 4]) -> Self {
        Self(octets)
    }
}

impl From<Ipv4Addr> for PeerAddress {
    fn from(addr: Ipv4Addr) -> Self {
        Self(addr.octets())
    }
}

impl From<PeerAddress> for Ipv4Addr {
    fn from(addr: PeerAddress) -> Self {
        Ipv4Addr::from(addr.0)
    }
}

impl fmt::Display for PeerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d] = self.0;
        write!(f, "{a}.{b}.{c}.{d}")
    }
}

/// Logical connection state of a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LinkState {
    /// No live link to the companion computer.
    #[default]
    Disconnected,
    /// Link established and heartbeats arriving in time.
    Connected,
}

impl LinkState {
    /// Returns true for [`LinkState::Connected`].
    #[inline]
    #[must_use]
    pub const fn is_connected(self) -> bool {
        matches!(self, Self::Connected)
    }

    /// Returns the state name in upper case, as shown on status displays.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "DISCONNECTED",
            Self::Connected => "CONNECTED",
        }
    }
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
