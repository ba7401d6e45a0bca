/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 19/10/26
******************************************************************************/

//! Published session state.
//!
//! The session task is the only writer of connection state. Other tasks read
//! it through a [`SnapshotCell`], which swaps whole [`SessionSnapshot`] values
//! atomically so a reader never sees a state from one moment paired with a
//! peer address from another.

use arc_swap::ArcSwap;
use cortexlink_core::types::{LinkState, PeerAddress};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;

/// Why a session was reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResetReason {
    /// Explicit reset from `init`.
    Init,
    /// The framer reported the link down.
    LinkLost,
    /// No heartbeat within the heartbeat timeout.
    HeartbeatExpired,
    /// No message within the message timeout.
    MessageExpired,
    /// The transport stopped accepting output.
    WriteTimedOut,
}

impl fmt::Display for ResetReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Init => "init",
            Self::LinkLost => "link lost",
            Self::HeartbeatExpired => "heartbeat expired",
            Self::MessageExpired => "message expired",
            Self::WriteTimedOut => "write timed out",
        })
    }
}

/// Consistent view of a session's externally visible state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Connection state.
    pub state: LinkState,
    /// Peer address; unknown whenever disconnected.
    pub peer: PeerAddress,
    /// Last sequence id; zero whenever disconnected.
    pub sequence_id: u32,
}

impl SessionSnapshot {
    /// The disconnected snapshot.
    pub const DISCONNECTED: Self = Self {
        state: LinkState::Disconnected,
        peer: PeerAddress::UNKNOWN,
        sequence_id: 0,
    };

    /// Creates a snapshot, forcing peer and sequence id to zero when disconnected.
    #[must_use]
    pub const fn new(state: LinkState, peer: PeerAddress, sequence_id: u32) -> Self {
        match state {
            LinkState::Disconnected => Self::DISCONNECTED,
            LinkState::Connected => Self {
                state,
                peer,
                sequence_id,
            },
        }
    }

    /// Returns true if the session is connected.
    #[inline]
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        self.state.is_connected()
    }
}

impl fmt::Display for SessionSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} seq={}", self.state, self.peer, self.sequence_id)
    }
}

/// Single-writer, many-reader cell holding the latest snapshot.
#[derive(Debug)]
pub struct SnapshotCell {
    current: ArcSwap<SessionSnapshot>,
    changes: watch::Sender<SessionSnapshot>,
}

impl SnapshotCell {
    /// Creates a cell holding the disconnected snapshot.
    #[must_use]
    pub fn new() -> Self {
        let (changes, _) = watch::channel(SessionSnapshot::DISCONNECTED);
        Self {
            current: ArcSwap::from_pointee(SessionSnapshot::DISCONNECTED),
            changes,
        }
    }

    /// Returns the latest snapshot without blocking.
    #[inline]
    #[must_use]
    pub fn load(&self) -> SessionSnapshot {
        **self.current.load()
    }

    /// Publishes a snapshot.
    ///
    /// # Returns
    /// `true` if it differs from the previous one; subscribers are only
    /// notified in that case.
    pub fn publish(&self, snapshot: SessionSnapshot) -> bool {
        if self.load() == snapshot {
            return false;
        }
        self.current.store(Arc::new(snapshot));
        self.changes.send_if_modified(|value| {
            *value = snapshot;
            true
        })
    }

    /// Returns a receiver notified on every change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.changes.subscribe()
    }
}

impl Default for SnapshotCell {
    fn default() -> Self {
        Self::new()
    }
}
