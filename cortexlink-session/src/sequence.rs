/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 19/10/26
******************************************************************************/

//! Sequence id management.
//!
//! The RPC layer stamps outgoing messages with sequence ids allocated here.
//! The counter starts at zero and returns to zero on every session reset.

/// Sequence id counter for one session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SequenceCounter {
    current: u32,
}

impl SequenceCounter {
    /// Creates a counter at zero.
    #[must_use]
    pub const fn new() -> Self {
        Self { current: 0 }
    }

    /// Returns the last allocated id, or zero if none since the last reset.
    #[inline]
    #[must_use]
    pub const fn current(&self) -> u32 {
        self.current
    }

    /// Allocates and returns the next id.
    ///
    /// Ids start at 1 and wrap back to 1, skipping zero.
    #[inline]
    pub fn allocate(&mut self) -> u32 {
        self.current = self.current.checked_add(1).unwrap_or(1);
        self.current
    }

    /// Overwrites the current id, e.g. to adopt the peer's numbering.
    #[inline]
    pub fn set(&mut self, id: u32) {
        self.current = id;
    }

    /// Returns the counter to zero.
    #[inline]
    pub fn reset(&mut self) {
        self.current = 0;
    }
}
