/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 19/10/26
******************************************************************************/

//! Monotonic tick sources.
//!
//! The session measures liveness in [`Ticks`], a wrapping millisecond counter.
//! [`TokioClock`] follows tokio's clock, so paused test time applies to it;
//! [`ManualClock`] only moves when told to.

use cortexlink_core::types::Ticks;
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use tokio::time::Instant;

/// A source of monotonic millisecond ticks.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Returns the current tick count.
    fn now(&self) -> Ticks;
}

/// Clock counting milliseconds since its creation on tokio's timer.
#[derive(Debug, Clone, Copy)]
pub struct TokioClock {
    origin: Instant,
}

impl TokioClock {
    /// Creates a clock whose tick zero is now.
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for TokioClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for TokioClock {
    fn now(&self) -> Ticks {
        // Truncation wraps the counter like a 32-bit hardware timer.
        Ticks::new(self.origin.elapsed().as_millis() as u32)
    }
}

/// Clock that advances only when set or advanced explicitly.
#[derive(Debug, Default)]
pub struct ManualClock {
    millis: AtomicU32,
}

impl ManualClock {
    /// Creates a clock reading `start`.
    #[must_use]
    pub fn new(start: u32) -> Self {
        Self {
            millis: AtomicU32::new(start),
        }
    }

    /// Sets the current tick count.
    pub fn set(&self, millis: u32) {
        self.millis.store(millis, Ordering::SeqCst);
    }

    /// Advances the clock by `millis`, wrapping on overflow.
    pub fn advance(&self, millis: u32) {
        let _ = self
            .millis
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |t| {
                Some(t.wrapping_add(millis))
            });
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Ticks {
        Ticks::new(self.millis.load(Ordering::SeqCst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_manual_clock() {
        let clock = ManualClock::new(10);
        assert_eq!(clock.now(), Ticks::new(10));

        clock.advance(5);
        assert_eq!(clock.now(), Ticks::new(15));

        clock.set(u32::MAX);
        clock.advance(2);
        assert_eq!(clock.now(), Ticks::new(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_tokio_clock_follows_paused_time() {
        let clock = TokioClock::new();
        assert_eq!(clock.now(), Ticks::ZERO);

        tokio::time::advance(Duration::from_millis(1234)).await;
        assert_eq!(clock.now(), Ticks::new(1234));
    }
}
