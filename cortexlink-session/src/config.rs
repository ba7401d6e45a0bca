/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 19/10/26
******************************************************************************/

//! Session configuration.
//!
//! This module provides configuration options for serial sessions.

use cortexlink_transport::LineConfig;
use std::time::Duration;

/// Default delay between loop iterations and between write retries.
pub const DEFAULT_PACING_INTERVAL: Duration = Duration::from_millis(2);

/// Default heartbeat age, in ticks, after which a connected session resets.
pub const DEFAULT_HEARTBEAT_TIMEOUT: u32 = 5000;

/// Default last-message age, in ticks, after which a connected session resets.
///
/// Half the tick range, so it only fires on counter corruption.
pub const DEFAULT_MESSAGE_TIMEOUT: u32 = i32::MAX as u32;

/// Default number of octets read from the transport per iteration.
pub const DEFAULT_MAX_PACKET_SIZE: usize = 256;

/// Default number of consecutive zero-progress write attempts tolerated.
pub const DEFAULT_MAX_WRITE_STALLS: u32 = 500;

/// Configuration for a serial session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Line parameters applied to the transport on init.
    pub line: LineConfig,
    /// Delay between loop iterations and between write retries.
    pub pacing_interval: Duration,
    /// Heartbeat age in ticks that forces a reset.
    pub heartbeat_timeout: u32,
    /// Last-message age in ticks that forces a reset.
    pub message_timeout: u32,
    /// Maximum octets read from the transport per iteration.
    pub max_packet_size: usize,
    /// Consecutive zero-progress write attempts before the write times out.
    pub max_write_stalls: u32,
}

impl SessionConfig {
    /// Creates a configuration with the companion link defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            line: LineConfig::default(),
            pacing_interval: DEFAULT_PACING_INTERVAL,
            heartbeat_timeout: DEFAULT_HEARTBEAT_TIMEOUT,
            message_timeout: DEFAULT_MESSAGE_TIMEOUT,
            max_packet_size: DEFAULT_MAX_PACKET_SIZE,
            max_write_stalls: DEFAULT_MAX_WRITE_STALLS,
        }
    }

    /// Sets the line parameters.
    #[must_use]
    pub const fn with_line(mut self, line: LineConfig) -> Self {
        self.line = line;
        self
    }

    /// Sets the pacing interval.
    #[must_use]
    pub const fn with_pacing_interval(mut self, interval: Duration) -> Self {
        self.pacing_interval = interval;
        self
    }

    /// Sets the heartbeat timeout in ticks.
    #[must_use]
    pub const fn with_heartbeat_timeout(mut self, ticks: u32) -> Self {
        self.heartbeat_timeout = ticks;
        self
    }

    /// Sets the last-message timeout in ticks.
    #[must_use]
    pub const fn with_message_timeout(mut self, ticks: u32) -> Self {
        self.message_timeout = ticks;
        self
    }

    /// Sets the maximum octets read per iteration.
    ///
    /// Zero is raised to one so every iteration can make progress.
    #[must_use]
    pub fn with_max_packet_size(mut self, size: usize) -> Self {
        self.max_packet_size = size.max(1);
        self
    }

    /// Sets how many consecutive stalled write attempts are tolerated.
    #[must_use]
    pub const fn with_max_write_stalls(mut self, stalls: u32) -> Self {
        self.max_write_stalls = stalls;
        self
    }

    /// Returns the worst-case time a fully stalled write blocks the session.
    #[must_use]
    pub fn write_timeout(&self) -> Duration {
        self.pacing_interval * self.max_write_stalls
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for session configuration.
#[derive(Debug, Default)]
pub struct SessionConfigBuilder {
    line: Option<LineConfig>,
    pacing_interval: Option<Duration>,
    heartbeat_timeout: Option<u32>,
    message_timeout: Option<u32>,
    max_packet_size: Option<usize>,
    max_write_stalls: Option<u32>,
}

impl SessionConfigBuilder {
    /// Creates a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the line parameters.
    #[must_use]
    pub fn line(mut self, line: LineConfig) -> Self {
        self.line = Some(line);
        self
    }

    /// Sets the pacing interval.
    #[must_use]
    pub fn pacing_interval(mut self, interval: Duration) -> Self {
        self.pacing_interval = Some(interval);
        self
    }

    /// Sets the heartbeat timeout in ticks.
    #[must_use]
    pub fn heartbeat_timeout(mut self, ticks: u32) -> Self {
        self.heartbeat_timeout = Some(ticks);
        self
    }

    /// Sets the last-message timeout in ticks.
    #[must_use]
    pub fn message_timeout(mut self, ticks: u32) -> Self {
        self.message_timeout = Some(ticks);
        self
    }

    /// Sets the maximum octets read per iteration.
    #[must_use]
    pub fn max_packet_size(mut self, size: usize) -> Self {
        self.max_packet_size = Some(size);
        self
    }

    /// Sets the consecutive stalled write attempts tolerated.
    #[must_use]
    pub fn max_write_stalls(mut self, stalls: u32) -> Self {
        self.max_write_stalls = Some(stalls);
        self
    }

    /// Builds the configuration, falling back to defaults for unset fields.
    #[must_use]
    pub fn build(self) -> SessionConfig {
        let mut config = SessionConfig::new();

        if let Some(line) = self.line {
            config.line = line;
        }
        if let Some(interval) = self.pacing_interval {
            config.pacing_interval = interval;
        }
        if let Some(ticks) = self.heartbeat_timeout {
            config.heartbeat_timeout = ticks;
        }
        if let Some(ticks) = self.message_timeout {
            config.message_timeout = ticks;
        }
        if let Some(size) = self.max_packet_size {
            config = config.with_max_packet_size(size);
        }
        if let Some(stalls) = self.max_write_stalls {
            config.max_write_stalls = stalls;
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_config_new() {
        let config = SessionConfig::new();

        assert_eq!(config.line, LineConfig::default());
        assert_eq!(config.pacing_interval, Duration::from_millis(2));
        assert_eq!(config.heartbeat_timeout, 5000);
        assert_eq!(config.message_timeout, 2_147_483_647);
        assert_eq!(config.max_packet_size, 256);
        assert_eq!(config.write_timeout(), Duration::from_secs(1));
    }

    #[test]
    fn test_session_config_builder() {
        let config = SessionConfigBuilder::new()
            .pacing_interval(Duration::from_millis(5))
            .heartbeat_timeout(2000)
            .max_packet_size(0)
            .max_write_stalls(10)
            .build();

        assert_eq!(config.pacing_interval, Duration::from_millis(5));
        assert_eq!(config.heartbeat_timeout, 2000);
        assert_eq!(config.max_packet_size, 1);
        assert_eq!(config.write_timeout(), Duration::from_millis(50));
        assert_eq!(config.message_timeout, DEFAULT_MESSAGE_TIMEOUT);
    }

    #[test]
    fn test_session_config_setters() {
        let config = SessionConfig::new()
            .with_heartbeat_timeout(3000)
            .with_message_timeout(60_000);

        assert_eq!(config.heartbeat_timeout, 3000);
        assert_eq!(config.message_timeout, 60_000);
        assert_eq!(
            config,
            SessionConfigBuilder::new()
                .heartbeat_timeout(3000)
                .message_timeout(60_000)
                .build()
        );
    }
}
