//! Common utilities shared across examples.

#![allow(dead_code)]

use cortexlink_session::SessionConfig;
use std::env;
use std::net::Ipv4Addr;
use std::time::Duration;

/// Default pacing interval in milliseconds.
pub const DEFAULT_PACING_MS: u64 = 2;

/// Default heartbeat timeout in milliseconds.
pub const DEFAULT_HEARTBEAT_MS: u32 = 5000;

/// Default demo duration in seconds.
pub const DEFAULT_RUN_SECS: u64 = 16;

/// Frame start marker.
pub const FRAME_START: u8 = 0xAA;

/// Largest payload a frame can carry.
pub const MAX_PAYLOAD: usize = u8::MAX as usize;

/// Example configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ExampleConfig {
    /// Delay between loop iterations.
    pub pacing_interval: Duration,
    /// Heartbeat timeout in milliseconds.
    pub heartbeat_timeout: u32,
    /// How long the demo runs.
    pub run_for: Duration,
    /// Address the simulated companion announces.
    pub companion_address: Ipv4Addr,
}

impl ExampleConfig {
    /// Creates a configuration from `CORTEXLINK_*` variables, with defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            pacing_interval: Duration::from_millis(
                env::var("CORTEXLINK_PACING_MS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(DEFAULT_PACING_MS),
            ),
            heartbeat_timeout: env::var("CORTEXLINK_HEARTBEAT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_HEARTBEAT_MS),
            run_for: Duration::from_secs(
                env::var("CORTEXLINK_RUN_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(DEFAULT_RUN_SECS),
            ),
            companion_address: env::var("CORTEXLINK_COMPANION_IP")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(Ipv4Addr::new(192, 168, 7, 2)),
        }
    }

    /// Returns the session configuration for this demo.
    #[must_use]
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig::new()
            .with_pacing_interval(self.pacing_interval)
            .with_heartbeat_timeout(self.heartbeat_timeout)
    }
}

/// Initializes logging for examples.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .try_init();
}

/// XOR of all payload octets.
#[must_use]
pub fn checksum(payload: &[u8]) -> u8 {
    payload.iter().fold(0, |acc, b| acc ^ b)
}

/// Encodes `payload` as `START len payload xor`.
///
/// Payloads longer than [`MAX_PAYLOAD`] are truncated; callers check first.
#[must_use]
pub fn encode_frame(payload: &[u8]) -> Vec<u8> {
    let payload = &payload[..payload.len().min(MAX_PAYLOAD)];
    let mut frame = Vec::with_capacity(payload.len() + 3);
    frame.push(FRAME_START);
    frame.push(payload.len() as u8);
    frame.extend_from_slice(payload);
    frame.push(checksum(payload));
    frame
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecodeState {
    Idle,
    Length,
    Payload(usize),
    Checksum,
}

/// Incremental decoder for [`encode_frame`] output.
#[derive(Debug)]
pub struct FrameDecoder {
    state: DecodeState,
    payload: Vec<u8>,
    rejected: u64,
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameDecoder {
    /// Creates a decoder waiting for a start marker.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: DecodeState::Idle,
            payload: Vec::with_capacity(MAX_PAYLOAD),
            rejected: 0,
        }
    }

    /// Discards any partial frame.
    pub fn reset(&mut self) {
        self.state = DecodeState::Idle;
        self.payload.clear();
    }

    /// Frames dropped for a bad checksum.
    #[must_use]
    pub fn rejected(&self) -> u64 {
        self.rejected
    }

    /// Feeds one octet, returning the payload when it completes a valid frame.
    pub fn push(&mut self, octet: u8) -> Option<Vec<u8>> {
        match self.state {
            DecodeState::Idle => {
                if octet == FRAME_START {
                    self.payload.clear();
                    self.state = DecodeState::Length;
                }
                None
            }
            DecodeState::Length => {
                self.state = match octet {
                    0 => DecodeState::Checksum,
                    len => DecodeState::Payload(len as usize),
                };
                None
            }
            DecodeState::Payload(len) => {
                self.payload.push(octet);
                if self.payload.len() == len {
                    self.state = DecodeState::Checksum;
                }
                None
            }
            DecodeState::Checksum => {
                self.state = DecodeState::Idle;
                if checksum(&self.payload) == octet {
                    Some(std::mem::take(&mut self.payload))
                } else {
                    self.rejected += 1;
                    None
                }
            }
        }
    }
}
