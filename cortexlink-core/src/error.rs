/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 19/10/26
******************************************************************************/

//! Error types for the CortexLink serial session stack.
//!
//! This module provides a unified error hierarchy using `thiserror` for typed,
//! domain-specific errors across transport, framing, RPC and session operations.

use thiserror::Error;

/// Result type alias using [`CortexError`] as the error type.
pub type Result<T> = std::result::Result<T, CortexError>;

/// Top-level error type for all CortexLink operations.
#[derive(Debug, Error)]
pub enum CortexError {
    /// Error in session layer operations.
    #[error("session error: {0}")]
    Session(#[from] SessionError),

    /// Error from the serial transport.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Error from the framing layer.
    #[error("framer error: {0}")]
    Framer(#[from] FramerError),

    /// Error from the RPC layer.
    #[error("rpc error: {0}")]
    Rpc(#[from] RpcError),
}

/// Errors raised by a serial transport.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The line has been closed by the other side.
    #[error("transport closed")]
    Closed,

    /// The requested line parameters are not supported by the device.
    #[error("unsupported line configuration: {0}")]
    UnsupportedLine(String),

    /// I/O error from the underlying device.
    #[error("io error: {0}")]
    Io(String),
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Errors raised by a packet framer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FramerError {
    /// Packet exceeds the framer's maximum payload size.
    #[error("packet too large: {size} bytes exceeds maximum {max_size}")]
    PacketTooLarge {
        /// Actual packet size.
        size: usize,
        /// Maximum allowed size.
        max_size: usize,
    },

    /// The framer has no established link to write on.
    #[error("framer is not connected")]
    NotConnected,

    /// The sink rejected the encoded octets.
    #[error("sink error: {0}")]
    Sink(String),
}

/// Errors raised by the RPC layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RpcError {
    /// A packet could not be turned into an application message.
    #[error("deserialize failed: {0}")]
    Deserialize(String),

    /// A message could not be dispatched.
    #[error("dispatch failed: {0}")]
    Dispatch(String),
}

/// Errors in session layer operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// An operation that needs a transport ran before `setup`.
    #[error("session has no transport bound")]
    NotSetUp,

    /// The processing task is already running.
    #[error("session task already running")]
    AlreadyRunning,

    /// The transport stopped accepting octets.
    #[error("write timed out after {attempts} attempts: {written} written, {remaining} remaining")]
    WriteTimedOut {
        /// Octets accepted before giving up.
        written: usize,
        /// Octets still pending.
        remaining: usize,
        /// Write attempts made.
        attempts: u32,
    },

    /// Transport failure surfaced through the session.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Framer failure surfaced through the session.
    #[error("framer error: {0}")]
    Framer(#[from] FramerError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_timed_out_display() {
        let err = SessionError::WriteTimedOut {
            written: 40,
            remaining: 60,
            attempts: 12,
        };
        assert_eq!(
            err.to_string(),
            "write timed out after 12 attempts: 40 written, 60 remaining"
        );
    }

    #[test]
    fn test_cortex_error_from_session() {
        let err: CortexError = SessionError::NotSetUp.into();
        assert!(matches!(err, CortexError::Session(SessionError::NotSetUp)));
    }

    #[test]
    fn test_session_error_from_transport() {
        let err: SessionError = TransportError::Closed.into();
        assert_eq!(err.to_string(), "transport error: transport closed");
    }

    #[test]
    fn test_transport_error_from_io() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe gone");
        let err: TransportError = io.into();
        assert_eq!(err, TransportError::Io("pipe gone".to_string()));
    }

    #[test]
    fn test_framer_error_display() {
        let err = FramerError::PacketTooLarge {
            size: 300,
            max_size: 256,
        };
        assert_eq!(
            err.to_string(),
            "packet too large: 300 bytes exceeds maximum 256"
        );
    }
}
