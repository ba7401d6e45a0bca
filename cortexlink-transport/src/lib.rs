/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 19/10/26
******************************************************************************/

//! # CortexLink Transport
//!
//! Serial transport layer for the CortexLink session stack.
//!
//! This crate provides:
//! - **Transport trait**: Non-blocking read/write primitives over a serial line
//! - **Line configuration**: Baud rate and character framing (115200 8N1 by default)
//! - **Memory transport**: Channel-backed line pair for tests and demos

pub mod line;
pub mod memory;
pub mod traits;

pub use line::{DataBits, LineConfig, Parity, StopBits};
pub use memory::{MemoryPeer, MemoryTransport};
pub use traits::Transport;
