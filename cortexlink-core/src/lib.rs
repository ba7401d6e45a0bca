/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 19/10/26
******************************************************************************/

//! # CortexLink Core
//!
//! Core types and error definitions for the CortexLink serial session stack.
//!
//! This crate provides the fundamental building blocks used across all CortexLink crates:
//! - **Error types**: Unified error handling with `thiserror`
//! - **Core types**: `Ticks`, `PeerAddress`, `LinkState`

pub mod error;
pub mod types;

pub use error::{CortexError, FramerError, Result, RpcError, SessionError, TransportError};
pub use types::{LinkState, PeerAddress, Ticks};
