/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 19/10/26
******************************************************************************/

//! # CortexLink Session
//!
//! Serial session manager for the link between a robot controller and its
//! companion computer.
//!
//! This crate provides:
//! - **State machine**: Connected/disconnected tracking with heartbeat expiry
//! - **Paced I/O**: Bounded, retrying writes over a partial-write transport
//! - **Protocol seams**: [`Framer`] and [`RpcDispatcher`] traits for the layers above
//! - **Lifecycle**: A background processing task that can be started and stopped
//! - **Published state**: Lock-free snapshots of state, peer and sequence id

pub mod clock;
pub mod config;
pub mod framer;
pub mod heartbeat;
pub mod link;
pub mod manager;
pub mod rpc;
pub mod sequence;
pub mod state;
pub mod stats;

pub use clock::{Clock, ManualClock, TokioClock};
pub use config::{SessionConfig, SessionConfigBuilder};
pub use framer::{FrameSink, Framer};
pub use heartbeat::Liveness;
pub use link::{SessionLink, SessionShared};
pub use manager::{SessionManager, SessionStatus};
pub use rpc::{RpcContext, RpcDispatcher};
pub use sequence::SequenceCounter;
pub use state::{ResetReason, SessionSnapshot, SnapshotCell};
pub use stats::{SessionStats, StatsSnapshot};
