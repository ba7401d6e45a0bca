/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 19/10/26
******************************************************************************/

//! # CortexLink
//!
//! Serial session stack linking a robot controller to its companion computer.
//!
//! CortexLink owns a serial line, layers a packet framer and an RPC
//! dispatcher on top of it, and keeps track of whether the companion is
//! alive. Heartbeats refresh the link; silence longer than the heartbeat
//! timeout resets it.
//!
//! ## Features
//!
//! - **Paced I/O**: Retrying writes over transports that accept partial output
//! - **Liveness**: Heartbeat expiry with wrap-safe millisecond ticks
//! - **Pluggable protocols**: Bring your own `Framer` and `RpcDispatcher`
//! - **Async support**: The processing loop runs as a Tokio task
//! - **Lock-free state**: Readers get consistent snapshots without blocking the loop
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use cortexlink::prelude::*;
//!
//! let mut session = SessionManager::new(SessionConfig::new(), MyFramer::new(), MyRpc::new());
//! session.setup(serial_port).await?;
//! session.init().await?;
//! session.start()?;
//!
//! if session.is_connected() {
//!     println!("companion at {}", session.peer_address());
//! }
//! ```
//!
//! ## Crate Organization
//!
//! - [`core`]: Fundamental types and error definitions
//! - [`transport`]: Serial transport layer
//! - [`session`]: Session state machine, contracts and lifecycle

pub mod core {
    //! Fundamental types and error definitions.
    pub use cortexlink_core::*;
}

pub mod transport {
    //! Serial transport layer.
    pub use cortexlink_transport::*;
}

pub mod session {
    //! Session state machine, contracts and lifecycle.
    pub use cortexlink_session::*;
}

/// Prelude module for convenient imports.
pub mod prelude {
    // Core types
    pub use cortexlink_core::{
        CortexError, FramerError, LinkState, PeerAddress, Result, RpcError, SessionError, Ticks,
        TransportError,
    };

    // Transport
    pub use cortexlink_transport::{LineConfig, MemoryPeer, MemoryTransport, Transport};

    // Session
    pub use cortexlink_session::{
        Clock, FrameSink, Framer, ManualClock, ResetReason, RpcContext, RpcDispatcher,
        SessionConfig, SessionConfigBuilder, SessionManager, SessionSnapshot, SessionStatus,
        StatsSnapshot, TokioClock,
    };
}
