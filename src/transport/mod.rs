//! # Transport
//!
//! The real-time channel between this client and the chat server.
//!
//! The session only sees the [`Transport`] trait: a named-event
//! publish/subscribe surface with fire-and-forget emits. The concrete
//! implementation is [`SocketClient`], a thin Socket.IO-over-websocket
//! client.
//!
//! ```text
//!   SessionController ──on/off──▶ ┌──────────────┐ ◀── ws frames ── server
//!                     ──emit────▶ │ SocketClient │ ─── ws frames ─▶
//!                     ◀─handler── └──────────────┘
//! ```
//!
//! ## One connection per process
//!
//! [`shared`] hands out the single process-wide client. The first call
//! opens the connection; every later call returns the same handle, so a
//! session that is torn down and started again re-attaches its listeners
//! to the existing connection instead of dialing a second one.

pub mod codec;
pub mod protocol;
pub mod socket;

use std::sync::{Arc, OnceLock};

use log::warn;

pub use protocol::{ChatPayload, EventName, InboundEvent, OutboundEvent, TypingPayload};
pub use socket::{SocketClient, TransportError};

/// Callback invoked by the transport for each delivered inbound event.
pub type Handler = Box<dyn Fn(InboundEvent) + Send + Sync>;

pub trait Transport: Send + Sync {
    /// Short identifier for logs.
    fn name(&self) -> &str;

    /// Register `handler` for `event`, replacing any previous handler for
    /// that name.
    fn on(&self, event: EventName, handler: Handler);

    /// Remove the handler registered for `event`, if any.
    fn off(&self, event: EventName);

    /// Send an event to the server. Never blocks and never reports failure;
    /// events emitted while disconnected are dropped.
    fn emit(&self, event: OutboundEvent);

    /// Live connectivity as seen by the transport.
    fn is_connected(&self) -> bool;
}

static SHARED: OnceLock<Arc<SocketClient>> = OnceLock::new();

/// The process-wide connection, created on first use.
///
/// Must be called from within a tokio runtime (the first call spawns the
/// connection task). Later calls with a different endpoint get the
/// existing connection.
pub fn shared(endpoint: &str, path: &str) -> Arc<SocketClient> {
    let client = SHARED.get_or_init(|| Arc::new(SocketClient::connect(endpoint, path)));
    if client.endpoint() != endpoint {
        warn!(
            "Transport already connected to {}; ignoring endpoint {}",
            client.endpoint(),
            endpoint
        );
    }
    Arc::clone(client)
}
