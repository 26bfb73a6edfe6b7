//! # Core Session Logic
//!
//! This module contains the chat session's business logic.
//! It knows nothing about terminals or sockets.
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │         CORE            │
//!                    │  (this module)          │
//!                    │                         │
//!                    │  • State (session data) │
//!                    │  • Action (events)      │
//!                    │  • update() (reducer)   │
//!                    │  • SessionController    │
//!                    └───────────┬─────────────┘
//!                                │
//!                  ┌─────────────┴─────────────┐
//!                  ▼                           ▼
//!           ┌────────────┐              ┌────────────┐
//!           │    TUI     │              │ Transport  │
//!           │  Adapter   │              │ (socket.io │
//!           │ (ratatui)  │              │  framing)  │
//!           └────────────┘              └────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`state`]: `SessionState`, the observable session data
//! - [`action`]: The `Action` enum and the `update()` reducer
//! - [`controller`]: Wires a transport to the state
//! - [`config`]: Layered settings (file, env, CLI)

pub mod action;
pub mod config;
pub mod controller;
pub mod state;

pub use controller::SessionController;
pub use state::{ChatMessage, MessageKind, SessionState};
