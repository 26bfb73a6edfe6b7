//! # TUI Components
//!
//! All UI components for the terminal interface.
//!
//! ## Component Architecture
//!
//! ### Stateless Components (Props-Based Rendering)
//!
//! Display components that receive all data as parameters:
//! - `TitleBar`: top bar with connection status and endpoint
//! - `Message`: a single log entry
//! - `TypingBanner`: the transient "X is typing..." line
//!
//! ### Stateful Components (Event-Driven)
//!
//! Components that manage local state and emit events:
//! - `Composer`: name and message fields, emits typing/send events
//! - `MessageList`: scrollable log view with layout caching
//!
//! Components receive external data as props, never by reaching into
//! global state:
//!
//! ```rust,ignore
//! TitleBar::new(session.connected, endpoint, unseen).render(frame, area);
//! ```
//!
//! ## Module Structure
//!
//! ```text
//! components/
//! ├── mod.rs            (this file)
//! ├── title_bar.rs      (Top status bar)
//! ├── message.rs        (Single entry renderer)
//! ├── message_list.rs   (Scrollable log container)
//! ├── typing_banner.rs  (Typing indicator)
//! └── composer/         (Name + message input)
//! ```

pub mod composer;
pub mod message;
pub mod message_list;
mod title_bar;
mod typing_banner;

pub use composer::{COMPOSER_HEIGHT, Composer, ComposerEvent};
pub use message_list::{MessageList, MessageListState};
pub use title_bar::TitleBar;
pub use typing_banner::TypingBanner;
