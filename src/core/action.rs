//! # Actions
//!
//! Everything that can happen in a chat session becomes an `Action`.
//! Server says someone typed? That's `Action::UserTyping`.
//! User presses Enter? That's `Action::SendMessage`.
//!
//! The `update()` function applies an action to the state and returns an
//! `Effect` describing the I/O the caller must perform. No side effects
//! here.
//!
//! ```text
//! State + Action  →  update()  →  State' + Effect
//! ```

use crate::core::state::{ChatMessage, MessageKind, SessionState};
use crate::transport::{ChatPayload, InboundEvent, OutboundEvent, TypingPayload};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    // Inbound (transport → session)
    Connected,
    Disconnected,
    BroadcastReceived { text: String, user: String },
    MessageReceived { text: String, user: String },
    UserTyping { user: String },
    /// A typing-decay timer fired.
    TypingExpired,

    // Outbound (composer → session)
    SendMessage { text: String, user: String },
    NotifyTyping { user: String },
}

impl From<InboundEvent> for Action {
    fn from(event: InboundEvent) -> Self {
        match event {
            InboundEvent::Connect => Action::Connected,
            InboundEvent::Disconnect => Action::Disconnected,
            InboundEvent::Message(p) => Action::BroadcastReceived {
                text: p.text,
                user: p.user,
            },
            InboundEvent::ReceiveMessage(p) => Action::MessageReceived {
                text: p.text,
                user: p.user,
            },
            InboundEvent::UserTyping(p) => Action::UserTyping { user: p.user },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    None,
    /// Send this event over the transport.
    Emit(OutboundEvent),
    /// Start a one-shot timer that dispatches `Action::TypingExpired`.
    ScheduleTypingDecay,
}

pub fn update(state: &mut SessionState, action: Action) -> Effect {
    match action {
        Action::Connected => {
            state.connected = true;
            Effect::None
        }
        Action::Disconnected => {
            state.connected = false;
            Effect::None
        }
        Action::BroadcastReceived { text, user } => {
            state
                .messages
                .append(ChatMessage::new(text, user, MessageKind::System));
            Effect::None
        }
        Action::MessageReceived { text, user } => {
            state
                .messages
                .append(ChatMessage::new(text, user, MessageKind::Message));
            Effect::None
        }
        Action::UserTyping { user } => {
            state.typing_user = user;
            Effect::ScheduleTypingDecay
        }
        // Unconditional: a stale timer clears a newer typer too.
        Action::TypingExpired => {
            state.typing_user.clear();
            Effect::None
        }
        Action::SendMessage { text, user } => {
            if text.trim().is_empty() {
                return Effect::None;
            }
            state.claim_local_user(&user);
            // Not appended locally; the server echo is what shows up.
            Effect::Emit(OutboundEvent::SendMessage(ChatPayload { text, user }))
        }
        Action::NotifyTyping { user } => {
            state.claim_local_user(&user);
            Effect::Emit(OutboundEvent::Typing(TypingPayload { user }))
        }
    }
}
