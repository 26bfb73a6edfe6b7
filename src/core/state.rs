//! # Session State
//!
//! Everything the chat UI observes, in one place. No transport types, no
//! terminal types.
//!
//! ```text
//! SessionState
//! ├── connected: bool          // live transport status
//! ├── typing_user: String      // most recent remote typer, or ""
//! ├── local_user: String       // first non-empty name we used; then frozen
//! └── messages: MessageLog     // append-only, arrival order
//! ```
//!
//! State changes only happen through `update(state, action)` in action.rs.

use serde::Serialize;

/// Whether a line came from the server's broadcast channel or from a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    /// Ordinary chat line (`receiveMessage`).
    Message,
    /// Server announcement (`message`).
    System,
}

/// One line in the log. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub text: String,
    pub user: String,
    #[serde(rename = "type")]
    pub kind: MessageKind,
}

impl ChatMessage {
    pub fn new(text: impl Into<String>, user: impl Into<String>, kind: MessageKind) -> Self {
        Self {
            text: text.into(),
            user: user.into(),
            kind,
        }
    }

    pub fn is_system(&self) -> bool {
        self.kind == MessageKind::System
    }
}

/// Insertion-ordered, append-only message log.
///
/// Entries cannot be removed, reordered or edited.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageLog {
    items: Vec<ChatMessage>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn append(&mut self, message: ChatMessage) {
        self.items.push(message);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ChatMessage> {
        self.items.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ChatMessage> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[ChatMessage] {
        &self.items
    }
}

impl<'a> IntoIterator for &'a MessageLog {
    type Item = &'a ChatMessage;
    type IntoIter = std::slice::Iter<'a, ChatMessage>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[derive(Debug, Default)]
pub struct SessionState {
    pub connected: bool,
    pub typing_user: String,
    local_user: String,
    pub messages: MessageLog,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// The name this client has identified itself with, or "" if unresolved.
    pub fn local_user(&self) -> &str {
        &self.local_user
    }

    /// Adopt `user` as the local identity if none is set yet.
    ///
    /// Empty names never resolve the identity. The name is stored exactly
    /// as given (no trimming). Returns true if the identity was set by this
    /// call.
    pub(crate) fn claim_local_user(&mut self, user: &str) -> bool {
        if !self.local_user.is_empty() || user.is_empty() {
            return false;
        }
        self.local_user = user.to_string();
        true
    }

    /// Banner text for the typing indicator. Hidden when nobody is typing
    /// or when the typer is ourselves.
    pub fn typing_banner(&self) -> Option<String> {
        if self.typing_user.is_empty() || self.typing_user == self.local_user {
            return None;
        }
        Some(format!("{} is typing...", self.typing_user))
    }

    /// Whether a chat line was written under our own name.
    pub fn is_own(&self, message: &ChatMessage) -> bool {
        !message.is_system() && !self.local_user.is_empty() && message.user == self.local_user
    }
}
