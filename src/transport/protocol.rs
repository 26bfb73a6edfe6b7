//! # Wire Contract
//!
//! Event names and payload shapes exchanged with the chat server.
//!
//! ```text
//! in   connect          (none)
//! in   disconnect       (none)
//! in   message          {text, user}   → system line
//! in   receiveMessage   {text, user}   → chat line
//! in   userTyping       {user}
//! out  sendMessage      {text, user}
//! out  typing           {user}
//! ```
//!
//! Inbound payloads are NOT validated. A missing or null field becomes an
//! empty string, a non-string scalar keeps its JSON text.

use serde::Serialize;
use serde_json::Value;

/// Every event name that appears on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventName {
    Connect,
    Disconnect,
    Message,
    ReceiveMessage,
    UserTyping,
    SendMessage,
    Typing,
}

impl EventName {
    /// The five events a session subscribes to.
    pub const INBOUND: [EventName; 5] = [
        EventName::Connect,
        EventName::Disconnect,
        EventName::Message,
        EventName::ReceiveMessage,
        EventName::UserTyping,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventName::Connect => "connect",
            EventName::Disconnect => "disconnect",
            EventName::Message => "message",
            EventName::ReceiveMessage => "receiveMessage",
            EventName::UserTyping => "userTyping",
            EventName::SendMessage => "sendMessage",
            EventName::Typing => "typing",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "connect" => Some(EventName::Connect),
            "disconnect" => Some(EventName::Disconnect),
            "message" => Some(EventName::Message),
            "receiveMessage" => Some(EventName::ReceiveMessage),
            "userTyping" => Some(EventName::UserTyping),
            "sendMessage" => Some(EventName::SendMessage),
            "typing" => Some(EventName::Typing),
            _ => None,
        }
    }
}

/// `{text, user}`: carried by `message`, `receiveMessage` and `sendMessage`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChatPayload {
    pub text: String,
    pub user: String,
}

impl ChatPayload {
    pub fn new(text: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            user: user.into(),
        }
    }

    fn from_value(value: Option<&Value>) -> Self {
        Self {
            text: lenient_field(value, "text"),
            user: lenient_field(value, "user"),
        }
    }
}

/// `{user}`: carried by `userTyping` and `typing`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TypingPayload {
    pub user: String,
}

impl TypingPayload {
    pub fn new(user: impl Into<String>) -> Self {
        Self { user: user.into() }
    }

    fn from_value(value: Option<&Value>) -> Self {
        Self {
            user: lenient_field(value, "user"),
        }
    }
}

/// Read `key` out of an (assumed) object without complaining about its shape.
fn lenient_field(value: Option<&Value>, key: &str) -> String {
    match value.and_then(|v| v.get(key)) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// An event delivered by the server (or synthesized by the transport for
/// connectivity changes).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    Connect,
    Disconnect,
    /// Broadcast/system announcement.
    Message(ChatPayload),
    /// Chat line from a user (possibly ourselves, echoed back).
    ReceiveMessage(ChatPayload),
    UserTyping(TypingPayload),
}

impl InboundEvent {
    pub fn name(&self) -> EventName {
        match self {
            InboundEvent::Connect => EventName::Connect,
            InboundEvent::Disconnect => EventName::Disconnect,
            InboundEvent::Message(_) => EventName::Message,
            InboundEvent::ReceiveMessage(_) => EventName::ReceiveMessage,
            InboundEvent::UserTyping(_) => EventName::UserTyping,
        }
    }

    /// Build an inbound event from a decoded Socket.IO EVENT packet.
    ///
    /// Returns `None` for names the session does not subscribe to. The
    /// connectivity names are reserved for the transport itself and are
    /// never accepted from the server as plain events.
    pub fn from_wire(name: &str, args: &[Value]) -> Option<Self> {
        let first = args.first();
        match EventName::parse(name)? {
            EventName::Message => Some(InboundEvent::Message(ChatPayload::from_value(first))),
            EventName::ReceiveMessage => Some(InboundEvent::ReceiveMessage(
                ChatPayload::from_value(first),
            )),
            EventName::UserTyping => Some(InboundEvent::UserTyping(TypingPayload::from_value(
                first,
            ))),
            _ => None,
        }
    }
}

/// An event the client emits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundEvent {
    SendMessage(ChatPayload),
    Typing(TypingPayload),
}

impl OutboundEvent {
    pub fn name(&self) -> EventName {
        match self {
            OutboundEvent::SendMessage(_) => EventName::SendMessage,
            OutboundEvent::Typing(_) => EventName::Typing,
        }
    }

    /// JSON argument list as it goes on the wire: `[payload]`.
    pub fn args(&self) -> Vec<Value> {
        let payload = match self {
            OutboundEvent::SendMessage(p) => serde_json::to_value(p),
            OutboundEvent::Typing(p) => serde_json::to_value(p),
        };
        // Both payloads are plain string structs; serialization cannot fail.
        vec![payload.unwrap_or(Value::Null)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn event_names_match_wire_strings() {
        for name in EventName::INBOUND {
            assert_eq!(EventName::parse(name.as_str()), Some(name));
        }
        assert_eq!(EventName::SendMessage.as_str(), "sendMessage");
        assert_eq!(EventName::Typing.as_str(), "typing");
        assert_eq!(EventName::parse("onlineCount"), None);
    }

    #[test]
    fn receive_message_from_wire() {
        let event = InboundEvent::from_wire(
            "receiveMessage",
            &[json!({"text": "hi", "user": "Bob"})],
        );
        assert_eq!(
            event,
            Some(InboundEvent::ReceiveMessage(ChatPayload::new("hi", "Bob")))
        );
    }

    #[test]
    fn missing_fields_become_blank() {
        let event = InboundEvent::from_wire("message", &[json!({"text": "welcome"})]);
        assert_eq!(
            event,
            Some(InboundEvent::Message(ChatPayload::new("welcome", "")))
        );

        let event = InboundEvent::from_wire("userTyping", &[]);
        assert_eq!(event, Some(InboundEvent::UserTyping(TypingPayload::default())));
    }

    #[test]
    fn non_object_and_non_string_payloads_are_tolerated() {
        let event = InboundEvent::from_wire("message", &[json!("just a string")]);
        assert_eq!(event, Some(InboundEvent::Message(ChatPayload::default())));

        let event = InboundEvent::from_wire(
            "receiveMessage",
            &[json!({"text": 42, "user": null})],
        );
        assert_eq!(
            event,
            Some(InboundEvent::ReceiveMessage(ChatPayload::new("42", "")))
        );
    }

    #[test]
    fn reserved_and_unknown_names_are_ignored() {
        assert_eq!(InboundEvent::from_wire("connect", &[]), None);
        assert_eq!(InboundEvent::from_wire("disconnect", &[]), None);
        assert_eq!(InboundEvent::from_wire("sendMessage", &[]), None);
        assert_eq!(InboundEvent::from_wire("onlineUsers", &[json!(3)]), None);
    }

    #[test]
    fn outbound_args_are_single_payload_object() {
        let event = OutboundEvent::SendMessage(ChatPayload::new("hello", "Ann"));
        assert_eq!(event.name(), EventName::SendMessage);
        assert_eq!(event.args(), vec![json!({"text": "hello", "user": "Ann"})]);

        let event = OutboundEvent::Typing(TypingPayload::new(""));
        assert_eq!(event.args(), vec![json!({"user": ""})]);
    }
}
