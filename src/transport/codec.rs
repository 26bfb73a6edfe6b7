//! # Frame Codec
//!
//! Text framing for Socket.IO (protocol v5) carried over Engine.IO (v4)
//! websocket frames. Every websocket text frame is one Engine.IO packet;
//! Engine.IO `message` packets wrap one Socket.IO packet.
//!
//! ```text
//! 0{"sid":"..","pingInterval":25000,..}   engine open
//! 2 / 3                                   engine ping / pong
//! 40{"sid":".."}                          socket CONNECT (namespace "/")
//! 42/chat,7["sendMessage",{..}]           socket EVENT (namespace, ack id, args)
//! ```
//!
//! Binary packets (`5`, `6`) are rejected with [`CodecError::Unsupported`];
//! this client never negotiates attachments.

use serde::Deserialize;
use serde_json::Value;
use std::fmt;

use super::protocol::OutboundEvent;

pub const DEFAULT_NAMESPACE: &str = "/";

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug, PartialEq, Eq)]
pub enum CodecError {
    /// Zero-length frame.
    Empty,
    /// Leading type digit is not a known packet type.
    UnknownPacketType(char),
    /// Structure or JSON body could not be parsed.
    Malformed(String),
    /// Valid packet this client does not implement.
    Unsupported(&'static str),
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::Empty => write!(f, "empty frame"),
            CodecError::UnknownPacketType(c) => write!(f, "unknown packet type '{c}'"),
            CodecError::Malformed(msg) => write!(f, "malformed packet: {msg}"),
            CodecError::Unsupported(what) => write!(f, "unsupported packet: {what}"),
        }
    }
}

impl std::error::Error for CodecError {}

// ============================================================================
// Engine.IO
// ============================================================================

/// Body of the Engine.IO `open` packet.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Handshake {
    pub sid: String,
    #[serde(default)]
    pub upgrades: Vec<String>,
    #[serde(default)]
    pub ping_interval: u64,
    #[serde(default)]
    pub ping_timeout: u64,
    #[serde(default)]
    pub max_payload: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EnginePacket {
    Open(Handshake),
    Close,
    Ping(String),
    Pong(String),
    Message(SocketPacket),
    Upgrade,
    Noop,
}

impl EnginePacket {
    pub fn decode(frame: &str) -> Result<Self, CodecError> {
        let mut chars = frame.chars();
        let kind = chars.next().ok_or(CodecError::Empty)?;
        let body = chars.as_str();

        match kind {
            '0' => serde_json::from_str(body)
                .map(EnginePacket::Open)
                .map_err(|e| CodecError::Malformed(format!("handshake: {e}"))),
            '1' => Ok(EnginePacket::Close),
            '2' => Ok(EnginePacket::Ping(body.to_string())),
            '3' => Ok(EnginePacket::Pong(body.to_string())),
            '4' => SocketPacket::decode(body).map(EnginePacket::Message),
            '5' => Ok(EnginePacket::Upgrade),
            '6' => Ok(EnginePacket::Noop),
            other => Err(CodecError::UnknownPacketType(other)),
        }
    }

    /// Encode a client-originated packet. `Open` is server-only and encodes
    /// to its bare type digit.
    pub fn encode(&self) -> String {
        match self {
            EnginePacket::Open(_) => "0".to_string(),
            EnginePacket::Close => "1".to_string(),
            EnginePacket::Ping(data) => format!("2{data}"),
            EnginePacket::Pong(data) => format!("3{data}"),
            EnginePacket::Message(packet) => format!("4{}", packet.encode()),
            EnginePacket::Upgrade => "5".to_string(),
            EnginePacket::Noop => "6".to_string(),
        }
    }
}

// ============================================================================
// Socket.IO
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum SocketPacket {
    Connect {
        namespace: String,
        payload: Option<Value>,
    },
    Disconnect {
        namespace: String,
    },
    Event {
        namespace: String,
        ack: Option<u64>,
        name: String,
        args: Vec<Value>,
    },
    Ack {
        namespace: String,
        ack: u64,
        args: Vec<Value>,
    },
    ConnectError {
        namespace: String,
        message: String,
    },
}

impl SocketPacket {
    /// CONNECT request for `namespace`, no auth payload.
    pub fn connect(namespace: &str) -> Self {
        SocketPacket::Connect {
            namespace: namespace.to_string(),
            payload: None,
        }
    }

    pub fn event(namespace: &str, event: &OutboundEvent) -> Self {
        SocketPacket::Event {
            namespace: namespace.to_string(),
            ack: None,
            name: event.name().as_str().to_string(),
            args: event.args(),
        }
    }

    pub fn namespace(&self) -> &str {
        match self {
            SocketPacket::Connect { namespace, .. }
            | SocketPacket::Disconnect { namespace }
            | SocketPacket::Event { namespace, .. }
            | SocketPacket::Ack { namespace, .. }
            | SocketPacket::ConnectError { namespace, .. } => namespace,
        }
    }

    pub fn decode(body: &str) -> Result<Self, CodecError> {
        let mut chars = body.chars();
        let kind = chars.next().ok_or(CodecError::Empty)?;
        if matches!(kind, '5' | '6') {
            return Err(CodecError::Unsupported("binary attachments"));
        }
        if !('0'..='4').contains(&kind) {
            return Err(CodecError::UnknownPacketType(kind));
        }

        let (namespace, rest) = split_namespace(chars.as_str());
        let (ack, data) = split_ack(rest)?;
        let payload = if data.is_empty() {
            None
        } else {
            Some(
                serde_json::from_str::<Value>(data)
                    .map_err(|e| CodecError::Malformed(format!("payload: {e}")))?,
            )
        };

        match kind {
            '0' => Ok(SocketPacket::Connect { namespace, payload }),
            '1' => Ok(SocketPacket::Disconnect { namespace }),
            '2' => {
                let mut items = match payload {
                    Some(Value::Array(items)) if !items.is_empty() => items,
                    _ => return Err(CodecError::Malformed("event without arguments".into())),
                };
                let name = match items.remove(0) {
                    Value::String(name) => name,
                    _ => return Err(CodecError::Malformed("event name is not a string".into())),
                };
                Ok(SocketPacket::Event {
                    namespace,
                    ack,
                    name,
                    args: items,
                })
            }
            '3' => {
                let ack = ack.ok_or_else(|| CodecError::Malformed("ack without id".into()))?;
                let args = match payload {
                    Some(Value::Array(items)) => items,
                    None => Vec::new(),
                    _ => return Err(CodecError::Malformed("ack payload is not an array".into())),
                };
                Ok(SocketPacket::Ack {
                    namespace,
                    ack,
                    args,
                })
            }
            _ => {
                let message = match payload {
                    Some(Value::Object(map)) => map
                        .get("message")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string(),
                    Some(Value::String(s)) => s,
                    _ => String::new(),
                };
                Ok(SocketPacket::ConnectError { namespace, message })
            }
        }
    }

    pub fn encode(&self) -> String {
        match self {
            SocketPacket::Connect { namespace, payload } => {
                let body = payload.as_ref().map(Value::to_string).unwrap_or_default();
                format!("0{}{body}", namespace_prefix(namespace))
            }
            SocketPacket::Disconnect { namespace } => format!("1{}", namespace_prefix(namespace)),
            SocketPacket::Event {
                namespace,
                ack,
                name,
                args,
            } => {
                let mut items = Vec::with_capacity(args.len() + 1);
                items.push(Value::String(name.clone()));
                items.extend(args.iter().cloned());
                format!(
                    "2{}{}{}",
                    namespace_prefix(namespace),
                    ack.map(|id| id.to_string()).unwrap_or_default(),
                    Value::Array(items)
                )
            }
            SocketPacket::Ack {
                namespace,
                ack,
                args,
            } => format!(
                "3{}{ack}{}",
                namespace_prefix(namespace),
                Value::Array(args.clone())
            ),
            SocketPacket::ConnectError { namespace, message } => format!(
                "4{}{}",
                namespace_prefix(namespace),
                serde_json::json!({ "message": message })
            ),
        }
    }
}

/// The default namespace is implicit on the wire; others are `/name,`.
fn namespace_prefix(namespace: &str) -> String {
    if namespace == DEFAULT_NAMESPACE || namespace.is_empty() {
        String::new()
    } else {
        format!("{namespace},")
    }
}

fn split_namespace(rest: &str) -> (String, &str) {
    if !rest.starts_with('/') {
        return (DEFAULT_NAMESPACE.to_string(), rest);
    }
    match rest.find(',') {
        Some(idx) => (rest[..idx].to_string(), &rest[idx + 1..]),
        None => (rest.to_string(), ""),
    }
}

fn split_ack(rest: &str) -> Result<(Option<u64>, &str), CodecError> {
    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return Ok((None, rest));
    }
    let id = rest[..digits]
        .parse::<u64>()
        .map_err(|e| CodecError::Malformed(format!("ack id: {e}")))?;
    Ok((Some(id), &rest[digits..]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::protocol::{ChatPayload, TypingPayload};
    use serde_json::json;

    #[test]
    fn decode_open_handshake() {
        let frame = r#"0{"sid":"abc","upgrades":[],"pingInterval":25000,"pingTimeout":20000,"maxPayload":1000000}"#;
        match EnginePacket::decode(frame).unwrap() {
            EnginePacket::Open(handshake) => {
                assert_eq!(handshake.sid, "abc");
                assert_eq!(handshake.ping_interval, 25000);
                assert_eq!(handshake.ping_timeout, 20000);
                assert_eq!(handshake.max_payload, 1_000_000);
            }
            other => panic!("Expected Open, got {other:?}"),
        }
    }

    #[test]
    fn decode_ping_keeps_probe_data() {
        assert_eq!(EnginePacket::decode("2").unwrap(), EnginePacket::Ping(String::new()));
        assert_eq!(
            EnginePacket::decode("2probe").unwrap(),
            EnginePacket::Ping("probe".to_string())
        );
        assert_eq!(EnginePacket::Pong("probe".into()).encode(), "3probe");
    }

    #[test]
    fn decode_connect_ack_with_sid() {
        let packet = EnginePacket::decode(r#"40{"sid":"xyz"}"#).unwrap();
        assert_eq!(
            packet,
            EnginePacket::Message(SocketPacket::Connect {
                namespace: "/".into(),
                payload: Some(json!({"sid": "xyz"})),
            })
        );
    }

    #[test]
    fn decode_event_default_namespace() {
        let packet =
            EnginePacket::decode(r#"42["receiveMessage",{"text":"hi","user":"Bob"}]"#).unwrap();
        assert_eq!(
            packet,
            EnginePacket::Message(SocketPacket::Event {
                namespace: "/".into(),
                ack: None,
                name: "receiveMessage".into(),
                args: vec![json!({"text": "hi", "user": "Bob"})],
            })
        );
    }

    #[test]
    fn decode_event_with_namespace_and_ack() {
        let packet = SocketPacket::decode(r#"2/chat,12["userTyping",{"user":"Dee"}]"#).unwrap();
        assert_eq!(
            packet,
            SocketPacket::Event {
                namespace: "/chat".into(),
                ack: Some(12),
                name: "userTyping".into(),
                args: vec![json!({"user": "Dee"})],
            }
        );
        assert_eq!(packet.namespace(), "/chat");
    }

    #[test]
    fn decode_connect_error_message() {
        let packet = SocketPacket::decode(r#"4{"message":"Not authorized"}"#).unwrap();
        assert_eq!(
            packet,
            SocketPacket::ConnectError {
                namespace: "/".into(),
                message: "Not authorized".into(),
            }
        );
    }

    #[test]
    fn decode_rejects_bad_frames() {
        assert_eq!(EnginePacket::decode(""), Err(CodecError::Empty));
        assert_eq!(EnginePacket::decode("9"), Err(CodecError::UnknownPacketType('9')));
        assert_eq!(
            EnginePacket::decode(r#"451-["upload",{"_placeholder":true,"num":0}]"#),
            Err(CodecError::Unsupported("binary attachments"))
        );
        assert!(matches!(
            EnginePacket::decode("42[not json"),
            Err(CodecError::Malformed(_))
        ));
        assert!(matches!(
            EnginePacket::decode("42[]"),
            Err(CodecError::Malformed(_))
        ));
        assert!(matches!(
            EnginePacket::decode("42[7]"),
            Err(CodecError::Malformed(_))
        ));
    }

    #[test]
    fn encode_connect_request() {
        let frame = EnginePacket::Message(SocketPacket::connect("/")).encode();
        assert_eq!(frame, "40");

        let frame = EnginePacket::Message(SocketPacket::connect("/chat")).encode();
        assert_eq!(frame, "40/chat,");
    }

    #[test]
    fn encode_outbound_events() {
        let send = OutboundEvent::SendMessage(ChatPayload::new("hello", "Bob"));
        let frame = EnginePacket::Message(SocketPacket::event("/", &send)).encode();
        assert_eq!(frame, r#"42["sendMessage",{"text":"hello","user":"Bob"}]"#);

        let typing = OutboundEvent::Typing(TypingPayload::new("Bob"));
        let frame = EnginePacket::Message(SocketPacket::event("/chat", &typing)).encode();
        assert_eq!(frame, r#"42/chat,["typing",{"user":"Bob"}]"#);
    }

    #[test]
    fn encoded_event_decodes_to_same_packet() {
        let packet = SocketPacket::Event {
            namespace: "/room".into(),
            ack: Some(3),
            name: "typing".into(),
            args: vec![json!({"user": "Ann"})],
        };
        assert_eq!(SocketPacket::decode(&packet.encode()).unwrap(), packet);
    }
}
