//! # Socket Client
//!
//! Websocket-backed [`Transport`]. One background task owns the socket:
//!
//! 1. Dial `ws(s)://host/socket.io/?EIO=4&transport=websocket`.
//! 2. On Engine.IO `open`, request the namespace (`40`).
//! 3. On the namespace acknowledgement, mark connected and raise `connect`.
//! 4. Answer every ping with a pong, decode events, hand them to the
//!    registered listener for that name.
//! 5. On close, socket error or a missed ping, mark disconnected, raise
//!    `disconnect` and dial again after a backoff delay.
//!
//! A namespace disconnect sent by the server (`41`) ends the task for good,
//! as does dropping every client handle.
//!
//! Frames are decoded and dispatched in arrival order by this single task,
//! so delivery per event name is FIFO.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use log::{debug, info, warn};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use url::Url;

use super::codec::{DEFAULT_NAMESPACE, EnginePacket, SocketPacket};
use super::protocol::{EventName, InboundEvent, OutboundEvent};
use super::{Handler, Transport};

const ENGINE_IO_QUERY: &str = "EIO=4&transport=websocket";

/// First redial delay after a lost connection.
const RECONNECT_DELAY: Duration = Duration::from_millis(1000);
/// Upper bound for the doubling redial delay.
const RECONNECT_DELAY_MAX: Duration = Duration::from_millis(5000);

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum TransportError {
    /// Endpoint is not an http(s)/ws(s) URL.
    InvalidEndpoint(String),
    /// Websocket handshake failed.
    Connect(String),
    /// Writing a frame failed.
    Send(String),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::InvalidEndpoint(msg) => write!(f, "invalid endpoint: {msg}"),
            TransportError::Connect(msg) => write!(f, "connect failed: {msg}"),
            TransportError::Send(msg) => write!(f, "send failed: {msg}"),
        }
    }
}

impl std::error::Error for TransportError {}

// ============================================================================
// Endpoint
// ============================================================================

/// Where to dial, and which Socket.IO namespace to join.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub url: Url,
    pub namespace: String,
}

/// Derive the websocket URL from a configured server address.
///
/// `http` maps to `ws`, `https` to `wss`. A path on the server address
/// selects the namespace (`http://host/chat` joins `/chat`), matching how
/// Socket.IO clients read their URL. `socket_path` is the Engine.IO mount
/// point on the server, normally `/socket.io/`.
pub fn resolve_endpoint(server_url: &str, socket_path: &str) -> Result<Endpoint, TransportError> {
    let mut url = Url::parse(server_url)
        .map_err(|e| TransportError::InvalidEndpoint(format!("{server_url}: {e}")))?;

    let scheme = match url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => {
            return Err(TransportError::InvalidEndpoint(format!(
                "{server_url}: unsupported scheme '{other}'"
            )));
        }
    };
    url.set_scheme(scheme)
        .map_err(|()| TransportError::InvalidEndpoint(format!("{server_url}: bad scheme")))?;

    let namespace = match url.path().trim_end_matches('/') {
        "" => DEFAULT_NAMESPACE.to_string(),
        path => path.to_string(),
    };

    let mount = match socket_path.trim_matches('/') {
        "" => "/".to_string(),
        trimmed => format!("/{trimmed}/"),
    };
    url.set_path(&mount);
    url.set_query(Some(ENGINE_IO_QUERY));
    url.set_fragment(None);

    Ok(Endpoint { url, namespace })
}

// ============================================================================
// Reconnection
// ============================================================================

/// How one websocket session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ending {
    /// Socket closed, failed or went silent. Dial again.
    Lost,
    /// The server removed us from the namespace. Stay disconnected.
    Kicked,
    /// Every client handle is gone.
    Shutdown,
}

/// Doubling redial delay, reset once a namespace join succeeds.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Backoff {
    next: Duration,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            next: RECONNECT_DELAY,
        }
    }
}

impl Backoff {
    fn next_delay(&mut self) -> Duration {
        let delay = self.next;
        self.next = (self.next * 2).min(RECONNECT_DELAY_MAX);
        delay
    }

    fn reset(&mut self) {
        self.next = RECONNECT_DELAY;
    }
}

// ============================================================================
// Listener registry + connectivity
// ============================================================================

/// State shared between the client handle and its socket task.
struct Shared {
    listeners: Mutex<HashMap<EventName, Handler>>,
    connected: AtomicBool,
}

/// What the socket task must do after a frame was handled.
#[derive(Debug, Default, PartialEq)]
struct FrameOutcome {
    replies: Vec<String>,
    /// Stop reading this socket.
    end: Option<Ending>,
    /// Heartbeat window announced by the engine handshake.
    ping_window: Option<Duration>,
    /// Proof of life: restart the heartbeat deadline.
    alive: bool,
    /// The namespace join was acknowledged.
    joined: bool,
}

impl Shared {
    fn new() -> Self {
        Self {
            listeners: Mutex::new(HashMap::new()),
            connected: AtomicBool::new(false),
        }
    }

    fn dispatch(&self, event: InboundEvent) {
        let listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        match listeners.get(&event.name()) {
            Some(handler) => handler(event),
            None => debug!("No listener for '{}', dropping", event.name().as_str()),
        }
    }

    fn mark_connected(&self) {
        if !self.connected.swap(true, Ordering::SeqCst) {
            info!("Namespace joined, connected");
            self.dispatch(InboundEvent::Connect);
        }
    }

    fn mark_disconnected(&self) {
        if self.connected.swap(false, Ordering::SeqCst) {
            info!("Disconnected");
            self.dispatch(InboundEvent::Disconnect);
        }
    }

    /// Decode one websocket text frame and react to it.
    fn handle_frame(&self, frame: &str, namespace: &str) -> FrameOutcome {
        let mut outcome = FrameOutcome::default();
        let packet = match EnginePacket::decode(frame) {
            Ok(packet) => packet,
            Err(e) => {
                warn!("Skipping undecodable frame ({e}): {frame:.80}");
                return outcome;
            }
        };

        match packet {
            EnginePacket::Open(handshake) => {
                debug!(
                    "Engine open: sid={} ping_interval={}ms ping_timeout={}ms",
                    handshake.sid, handshake.ping_interval, handshake.ping_timeout
                );
                let window = handshake.ping_interval.saturating_add(handshake.ping_timeout);
                if window > 0 {
                    outcome.ping_window = Some(Duration::from_millis(window));
                }
                outcome.alive = true;
                outcome
                    .replies
                    .push(EnginePacket::Message(SocketPacket::connect(namespace)).encode());
            }
            EnginePacket::Ping(data) => {
                outcome.alive = true;
                outcome.replies.push(EnginePacket::Pong(data).encode());
            }
            EnginePacket::Close => {
                info!("Server closed the engine session");
                outcome.end = Some(Ending::Lost);
            }
            EnginePacket::Message(packet) if packet.namespace() != namespace => {
                debug!("Ignoring packet for namespace {}", packet.namespace());
            }
            EnginePacket::Message(SocketPacket::Connect { .. }) => {
                self.mark_connected();
                outcome.joined = true;
            }
            EnginePacket::Message(SocketPacket::Disconnect { .. }) => {
                info!("Server disconnected namespace {namespace}");
                outcome.end = Some(Ending::Kicked);
            }
            EnginePacket::Message(SocketPacket::Event { name, args, .. }) => {
                match InboundEvent::from_wire(&name, &args) {
                    Some(event) => self.dispatch(event),
                    None => debug!("Ignoring unsubscribed event '{name}'"),
                }
            }
            EnginePacket::Message(SocketPacket::ConnectError { message, .. }) => {
                warn!("Namespace {namespace} refused connection: {message}");
            }
            EnginePacket::Message(SocketPacket::Ack { ack, .. }) => {
                debug!("Ignoring ack {ack}");
            }
            EnginePacket::Pong(_) | EnginePacket::Upgrade | EnginePacket::Noop => {}
        }
        outcome
    }
}

// ============================================================================
// Client
// ============================================================================

/// Handle to the background socket task.
pub struct SocketClient {
    endpoint: String,
    shared: Arc<Shared>,
    outbound: mpsc::UnboundedSender<OutboundEvent>,
}

impl SocketClient {
    /// Spawn the connection task and return immediately.
    ///
    /// Must be called from within a tokio runtime. Failed dials and lost
    /// connections are logged and retried with a growing delay.
    pub fn connect(server_url: &str, socket_path: &str) -> Self {
        let shared = Arc::new(Shared::new());
        let (outbound, outbound_rx) = mpsc::unbounded_channel();

        let task_shared = Arc::clone(&shared);
        let server = server_url.to_string();
        let socket_path = socket_path.to_string();
        tokio::spawn(async move {
            match resolve_endpoint(&server, &socket_path) {
                Ok(endpoint) => maintain(&endpoint, outbound_rx, &task_shared).await,
                Err(e) => warn!("Transport to {server} not started: {e}"),
            }
        });

        Self {
            endpoint: server_url.to_string(),
            shared,
            outbound,
        }
    }

    /// The server address this client was created for.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Transport for SocketClient {
    fn name(&self) -> &str {
        "socket.io"
    }

    fn on(&self, event: EventName, handler: Handler) {
        debug!("Listener attached: {}", event.as_str());
        self.shared
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(event, handler);
    }

    fn off(&self, event: EventName) {
        debug!("Listener detached: {}", event.as_str());
        self.shared
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&event);
    }

    fn emit(&self, event: OutboundEvent) {
        if !self.is_connected() {
            debug!("Not connected, dropping '{}'", event.name().as_str());
            return;
        }
        if self.outbound.send(event).is_err() {
            debug!("Socket task gone, dropping outbound event");
        }
    }

    fn is_connected(&self) -> bool {
        self.shared.connected.load(Ordering::SeqCst)
    }
}

/// Keep a session with the server alive: dial, run, back off, dial again.
async fn maintain(
    endpoint: &Endpoint,
    mut outbound: mpsc::UnboundedReceiver<OutboundEvent>,
    shared: &Shared,
) {
    let mut backoff = Backoff::default();
    loop {
        let ending = match run(endpoint, &mut outbound, shared, &mut backoff).await {
            Ok(ending) => ending,
            Err(e) => {
                warn!("Transport to {} failed: {e}", endpoint.url);
                Ending::Lost
            }
        };
        shared.mark_disconnected();

        match ending {
            Ending::Lost => {}
            Ending::Kicked => {
                info!("Not reconnecting after server-side disconnect");
                return;
            }
            Ending::Shutdown => return,
        }

        let delay = backoff.next_delay();
        info!("Reconnecting in {}ms", delay.as_millis());
        if !idle(delay, &mut outbound).await {
            return;
        }
    }
}

/// Sleep for `delay`, discarding emits meanwhile. False once every client
/// handle is gone.
async fn idle(delay: Duration, outbound: &mut mpsc::UnboundedReceiver<OutboundEvent>) -> bool {
    let deadline = tokio::time::sleep(delay);
    tokio::pin!(deadline);
    loop {
        tokio::select! {
            () = &mut deadline => return true,
            event = outbound.recv() => match event {
                Some(event) => debug!("Not connected, dropping '{}'", event.name().as_str()),
                None => return false,
            },
        }
    }
}

/// One websocket session, from dial to close.
async fn run(
    endpoint: &Endpoint,
    outbound: &mut mpsc::UnboundedReceiver<OutboundEvent>,
    shared: &Shared,
    backoff: &mut Backoff,
) -> Result<Ending, TransportError> {
    info!("Connecting to {} (namespace {})", endpoint.url, endpoint.namespace);

    let (stream, _) = connect_async(endpoint.url.as_str())
        .await
        .map_err(|e| TransportError::Connect(e.to_string()))?;
    let (mut writer, mut reader) = stream.split();
    info!("Websocket open");

    // Armed by the engine handshake, pushed back by every ping
    let mut ping_window: Option<Duration> = None;
    let heartbeat = tokio::time::sleep(Duration::ZERO);
    tokio::pin!(heartbeat);

    let ending = loop {
        tokio::select! {
            frame = reader.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    let outcome = shared.handle_frame(text.as_str(), &endpoint.namespace);
                    if outcome.ping_window.is_some() {
                        ping_window = outcome.ping_window;
                    }
                    if let (true, Some(window)) = (outcome.alive, ping_window) {
                        heartbeat.as_mut().reset(Instant::now() + window);
                    }
                    if outcome.joined {
                        backoff.reset();
                    }
                    for reply in outcome.replies {
                        writer
                            .send(Message::Text(reply.into()))
                            .await
                            .map_err(|e| TransportError::Send(e.to_string()))?;
                    }
                    if let Some(ending) = outcome.end {
                        break ending;
                    }
                }
                Some(Ok(Message::Close(_))) | None => {
                    info!("Websocket closed by server");
                    break Ending::Lost;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!("Websocket receive failed: {e}");
                    break Ending::Lost;
                }
            },
            () = &mut heartbeat, if ping_window.is_some() => {
                warn!("No ping from server in time, dropping connection");
                break Ending::Lost;
            }
            event = outbound.recv() => match event {
                Some(event) => {
                    if !shared.connected.load(Ordering::SeqCst) {
                        debug!("Not connected, dropping '{}'", event.name().as_str());
                        continue;
                    }
                    let frame = EnginePacket::Message(SocketPacket::event(&endpoint.namespace, &event)).encode();
                    debug!("Emitting {frame:.120}");
                    writer
                        .send(Message::Text(frame.into()))
                        .await
                        .map_err(|e| TransportError::Send(e.to_string()))?;
                }
                None => break Ending::Shutdown,
            },
        }
    };

    shared.mark_disconnected();
    let _ = writer.close().await;
    Ok(ending)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::protocol::ChatPayload;
    use std::sync::mpsc as std_mpsc;

    fn recording_shared() -> (Shared, std_mpsc::Receiver<InboundEvent>) {
        let shared = Shared::new();
        let (tx, rx) = std_mpsc::channel();
        for name in EventName::INBOUND {
            let tx = tx.clone();
            shared.listeners.lock().unwrap().insert(
                name,
                Box::new(move |event| {
                    let _ = tx.send(event);
                }),
            );
        }
        (shared, rx)
    }

    #[test]
    fn resolve_http_endpoint() {
        let endpoint = resolve_endpoint("http://localhost:5000", "/socket.io/").unwrap();
        assert_eq!(
            endpoint.url.as_str(),
            "ws://localhost:5000/socket.io/?EIO=4&transport=websocket"
        );
        assert_eq!(endpoint.namespace, "/");
    }

    #[test]
    fn resolve_https_endpoint_with_namespace() {
        let endpoint = resolve_endpoint("https://chat.example.com/lobby/", "socket.io").unwrap();
        assert_eq!(
            endpoint.url.as_str(),
            "wss://chat.example.com/socket.io/?EIO=4&transport=websocket"
        );
        assert_eq!(endpoint.namespace, "/lobby");
    }

    #[test]
    fn resolve_rejects_unknown_scheme() {
        assert!(matches!(
            resolve_endpoint("ftp://example.com", "/socket.io/"),
            Err(TransportError::InvalidEndpoint(_))
        ));
        assert!(matches!(
            resolve_endpoint("not a url", "/socket.io/"),
            Err(TransportError::InvalidEndpoint(_))
        ));
    }

    #[test]
    fn open_triggers_namespace_connect() {
        let (shared, _rx) = recording_shared();
        let outcome = shared.handle_frame(r#"0{"sid":"s1","pingInterval":25000}"#, "/");
        assert_eq!(outcome.replies, vec!["40".to_string()]);
        assert_eq!(outcome.end, None);

        let outcome = shared.handle_frame(r#"0{"sid":"s1"}"#, "/chat");
        assert_eq!(outcome.replies, vec!["40/chat,".to_string()]);
    }

    #[test]
    fn ping_is_answered_with_pong() {
        let (shared, _rx) = recording_shared();
        let outcome = shared.handle_frame("2", "/");
        assert_eq!(outcome.replies, vec!["3".to_string()]);
        assert!(outcome.alive);
    }

    #[test]
    fn open_announces_heartbeat_window() {
        let (shared, _rx) = recording_shared();
        let outcome = shared.handle_frame(
            r#"0{"sid":"s1","pingInterval":25000,"pingTimeout":20000}"#,
            "/",
        );
        assert_eq!(outcome.ping_window, Some(Duration::from_millis(45000)));
        assert!(outcome.alive);

        // No timings, no deadline
        let outcome = shared.handle_frame(r#"0{"sid":"s2"}"#, "/");
        assert_eq!(outcome.ping_window, None);
    }

    #[test]
    fn backoff_doubles_up_to_cap_and_resets() {
        let mut backoff = Backoff::default();
        let delays: Vec<u128> = (0..5).map(|_| backoff.next_delay().as_millis()).collect();
        assert_eq!(delays, vec![1000, 2000, 4000, 5000, 5000]);

        backoff.reset();
        assert_eq!(backoff.next_delay(), RECONNECT_DELAY);
    }

    #[test]
    fn engine_close_is_recoverable() {
        let (shared, _rx) = recording_shared();
        let outcome = shared.handle_frame("1", "/");
        assert_eq!(outcome.end, Some(Ending::Lost));
    }

    #[test]
    fn connect_ack_raises_connect_once() {
        let (shared, rx) = recording_shared();
        let outcome = shared.handle_frame(r#"40{"sid":"abc"}"#, "/");
        assert!(outcome.joined);
        shared.handle_frame(r#"40{"sid":"abc"}"#, "/");
        assert!(shared.connected.load(Ordering::SeqCst));
        assert_eq!(rx.try_iter().collect::<Vec<_>>(), vec![InboundEvent::Connect]);
    }

    #[test]
    fn events_are_dispatched_in_order() {
        let (shared, rx) = recording_shared();
        shared.handle_frame(r#"42["message",{"text":"Bob joined","user":"system"}]"#, "/");
        shared.handle_frame(r#"42["receiveMessage",{"text":"hi","user":"Bob"}]"#, "/");
        shared.handle_frame(r#"42["onlineUsers",3]"#, "/");

        assert_eq!(
            rx.try_iter().collect::<Vec<_>>(),
            vec![
                InboundEvent::Message(ChatPayload::new("Bob joined", "system")),
                InboundEvent::ReceiveMessage(ChatPayload::new("hi", "Bob")),
            ]
        );
    }

    #[test]
    fn other_namespace_is_ignored() {
        let (shared, rx) = recording_shared();
        shared.handle_frame(r#"42/admin,["receiveMessage",{"text":"x","user":"y"}]"#, "/");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn malformed_frame_is_skipped() {
        let (shared, rx) = recording_shared();
        let outcome = shared.handle_frame("42[broken", "/");
        assert_eq!(outcome, FrameOutcome::default());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn server_disconnect_closes_and_raises_disconnect() {
        let (shared, rx) = recording_shared();
        shared.handle_frame("40", "/");
        let outcome = shared.handle_frame("41", "/");
        assert_eq!(outcome.end, Some(Ending::Kicked));

        shared.mark_disconnected();
        shared.mark_disconnected();
        assert_eq!(
            rx.try_iter().collect::<Vec<_>>(),
            vec![InboundEvent::Connect, InboundEvent::Disconnect]
        );
    }

    #[test]
    fn disconnect_without_connect_is_silent() {
        let (shared, rx) = recording_shared();
        shared.mark_disconnected();
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn missing_listener_drops_event() {
        let shared = Shared::new();
        // Nothing registered: must not panic.
        shared.handle_frame(r#"42["userTyping",{"user":"Ann"}]"#, "/");
    }
}
