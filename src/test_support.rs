//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::transport::{EventName, Handler, InboundEvent, OutboundEvent, Transport};

/// In-memory transport: records emits and lets tests play the server.
pub struct FakeTransport {
    handlers: Mutex<HashMap<EventName, Handler>>,
    emitted: Mutex<Vec<OutboundEvent>>,
    connected: AtomicBool,
}

impl Default for FakeTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeTransport {
    pub fn new() -> Self {
        Self {
            handlers: Mutex::new(HashMap::new()),
            emitted: Mutex::new(Vec::new()),
            connected: AtomicBool::new(true),
        }
    }

    /// Deliver `event` to its registered handler, if any.
    pub fn fire(&self, event: InboundEvent) {
        let handlers = self.handlers.lock().unwrap();
        if let Some(handler) = handlers.get(&event.name()) {
            handler(event);
        }
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    pub fn emitted(&self) -> Vec<OutboundEvent> {
        self.emitted.lock().unwrap().clone()
    }

    pub fn has_listener(&self, name: EventName) -> bool {
        self.handlers.lock().unwrap().contains_key(&name)
    }

    pub fn listener_names(&self) -> Vec<EventName> {
        self.handlers.lock().unwrap().keys().copied().collect()
    }
}

impl Transport for FakeTransport {
    fn name(&self) -> &str {
        "fake"
    }

    fn on(&self, event: EventName, handler: Handler) {
        self.handlers.lock().unwrap().insert(event, handler);
    }

    fn off(&self, event: EventName) {
        self.handlers.lock().unwrap().remove(&event);
    }

    fn emit(&self, event: OutboundEvent) {
        if self.connected.load(Ordering::SeqCst) {
            self.emitted.lock().unwrap().push(event);
        }
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}
