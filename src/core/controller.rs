//! # Session Controller
//!
//! Bridges the transport and the observable [`SessionState`].
//!
//! ```text
//!  transport handler ──Action──▶ channel ──process_pending()──▶ update() ──▶ Effect
//!                                   ▲                                         │
//!                                   └──── TypingExpired (2s timer) ◀──────────┤
//!                                                     transport.emit() ◀──────┘
//! ```
//!
//! Transport callbacks never touch state. They only enqueue actions; the
//! owner of the controller drains the queue on its own thread, so every
//! transition happens one at a time in arrival order.
//!
//! ## Typing decay
//!
//! Every `userTyping` notice starts its own 2-second timer. Timers are never
//! cancelled, and each one clears `typing_user` when it fires regardless of
//! who is typing by then. A notice from Dee 500ms after one from Carl is
//! therefore wiped when Carl's timer fires, 1.5s into Dee's window.

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Duration;

use log::{debug, info, warn};

use crate::core::action::{Action, Effect, update};
use crate::core::state::SessionState;
use crate::transport::{EventName, Transport};

/// How long a typing notice stays visible.
pub const TYPING_DECAY: Duration = Duration::from_millis(2000);

pub struct SessionController {
    transport: Arc<dyn Transport>,
    state: SessionState,
    tx: Sender<Action>,
    rx: Receiver<Action>,
    attached: bool,
}

impl SessionController {
    /// A detached controller with empty state.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            transport,
            state: SessionState::new(),
            tx,
            rx,
            attached: false,
        }
    }

    /// Begin a session: fresh state, listeners attached.
    pub fn start(transport: Arc<dyn Transport>) -> Self {
        let mut controller = Self::new(transport);
        controller.attach();
        controller
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Register one handler per inbound event name.
    pub fn attach(&mut self) {
        if self.attached {
            return;
        }
        for name in EventName::INBOUND {
            let tx = self.tx.clone();
            self.transport.on(
                name,
                Box::new(move |event| {
                    if tx.send(Action::from(event)).is_err() {
                        warn!("Session gone, dropping inbound '{}'", name.as_str());
                    }
                }),
            );
        }
        self.attached = true;
        info!("Session attached to {} transport", self.transport.name());
    }

    /// Remove all five handlers. Pending actions stay queued.
    pub fn detach(&mut self) {
        if !self.attached {
            return;
        }
        for name in EventName::INBOUND {
            self.transport.off(name);
        }
        self.attached = false;
        info!("Session detached from {} transport", self.transport.name());
    }

    /// Outbound: emit a chat line. Blank text is ignored.
    pub fn send_message(&mut self, text: &str, user: &str) {
        self.dispatch(Action::SendMessage {
            text: text.to_string(),
            user: user.to_string(),
        });
    }

    /// Outbound: tell the room we are typing. Emitted even for an empty name.
    pub fn notify_typing(&mut self, user: &str) {
        self.dispatch(Action::NotifyTyping {
            user: user.to_string(),
        });
    }

    /// Apply every queued action in arrival order. Returns how many ran.
    pub fn process_pending(&mut self) -> usize {
        let mut count = 0;
        while let Ok(action) = self.rx.try_recv() {
            self.dispatch(action);
            count += 1;
        }
        count
    }

    fn dispatch(&mut self, action: Action) {
        debug!("Session action: {:?}", action);
        match update(&mut self.state, action) {
            Effect::None => {}
            Effect::Emit(event) => self.transport.emit(event),
            Effect::ScheduleTypingDecay => self.schedule_typing_decay(),
        }
    }

    fn schedule_typing_decay(&self) {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(TYPING_DECAY).await;
            if tx.send(Action::TypingExpired).is_err() {
                debug!("Typing decay fired after session ended");
            }
        });
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        self.detach();
    }
}
