//! # TUI Adapter
//!
//! The ratatui-specific layer. Handles terminal I/O, renders the session,
//! and routes keyboard events to the Composer and message list.
//!
//! This is the only module that knows about ratatui and crossterm.
//!
//! ## Redraw Strategy
//!
//! The loop polls input for up to 100ms, drains every pending event, then
//! drains the session's action queue. It only redraws when one of those
//! produced something, so an idle chat costs nothing beyond the poll.
//!
//! A `SteadyBlock` cursor style is used instead of a blinking cursor because
//! ratatui's `set_cursor_position` resets the terminal's blink timer on every
//! `draw()` call.

mod component;
mod components;
mod event;
mod ui;

use log::{debug, info};
use std::io::stdout;
use std::sync::Arc;
use std::time::Duration;

use crossterm::cursor::{Hide, SetCursorStyle, Show};
use crossterm::event::{
    DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
    KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::execute;

use crate::core::config::ResolvedConfig;
use crate::core::controller::SessionController;
use crate::transport::{self, Transport};
use crate::tui::component::EventHandler;
use crate::tui::components::{Composer, ComposerEvent, MessageListState};
use crate::tui::event::{TuiEvent, poll_event_immediate, poll_event_timeout};

const POLL_TIMEOUT: Duration = Duration::from_millis(100);

/// TUI-specific presentation state (not part of the session)
pub struct TuiState {
    pub message_list: MessageListState,
    pub composer: Composer,
}

impl Default for TuiState {
    fn default() -> Self {
        Self::new()
    }
}

impl TuiState {
    pub fn new() -> Self {
        Self {
            message_list: MessageListState::new(),
            composer: Composer::new(),
        }
    }
}

/// What the loop should do after an input event.
#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// Route one input event. Scroll keys go to the list, everything else to
/// the Composer, whose events become session actions.
fn handle_tui_event(event: &TuiEvent, tui: &mut TuiState, session: &mut SessionController) -> Flow {
    match event {
        TuiEvent::ForceQuit | TuiEvent::Quit => Flow::Quit,
        // Resize just needs a redraw
        TuiEvent::Resize => Flow::Continue,
        TuiEvent::ScrollUp
        | TuiEvent::ScrollDown
        | TuiEvent::ScrollPageUp
        | TuiEvent::ScrollPageDown
        | TuiEvent::ScrollToBottom => {
            tui.message_list.handle_event(event);
            Flow::Continue
        }
        _ => {
            match tui.composer.handle_event(event) {
                Some(ComposerEvent::Typing(user)) => session.notify_typing(&user),
                Some(ComposerEvent::Send { text, user }) => {
                    session.send_message(&text, &user);
                    // Own message should be visible once echoed
                    tui.message_list.stick_to_bottom = true;
                }
                None => {}
            }
            Flow::Continue
        }
    }
}

struct TerminalModeGuard;

impl TerminalModeGuard {
    fn new() -> std::io::Result<Self> {
        // Kitty keyboard protocol lets Shift+Enter be told apart from Enter;
        // terminals without it ignore the request
        execute!(
            stdout(),
            EnableMouseCapture,
            EnableBracketedPaste,
            Show,
            SetCursorStyle::SteadyBlock,
            PushKeyboardEnhancementFlags(
                KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                    | KeyboardEnhancementFlags::REPORT_EVENT_TYPES
            )
        )?;
        info!("Terminal modes enabled (mouse, bracketed paste, steady block cursor, keyboard enhancement)");
        Ok(Self)
    }
}

impl Drop for TerminalModeGuard {
    fn drop(&mut self) {
        let _ = execute!(
            stdout(),
            PopKeyboardEnhancementFlags,
            DisableMouseCapture,
            DisableBracketedPaste,
            Hide
        );
    }
}

/// Run the chat UI until the user quits. Must be called inside a tokio
/// runtime: the transport and typing-decay timers spawn onto it.
pub fn run(config: ResolvedConfig) -> std::io::Result<()> {
    let client = transport::shared(&config.server_url, &config.socket_path);
    let endpoint = client.endpoint().to_string();
    info!("Using {} transport at {}", client.name(), endpoint);

    let mut session = SessionController::start(client as Arc<dyn Transport>);
    let mut tui = TuiState::new();

    let mut terminal = ratatui::init();
    let terminal_mode_guard = TerminalModeGuard::new();

    let mut needs_redraw = true; // Force first frame

    let result = loop {
        if needs_redraw {
            if let Err(e) =
                terminal.draw(|f| ui::draw_ui(f, session.state(), &endpoint, &mut tui))
            {
                break Err(e);
            }
            needs_redraw = false;
        }

        // Process first event + drain ALL pending events before next draw
        let first_event = poll_event_timeout(POLL_TIMEOUT);
        if first_event.is_some() {
            needs_redraw = true;
        }
        let mut flow = Flow::Continue;
        for event in first_event
            .into_iter()
            .chain(std::iter::from_fn(poll_event_immediate))
        {
            flow = handle_tui_event(&event, &mut tui, &mut session);
            if flow == Flow::Quit {
                break;
            }
        }
        if flow == Flow::Quit {
            break Ok(());
        }

        // Inbound transport events and expired typing timers
        let applied = session.process_pending();
        if applied > 0 {
            debug!("Applied {} session actions", applied);
            needs_redraw = true;
        }
    };

    // Listeners come off before the terminal is handed back
    drop(session);
    drop(terminal_mode_guard);
    ratatui::restore();
    info!("Chatter shutting down");
    result
}
