//! # Composer Component
//!
//! Collects a display name and message text, and turns them into the
//! session's two outbound actions.
//!
//! ## Responsibilities
//!
//! - Edit the name and message fields (see [`TextField`])
//! - Emit a typing notice on every message change once a name is set
//! - Submit on Enter when both fields are non-blank, then clear the message
//!
//! ## State Management
//!
//! Both fields are internal state and survive for as long as the Composer
//! does. The name is never cleared. The parent forwards emitted
//! [`ComposerEvent`]s to the `SessionController`.

mod field;

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, BorderType, Padding, Paragraph};

use crate::tui::component::{Component, EventHandler};
use crate::tui::event::TuiEvent;

pub use field::{Edit, TextField};

/// Total rows the composer occupies (borders + one line of text).
pub const COMPOSER_HEIGHT: u16 = 3;
/// Name box width including borders.
const NAME_WIDTH: u16 = 20;
const SEND_LABEL: &str = "[ Send ]";

/// High-level events emitted by the Composer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComposerEvent {
    /// Message text changed while a name is set
    Typing(String),
    /// User submitted a message
    Send { text: String, user: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Name,
    Message,
}

impl Focus {
    fn toggle(self) -> Self {
        match self {
            Focus::Name => Focus::Message,
            Focus::Message => Focus::Name,
        }
    }
}

pub struct Composer {
    name: TextField,
    message: TextField,
    pub focus: Focus,
}

impl Default for Composer {
    fn default() -> Self {
        Self::new()
    }
}

impl Composer {
    pub fn new() -> Self {
        Self {
            name: TextField::new(),
            message: TextField::new(),
            focus: Focus::Name,
        }
    }

    pub fn display_name(&self) -> &str {
        self.name.value()
    }

    pub fn message_text(&self) -> &str {
        self.message.value()
    }

    /// Sending is only possible with both a name and a message.
    pub fn can_send(&self) -> bool {
        !self.name.is_blank() && !self.message.is_blank()
    }

    /// Replace the message text as if the user had edited it.
    pub fn on_text_change(&mut self, value: &str) -> Option<ComposerEvent> {
        self.message.clear();
        self.message.handle(&TuiEvent::Paste(value.to_string()));
        self.text_changed()
    }

    /// Replace the display name. No side effect.
    pub fn on_name_change(&mut self, value: &str) {
        self.name.clear();
        self.name.handle(&TuiEvent::Paste(value.to_string()));
    }

    /// Hand the message off for sending. Leaves both fields alone when
    /// either is blank.
    pub fn submit(&mut self) -> Option<ComposerEvent> {
        if !self.can_send() {
            return None;
        }
        let event = ComposerEvent::Send {
            text: self.message.value().to_string(),
            user: self.name.value().to_string(),
        };
        self.message.clear();
        Some(event)
    }

    fn text_changed(&self) -> Option<ComposerEvent> {
        // Untrimmed name goes out; blank names stay silent
        (!self.name.is_blank()).then(|| ComposerEvent::Typing(self.name.value().to_string()))
    }

    fn focused_field(&mut self) -> &mut TextField {
        match self.focus {
            Focus::Name => &mut self.name,
            Focus::Message => &mut self.message,
        }
    }

    fn field_block(title: &str, focused: bool) -> Block<'_> {
        let border_style = if focused {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().add_modifier(Modifier::DIM)
        };
        Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(border_style)
            .title(title)
    }

    fn render_field(
        frame: &mut Frame,
        area: Rect,
        field: &mut TextField,
        title: &str,
        focused: bool,
    ) {
        let block = Self::field_block(title, focused);
        let inner = block.inner(area);
        let (visible, cursor_x) = field.viewport(inner.width);

        frame.render_widget(Paragraph::new(visible).block(block), area);

        if focused && inner.width > 0 && inner.height > 0 {
            frame.set_cursor_position((inner.x + cursor_x.min(inner.width - 1), inner.y));
        }
    }
}

impl Component for Composer {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        use Constraint::{Length, Min};
        let send_width = SEND_LABEL.len() as u16 + 2;
        let [name_area, message_area, send_area] =
            Layout::horizontal([Length(NAME_WIDTH), Min(10), Length(send_width)]).areas(area);

        let name_focused = self.focus == Focus::Name;
        Self::render_field(frame, name_area, &mut self.name, "Name", name_focused);
        Self::render_field(frame, message_area, &mut self.message, "Message", !name_focused);

        let send_style = if self.can_send() {
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
        } else {
            Style::default().add_modifier(Modifier::DIM)
        };
        let send = Paragraph::new(SEND_LABEL)
            .style(send_style)
            .block(Block::new().padding(Padding::new(1, 1, 1, 0)));
        frame.render_widget(send, send_area);
    }
}

impl EventHandler for Composer {
    type Event = ComposerEvent;

    fn handle_event(&mut self, event: &TuiEvent) -> Option<Self::Event> {
        match event {
            TuiEvent::FocusNext | TuiEvent::FocusPrev => {
                self.focus = self.focus.toggle();
                None
            }
            TuiEvent::Submit => match self.focus {
                Focus::Name => {
                    self.focus = Focus::Message;
                    None
                }
                Focus::Message => self.submit(),
            },
            _ => {
                let edit = self.focused_field().handle(event)?;
                if edit == Edit::Changed && self.focus == Focus::Message {
                    self.text_changed()
                } else {
                    None
                }
            }
        }
    }
}
