use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Span;

use crate::tui::component::Component;

/// One-line "X is typing..." notice. Renders nothing when `text` is `None`.
pub struct TypingBanner {
    pub text: Option<String>,
}

impl TypingBanner {
    pub fn new(text: Option<String>) -> Self {
        Self { text }
    }
}

impl Component for TypingBanner {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let Some(text) = self.text.as_deref() else {
            return;
        };
        let style = Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::ITALIC);
        frame.render_widget(Span::styled(text, style), area);
    }
}
