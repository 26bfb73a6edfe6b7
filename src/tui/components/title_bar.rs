//! # TitleBar Component
//!
//! Top status bar: application name, connection indicator, server endpoint
//! and a "↓ New" marker when messages arrived below the scroll position.
//!
//! TitleBar is purely presentational. It receives all data as props and has
//! no internal state:
//!
//! ```rust,ignore
//! let mut title_bar = TitleBar::new(state.connected, client.endpoint(), unseen);
//! title_bar.render(frame, area);
//! ```

use crate::tui::component::Component;
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

pub const APP_TITLE: &str = "Real-Time Chat";

pub struct TitleBar<'a> {
    /// Live connectivity from the session state
    pub connected: bool,
    /// Server the transport was configured with
    pub endpoint: &'a str,
    /// Whether there's content below the current scroll position
    pub has_unseen_content: bool,
}

impl<'a> TitleBar<'a> {
    pub fn new(connected: bool, endpoint: &'a str, has_unseen_content: bool) -> Self {
        Self {
            connected,
            endpoint,
            has_unseen_content,
        }
    }

    fn status_span(&self) -> Span<'static> {
        if self.connected {
            Span::styled("● Connected", Style::default().fg(Color::Green))
        } else {
            Span::styled(
                "○ Disconnected",
                Style::default().fg(Color::Red).add_modifier(Modifier::DIM),
            )
        }
    }
}

impl Component for TitleBar<'_> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let mut spans = vec![
            Span::styled(APP_TITLE, Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" | "),
            self.status_span(),
            Span::raw(" | "),
            Span::styled(self.endpoint, Style::default().fg(Color::DarkGray)),
        ];
        if self.has_unseen_content {
            spans.push(Span::raw(" | ↓ New"));
        }

        frame.render_widget(Line::from(spans), area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn render_to_text(title_bar: &mut TitleBar) -> String {
        let backend = TestBackend::new(80, 1);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal
            .draw(|f| {
                title_bar.render(f, f.area());
            })
            .unwrap();

        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect::<String>()
    }

    #[test]
    fn test_title_bar_connected() {
        let mut title_bar = TitleBar::new(true, "http://localhost:5000", false);
        let text = render_to_text(&mut title_bar);

        assert!(text.contains("Real-Time Chat"));
        assert!(text.contains("● Connected"));
        assert!(text.contains("http://localhost:5000"));
        assert!(!text.contains("↓ New"));
    }

    #[test]
    fn test_title_bar_disconnected() {
        let mut title_bar = TitleBar::new(false, "http://localhost:5000", false);
        let text = render_to_text(&mut title_bar);

        assert!(text.contains("○ Disconnected"));
        assert!(!text.contains("● Connected"));
    }

    #[test]
    fn test_title_bar_with_unseen_content() {
        let mut title_bar = TitleBar::new(true, "ws://chat", true);
        let text = render_to_text(&mut title_bar);
        assert!(text.contains("↓ New"));
    }
}
