use crate::core::state::SessionState;
use crate::tui::TuiState;
use crate::tui::component::Component;
use crate::tui::components::{COMPOSER_HEIGHT, MessageList, TitleBar, TypingBanner};

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout};

/// Draw one frame:
///
/// ```text
/// ┌ title bar ─────────────────────────┐  1 row
/// │ message list                       │  rest
/// │ typing banner                      │  1 row
/// └ composer ──────────────────────────┘  3 rows
/// ```
pub fn draw_ui(frame: &mut Frame, session: &SessionState, endpoint: &str, tui: &mut TuiState) {
    use Constraint::{Length, Min};
    let layout = Layout::vertical([Length(1), Min(0), Length(1), Length(COMPOSER_HEIGHT)]);
    let [title_area, main_area, typing_area, composer_area] = layout.areas(frame.area());

    MessageList::new(&mut tui.message_list, session).render(frame, main_area);

    // After the list so the unseen flag reflects this frame
    TitleBar::new(session.connected, endpoint, tui.message_list.has_unseen_content)
        .render(frame, title_area);

    TypingBanner::new(session.typing_banner()).render(frame, typing_area);

    tui.composer.render(frame, composer_area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::action::{Action, update};
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn screen(session: &SessionState, tui: &mut TuiState) -> Vec<String> {
        let backend = TestBackend::new(60, 16);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal
            .draw(|f| draw_ui(f, session, "http://localhost:5000", tui))
            .unwrap();
        let buffer = terminal.backend().buffer();
        (0..buffer.area.height)
            .map(|y| {
                (0..buffer.area.width)
                    .map(|x| buffer[(x, y)].symbol())
                    .collect::<String>()
            })
            .collect()
    }

    #[test]
    fn test_draw_ui_empty_session() {
        let session = SessionState::new();
        let mut tui = TuiState::new();
        let rows = screen(&session, &mut tui);

        assert!(rows[0].contains("Real-Time Chat"));
        assert!(rows[0].contains("Disconnected"));
        assert!(rows.iter().any(|r| r.contains("[ Send ]")));
    }

    #[test]
    fn test_draw_ui_connected_with_messages_and_typer() {
        let mut session = SessionState::new();
        update(&mut session, Action::Connected);
        update(
            &mut session,
            Action::MessageReceived {
                text: "hi".into(),
                user: "Bob".into(),
            },
        );
        update(&mut session, Action::UserTyping { user: "Carl".into() });

        let mut tui = TuiState::new();
        let rows = screen(&session, &mut tui);

        assert!(rows[0].contains("● Connected"));
        assert!(rows.iter().any(|r| r.contains("Bob")));
        // Banner sits right above the composer
        assert!(rows[12].contains("Carl is typing..."));
    }
}
