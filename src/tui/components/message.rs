use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Padding, Paragraph, Widget, Wrap};

use crate::core::state::ChatMessage;
use crate::tui::component::Component;

/// Horizontal padding (per side) between the border and text content.
const CONTENT_PAD_H: u16 = 1;
/// Total horizontal space consumed by borders (1 left + 1 right) and padding.
const HORIZONTAL_OVERHEAD: u16 = 2 + CONTENT_PAD_H * 2;
/// Total vertical space consumed by borders (1 top + 1 bottom).
const VERTICAL_OVERHEAD: u16 = 2;
/// System lines are unbordered, indented by the same padding.
const SYSTEM_HORIZONTAL_OVERHEAD: u16 = CONTENT_PAD_H * 2;

/// Title shown for a chat line that arrived without a name.
const ANONYMOUS: &str = "anonymous";

/// A stateless component that renders a single log entry.
///
/// `Message` is a **transient component**: it's created fresh each frame
/// with the data it needs to render.
///
/// # Styling
///
/// - **System** (yellow, italic): server broadcasts, one unbordered line
///   block with no author.
/// - **Own** (green): chat lines written under the local user's name.
/// - **Other** (blue): everyone else's chat lines, titled with the author.
///
/// # Height Calculation
///
/// [`calculate_height`](Self::calculate_height) predicts rendered height
/// using `textwrap` with options that match Ratatui's `Paragraph` wrapping,
/// so the parent `MessageList` can lay out the scroll canvas without
/// rendering.
#[derive(Clone, Copy)]
pub struct Message<'a> {
    pub message: &'a ChatMessage,
    /// Whether the line was written under the local user's name
    pub is_own: bool,
}

impl<'a> Message<'a> {
    pub fn new(message: &'a ChatMessage, is_own: bool) -> Self {
        Self { message, is_own }
    }

    /// Calculate the height required for this message given a width.
    pub fn calculate_height(message: &ChatMessage, width: u16) -> u16 {
        let (h_overhead, v_overhead) = if message.is_system() {
            (SYSTEM_HORIZONTAL_OVERHEAD, 0)
        } else {
            (HORIZONTAL_OVERHEAD, VERTICAL_OVERHEAD)
        };

        let content_width = width.saturating_sub(h_overhead);
        if content_width == 0 {
            // Degenerate case: terminal too narrow for borders + padding.
            return 1;
        }

        let content = message.text.as_str();
        if content.is_empty() {
            return v_overhead.max(1);
        }

        let options = textwrap::Options::new(content_width as usize)
            .break_words(true)
            .word_separator(textwrap::WordSeparator::AsciiSpace);

        let lines = textwrap::wrap(content, options);
        u16::try_from(lines.len())
            .unwrap_or(u16::MAX)
            .max(1)
            .saturating_add(v_overhead)
    }

    fn style(&self) -> Style {
        if self.message.is_system() {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::ITALIC)
        } else if self.is_own {
            Style::default().fg(Color::Green)
        } else {
            Style::default().fg(Color::Blue)
        }
    }

    fn title(&self) -> String {
        let user = if self.message.user.is_empty() {
            ANONYMOUS
        } else {
            self.message.user.as_str()
        };
        if self.is_own {
            format!("{user} (you)")
        } else {
            user.to_string()
        }
    }
}

impl Widget for Message<'_> {
    fn render(self, area: Rect, buf: &mut ratatui::buffer::Buffer) {
        let style = self.style();
        let content = self.message.text.as_str();

        if self.message.is_system() {
            Paragraph::new(content)
                .block(Block::new().padding(Padding::horizontal(CONTENT_PAD_H)))
                .style(style)
                .wrap(Wrap { trim: false })
                .render(area, buf);
            return;
        }

        let border_style = style.add_modifier(Modifier::DIM);
        let block = Block::bordered()
            .title(self.title())
            .border_type(ratatui::widgets::BorderType::Rounded)
            .border_style(border_style)
            .title_style(style)
            .padding(Padding::horizontal(CONTENT_PAD_H));

        let inner_area = block.inner(area);
        block.render(area, buf);

        Paragraph::new(content)
            .style(style)
            .wrap(Wrap { trim: false })
            .render(inner_area, buf);
    }
}

impl Component for Message<'_> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        frame.render_widget(*self, area);
    }
}
