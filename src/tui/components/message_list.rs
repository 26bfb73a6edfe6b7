//! # MessageList Component
//!
//! Scrollable view of the session's message log.
//!
//! ## Responsibilities
//!
//! - Display every log entry in arrival order
//! - Manage scrolling (stick-to-bottom while new lines arrive)
//! - Cache per-entry heights
//!
//! ## Architecture
//!
//! `MessageList` is a transient component (created each frame) that wraps
//! `&'a mut MessageListState` (persistent state) and `SessionState` (props).
//!
//! The log only ever grows, so cached heights stay valid until the width
//! changes. Each frame measures just the entries appended since the last one.
//!
//! Row positions are `u32` in log coordinates. A long session can outgrow
//! the `u16` canvas of a `ScrollView`, so each frame only lays out the
//! entries around the viewport into a window canvas and scrolls inside it.

use ratatui::Frame;
use ratatui::layout::{Position, Rect, Size};
use ratatui::widgets::{Scrollbar, ScrollbarOrientation, ScrollbarState};
use tui_scrollview::{ScrollView, ScrollViewState, ScrollbarVisibility};

use crate::core::state::SessionState;
use crate::tui::component::{Component, EventHandler};
use crate::tui::components::message::Message;
use crate::tui::event::TuiEvent;

/// Layout and scroll state for the message list.
/// Must be persisted in the parent TuiState.
pub struct MessageListState {
    /// Top row of the viewport, in log coordinates
    pub offset: u32,
    /// View state of the window canvas, rebuilt each frame
    pub scroll_state: ScrollViewState,
    /// Cached layout measurements
    pub layout: LayoutCache,
    /// When true, auto-scroll to bottom on new content
    pub stick_to_bottom: bool,
    /// Last known viewport height (for scroll clamping between frames)
    pub viewport_height: u16,
    /// Content exists below the visible window
    pub has_unseen_content: bool,
}

impl Default for MessageListState {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageListState {
    pub fn new() -> Self {
        Self {
            offset: 0,
            scroll_state: ScrollViewState::default(),
            layout: LayoutCache::new(),
            stick_to_bottom: true, // Start attached to bottom
            viewport_height: 0,
            has_unseen_content: false,
        }
    }

    fn max_offset(&self) -> u32 {
        self.layout
            .total_height()
            .saturating_sub(u32::from(self.viewport_height))
    }

    /// Clamp scroll offset so it never exceeds the content bounds.
    pub fn clamp_scroll(&mut self) {
        self.offset = self.offset.min(self.max_offset());
    }

    /// Clamp scroll and re-engage auto-scroll if the user has reached the bottom.
    pub fn repin_if_at_bottom(&mut self) {
        let max_y = self.max_offset();
        if self.offset >= max_y {
            self.stick_to_bottom = true;
            self.offset = max_y;
        }
    }

    fn page(&self) -> u32 {
        u32::from(self.viewport_height.max(1))
    }
}

/// Scrollable log view component.
/// Created fresh each frame with references to state and data.
pub struct MessageList<'a> {
    pub state: &'a mut MessageListState,
    pub session: &'a SessionState,
}

impl<'a> MessageList<'a> {
    pub fn new(state: &'a mut MessageListState, session: &'a SessionState) -> Self {
        Self { state, session }
    }
}

impl Component for MessageList<'_> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let content_width = area.width.saturating_sub(1); // last column is the scrollbar
        let messages = &self.session.messages;

        // 1. Measure entries appended since last frame
        let layout = &mut self.state.layout;
        let reusable = layout.reusable_count(messages.len(), content_width);
        layout.heights.truncate(reusable);
        for message in messages.iter().skip(layout.heights.len()) {
            layout
                .heights
                .push(Message::calculate_height(message, content_width));
        }
        layout.rebuild_prefix_heights();
        layout.update_metadata(messages.len(), content_width);

        let total_height = self.state.layout.total_height();

        // 2. Pin or clamp the offset against the new content
        self.state.viewport_height = area.height;
        if self.state.stick_to_bottom {
            self.state.offset = self.state.max_offset();
        } else {
            self.state.clamp_scroll();
        }
        let offset = self.state.offset;

        // 3. Lay out the entries around the viewport into a window canvas
        let layout = &self.state.layout;
        let visible_range = layout.visible_range(offset, area.height);
        let window_top = layout.row_of(visible_range.start);
        let window_bottom = layout.row_of(visible_range.end);
        let window_height =
            u16::try_from(window_bottom.saturating_sub(window_top)).unwrap_or(u16::MAX);

        let mut scroll_view = ScrollView::new(Size::new(content_width, window_height))
            .vertical_scrollbar_visibility(ScrollbarVisibility::Never)
            .horizontal_scrollbar_visibility(ScrollbarVisibility::Never);

        for i in visible_range {
            let Some(message) = messages.get(i) else {
                break;
            };
            let Ok(y) = u16::try_from(layout.row_of(i).saturating_sub(window_top)) else {
                break;
            };
            let height = layout.heights[i].min(window_height.saturating_sub(y));
            let rect = Rect::new(0, y, content_width, height);
            scroll_view.render_widget(Message::new(message, self.session.is_own(message)), rect);
        }

        let in_window = u16::try_from(offset.saturating_sub(window_top)).unwrap_or(u16::MAX);
        self.state.scroll_state.set_offset(Position { x: 0, y: in_window });

        let list_area = Rect {
            width: content_width,
            ..area
        };
        frame.render_stateful_widget(scroll_view, list_area, &mut self.state.scroll_state);

        // 4. Scrollbar over the whole log
        let max_offset = self.state.max_offset();
        let mut scrollbar_state = ScrollbarState::new(max_offset as usize)
            .position(offset as usize)
            .viewport_content_length(usize::from(area.height));
        frame.render_stateful_widget(
            Scrollbar::new(ScrollbarOrientation::VerticalRight),
            area,
            &mut scrollbar_state,
        );

        // 5. Unseen content indicator
        self.state.has_unseen_content =
            total_height > u32::from(area.height) && offset < max_offset;
    }
}

/// EventHandler lives on `MessageListState` since `MessageList` is rebuilt
/// every frame and can't hold scroll position.
impl EventHandler for MessageListState {
    type Event = ();

    fn handle_event(&mut self, event: &TuiEvent) -> Option<Self::Event> {
        match event {
            TuiEvent::ScrollUp => {
                self.offset = self.offset.saturating_sub(1);
                self.stick_to_bottom = false;
            }
            TuiEvent::ScrollDown => {
                self.offset = self.offset.saturating_add(1);
                self.repin_if_at_bottom();
            }
            TuiEvent::ScrollPageUp => {
                self.offset = self.offset.saturating_sub(self.page());
                self.stick_to_bottom = false;
            }
            TuiEvent::ScrollPageDown => {
                self.offset = self.offset.saturating_add(self.page());
                self.repin_if_at_bottom();
            }
            TuiEvent::ScrollToBottom => {
                self.stick_to_bottom = true;
                self.offset = self.max_offset();
            }
            _ => {}
        }
        None
    }
}

/// Cached layout measurements
pub struct LayoutCache {
    pub heights: Vec<u16>,
    /// Bottom row (exclusive) of each entry, in log coordinates
    pub prefix_heights: Vec<u32>,
    message_count: usize,
    content_width: u16,
}

impl Default for LayoutCache {
    fn default() -> Self {
        Self::new()
    }
}

impl LayoutCache {
    pub fn new() -> Self {
        Self {
            heights: Vec::new(),
            prefix_heights: Vec::new(),
            message_count: 0,
            content_width: 0,
        }
    }

    /// How many cached heights are still valid for `message_count` entries
    /// at `content_width`.
    pub fn reusable_count(&self, message_count: usize, content_width: u16) -> usize {
        if self.content_width != content_width {
            return 0;
        }
        // A shorter log means a new session: nothing carries over
        if message_count < self.message_count {
            return 0;
        }
        self.heights.len().min(message_count)
    }

    pub fn update_metadata(&mut self, message_count: usize, content_width: u16) {
        self.message_count = message_count;
        self.content_width = content_width;
    }

    pub fn rebuild_prefix_heights(&mut self) {
        self.prefix_heights = self
            .heights
            .iter()
            .scan(0u32, |acc, &h| {
                *acc = acc.saturating_add(u32::from(h));
                Some(*acc)
            })
            .collect();
    }

    pub fn total_height(&self) -> u32 {
        self.prefix_heights.last().copied().unwrap_or(0)
    }

    /// Top row of entry `index`; one past the end gives the total height.
    pub fn row_of(&self, index: usize) -> u32 {
        match index {
            0 => 0,
            i => self
                .prefix_heights
                .get(i - 1)
                .copied()
                .unwrap_or_else(|| self.total_height()),
        }
    }

    pub fn visible_range(&self, scroll_offset: u32, viewport_height: u16) -> std::ops::Range<usize> {
        let viewport_height = u32::from(viewport_height);
        let buffer = viewport_height / 2;
        let buffered_start = scroll_offset.saturating_sub(buffer);
        let buffered_end = scroll_offset
            .saturating_add(viewport_height)
            .saturating_add(buffer);

        let start = self
            .prefix_heights
            .partition_point(|&end| end <= buffered_start);
        let end = self
            .prefix_heights
            .partition_point(|&end| end < buffered_end)
            .saturating_add(1)
            .min(self.prefix_heights.len());

        start..end
    }
}
