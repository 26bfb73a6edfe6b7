//! Single-line text field used by the Composer.
//!
//! `TextField` owns the value, a byte-offset cursor and a horizontal
//! window (in display columns) that follows the cursor when the value is
//! wider than the box.

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::tui::event::TuiEvent;

/// What an editing event did to the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edit {
    /// The value changed.
    Changed,
    /// Only the cursor moved.
    Moved,
}

#[derive(Debug, Default)]
pub struct TextField {
    value: String,
    /// Cursor position as byte offset in value (0..=value.len())
    cursor: usize,
    /// First visible display column
    scroll: usize,
}

impl TextField {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn is_blank(&self) -> bool {
        self.value.trim().is_empty()
    }

    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
        self.scroll = 0;
    }

    /// Apply an editing event. `None` means the event doesn't concern
    /// the field or hit a boundary.
    pub fn handle(&mut self, event: &TuiEvent) -> Option<Edit> {
        match event {
            TuiEvent::InputChar(c) => {
                self.insert_str(&flatten(&c.to_string()));
                Some(Edit::Changed)
            }
            TuiEvent::Paste(text) => {
                let text = flatten(text);
                if text.is_empty() {
                    return None;
                }
                self.insert_str(&text);
                Some(Edit::Changed)
            }
            TuiEvent::Backspace => {
                if self.cursor == 0 {
                    return None;
                }
                let prev = prev_char_boundary(&self.value, self.cursor);
                self.value.drain(prev..self.cursor);
                self.cursor = prev;
                Some(Edit::Changed)
            }
            TuiEvent::Delete => {
                if self.cursor >= self.value.len() {
                    return None;
                }
                let next = next_char_boundary(&self.value, self.cursor);
                self.value.drain(self.cursor..next);
                Some(Edit::Changed)
            }
            TuiEvent::CursorLeft => {
                (self.cursor > 0).then(|| {
                    self.cursor = prev_char_boundary(&self.value, self.cursor);
                    Edit::Moved
                })
            }
            TuiEvent::CursorRight => (self.cursor < self.value.len()).then(|| {
                self.cursor = next_char_boundary(&self.value, self.cursor);
                Edit::Moved
            }),
            TuiEvent::CursorHome => (self.cursor != 0).then(|| {
                self.cursor = 0;
                Edit::Moved
            }),
            TuiEvent::CursorEnd => (self.cursor != self.value.len()).then(|| {
                self.cursor = self.value.len();
                Edit::Moved
            }),
            _ => None,
        }
    }

    fn insert_str(&mut self, text: &str) {
        self.value.insert_str(self.cursor, text);
        self.cursor += text.len();
    }

    /// The slice of the value that fits in `width` columns, plus the
    /// cursor's column within it. Slides the window to keep the cursor
    /// visible.
    pub fn viewport(&mut self, width: u16) -> (String, u16) {
        let width = width as usize;
        if width == 0 {
            return (String::new(), 0);
        }

        let cursor_col = self.value[..self.cursor].width();
        if cursor_col < self.scroll {
            self.scroll = cursor_col;
        } else if cursor_col >= self.scroll + width {
            // Leave one cell for the cursor itself
            self.scroll = cursor_col + 1 - width;
        }

        let mut visible = String::new();
        let mut col = 0;
        for c in self.value.chars() {
            let w = c.width().unwrap_or(0);
            if col >= self.scroll && col + w <= self.scroll + width {
                visible.push(c);
            }
            col += w;
            if col >= self.scroll + width {
                break;
            }
        }

        (visible, (cursor_col - self.scroll) as u16)
    }
}

/// Fields are single-line: pasted newlines become spaces.
fn flatten(text: &str) -> String {
    text.replace("\r\n", " ").replace(['\r', '\n'], " ")
}

/// Find the byte offset of the previous character boundary before `pos` in `text`.
fn prev_char_boundary(text: &str, pos: usize) -> usize {
    text[..pos]
        .char_indices()
        .next_back()
        .map(|(i, _)| i)
        .unwrap_or(0)
}

/// Find the byte offset of the next character boundary after `pos` in `text`.
fn next_char_boundary(text: &str, pos: usize) -> usize {
    text[pos..]
        .char_indices()
        .nth(1)
        .map(|(i, _)| pos + i)
        .unwrap_or(text.len())
}
