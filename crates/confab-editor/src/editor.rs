#![forbid(unsafe_code)]

//! The single-line editor.
//!
//! [`LineEditor`] consumes [`Key`] values from the decoder and mutates an
//! owned UTF-8 buffer, returning an [`Action`] signal for the UI. The editor
//! never interprets the signals itself — `Submit` does not clear the buffer,
//! the host calls [`LineEditor::take_submission`] when it has consumed the
//! line.
//!
//! Invariants, maintained across every operation:
//! - the buffer is valid UTF-8 (it is a `String`)
//! - the cursor is a byte offset on a codepoint boundary in `0..=len`
//!
//! Key policy highlights:
//! - Ctrl-C / Escape on a non-empty line discard it and signal `Interrupt`;
//!   on an empty line Ctrl-C means quit (`Cancel`) while Escape still
//!   signals `Interrupt`
//! - Ctrl-D quits only on an empty line, so a stray EOF chord cannot eat a
//!   half-written message
//! - Ctrl-] arms one-shot jump-to-char; the next character key seeks
//!   forward to its next occurrence

use std::fmt;

use confab_core::event::Key;

use crate::history::History;
use crate::kill_ring::KillRing;
use crate::undo::{EditKind, Snapshot, UndoState};

/// Signal returned by [`LineEditor::apply`]. Everything except `None` is a
/// request to the surrounding UI; the editor attaches no meaning to them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Nothing for the caller (the buffer may still have changed).
    None,
    /// The current line is ready; consume it via `take_submission`.
    Submit,
    /// Quit request.
    Cancel,
    /// Abort the in-flight operation.
    Interrupt,
    /// Repaint the screen.
    Redraw,
    /// Scroll the transcript one page up.
    ScrollUp,
    /// Scroll the transcript one page down.
    ScrollDown,
    /// Move focus to the next pane.
    FocusNext,
    /// Move focus to the previous pane.
    FocusPrev,
    /// Grow the composer by a literal newline.
    Newline,
    /// Open the command palette.
    Palette,
}

/// Rejected editor input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditError {
    /// The supplied bytes are not valid UTF-8; the buffer was not touched.
    InvalidUtf8,
}

impl fmt::Display for EditError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidUtf8 => write!(f, "text is not valid UTF-8"),
        }
    }
}

impl std::error::Error for EditError {}

/// Span of the most recent yank, consumed by yank-pop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct YankMark {
    pos: usize,
    len: usize,
}

/// Which side of the cursor a kill removed, which decides how consecutive
/// kills merge in the ring.
#[derive(Debug, Clone, Copy)]
enum KillDirection {
    Forward,
    Backward,
}

/// Emacs-flavoured single-line editor.
#[derive(Debug, Default)]
pub struct LineEditor {
    buf: String,
    /// Byte offset, always on a codepoint boundary.
    cursor: usize,
    ring: KillRing,
    undo: UndoState,
    history: History,
    /// Span of the last yank; cleared by any non-yank operation.
    yank: Option<YankMark>,
    /// One-shot jump-to-char mode armed by Ctrl-].
    jump_armed: bool,
}

impl LineEditor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current line content.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.buf
    }

    /// Cursor byte offset into [`text`](Self::text).
    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Recorded submission history.
    #[must_use]
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Seed a history entry (e.g. restored from a previous session).
    pub fn push_history(&mut self, entry: &str) {
        self.history.push(entry);
    }

    /// Replace the line content, cursor at the end. Resets undo history.
    pub fn set_text(&mut self, text: &str) {
        self.buf = text.to_string();
        self.cursor = self.buf.len();
        self.undo.reset();
        self.yank = None;
        self.ring.break_chain();
    }

    /// Apply one key, mutating the buffer and returning the UI signal.
    pub fn apply(&mut self, key: Key) -> Action {
        // One-shot jump mode swallows the next key outright.
        if self.jump_armed {
            self.jump_armed = false;
            if let Key::Char(c) = key {
                self.jump_to(c);
            }
            self.ring.break_chain();
            self.yank = None;
            return Action::None;
        }

        let action = self.dispatch(key);

        if !matches!(key, Key::CtrlK | Key::CtrlU | Key::CtrlW | Key::AltD) {
            self.ring.break_chain();
        }
        if !matches!(key, Key::CtrlY | Key::AltY) {
            self.yank = None;
        }
        action
    }

    /// Hand the submitted line to the caller. Records it into history
    /// (deduplicated, empty lines skipped) and resets per-line editing
    /// state; the kill ring survives across lines.
    pub fn take_submission(&mut self) -> String {
        let text = std::mem::take(&mut self.buf);
        self.cursor = 0;
        self.history.push(&text);
        self.history.reset_browse();
        self.undo.reset();
        self.yank = None;
        self.jump_armed = false;
        self.ring.break_chain();
        text
    }

    /// Splice externally supplied bytes (typically a paste) at the cursor.
    ///
    /// The whole slice is validated first; invalid UTF-8 is rejected with
    /// the buffer and cursor untouched.
    pub fn insert_bytes(&mut self, bytes: &[u8]) -> Result<(), EditError> {
        let text = std::str::from_utf8(bytes).map_err(|_| EditError::InvalidUtf8)?;
        if text.is_empty() {
            return Ok(());
        }
        self.undo.record(EditKind::Insert, &self.buf, self.cursor);
        self.buf.insert_str(self.cursor, text);
        self.cursor += text.len();
        self.ring.break_chain();
        self.yank = None;
        Ok(())
    }

    fn dispatch(&mut self, key: Key) -> Action {
        match key {
            Key::Char(c) => {
                self.insert_char(c);
                Action::None
            }
            Key::Enter => Action::Submit,

            Key::Backspace => {
                self.delete_backward();
                Action::None
            }
            Key::Delete => {
                self.delete_forward();
                Action::None
            }

            Key::Left | Key::CtrlB => {
                if let Some(prev) = self.prev_offset() {
                    self.cursor = prev;
                }
                Action::None
            }
            Key::Right | Key::CtrlF => {
                if let Some(next) = self.next_offset() {
                    self.cursor = next;
                }
                Action::None
            }
            Key::Home | Key::CtrlA => {
                self.cursor = 0;
                Action::None
            }
            Key::End | Key::CtrlE => {
                self.cursor = self.buf.len();
                Action::None
            }
            Key::CtrlLeft | Key::AltB => {
                self.cursor = prev_word_boundary(&self.buf, self.cursor);
                Action::None
            }
            Key::CtrlRight | Key::AltF => {
                self.cursor = next_word_boundary(&self.buf, self.cursor);
                Action::None
            }

            Key::CtrlK => {
                self.kill_range(self.cursor, self.buf.len(), KillDirection::Forward);
                Action::None
            }
            Key::CtrlU => {
                self.kill_range(0, self.buf.len(), KillDirection::Backward);
                Action::None
            }
            Key::CtrlW => {
                let start = prev_word_boundary(&self.buf, self.cursor);
                self.kill_range(start, self.cursor, KillDirection::Backward);
                Action::None
            }
            Key::AltD => {
                let end = next_word_boundary(&self.buf, self.cursor);
                self.kill_range(self.cursor, end, KillDirection::Forward);
                Action::None
            }

            Key::CtrlY => {
                self.yank();
                Action::None
            }
            Key::AltY => {
                self.yank_pop();
                Action::None
            }

            Key::CtrlZ => {
                self.undo_edit();
                Action::None
            }
            Key::ShiftCtrlZ => {
                self.redo_edit();
                Action::None
            }

            Key::Up | Key::CtrlP | Key::AltUp => {
                self.history_prev();
                Action::None
            }
            Key::Down | Key::CtrlN => {
                self.history_next();
                Action::None
            }

            Key::CtrlRBracket => {
                self.jump_armed = true;
                Action::None
            }

            Key::CtrlC => {
                if self.buf.is_empty() {
                    Action::Cancel
                } else {
                    self.discard_line();
                    Action::Interrupt
                }
            }
            Key::Escape => {
                if !self.buf.is_empty() {
                    self.discard_line();
                }
                Action::Interrupt
            }
            Key::CtrlD => {
                if self.buf.is_empty() {
                    Action::Cancel
                } else {
                    Action::None
                }
            }

            Key::CtrlL => Action::Redraw,
            Key::PageUp => Action::ScrollUp,
            Key::PageDown => Action::ScrollDown,
            Key::Tab => Action::FocusNext,
            Key::BackTab => Action::FocusPrev,
            Key::AltEnter => Action::Newline,
            Key::ShiftCtrlP => Action::Palette,
        }
    }

    // ── Editing primitives ─────────────────────────────────────────────

    fn insert_char(&mut self, c: char) {
        self.undo.record(EditKind::Insert, &self.buf, self.cursor);
        self.buf.insert(self.cursor, c);
        self.cursor += c.len_utf8();
    }

    fn delete_backward(&mut self) {
        let Some(prev) = self.prev_offset() else {
            return;
        };
        self.undo.record(EditKind::Delete, &self.buf, self.cursor);
        self.buf.replace_range(prev..self.cursor, "");
        self.cursor = prev;
    }

    fn delete_forward(&mut self) {
        let Some(next) = self.next_offset() else {
            return;
        };
        self.undo.record(EditKind::Delete, &self.buf, self.cursor);
        self.buf.replace_range(self.cursor..next, "");
    }

    /// Remove `start..end`, push it to the kill ring (merging while the
    /// kill chain holds), and leave the cursor at `start`.
    fn kill_range(&mut self, start: usize, end: usize, direction: KillDirection) {
        if start >= end {
            return;
        }
        self.undo.record(EditKind::Kill, &self.buf, self.cursor);
        let text = self.buf[start..end].to_string();
        self.buf.replace_range(start..end, "");
        self.cursor = start;
        if self.ring.is_chained() {
            match direction {
                KillDirection::Forward => self.ring.append_to_newest(&text),
                KillDirection::Backward => self.ring.prepend_to_newest(&text),
            }
        } else {
            self.ring.push(text);
        }
        self.ring.begin_chain();
    }

    fn yank(&mut self) {
        let Some(text) = self.ring.newest().map(str::to_string) else {
            return;
        };
        self.undo.record(EditKind::Other, &self.buf, self.cursor);
        let pos = self.cursor;
        self.buf.insert_str(pos, &text);
        self.cursor = pos + text.len();
        self.yank = Some(YankMark {
            pos,
            len: text.len(),
        });
        self.ring.reset_rotation();
    }

    /// Replace the span the last yank inserted with the next-older ring
    /// entry. Meaningful only directly after a yank.
    fn yank_pop(&mut self) {
        let Some(mark) = self.yank else {
            return;
        };
        if self.ring.len() <= 1 {
            return;
        }
        let Some(text) = self.ring.rotate().map(str::to_string) else {
            return;
        };
        self.undo.record(EditKind::Other, &self.buf, self.cursor);
        self.buf.replace_range(mark.pos..mark.pos + mark.len, &text);
        self.cursor = mark.pos + text.len();
        self.yank = Some(YankMark {
            pos: mark.pos,
            len: text.len(),
        });
    }

    fn undo_edit(&mut self) {
        let current = Snapshot {
            text: self.buf.clone(),
            cursor: self.cursor,
        };
        if let Some(snapshot) = self.undo.undo(current) {
            self.buf = snapshot.text;
            self.cursor = snapshot.cursor;
        }
    }

    fn redo_edit(&mut self) {
        let current = Snapshot {
            text: self.buf.clone(),
            cursor: self.cursor,
        };
        if let Some(snapshot) = self.undo.redo(current) {
            self.buf = snapshot.text;
            self.cursor = snapshot.cursor;
        }
    }

    fn history_prev(&mut self) {
        let Some(text) = self.history.prev(&self.buf) else {
            return;
        };
        self.replace_line(text);
    }

    fn history_next(&mut self) {
        let Some(text) = self.history.next() else {
            return;
        };
        self.replace_line(text);
    }

    /// Swap in a history entry (or the stash) without recording undo; the
    /// next real edit starts a fresh undo step.
    fn replace_line(&mut self, text: String) {
        self.cursor = text.len();
        self.buf = text;
        self.undo.break_coalescing();
    }

    /// Seek forward, skipping the codepoint under the cursor, to the next
    /// occurrence of `target`. No motion if it does not occur.
    fn jump_to(&mut self, target: char) {
        let Some(start) = self.next_offset() else {
            return;
        };
        if let Some(found) = self.buf[start..].find(target) {
            self.cursor = start + found;
        }
    }

    /// Ctrl-C / Escape with content: drop the line outright.
    fn discard_line(&mut self) {
        self.buf.clear();
        self.cursor = 0;
        self.undo.reset();
        self.history.reset_browse();
        self.jump_armed = false;
    }

    // ── Cursor helpers ─────────────────────────────────────────────────

    /// Byte offset of the codepoint before the cursor.
    fn prev_offset(&self) -> Option<usize> {
        let c = self.buf[..self.cursor].chars().next_back()?;
        Some(self.cursor - c.len_utf8())
    }

    /// Byte offset just past the codepoint under the cursor.
    fn next_offset(&self) -> Option<usize> {
        let c = self.buf[self.cursor..].chars().next()?;
        Some(self.cursor + c.len_utf8())
    }
}

fn is_word_separator(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n')
}

/// Forward word motion: skip a separator run, then a word run.
fn next_word_boundary(s: &str, from: usize) -> usize {
    let mut pos = from;
    while let Some(c) = s[pos..].chars().next() {
        if !is_word_separator(c) {
            break;
        }
        pos += c.len_utf8();
    }
    while let Some(c) = s[pos..].chars().next() {
        if is_word_separator(c) {
            break;
        }
        pos += c.len_utf8();
    }
    pos
}

/// Backward word motion: mirror of [`next_word_boundary`].
fn prev_word_boundary(s: &str, from: usize) -> usize {
    let mut pos = from;
    while let Some(c) = s[..pos].chars().next_back() {
        if !is_word_separator(c) {
            break;
        }
        pos -= c.len_utf8();
    }
    while let Some(c) = s[..pos].chars().next_back() {
        if is_word_separator(c) {
            break;
        }
        pos -= c.len_utf8();
    }
    pos
}
