#![forbid(unsafe_code)]

//! Canonical input/event types.
//!
//! This module defines the event vocabulary shared by the byte-stream
//! decoder (which produces these values) and the line editor (which consumes
//! the [`Key`] subset). All types derive `Clone`, `PartialEq`, and `Eq` for
//! use in tests and pattern matching.
//!
//! # Design Notes
//!
//! - Mouse coordinates are 0-indexed (the SGR wire protocol is 1-indexed)
//! - [`Key`] is a closed set: the editor matches it exhaustively, so adding
//!   a variant is a breaking change by design
//! - [`Modifiers`] use bitflags and mirror the xterm/Kitty encoding
//!   (`value - 1` holds the bit set)

use bitflags::bitflags;

/// Canonical input event produced by the decoder.
///
/// "No event yet" and "fatal read failure" are not variants: the reader
/// returns `io::Result<Option<Event>>`, so a quiet poll is `Ok(None)` and a
/// broken descriptor is `Err`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A decoded keyboard event.
    Key(Key),

    /// A decoded SGR mouse report.
    Mouse(MouseEvent),

    /// Bracketed-paste payload, raw bytes as received.
    ///
    /// The decoder does not validate the payload; consumers that splice it
    /// into a text buffer perform UTF-8 validation at that boundary.
    Paste(Vec<u8>),

    /// The terminal was resized (SIGWINCH). Consumers query the new size
    /// themselves; resize storms are coalesced to a single pending event.
    Resize,

    /// The wake-up descriptor was written to by another thread.
    ///
    /// Guaranteed not to displace any pending input bytes.
    Notify,
}

/// A decoded key press.
///
/// Plain text arrives as [`Key::Char`]; everything else is a named chord.
/// Control chords are named after the chord itself (`CtrlW`), not the edit
/// they usually trigger, because the binding lives in the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// A regular character (any Unicode scalar the terminal sent as text).
    Char(char),

    // Navigation keys.
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,

    // Editing keys.
    Backspace,
    Delete,
    Enter,
    Tab,
    /// Shift+Tab (CSI Z).
    BackTab,
    Escape,

    // Control chords (C0 bytes and Kitty `ctrl+letter`).
    CtrlA,
    CtrlB,
    CtrlC,
    CtrlD,
    CtrlE,
    CtrlF,
    CtrlK,
    CtrlL,
    CtrlN,
    CtrlP,
    CtrlU,
    CtrlW,
    CtrlY,
    CtrlZ,
    /// Ctrl+] (0x1D), the jump-to-char chord.
    CtrlRBracket,

    // Modified arrows.
    CtrlLeft,
    CtrlRight,
    AltUp,

    // Alt chords (ESC-prefixed or Kitty `alt+letter`).
    AltEnter,
    AltB,
    AltF,
    AltD,
    AltY,

    // Kitty-only chords: plain terminals cannot report these.
    ShiftCtrlP,
    ShiftCtrlZ,
}

impl Key {
    /// Check if this is a specific character key.
    #[must_use]
    pub fn is_char(&self, c: char) -> bool {
        matches!(self, Key::Char(ch) if *ch == c)
    }
}

bitflags! {
    /// Modifier bit set as encoded by xterm and the Kitty keyboard protocol:
    /// the wire value is `1 + bits`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        /// No modifiers.
        const NONE  = 0b0000;
        /// Shift key.
        const SHIFT = 0b0001;
        /// Alt/Option key.
        const ALT   = 0b0010;
        /// Control key.
        const CTRL  = 0b0100;
        /// Super/Meta/Command key.
        const SUPER = 0b1000;
    }
}

impl Modifiers {
    /// Decode an xterm/Kitty modifier parameter (`1 + bits` on the wire).
    #[must_use]
    pub fn from_wire(value: u32) -> Self {
        Self::from_bits_truncate(value.saturating_sub(1) as u8)
    }
}

impl Default for Modifiers {
    fn default() -> Self {
        Self::NONE
    }
}

/// A decoded SGR mouse report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseEvent {
    /// Wheel scrolled up (button code 64).
    ScrollUp,

    /// Wheel scrolled down (button code 65).
    ScrollDown,

    /// Button pressed (`M` terminator).
    Press(MousePos),

    /// Button released (`m` terminator).
    Release(MousePos),
}

/// Position of a mouse press/release, 0-indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MousePos {
    /// Column, leftmost is 0.
    pub x: u16,
    /// Row, topmost is 0.
    pub y: u16,
    /// Raw SGR button code (low bits select the button).
    pub button: u16,
}

impl MousePos {
    /// Create a position from already 0-indexed coordinates.
    #[must_use]
    pub const fn new(x: u16, y: u16, button: u16) -> Self {
        Self { x, y, button }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_is_char() {
        assert!(Key::Char('q').is_char('q'));
        assert!(!Key::Char('q').is_char('x'));
        assert!(!Key::Enter.is_char('\n'));
    }

    #[test]
    fn modifiers_from_wire() {
        assert_eq!(Modifiers::from_wire(1), Modifiers::NONE);
        assert_eq!(Modifiers::from_wire(2), Modifiers::SHIFT);
        assert_eq!(Modifiers::from_wire(3), Modifiers::ALT);
        assert_eq!(Modifiers::from_wire(5), Modifiers::CTRL);
        assert_eq!(Modifiers::from_wire(6), Modifiers::SHIFT | Modifiers::CTRL);
        assert_eq!(Modifiers::from_wire(9), Modifiers::SUPER);
    }

    #[test]
    fn modifiers_from_wire_zero_is_none() {
        // Some terminals omit the parameter entirely; 0 must not underflow.
        assert_eq!(Modifiers::from_wire(0), Modifiers::NONE);
    }

    #[test]
    fn modifiers_default() {
        assert_eq!(Modifiers::default(), Modifiers::NONE);
    }

    #[test]
    fn event_is_clone_and_eq() {
        let event = Event::Key(Key::Char('x'));
        let cloned = event.clone();
        assert_eq!(event, cloned);
    }

    #[test]
    fn event_variants() {
        let _key = Event::Key(Key::CtrlC);
        let _mouse = Event::Mouse(MouseEvent::Press(MousePos::new(0, 0, 0)));
        let _paste = Event::Paste(b"pasted".to_vec());
        let _resize = Event::Resize;
        let _notify = Event::Notify;
    }

    #[test]
    fn mouse_pos_fields() {
        let pos = MousePos::new(9, 19, 2);
        assert_eq!((pos.x, pos.y, pos.button), (9, 19, 2));
    }
}
