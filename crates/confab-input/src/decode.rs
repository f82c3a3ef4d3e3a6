#![forbid(unsafe_code)]

//! Escape-sequence grammar.
//!
//! [`decode`] examines the unconsumed front of the input window and
//! classifies exactly one event. It is pure: the caller owns the buffer and
//! applies the returned byte counts, so an incomplete sequence can simply be
//! retried once more bytes arrive.
//!
//! Recognized grammar:
//! - C0 control bytes mapped to named chords (unknown ones swallowed)
//! - `ESC [` cursor keys, the tilde digit table, modified arrows
//! - `ESC [ ... u` Kitty keyboard reports
//! - `ESC [ <` SGR mouse reports (delegated to [`crate::mouse`])
//! - `ESC [ 200 ~` bracketed-paste start (`201~` outside a paste is stray)
//! - `ESC O` SS3 arrow/Home/End duplicates
//! - `ESC <byte>` Alt chords; anything else is a bare Escape and the
//!   trailing byte is re-examined on the next call
//! - UTF-8 text, one scalar at a time
//!
//! Decoding is deliberately forgiving: garbage is skipped, never an error.

use confab_core::event::{Event, Key, Modifiers};

use crate::mouse::{MouseParse, parse_sgr_mouse};

/// Longest accepted CSI parameter run. Key-sized sequences are far shorter;
/// a run this long with no final byte is garbage.
const MAX_CSI_PARAM_LEN: usize = 16;

/// One decode step over the unconsumed input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// A complete event; consume exactly this many bytes.
    Emit(Event, usize),
    /// The input ends mid-sequence; read more bytes and retry the whole
    /// sequence.
    Pending,
    /// Unrecognized or malformed bytes; consume them and report nothing.
    Skip(usize),
    /// A bracketed-paste start marker; consume it and enter paste mode.
    PasteBegin(usize),
}

/// Classify one event at the front of `input`.
#[must_use]
pub fn decode(input: &[u8]) -> Step {
    let Some(&first) = input.first() else {
        return Step::Pending;
    };
    match first {
        0x1b => decode_escape(input),
        0x00..=0x1f => match ctrl_key(first) {
            Some(key) => Step::Emit(Event::Key(key), 1),
            None => Step::Skip(1),
        },
        0x7f => Step::Emit(Event::Key(Key::Backspace), 1),
        0x20..=0x7e => Step::Emit(Event::Key(Key::Char(first as char)), 1),
        _ => decode_utf8(input),
    }
}

/// C0 control byte to chord. `None` means the byte is swallowed.
fn ctrl_key(byte: u8) -> Option<Key> {
    let key = match byte {
        0x01 => Key::CtrlA,
        0x02 => Key::CtrlB,
        0x03 => Key::CtrlC,
        0x04 => Key::CtrlD,
        0x05 => Key::CtrlE,
        0x06 => Key::CtrlF,
        0x08 => Key::Backspace,
        0x09 => Key::Tab,
        0x0a | 0x0d => Key::Enter,
        0x0b => Key::CtrlK,
        0x0c => Key::CtrlL,
        0x0e => Key::CtrlN,
        0x10 => Key::CtrlP,
        0x15 => Key::CtrlU,
        0x17 => Key::CtrlW,
        0x19 => Key::CtrlY,
        0x1a => Key::CtrlZ,
        0x1d => Key::CtrlRBracket,
        _ => return None,
    };
    Some(key)
}

fn decode_escape(input: &[u8]) -> Step {
    match input.get(1) {
        None => Step::Pending,
        Some(b'[') => decode_csi(input),
        Some(b'O') => decode_ss3(input),
        Some(b'\r' | b'\n') => Step::Emit(Event::Key(Key::AltEnter), 2),
        Some(b'b') => Step::Emit(Event::Key(Key::AltB), 2),
        Some(b'f') => Step::Emit(Event::Key(Key::AltF), 2),
        Some(b'd') => Step::Emit(Event::Key(Key::AltD), 2),
        Some(b'y') => Step::Emit(Event::Key(Key::AltY), 2),
        // Unrecognized ESC prefix: report the bare Escape and leave the
        // trailing byte for the next call.
        Some(_) => Step::Emit(Event::Key(Key::Escape), 1),
    }
}

fn decode_ss3(input: &[u8]) -> Step {
    let Some(&final_byte) = input.get(2) else {
        return Step::Pending;
    };
    let key = match final_byte {
        b'A' => Key::Up,
        b'B' => Key::Down,
        b'C' => Key::Right,
        b'D' => Key::Left,
        b'H' => Key::Home,
        b'F' => Key::End,
        _ => return Step::Skip(3),
    };
    Step::Emit(Event::Key(key), 3)
}

fn decode_csi(input: &[u8]) -> Step {
    if input.get(2) == Some(&b'<') {
        return match parse_sgr_mouse(input) {
            MouseParse::Event(mouse, len) => Step::Emit(Event::Mouse(mouse), len),
            MouseParse::Incomplete => Step::Pending,
            // Drop just the `ESC [`; the rest re-parses as plain bytes.
            MouseParse::Invalid => Step::Skip(2),
        };
    }

    // Collect the parameter run up to the final byte.
    let mut pos = 2;
    loop {
        match input.get(pos) {
            None => {
                return if pos - 2 > MAX_CSI_PARAM_LEN {
                    Step::Skip(2)
                } else {
                    Step::Pending
                };
            }
            Some(b'0'..=b'9' | b';' | b':') => {
                pos += 1;
                if pos - 2 > MAX_CSI_PARAM_LEN {
                    return Step::Skip(2);
                }
            }
            Some(&final_byte) if (0x40..=0x7e).contains(&final_byte) => {
                return dispatch_csi(&input[2..pos], final_byte, pos + 1);
            }
            Some(_) => return Step::Skip(2),
        }
    }
}

fn dispatch_csi(params: &[u8], final_byte: u8, consumed: usize) -> Step {
    let emit = |key| Step::Emit(Event::Key(key), consumed);
    match final_byte {
        b'A' | b'B' | b'C' | b'D' | b'H' | b'F' if params.is_empty() => emit(match final_byte {
            b'A' => Key::Up,
            b'B' => Key::Down,
            b'C' => Key::Right,
            b'D' => Key::Left,
            b'H' => Key::Home,
            _ => Key::End,
        }),
        b'A' if params == b"1;3" => emit(Key::AltUp),
        b'C' if params == b"1;5" => emit(Key::CtrlRight),
        b'D' if params == b"1;5" => emit(Key::CtrlLeft),
        b'Z' if params.is_empty() => emit(Key::BackTab),
        b'~' => dispatch_csi_tilde(params, consumed),
        b'u' => dispatch_kitty(params, consumed),
        _ => Step::Skip(consumed),
    }
}

/// The legacy `CSI <digits> ~` table.
fn dispatch_csi_tilde(params: &[u8], consumed: usize) -> Step {
    let Some(code) = parse_decimal(params) else {
        return Step::Skip(consumed);
    };
    let key = match code {
        1 | 7 => Key::Home,
        3 => Key::Delete,
        4 | 8 => Key::End,
        5 => Key::PageUp,
        6 => Key::PageDown,
        200 => return Step::PasteBegin(consumed),
        // A stray paste-end marker outside paste mode.
        _ => return Step::Skip(consumed),
    };
    Step::Emit(Event::Key(key), consumed)
}

/// Kitty keyboard protocol: `CSI codepoint ; modifiers u`.
///
/// Only the chords the editor understands are decoded; everything else is
/// swallowed. Sub-parameters after `:` (alternate keys, event types) are
/// ignored.
fn dispatch_kitty(params: &[u8], consumed: usize) -> Step {
    let quiet = Step::Skip(consumed);
    let mut parts = params.split(|&b| b == b';');
    let Some(code_part) = parts.next() else {
        return quiet;
    };
    let code_digits = code_part.split(|&b| b == b':').next().unwrap_or(b"");
    let Some(code) = parse_decimal(code_digits) else {
        return quiet;
    };
    let mods = parts
        .next()
        .and_then(|p| p.split(|&b| b == b':').next())
        .and_then(parse_decimal)
        .unwrap_or(1);
    let mods = Modifiers::from_wire(mods);

    let key = if mods == Modifiers::CTRL {
        match char_code(code) {
            Some(c @ 'a'..='z') => match ctrl_key(c as u8 & 0x1f) {
                Some(key) => key,
                None => return quiet,
            },
            _ => return quiet,
        }
    } else if mods == Modifiers::ALT {
        match char_code(code) {
            Some('b') => Key::AltB,
            Some('f') => Key::AltF,
            Some('d') => Key::AltD,
            Some('y') => Key::AltY,
            _ => return quiet,
        }
    } else if mods == Modifiers::SHIFT | Modifiers::CTRL {
        match char_code(code) {
            Some('p') => Key::ShiftCtrlP,
            Some('z') => Key::ShiftCtrlZ,
            _ => return quiet,
        }
    } else if mods == Modifiers::NONE {
        match code {
            13 => Key::Enter,
            9 => Key::Tab,
            27 => Key::Escape,
            8 | 127 => Key::Backspace,
            _ => return quiet,
        }
    } else {
        return quiet;
    };
    Step::Emit(Event::Key(key), consumed)
}

fn char_code(code: u32) -> Option<char> {
    char::from_u32(code)
}

fn parse_decimal(digits: &[u8]) -> Option<u32> {
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return None;
    }
    let mut value: u32 = 0;
    for &b in digits {
        value = value.checked_mul(10)?.checked_add(u32::from(b - b'0'))?;
    }
    Some(value)
}

fn decode_utf8(input: &[u8]) -> Step {
    let lead = input[0];
    let len = match lead {
        0xc0..=0xdf => 2,
        0xe0..=0xef => 3,
        0xf0..=0xf7 => 4,
        // Continuation byte or invalid lead: drop it and move on.
        _ => return Step::Skip(1),
    };
    if input.len() < len {
        return Step::Pending;
    }
    match std::str::from_utf8(&input[..len]) {
        Ok(s) => match s.chars().next() {
            Some(c) => Step::Emit(Event::Key(Key::Char(c)), len),
            None => Step::Skip(1),
        },
        Err(_) => Step::Skip(1),
    }
}
