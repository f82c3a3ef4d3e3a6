#![forbid(unsafe_code)]

//! Public facade for the confab input pipeline.
//!
//! Re-exports the event model, the byte-stream decoder, and the line
//! editor. A typical event loop on Unix:
//!
//! ```no_run
//! use confab::prelude::*;
//!
//! # fn main() -> std::io::Result<()> {
//! let tty = std::fs::File::open("/dev/tty")?;
//! let mut reader = EventReader::new(tty).with_resize_events()?;
//! let mut editor = LineEditor::new();
//!
//! loop {
//!     match reader.next_event()? {
//!         Some(Event::Key(key)) => match editor.apply(key) {
//!             Action::Submit => {
//!                 let line = editor.take_submission();
//!                 // send `line` to the chat backend
//!                 # let _ = line;
//!             }
//!             Action::Cancel => break,
//!             _ => {}
//!         },
//!         Some(Event::Paste(bytes)) => {
//!             let _ = editor.insert_bytes(&bytes);
//!         }
//!         Some(Event::Mouse(_) | Event::Resize | Event::Notify) => {
//!             // routed to the transcript / layout layers
//!         }
//!         None => {
//!             // poll tick: refresh spinners, animations, ...
//!         }
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub use confab_core as core;
pub use confab_editor as editor;
pub use confab_input as input;

/// The commonly used surface in one import.
pub mod prelude {
    pub use confab_core::event::{Event, Key, Modifiers, MouseEvent, MousePos};
    pub use confab_editor::{Action, EditError, History, KillRing, LineEditor};
    pub use confab_input::{InputBuffer, MouseParse, PasteAccumulator, Step, decode};
    #[cfg(unix)]
    pub use confab_input::{DEFAULT_POLL_TIMEOUT, EventReader};
}

#[cfg(test)]
mod tests {
    use super::prelude::*;

    /// Decode a byte stream and feed the keys straight into the editor,
    /// the way the event loop wires the two crates together.
    fn run_pipeline(editor: &mut LineEditor, mut bytes: &[u8]) -> Vec<Action> {
        let mut actions = Vec::new();
        loop {
            match decode(bytes) {
                Step::Emit(Event::Key(key), n) => {
                    actions.push(editor.apply(key));
                    bytes = &bytes[n..];
                }
                Step::Emit(_, n) | Step::Skip(n) | Step::PasteBegin(n) => {
                    bytes = &bytes[n..];
                }
                Step::Pending => break,
            }
            if bytes.is_empty() {
                break;
            }
        }
        actions
    }

    #[test]
    fn typed_bytes_become_buffer_content() {
        let mut editor = LineEditor::new();
        run_pipeline(&mut editor, "hey β!".as_bytes());
        assert_eq!(editor.text(), "hey β!");
    }

    #[test]
    fn escape_sequences_drive_editing() {
        let mut editor = LineEditor::new();
        // Type, jump home, kill the first word forward.
        run_pipeline(&mut editor, b"one two\x1b[H\x1bd");
        assert_eq!(editor.text(), " two");
        // Yank it back at the end.
        run_pipeline(&mut editor, b"\x1b[F\x19");
        assert_eq!(editor.text(), " twoone");
    }

    #[test]
    fn enter_submits_through_the_pipeline() {
        let mut editor = LineEditor::new();
        let actions = run_pipeline(&mut editor, b"ship it\r");
        assert_eq!(actions.last(), Some(&Action::Submit));
        assert_eq!(editor.take_submission(), "ship it");
    }
}
