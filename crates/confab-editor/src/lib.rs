#![forbid(unsafe_code)]

//! Editor: the emacs-style single-line editor behind the chat composer.
//!
//! [`editor::LineEditor`] consumes decoded keys and owns the line buffer,
//! kill ring, undo/redo stacks, and submission history.

pub mod editor;
pub mod history;
pub mod kill_ring;
pub mod undo;

pub use editor::{Action, EditError, LineEditor};
pub use history::History;
pub use kill_ring::{KILL_RING_SLOTS, KillRing};
pub use undo::{EditKind, MAX_UNDO_DEPTH, UndoState};
