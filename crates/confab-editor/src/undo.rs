#![forbid(unsafe_code)]

//! Snapshot undo/redo with edit-kind coalescing.
//!
//! Every buffer mutation is tagged with an [`EditKind`]. A pre-mutation
//! snapshot is pushed only when the kind differs from the previous
//! operation's, so a run of character insertions collapses into a single
//! undoable step. The stack is capped at [`MAX_UNDO_DEPTH`]; the oldest
//! snapshot is dropped silently on overflow.

/// Maximum retained undo snapshots.
pub const MAX_UNDO_DEPTH: usize = 100;

/// Category of a buffer mutation, used to coalesce consecutive edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditKind {
    /// No mutation yet (initial state, or coalescing deliberately broken).
    #[default]
    None,
    /// Character or slice insertion.
    Insert,
    /// Single-codepoint deletion.
    Delete,
    /// Kill-ring deletion.
    Kill,
    /// Anything else that rewrites the buffer (yank, etc.).
    Other,
}

/// Buffer and cursor captured before a mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub text: String,
    pub cursor: usize,
}

/// The undo and redo stacks plus the coalescing tag.
#[derive(Debug, Default)]
pub struct UndoState {
    undo: Vec<Snapshot>,
    redo: Vec<Snapshot>,
    last_kind: EditKind,
}

impl UndoState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Called with the pre-mutation state just before a mutation of `kind`.
    ///
    /// Pushes a snapshot only when `kind` differs from the previous
    /// mutation's kind. Every fresh edit invalidates the redo stack, pushed
    /// or not.
    pub fn record(&mut self, kind: EditKind, text: &str, cursor: usize) {
        if kind != self.last_kind {
            self.undo.push(Snapshot {
                text: text.to_string(),
                cursor,
            });
            if self.undo.len() > MAX_UNDO_DEPTH {
                self.undo.remove(0);
            }
        }
        self.last_kind = kind;
        self.redo.clear();
    }

    /// Force the next mutation to start a fresh undo step without recording
    /// anything (the buffer changed out-of-band, e.g. history browsing).
    pub fn break_coalescing(&mut self) {
        self.last_kind = EditKind::None;
    }

    /// Pop the most recent snapshot, saving `current` for redo.
    pub fn undo(&mut self, current: Snapshot) -> Option<Snapshot> {
        let snapshot = self.undo.pop()?;
        self.redo.push(current);
        self.last_kind = EditKind::None;
        Some(snapshot)
    }

    /// Pop the most recent redo snapshot, saving `current` for undo.
    pub fn redo(&mut self, current: Snapshot) -> Option<Snapshot> {
        let snapshot = self.redo.pop()?;
        self.undo.push(current);
        if self.undo.len() > MAX_UNDO_DEPTH {
            self.undo.remove(0);
        }
        self.last_kind = EditKind::None;
        Some(snapshot)
    }

    /// Drop all snapshots (a new line was started).
    pub fn reset(&mut self) {
        self.undo.clear();
        self.redo.clear();
        self.last_kind = EditKind::None;
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Current undo depth.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.undo.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(text: &str, cursor: usize) -> Snapshot {
        Snapshot {
            text: text.to_string(),
            cursor,
        }
    }

    #[test]
    fn same_kind_coalesces() {
        let mut state = UndoState::new();
        state.record(EditKind::Insert, "", 0);
        state.record(EditKind::Insert, "a", 1);
        state.record(EditKind::Insert, "ab", 2);
        assert_eq!(state.depth(), 1);
    }

    #[test]
    fn kind_change_pushes() {
        let mut state = UndoState::new();
        state.record(EditKind::Insert, "", 0);
        state.record(EditKind::Delete, "ab", 2);
        state.record(EditKind::Insert, "a", 1);
        assert_eq!(state.depth(), 3);
    }

    #[test]
    fn undo_moves_to_redo() {
        let mut state = UndoState::new();
        state.record(EditKind::Insert, "", 0);
        let restored = state.undo(snap("abc", 3)).unwrap();
        assert_eq!(restored, snap("", 0));
        assert!(state.can_redo());
        let redone = state.redo(snap("", 0)).unwrap();
        assert_eq!(redone, snap("abc", 3));
        assert!(state.can_undo());
    }

    #[test]
    fn undo_on_empty_stack_keeps_redo_untouched() {
        let mut state = UndoState::new();
        assert!(state.undo(snap("x", 1)).is_none());
        assert!(!state.can_redo());
    }

    #[test]
    fn fresh_edit_clears_redo() {
        let mut state = UndoState::new();
        state.record(EditKind::Insert, "", 0);
        state.undo(snap("a", 1));
        assert!(state.can_redo());
        // Even a coalescing edit clears redo.
        state.record(EditKind::Insert, "", 0);
        state.record(EditKind::Insert, "x", 1);
        assert!(!state.can_redo());
    }

    #[test]
    fn depth_capped_with_oldest_dropped() {
        let mut state = UndoState::new();
        for i in 0..(MAX_UNDO_DEPTH + 20) {
            // Alternate kinds so every record pushes.
            let kind = if i % 2 == 0 {
                EditKind::Insert
            } else {
                EditKind::Delete
            };
            state.record(kind, &i.to_string(), 0);
        }
        assert_eq!(state.depth(), MAX_UNDO_DEPTH);
        // The oldest surviving snapshot is number 20, not 0.
        let mut last = None;
        while let Some(s) = state.undo(snap("", 0)) {
            last = Some(s);
        }
        assert_eq!(last.unwrap().text, "20");
    }

    #[test]
    fn break_coalescing_forces_next_push() {
        let mut state = UndoState::new();
        state.record(EditKind::Insert, "", 0);
        state.break_coalescing();
        state.record(EditKind::Insert, "history text", 12);
        assert_eq!(state.depth(), 2);
    }
}
