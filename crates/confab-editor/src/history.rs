#![forbid(unsafe_code)]

//! Submission history with stash-based browsing.
//!
//! History is append-only and deduplicated against only the immediately
//! preceding entry (repeating an old command still records it). Browsing
//! stashes the in-progress line on entry; stepping past the newest entry
//! restores the stash and leaves browse mode.

/// Previously submitted lines plus browsing state.
#[derive(Debug, Default)]
pub struct History {
    entries: Vec<String>,
    /// Index into `entries` while browsing; `None` means not browsing.
    browse: Option<usize>,
    /// In-progress line saved when browsing began.
    stash: String,
}

impl History {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a submitted line. Empty lines and immediate repeats are not
    /// recorded.
    pub fn push(&mut self, entry: &str) {
        if entry.is_empty() {
            return;
        }
        if self.entries.last().is_some_and(|last| last == entry) {
            return;
        }
        self.entries.push(entry.to_string());
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn is_browsing(&self) -> bool {
        self.browse.is_some()
    }

    /// Recorded entries, oldest first.
    #[must_use]
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Step to an older entry. The first step stashes `current` and lands on
    /// the newest entry; at the oldest entry the cursor stays put.
    ///
    /// Returns the text the line buffer should show, or `None` when there is
    /// no history at all.
    pub fn prev(&mut self, current: &str) -> Option<String> {
        if self.entries.is_empty() {
            return None;
        }
        let index = match self.browse {
            None => {
                self.stash = current.to_string();
                self.entries.len() - 1
            }
            Some(0) => 0,
            Some(i) => i - 1,
        };
        self.browse = Some(index);
        Some(self.entries[index].clone())
    }

    /// Step toward newer entries. Past the newest the stash is restored and
    /// browse mode ends. A no-op (`None`) while not browsing.
    pub fn next(&mut self) -> Option<String> {
        let index = self.browse?;
        if index + 1 < self.entries.len() {
            self.browse = Some(index + 1);
            Some(self.entries[index + 1].clone())
        } else {
            self.browse = None;
            Some(std::mem::take(&mut self.stash))
        }
    }

    /// Leave browse mode and discard the stash (after a submission).
    pub fn reset_browse(&mut self) {
        self.browse = None;
        self.stash.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_skips_empty_and_immediate_repeats() {
        let mut history = History::new();
        history.push("");
        history.push("a");
        history.push("a");
        history.push("b");
        history.push("a");
        assert_eq!(history.entries(), ["a", "b", "a"]);
    }

    #[test]
    fn browse_round_trip_restores_stash() {
        let mut history = History::new();
        history.push("hi");
        history.push("go");

        assert_eq!(history.prev("draft").as_deref(), Some("go"));
        assert_eq!(history.prev("go").as_deref(), Some("hi"));
        // Oldest entry: stays put.
        assert_eq!(history.prev("hi").as_deref(), Some("hi"));
        assert_eq!(history.next().as_deref(), Some("go"));
        assert_eq!(history.next().as_deref(), Some("draft"));
        assert!(!history.is_browsing());
    }

    #[test]
    fn next_without_browsing_is_noop() {
        let mut history = History::new();
        history.push("x");
        assert_eq!(history.next(), None);
    }

    #[test]
    fn prev_with_no_history_is_noop() {
        let mut history = History::new();
        assert_eq!(history.prev("draft"), None);
        assert!(!history.is_browsing());
    }

    #[test]
    fn reset_browse_discards_stash() {
        let mut history = History::new();
        history.push("one");
        history.prev("draft");
        history.reset_browse();
        assert!(!history.is_browsing());
        // A later browse cycle starts from a fresh stash.
        assert_eq!(history.prev("").as_deref(), Some("one"));
        assert_eq!(history.next().as_deref(), Some(""));
    }
}
