use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::AppError;

/// Undo/redo state for the UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct UndoState {
    pub can_undo: bool,
    pub can_redo: bool,
    pub undo_description: Option<String>,
    pub redo_description: Option<String>,
}

/// An undo entry: the snapshot taken before the first mutation of a group,
/// plus the group's description.
struct UndoEntry<S> {
    description: String,
    group_id: Option<String>,
    snapshot: S,
}

const MAX_UNDO_LEVELS: usize = 50;

/// Snapshot-based undo/redo.
///
/// Mutations that share a group id share one undo entry: only the first
/// [`UndoHistory::checkpoint`] of a group captures a snapshot, so a single
/// undo reverts a whole AI batch. Ungrouped checkpoints always push.
pub struct UndoHistory<S> {
    undo_stack: Vec<UndoEntry<S>>,
    redo_stack: Vec<UndoEntry<S>>,
}

impl<S> Default for UndoHistory<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> UndoHistory<S> {
    pub fn new() -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
        }
    }

    /// Record the state before a mutation. Returns true if a new entry was pushed.
    pub fn checkpoint(&mut self, group_id: Option<&str>, description: &str, before: &S) -> bool
    where
        S: Clone,
    {
        let same_group = group_id.is_some_and(|g| {
            self.undo_stack
                .last()
                .and_then(|e| e.group_id.as_deref())
                .is_some_and(|prev| prev == g)
        });
        // Any new mutation invalidates redo history, grouped or not.
        self.redo_stack.clear();
        if same_group {
            return false;
        }

        self.undo_stack.push(UndoEntry {
            description: description.to_string(),
            group_id: group_id.map(str::to_string),
            snapshot: before.clone(),
        });
        if self.undo_stack.len() > MAX_UNDO_LEVELS {
            self.undo_stack.remove(0);
        }
        true
    }

    /// Undo the last entry, swapping `current` with its snapshot.
    /// Returns the description of what was undone.
    pub fn undo(&mut self, current: &mut S) -> Result<String, AppError> {
        let mut entry = self.undo_stack.pop().ok_or(AppError::ValidationError {
            message: "Nothing to undo".into(),
        })?;
        std::mem::swap(current, &mut entry.snapshot);
        let description = entry.description.clone();
        entry.group_id = None;
        self.redo_stack.push(entry);
        Ok(description)
    }

    /// Redo the last undone entry. Returns the description of what was redone.
    pub fn redo(&mut self, current: &mut S) -> Result<String, AppError> {
        let mut entry = self.redo_stack.pop().ok_or(AppError::ValidationError {
            message: "Nothing to redo".into(),
        })?;
        std::mem::swap(current, &mut entry.snapshot);
        let description = entry.description.clone();
        self.undo_stack.push(entry);
        Ok(description)
    }

    pub fn undo_state(&self) -> UndoState {
        UndoState {
            can_undo: !self.undo_stack.is_empty(),
            can_redo: !self.redo_stack.is_empty(),
            undo_description: self.undo_stack.last().map(|e| e.description.clone()),
            redo_description: self.redo_stack.last().map(|e| e.description.clone()),
        }
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_grouped_checkpoints_share_one_entry() {
        let mut history = UndoHistory::new();
        let mut state = 0_i32;

        assert!(history.checkpoint(Some("g1"), "Batch", &state));
        state = 1;
        assert!(!history.checkpoint(Some("g1"), "Batch", &state));
        state = 2;

        let desc = history.undo(&mut state).unwrap();
        assert_eq!(desc, "Batch");
        assert_eq!(state, 0);
        assert!(!history.undo_state().can_undo);
    }

    #[test]
    fn test_ungrouped_checkpoints_push_each_time() {
        let mut history = UndoHistory::new();
        let mut state = 0_i32;
        history.checkpoint(None, "a", &state);
        state = 1;
        history.checkpoint(None, "b", &state);
        state = 2;

        history.undo(&mut state).unwrap();
        assert_eq!(state, 1);
        history.undo(&mut state).unwrap();
        assert_eq!(state, 0);
    }

    #[test]
    fn test_redo_restores_and_new_edit_clears_redo() {
        let mut history = UndoHistory::new();
        let mut state = 0_i32;
        history.checkpoint(Some("g"), "Batch", &state);
        state = 5;

        history.undo(&mut state).unwrap();
        assert_eq!(state, 0);
        assert!(history.undo_state().can_redo);

        history.redo(&mut state).unwrap();
        assert_eq!(state, 5);

        history.undo(&mut state).unwrap();
        history.checkpoint(None, "edit", &state);
        assert!(!history.undo_state().can_redo);
    }

    #[test]
    fn test_undo_on_empty_errors() {
        let mut history: UndoHistory<i32> = UndoHistory::new();
        let mut state = 0;
        assert!(history.undo(&mut state).is_err());
        assert!(history.redo(&mut state).is_err());
    }
}
