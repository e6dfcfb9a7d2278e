//! Undo/redo management for editor operations.
//!
//! Provides:
//! - `UndoManager` trait for abstracting undo implementations
//! - `UndoableState` - wraps an EditorState and records applied transactions

use std::collections::VecDeque;

use crate::error::StepError;
use crate::state::EditorState;
use crate::transform::Transaction;
use crate::types::Selection;

/// Trait for managing undo/redo operations.
///
/// Implementations must actually perform the undo/redo, not just track state.
pub trait UndoManager {
    /// Check if undo is available.
    fn can_undo(&self) -> bool;

    /// Check if redo is available.
    fn can_redo(&self) -> bool;

    /// Perform undo. Returns true if successful.
    fn undo(&mut self) -> bool;

    /// Perform redo. Returns true if successful.
    fn redo(&mut self) -> bool;
}

/// An EditorState wrapper that keeps previous versions for undo/redo.
///
/// Document versions share untouched subtrees, so a snapshot costs one
/// path of copied nodes per edit.
#[derive(Debug, Clone)]
pub struct UndoableState {
    state: EditorState,
    undo_stack: VecDeque<EditorState>,
    redo_stack: Vec<EditorState>,
    max_steps: usize,
}

impl UndoableState {
    pub fn new(state: EditorState, max_steps: usize) -> Self {
        Self {
            state,
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            max_steps,
        }
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    /// Apply a transaction. Document changes are recorded for undo;
    /// selection-only transactions are not.
    pub fn apply(&mut self, tr: &Transaction) -> Result<(), StepError> {
        let next = self.state.apply(tr)?;
        if tr.doc_changed() {
            let previous = std::mem::replace(&mut self.state, next);
            self.record(previous);
        } else {
            self.state = next;
        }
        Ok(())
    }

    /// Move the selection without touching history.
    pub fn set_selection(&mut self, selection: Selection) {
        self.state = self.state.with_selection(selection);
    }

    fn record(&mut self, previous: EditorState) {
        // Clear redo stack on new edit
        self.redo_stack.clear();
        self.undo_stack.push_back(previous);

        // Trim if over max
        while self.undo_stack.len() > self.max_steps {
            self.undo_stack.pop_front();
        }
    }
}

impl UndoManager for UndoableState {
    fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    fn undo(&mut self) -> bool {
        let Some(previous) = self.undo_stack.pop_back() else {
            return false;
        };
        let current = std::mem::replace(&mut self.state, previous);
        self.redo_stack.push(current);
        true
    }

    fn redo(&mut self) -> bool {
        let Some(next) = self.redo_stack.pop() else {
            return false;
        };
        let current = std::mem::replace(&mut self.state, next);
        self.undo_stack.push_back(current);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::default_schema;
    use crate::schema::Schema;
    use crate::value::AttrMap;

    fn doc_state(schema: &Schema, text: &str) -> EditorState {
        let para = schema
            .node("paragraph", AttrMap::new(), vec![schema.text(text, vec![]).unwrap()], vec![])
            .unwrap();
        EditorState::new(schema.node("doc", AttrMap::new(), vec![para], vec![]).unwrap())
    }

    fn insert(history: &mut UndoableState, schema: &Schema, pos: usize, text: &str) {
        let mut tr = Transaction::new(history.state());
        tr.replace_with(pos, pos, vec![schema.text(text, vec![]).unwrap()], schema)
            .unwrap();
        history.apply(&tr).unwrap();
    }

    fn text(history: &UndoableState) -> String {
        history.state().doc().text_content()
    }

    #[test]
    fn test_undo_redo() {
        let schema = default_schema().unwrap();
        let mut history = UndoableState::new(doc_state(&schema, "hello"), 100);
        assert!(!history.can_undo());

        insert(&mut history, &schema, 6, " world");
        assert_eq!(text(&history), "hello world");
        assert!(history.can_undo());

        assert!(history.undo());
        assert_eq!(text(&history), "hello");
        assert!(!history.can_undo());
        assert!(history.can_redo());

        assert!(history.redo());
        assert_eq!(text(&history), "hello world");
        assert!(!history.can_redo());
    }

    #[test]
    fn test_undo_restores_same_version() {
        let schema = default_schema().unwrap();
        let mut history = UndoableState::new(doc_state(&schema, "abc"), 100);
        let original = history.state().doc().clone();
        insert(&mut history, &schema, 4, "d");
        assert!(history.undo());
        assert!(history.state().doc().ptr_eq(&original));
    }

    #[test]
    fn test_selection_only_is_not_recorded() {
        let schema = default_schema().unwrap();
        let mut history = UndoableState::new(doc_state(&schema, "abc"), 100);
        let mut tr = Transaction::new(history.state());
        tr.set_selection(Selection::text(history.state().doc(), 1, 3));
        history.apply(&tr).unwrap();
        assert!(!history.can_undo());
        assert_eq!(history.state().selection().to(), 3);
    }

    #[test]
    fn test_new_edit_clears_redo() {
        let schema = default_schema().unwrap();
        let mut history = UndoableState::new(doc_state(&schema, "abc"), 100);
        insert(&mut history, &schema, 4, "d");
        assert!(history.undo());
        assert!(history.can_redo());

        insert(&mut history, &schema, 4, "e");
        assert!(!history.can_redo());
        assert_eq!(text(&history), "abce");
    }

    #[test]
    fn test_max_steps() {
        let schema = default_schema().unwrap();
        let mut history = UndoableState::new(doc_state(&schema, "x"), 3);
        for (i, s) in ["a", "b", "c", "d"].into_iter().enumerate() {
            insert(&mut history, &schema, 2 + i, s);
        }
        assert_eq!(text(&history), "xabcd");

        assert!(history.undo());
        assert!(history.undo());
        assert!(history.undo());
        assert!(!history.undo());
        assert_eq!(text(&history), "xa");
    }

    #[test]
    fn test_stale_transaction_is_rejected() {
        let schema = default_schema().unwrap();
        let mut history = UndoableState::new(doc_state(&schema, "abc"), 100);
        let stale = Transaction::new(history.state());
        insert(&mut history, &schema, 4, "d");
        assert_eq!(history.apply(&stale), Err(StepError::StaleTransaction));
        assert_eq!(text(&history), "abcd");
    }
}
