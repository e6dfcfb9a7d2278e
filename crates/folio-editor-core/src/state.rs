//! Editor state: one document version plus a selection valid for it.

use crate::error::StepError;
use crate::node::Node;
use crate::transform::Transaction;
use crate::types::Selection;

#[derive(Debug, Clone, PartialEq)]
pub struct EditorState {
    doc: Node,
    selection: Selection,
}

impl EditorState {
    /// New state with the cursor at the start of the document.
    pub fn new(doc: Node) -> Self {
        let selection = Selection::at_start(&doc);
        Self { doc, selection }
    }

    pub fn doc(&self) -> &Node {
        &self.doc
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Same document, different selection. The selection must have been
    /// built against this state's document.
    pub fn with_selection(&self, selection: Selection) -> Self {
        Self {
            doc: self.doc.clone(),
            selection,
        }
    }

    /// Produce the next state. Fails if `tr` was started from another version.
    pub fn apply(&self, tr: &Transaction) -> Result<EditorState, StepError> {
        if !tr.before().ptr_eq(&self.doc) {
            return Err(StepError::StaleTransaction);
        }
        tracing::debug!(
            steps = tr.steps().len(),
            size = tr.doc().content_size(),
            "applying transaction"
        );
        Ok(Self {
            doc: tr.doc().clone(),
            selection: tr.selection().clone(),
        })
    }
}
