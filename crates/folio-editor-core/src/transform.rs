//! Steps and transactions.
//!
//! A [`Transaction`] starts from an [`EditorState`] and accumulates steps.
//! Each step produces a new document version; the base document is never
//! touched. The selection is mapped through every step.

use smol_str::SmolStr;

use crate::error::StepError;
use crate::node::Node;
use crate::schema::Schema;
use crate::state::EditorState;
use crate::types::{Selection, StepMap};
use crate::value::AttrMap;

/// An atomic document change.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Replace the attributes of the node starting at `pos`.
    SetAttrs { pos: usize, attrs: AttrMap },
    /// Replace `from..to` with `nodes`. Both ends must share a parent.
    Replace {
        from: usize,
        to: usize,
        nodes: Vec<Node>,
    },
}

impl Step {
    pub fn apply(&self, doc: &Node, schema: &Schema) -> Result<Node, StepError> {
        match self {
            Step::SetAttrs { pos, attrs } => doc.replace_node_at(*pos, |node| {
                schema.with_attrs(node, attrs.clone()).map_err(Into::into)
            }),
            Step::Replace { from, to, nodes } => replace(doc, schema, *from, *to, nodes),
        }
    }

    pub fn map(&self) -> StepMap {
        match self {
            Step::SetAttrs { .. } => StepMap::identity(),
            Step::Replace { from, to, nodes } => StepMap::new(
                *from,
                to - from,
                nodes.iter().map(Node::node_size).sum(),
            ),
        }
    }

    pub fn name(&self) -> SmolStr {
        match self {
            Step::SetAttrs { .. } => SmolStr::new_static("setAttrs"),
            Step::Replace { .. } => SmolStr::new_static("replace"),
        }
    }
}

fn replace(
    doc: &Node,
    schema: &Schema,
    from: usize,
    to: usize,
    nodes: &[Node],
) -> Result<Node, StepError> {
    if from > to {
        return Err(StepError::CrossesBoundary { from, to });
    }
    let rfrom = doc.resolve(from)?;
    let rto = doc.resolve(to)?;
    if !rfrom.same_parent(&rto) {
        return Err(StepError::CrossesBoundary { from, to });
    }

    let parent = rfrom.parent();
    let mut content = parent.cut_content(0, rfrom.parent_offset());
    content.extend(nodes.iter().cloned());
    content.extend(parent.cut_content(rto.parent_offset(), parent.content_size()));

    let mut node = schema.with_content(parent, content)?;
    for entry in rfrom.path()[..rfrom.depth()].iter().rev() {
        node = entry.node.with_child(entry.index, node);
    }
    Ok(node)
}

/// A batch of steps applied on top of one document version.
#[derive(Debug, Clone)]
pub struct Transaction {
    before: Node,
    doc: Node,
    steps: Vec<Step>,
    selection: Selection,
}

impl Transaction {
    pub fn new(state: &EditorState) -> Self {
        Self {
            before: state.doc().clone(),
            doc: state.doc().clone(),
            steps: Vec::new(),
            selection: state.selection().clone(),
        }
    }

    /// Apply a step. On error the transaction is unchanged.
    pub fn step(&mut self, step: Step, schema: &Schema) -> Result<&mut Self, StepError> {
        let doc = step.apply(&self.doc, schema)?;
        let map = step.map();
        self.selection = self.selection.map(&doc, &map);
        tracing::trace!(step = %step.name(), ?map, "applied step");
        self.doc = doc;
        self.steps.push(step);
        Ok(self)
    }

    /// Set the full attribute map of the node at `pos`. Unlisted attributes
    /// fall back to their defaults.
    pub fn set_node_attrs(
        &mut self,
        pos: usize,
        attrs: AttrMap,
        schema: &Schema,
    ) -> Result<&mut Self, StepError> {
        self.step(Step::SetAttrs { pos, attrs }, schema)
    }

    pub fn replace_with(
        &mut self,
        from: usize,
        to: usize,
        nodes: Vec<Node>,
        schema: &Schema,
    ) -> Result<&mut Self, StepError> {
        self.step(Step::Replace { from, to, nodes }, schema)
    }

    pub fn delete(&mut self, from: usize, to: usize, schema: &Schema) -> Result<&mut Self, StepError> {
        self.replace_with(from, to, Vec::new(), schema)
    }

    /// Override the mapped selection. Must be valid for [`Transaction::doc`].
    pub fn set_selection(&mut self, selection: Selection) -> &mut Self {
        self.selection = selection;
        self
    }

    /// Document the transaction was started from.
    pub fn before(&self) -> &Node {
        &self.before
    }

    /// Current document.
    pub fn doc(&self) -> &Node {
        &self.doc
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn doc_changed(&self) -> bool {
        !self.steps.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::default_schema;
    use crate::value::{Value, attrs};

    fn state(schema: &Schema) -> EditorState {
        let image = schema.construct("image", attrs([("src", "a.png")])).unwrap();
        let para = schema
            .node(
                "paragraph",
                AttrMap::new(),
                vec![schema.text("hello", vec![]).unwrap(), image],
                vec![],
            )
            .unwrap();
        let doc = schema.node("doc", AttrMap::new(), vec![para], vec![]).unwrap();
        EditorState::new(doc)
    }

    #[test]
    fn test_set_attrs_keeps_base() {
        let schema = default_schema().unwrap();
        let state = state(&schema);
        let mut tr = Transaction::new(&state);
        tr.set_node_attrs(6, attrs([("src", "b.png")]), &schema).unwrap();

        assert_eq!(tr.doc().node_at(6).unwrap().attr_str("src"), Some("b.png"));
        assert_eq!(state.doc().node_at(6).unwrap().attr_str("src"), Some("a.png"));
        assert!(tr.before().ptr_eq(state.doc()));
        assert_eq!(tr.doc().node_at(6).unwrap().attr("alt"), Some(&Value::Null));
    }

    #[test]
    fn test_replace_splits_text() {
        let schema = default_schema().unwrap();
        let state = state(&schema);
        let mut tr = Transaction::new(&state);
        let x = schema.text("XY", vec![]).unwrap();
        tr.replace_with(3, 5, vec![x], &schema).unwrap();
        assert_eq!(tr.doc().text_content(), "heXYo");
        assert_eq!(tr.doc().content_size(), 8);
    }

    #[test]
    fn test_replace_rejects_invalid_content() {
        let schema = default_schema().unwrap();
        let state = state(&schema);
        let mut tr = Transaction::new(&state);
        let para = schema.node("paragraph", AttrMap::new(), vec![], vec![]).unwrap();
        let err = tr.replace_with(2, 2, vec![para], &schema).unwrap_err();
        assert!(matches!(err, StepError::Schema(_)));
        assert!(!tr.doc_changed());
    }

    #[test]
    fn test_replace_across_parents_fails() {
        let schema = default_schema().unwrap();
        let state = state(&schema);
        let mut tr = Transaction::new(&state);
        let err = tr.delete(2, 8, &schema).unwrap_err();
        assert_eq!(err, StepError::CrossesBoundary { from: 2, to: 8 });
    }

    #[test]
    fn test_node_selection_collapses_when_deleted() {
        let schema = default_schema().unwrap();
        let state = state(&schema);
        let sel = Selection::node_at(state.doc(), 6).unwrap();
        let state = state.with_selection(sel);
        let mut tr = Transaction::new(&state);
        tr.delete(6, 7, &schema).unwrap();
        assert_eq!(
            tr.selection(),
            &Selection::Text(crate::types::TextSelection::collapsed(6))
        );
    }
}
