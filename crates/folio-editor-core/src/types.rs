//! Core editor types: selections and position mapping.
//!
//! Selections are always constructed against a specific document version and
//! are mapped through every step of a transaction, so a selection held by an
//! [`crate::EditorState`] is valid for that state's document.

use crate::node::Node;

/// Which side a position sticks to when content is inserted exactly at it.
///
/// `Before` stays in front of the inserted content, `After` moves past it.
#[derive(Clone, Debug, Copy, PartialEq, Eq, Default)]
pub enum Affinity {
    Before,
    #[default]
    After,
}

/// Text selection with anchor and head positions.
///
/// The anchor is where the selection started, the head is where the cursor is now.
/// They may be in any order - use `start()` and `end()` for ordered bounds.
#[derive(Clone, Debug, Copy, PartialEq, Eq)]
pub struct TextSelection {
    /// Where selection started
    pub anchor: usize,
    /// Where cursor is now
    pub head: usize,
}

impl TextSelection {
    pub fn new(anchor: usize, head: usize) -> Self {
        Self { anchor, head }
    }

    /// Create a collapsed selection (cursor position).
    pub fn collapsed(offset: usize) -> Self {
        Self {
            anchor: offset,
            head: offset,
        }
    }

    pub fn start(&self) -> usize {
        self.anchor.min(self.head)
    }

    pub fn end(&self) -> usize {
        self.anchor.max(self.head)
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.head
    }

    pub fn len(&self) -> usize {
        self.end() - self.start()
    }

    pub fn is_empty(&self) -> bool {
        self.is_collapsed()
    }
}

/// A whole node selected as a unit.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeSelection {
    /// Position directly before the node.
    pub pos: usize,
    pub node: Node,
}

/// The editor selection.
#[derive(Clone, Debug, PartialEq)]
pub enum Selection {
    Node(NodeSelection),
    Text(TextSelection),
}

impl Selection {
    /// Select the node starting at `pos`. Text nodes cannot be node-selected.
    pub fn node_at(doc: &Node, pos: usize) -> Option<Selection> {
        let node = doc.node_at(pos)?;
        if node.is_text() {
            return None;
        }
        Some(Selection::Node(NodeSelection {
            pos,
            node: node.clone(),
        }))
    }

    /// A text selection, clamped into the document.
    pub fn text(doc: &Node, anchor: usize, head: usize) -> Selection {
        let size = doc.content_size();
        Selection::Text(TextSelection::new(anchor.min(size), head.min(size)))
    }

    /// The closest collapsed cursor to `pos` that sits inside a textblock.
    /// Falls back to `pos` clamped into the document when there is none.
    pub fn near(doc: &Node, pos: usize) -> Selection {
        let size = doc.content_size();
        let pos = pos.min(size);
        let valid = |p: usize| {
            doc.resolve(p)
                .is_ok_and(|rp| rp.parent().is_textblock())
        };
        for dist in 0..=size {
            if pos + dist <= size && valid(pos + dist) {
                return Selection::Text(TextSelection::collapsed(pos + dist));
            }
            if dist <= pos && valid(pos - dist) {
                return Selection::Text(TextSelection::collapsed(pos - dist));
            }
        }
        Selection::Text(TextSelection::collapsed(pos))
    }

    /// First cursor position in the document.
    pub fn at_start(doc: &Node) -> Selection {
        Selection::near(doc, 0)
    }

    /// The selected node, for node selections.
    pub fn node(&self) -> Option<&NodeSelection> {
        match self {
            Selection::Node(sel) => Some(sel),
            Selection::Text(_) => None,
        }
    }

    pub fn from(&self) -> usize {
        match self {
            Selection::Node(sel) => sel.pos,
            Selection::Text(sel) => sel.start(),
        }
    }

    pub fn to(&self) -> usize {
        match self {
            Selection::Node(sel) => sel.pos + sel.node.node_size(),
            Selection::Text(sel) => sel.end(),
        }
    }

    /// Map through one step into `doc`, the document the step produced.
    ///
    /// A node selection whose node was removed collapses to the nearest
    /// text position.
    pub fn map(&self, doc: &Node, map: &StepMap) -> Selection {
        match self {
            Selection::Node(sel) => {
                let end = sel.pos + sel.node.node_size();
                if map.deletes(sel.pos, end) {
                    return Selection::near(doc, map.map(sel.pos, Affinity::Before));
                }
                let pos = map.map(sel.pos, Affinity::After);
                Selection::node_at(doc, pos)
                    .unwrap_or_else(|| Selection::near(doc, pos))
            }
            Selection::Text(sel) => Selection::text(
                doc,
                map.map(sel.anchor, Affinity::After),
                map.map(sel.head, Affinity::After),
            ),
        }
    }
}

/// The position effect of one step: `deleted` chars at `pos` were replaced
/// by `inserted` chars.
#[derive(Clone, Debug, Copy, PartialEq, Eq, Default)]
pub struct StepMap {
    pub pos: usize,
    pub deleted: usize,
    pub inserted: usize,
}

impl StepMap {
    /// A step that leaves every position where it was.
    pub fn identity() -> Self {
        Self::default()
    }

    pub fn new(pos: usize, deleted: usize, inserted: usize) -> Self {
        Self {
            pos,
            deleted,
            inserted,
        }
    }

    pub fn map(&self, pos: usize, affinity: Affinity) -> usize {
        let start = self.pos;
        let end = self.pos + self.deleted;
        if pos < start || (self.deleted == 0 && self.inserted == 0) {
            return pos;
        }
        if pos > end {
            return pos + self.inserted - self.deleted;
        }
        let side = if self.deleted == 0 {
            affinity
        } else if pos == start {
            Affinity::Before
        } else if pos == end {
            Affinity::After
        } else {
            affinity
        };
        match side {
            Affinity::Before => start,
            Affinity::After => start + self.inserted,
        }
    }

    /// True when the deleted range overlaps `from..to`.
    pub fn deletes(&self, from: usize, to: usize) -> bool {
        self.deleted > 0 && self.pos < to && self.pos + self.deleted > from
    }
}
