//! Immutable document nodes and position arithmetic.
//!
//! Positions are counted in chars (Unicode scalar values, NOT bytes):
//! a text node is as long as its text, a leaf node has size 1, and every
//! other node has size `content size + 2` (its opening and closing token).
//! Position 0 is the start of the document's content.

use std::fmt;
use std::sync::Arc;

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use smol_str::SmolStr;

use crate::error::StepError;
use crate::value::{AttrMap, Value};

#[derive(Debug, PartialEq)]
pub(crate) struct NodeData {
    pub(crate) node_type: SmolStr,
    pub(crate) attrs: AttrMap,
    pub(crate) content: Vec<Node>,
    pub(crate) marks: Vec<SmolStr>,
    pub(crate) text: Option<SmolStr>,
    pub(crate) leaf: bool,
    pub(crate) inline: bool,
    pub(crate) textblock: bool,
}

/// A document node. Cloning is cheap; the data behind it never changes.
///
/// Nodes are only built through [`crate::schema::Schema`], which guarantees
/// complete attribute maps and valid children.
#[derive(Clone, PartialEq)]
pub struct Node(Arc<NodeData>);

impl Node {
    pub(crate) fn from_data(data: NodeData) -> Self {
        Self(Arc::new(data))
    }

    pub fn node_type(&self) -> &str {
        &self.0.node_type
    }

    pub fn attrs(&self) -> &AttrMap {
        &self.0.attrs
    }

    pub fn attr(&self, name: &str) -> Option<&Value> {
        self.0.attrs.get(name)
    }

    /// String attribute, `None` when null or absent.
    pub fn attr_str(&self, name: &str) -> Option<&str> {
        self.attr(name).and_then(Value::as_str)
    }

    pub fn attr_int(&self, name: &str) -> Option<i64> {
        self.attr(name).and_then(Value::as_int)
    }

    pub fn content(&self) -> &[Node] {
        &self.0.content
    }

    pub fn child(&self, index: usize) -> Option<&Node> {
        self.0.content.get(index)
    }

    pub fn child_count(&self) -> usize {
        self.0.content.len()
    }

    pub fn marks(&self) -> &[SmolStr] {
        &self.0.marks
    }

    pub fn has_mark(&self, mark: &str) -> bool {
        self.0.marks.iter().any(|m| m == mark)
    }

    pub fn text(&self) -> Option<&str> {
        self.0.text.as_deref()
    }

    pub fn is_text(&self) -> bool {
        self.0.text.is_some()
    }

    pub fn is_leaf(&self) -> bool {
        self.0.leaf
    }

    pub fn is_inline(&self) -> bool {
        self.0.inline
    }

    pub fn is_block(&self) -> bool {
        !self.0.inline
    }

    pub fn is_textblock(&self) -> bool {
        self.0.textblock
    }

    /// Reference equality: both handles point at the same data.
    pub fn ptr_eq(&self, other: &Node) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub fn node_size(&self) -> usize {
        match &self.0.text {
            Some(text) => text.chars().count(),
            None if self.0.leaf => 1,
            None => self.content_size() + 2,
        }
    }

    pub fn content_size(&self) -> usize {
        self.0.content.iter().map(Node::node_size).sum()
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self) -> String {
        match &self.0.text {
            Some(text) => text.to_string(),
            None => self.0.content.iter().map(Node::text_content).collect(),
        }
    }

    /// Text between two content offsets of this node. Inline leaves are
    /// represented by `leaf_text`.
    pub fn text_between(&self, from: usize, to: usize, leaf_text: &str) -> String {
        let mut out = String::new();
        let mut pos = 0;
        for child in self.content() {
            let end = pos + child.node_size();
            if end > from && pos < to {
                match child.text() {
                    Some(text) => {
                        let start = from.saturating_sub(pos);
                        let stop = to.min(end) - pos;
                        out.extend(text.chars().skip(start).take(stop - start));
                    }
                    None if child.is_leaf() => out.push_str(leaf_text),
                    None => {
                        let inner_from = from.saturating_sub(pos + 1);
                        let inner_to = (to - pos).saturating_sub(1).min(child.content_size());
                        out.push_str(&child.text_between(inner_from, inner_to, leaf_text));
                    }
                }
            }
            pos = end;
        }
        out
    }

    /// Visit every descendant in document order with its start position.
    pub fn descendants(&self, f: &mut impl FnMut(&Node, usize)) {
        self.descendants_from(0, f);
    }

    fn descendants_from(&self, start: usize, f: &mut impl FnMut(&Node, usize)) {
        let mut pos = start;
        for child in self.content() {
            f(child, pos);
            if !child.is_text() && !child.is_leaf() {
                child.descendants_from(pos + 1, f);
            }
            pos += child.node_size();
        }
    }

    /// Index of the child containing content offset `pos`, and that child's
    /// start offset. At the end of the content returns `(child_count, size)`.
    fn find_index(&self, pos: usize) -> Result<(usize, usize), StepError> {
        let mut cur = 0;
        for (index, child) in self.content().iter().enumerate() {
            let end = cur + child.node_size();
            if end > pos {
                return Ok((index, cur));
            }
            cur = end;
        }
        if pos == cur {
            Ok((self.child_count(), cur))
        } else {
            Err(StepError::PositionOutOfRange {
                pos,
                size: cur,
            })
        }
    }

    /// The node starting exactly at `pos`, if any.
    pub fn node_at(&self, mut pos: usize) -> Option<&Node> {
        let mut node = self;
        loop {
            let (index, offset) = node.find_index(pos).ok()?;
            let child = node.child(index)?;
            if offset == pos || child.is_text() {
                return Some(child);
            }
            pos -= offset + 1;
            node = child;
        }
    }

    /// Resolve a position into its ancestor path.
    pub fn resolve(&self, pos: usize) -> Result<ResolvedPos, StepError> {
        let size = self.content_size();
        if pos > size {
            return Err(StepError::PositionOutOfRange { pos, size });
        }

        let mut path = Vec::new();
        let mut node = self.clone();
        let mut start = 0;
        let mut parent_offset = pos;
        loop {
            let (index, offset) = node.find_index(parent_offset)?;
            let rem = parent_offset - offset;
            path.push(PathEntry {
                node: node.clone(),
                index,
                start,
            });
            if rem == 0 {
                break;
            }
            let Some(child) = node.child(index).cloned() else {
                break;
            };
            if child.is_text() || child.is_leaf() {
                break;
            }
            parent_offset = rem - 1;
            start += offset + 1;
            node = child;
        }
        Ok(ResolvedPos { pos, path })
    }

    /// Copy-on-write replacement of the non-text node starting at `pos`.
    pub(crate) fn replace_node_at(
        &self,
        pos: usize,
        replace: impl FnOnce(&Node) -> Result<Node, StepError>,
    ) -> Result<Node, StepError> {
        let (index, offset) = self.find_index(pos)?;
        let child = self.child(index).ok_or(StepError::NoNodeAt(pos))?;
        if offset == pos {
            if child.is_text() {
                return Err(StepError::NoNodeAt(pos));
            }
            let replaced = replace(child)?;
            return Ok(self.with_child(index, replaced));
        }
        if child.is_text() || child.is_leaf() {
            return Err(StepError::NoNodeAt(pos));
        }
        let replaced = child.replace_node_at(pos - offset - 1, replace)?;
        Ok(self.with_child(index, replaced))
    }

    /// Same node with child `index` swapped. Untouched children are shared.
    pub(crate) fn with_child(&self, index: usize, child: Node) -> Node {
        let mut content = self.0.content.clone();
        content[index] = child;
        self.with_content_unchecked(content)
    }

    pub(crate) fn with_content_unchecked(&self, content: Vec<Node>) -> Node {
        Node::from_data(NodeData {
            node_type: self.0.node_type.clone(),
            attrs: self.0.attrs.clone(),
            content,
            marks: self.0.marks.clone(),
            text: None,
            leaf: self.0.leaf,
            inline: self.0.inline,
            textblock: self.0.textblock,
        })
    }

    pub(crate) fn with_text(&self, text: &str) -> Node {
        Node::from_data(NodeData {
            node_type: self.0.node_type.clone(),
            attrs: AttrMap::new(),
            content: Vec::new(),
            marks: self.0.marks.clone(),
            text: Some(SmolStr::new(text)),
            leaf: true,
            inline: true,
            textblock: false,
        })
    }

    /// The children between two content offsets, splitting text nodes.
    pub(crate) fn cut_content(&self, from: usize, to: usize) -> Vec<Node> {
        let mut out = Vec::new();
        let mut pos = 0;
        for child in self.content() {
            let end = pos + child.node_size();
            if end > from && pos < to {
                match child.text() {
                    Some(text) if pos < from || end > to => {
                        let start = from.saturating_sub(pos);
                        let stop = to.min(end) - pos;
                        let piece: String = text.chars().skip(start).take(stop - start).collect();
                        out.push(child.with_text(&piece));
                    }
                    _ => out.push(child.clone()),
                }
            }
            pos = end;
        }
        out
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(text) = &self.0.text {
            if self.0.marks.is_empty() {
                return write!(f, "{text:?}");
            }
            return write!(f, "{:?}{text:?}", self.0.marks);
        }
        write!(f, "{}", self.0.node_type)?;
        let set: AttrMap = self
            .0
            .attrs
            .iter()
            .filter(|(_, v)| !v.is_null())
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        if !set.is_empty() {
            write!(f, "{set:?}")?;
        }
        if !self.0.content.is_empty() {
            f.debug_list().entries(self.0.content.iter()).finish()?;
        }
        Ok(())
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if let Some(text) = &self.0.text {
            let mut s = serializer.serialize_struct("Node", 3)?;
            s.serialize_field("type", &self.0.node_type)?;
            s.serialize_field("text", text)?;
            s.serialize_field("marks", &self.0.marks)?;
            return s.end();
        }
        let mut s = serializer.serialize_struct("Node", 3)?;
        s.serialize_field("type", &self.0.node_type)?;
        s.serialize_field("attrs", &self.0.attrs)?;
        s.serialize_field("content", &self.0.content)?;
        s.end()
    }
}

#[derive(Debug, Clone)]
pub struct PathEntry {
    pub node: Node,
    /// Index of the child the position falls into (or sits before).
    pub index: usize,
    /// Absolute position where `node`'s content starts.
    pub start: usize,
}

/// A position together with its ancestors.
#[derive(Debug, Clone)]
pub struct ResolvedPos {
    pub pos: usize,
    path: Vec<PathEntry>,
}

impl ResolvedPos {
    /// Depth of the innermost ancestor; the document is depth 0.
    pub fn depth(&self) -> usize {
        self.path.len() - 1
    }

    pub fn parent(&self) -> &Node {
        &self.path[self.depth()].node
    }

    /// Absolute start of the parent's content.
    pub fn start(&self) -> usize {
        self.path[self.depth()].start
    }

    pub fn parent_offset(&self) -> usize {
        self.pos - self.start()
    }

    pub fn index(&self) -> usize {
        self.path[self.depth()].index
    }

    pub fn path(&self) -> &[PathEntry] {
        &self.path
    }

    pub fn same_parent(&self, other: &ResolvedPos) -> bool {
        self.depth() == other.depth()
            && self.start() == other.start()
            && self.parent().ptr_eq(other.parent())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::default_schema;
    use crate::schema::Schema;
    use crate::value::attrs;

    // doc(paragraph("ab", image, "cd"), paragraph("ef"))
    fn sample(schema: &Schema) -> Node {
        let image = schema.construct("image", attrs([("src", "x.png")])).unwrap();
        let p1 = schema
            .node(
                "paragraph",
                AttrMap::new(),
                vec![
                    schema.text("ab", vec![]).unwrap(),
                    image,
                    schema.text("cd", vec![]).unwrap(),
                ],
                vec![],
            )
            .unwrap();
        let p2 = schema
            .node(
                "paragraph",
                AttrMap::new(),
                vec![schema.text("ef", vec![]).unwrap()],
                vec![],
            )
            .unwrap();
        schema.node("doc", AttrMap::new(), vec![p1, p2], vec![]).unwrap()
    }

    #[test]
    fn test_sizes() {
        let schema = default_schema().unwrap();
        let doc = sample(&schema);
        assert_eq!(doc.child(0).unwrap().node_size(), 7);
        assert_eq!(doc.child(1).unwrap().node_size(), 4);
        assert_eq!(doc.content_size(), 11);
    }

    #[test]
    fn test_node_at() {
        let schema = default_schema().unwrap();
        let doc = sample(&schema);
        assert_eq!(doc.node_at(0).unwrap().node_type(), "paragraph");
        assert_eq!(doc.node_at(3).unwrap().node_type(), "image");
        assert_eq!(doc.node_at(7).unwrap().node_type(), "paragraph");
        assert_eq!(doc.node_at(2).unwrap().text(), Some("ab"));
        assert!(doc.node_at(11).is_none());
    }

    #[test]
    fn test_resolve() {
        let schema = default_schema().unwrap();
        let doc = sample(&schema);

        let rp = doc.resolve(4).unwrap();
        assert_eq!(rp.depth(), 1);
        assert_eq!(rp.parent().node_type(), "paragraph");
        assert_eq!(rp.start(), 1);
        assert_eq!(rp.parent_offset(), 3);

        let rp = doc.resolve(7).unwrap();
        assert_eq!(rp.depth(), 0);
        assert_eq!(rp.index(), 1);

        assert!(doc.resolve(12).is_err());
    }

    #[test]
    fn test_descendants() {
        let schema = default_schema().unwrap();
        let doc = sample(&schema);
        let mut seen = Vec::new();
        doc.descendants(&mut |node, pos| seen.push((node.node_type().to_owned(), pos)));
        let expected = [
            ("paragraph", 0),
            ("text", 1),
            ("image", 3),
            ("text", 4),
            ("paragraph", 7),
            ("text", 8),
        ];
        assert_eq!(
            seen,
            expected.map(|(t, p)| (t.to_owned(), p)).to_vec()
        );
    }

    #[test]
    fn test_text_between() {
        let schema = default_schema().unwrap();
        let doc = sample(&schema);
        let para = doc.child(0).unwrap();
        assert_eq!(para.text_between(0, 5, "\u{fffc}"), "ab\u{fffc}cd");
        assert_eq!(para.text_between(1, 4, "*"), "b*c");
        assert_eq!(doc.text_between(0, 11, "*"), "ab*cdef");
    }

    #[test]
    fn test_replace_shares_untouched_subtrees() {
        let schema = default_schema().unwrap();
        let doc = sample(&schema);
        let updated = doc
            .replace_node_at(3, |image| {
                schema
                    .with_attrs(image, attrs([("src", "y.png")]))
                    .map_err(Into::into)
            })
            .unwrap();
        assert_eq!(updated.node_at(3).unwrap().attr_str("src"), Some("y.png"));
        assert_eq!(doc.node_at(3).unwrap().attr_str("src"), Some("x.png"));
        assert!(updated.child(1).unwrap().ptr_eq(doc.child(1).unwrap()));
        assert!(!updated.child(0).unwrap().ptr_eq(doc.child(0).unwrap()));
    }

    #[test]
    fn test_cut_content_splits_text() {
        let schema = default_schema().unwrap();
        let doc = sample(&schema);
        let para = doc.child(0).unwrap();
        let cut = para.cut_content(1, 4);
        assert_eq!(cut.len(), 3);
        assert_eq!(cut[0].text(), Some("b"));
        assert_eq!(cut[1].node_type(), "image");
        assert_eq!(cut[2].text(), Some("c"));
    }
}
