//! Building nodes from element trees.
//!
//! Parse rules come from the schema: node types are visited in registration
//! order and, within a type, rules in declaration order. The first rule whose
//! selector matches and whose attribute extraction succeeds decides the node.

use smol_str::SmolStr;

use super::{DomNode, Element};
use crate::error::SchemaError;
use crate::node::Node;
use crate::schema::Schema;
use crate::value::AttrMap;

/// Tags that end the current paragraph.
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "body", "dd", "div", "dl", "dt", "figure",
    "footer", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main", "nav", "ol",
    "p", "pre", "section", "table", "td", "th", "tr", "ul",
];

pub struct DomParser<'a> {
    schema: &'a Schema,
}

impl<'a> DomParser<'a> {
    pub fn new(schema: &'a Schema) -> Self {
        Self { schema }
    }

    /// Node for a single element, or `None` when no rule recognizes it.
    pub fn parse_element(&self, el: &Element) -> Option<Node> {
        for node_type in self.schema.node_types() {
            for rule in &node_type.spec.dom_rules {
                if !rule.selector.matches(el) {
                    continue;
                }
                let Some(attrs) = (rule.get_attrs)(el) else {
                    tracing::trace!(selector = %rule.selector, "rule matched but extracted nothing");
                    continue;
                };
                tracing::trace!(node_type = %node_type.name, selector = %rule.selector, "dom rule matched");
                let result = if node_type.is_leaf() {
                    self.schema.construct_lenient(&node_type.name, attrs)
                } else {
                    self.build_with_children(&node_type.name, attrs, el)
                };
                match result {
                    Ok(node) => return Some(node),
                    Err(err) => {
                        tracing::debug!(%err, node_type = %node_type.name, "dropping element");
                        return None;
                    }
                }
            }
        }
        None
    }

    fn build_with_children(
        &self,
        name: &str,
        attrs: AttrMap,
        el: &Element,
    ) -> Result<Node, SchemaError> {
        let node_type = self.schema.node_type(name)?;
        let node = self.schema.construct_lenient(name, attrs)?;
        let children = if self.schema.is_textblock_type(node_type) {
            self.parse_inline(&el.children, &[])
        } else {
            self.parse_blocks(&el.children)?
        };
        self.schema.with_content(&node, children)
    }

    /// Parse a whole element tree into a document.
    pub fn parse_document(&self, root: &Element) -> Result<Node, SchemaError> {
        let mut blocks = Vec::new();
        let mut pending = Vec::new();
        self.collect_element(root, &mut blocks, &mut pending)?;
        self.flush(&mut blocks, &mut pending)?;
        if blocks.is_empty() {
            blocks.push(self.schema.node("paragraph", AttrMap::new(), Vec::new(), Vec::new())?);
        }
        self.schema.node("doc", AttrMap::new(), blocks, Vec::new())
    }

    fn parse_blocks(&self, nodes: &[DomNode]) -> Result<Vec<Node>, SchemaError> {
        let mut blocks = Vec::new();
        let mut pending = Vec::new();
        self.collect_blocks(nodes, &mut blocks, &mut pending)?;
        self.flush(&mut blocks, &mut pending)?;
        Ok(blocks)
    }

    fn collect_blocks(
        &self,
        nodes: &[DomNode],
        blocks: &mut Vec<Node>,
        pending: &mut Vec<Node>,
    ) -> Result<(), SchemaError> {
        for dom in nodes {
            match dom {
                DomNode::Text(text) if text.trim().is_empty() => {}
                DomNode::Text(_) => pending.extend(self.parse_inline(std::slice::from_ref(dom), &[])),
                DomNode::Element(el) => self.collect_element(el, blocks, pending)?,
            }
        }
        Ok(())
    }

    fn collect_element(
        &self,
        el: &Element,
        blocks: &mut Vec<Node>,
        pending: &mut Vec<Node>,
    ) -> Result<(), SchemaError> {
        if let Some(node) = self.parse_element(el) {
            if node.is_inline() {
                pending.push(node);
            } else {
                self.flush(blocks, pending)?;
                blocks.push(node);
            }
        } else if let Some(mark) = self.mark_for(&el.tag) {
            pending.extend(self.parse_inline(&el.children, &[mark]));
        } else if el.tag == "br" {
            pending.extend(self.schema.text("\n", Vec::new()));
        } else if BLOCK_TAGS.contains(&el.tag.as_str()) {
            self.flush(blocks, pending)?;
            self.collect_blocks(&el.children, blocks, pending)?;
            self.flush(blocks, pending)?;
        } else {
            self.collect_blocks(&el.children, blocks, pending)?;
        }
        Ok(())
    }

    fn flush(&self, blocks: &mut Vec<Node>, pending: &mut Vec<Node>) -> Result<(), SchemaError> {
        if pending.is_empty() {
            return Ok(());
        }
        let content = std::mem::take(pending);
        blocks.push(self.schema.node("paragraph", AttrMap::new(), content, Vec::new())?);
        Ok(())
    }

    /// Inline content with the given marks active.
    fn parse_inline(&self, nodes: &[DomNode], marks: &[SmolStr]) -> Vec<Node> {
        let mut out = Vec::new();
        for dom in nodes {
            match dom {
                DomNode::Text(text) => {
                    if let Ok(node) = self.schema.text(text, marks.to_vec()) {
                        out.push(node);
                    }
                }
                DomNode::Element(el) if el.tag == "br" => {
                    if let Ok(node) = self.schema.text("\n", marks.to_vec()) {
                        out.push(node);
                    }
                }
                DomNode::Element(el) => {
                    if let Some(mark) = self.mark_for(&el.tag) {
                        let mut inner = marks.to_vec();
                        inner.push(mark);
                        out.extend(self.parse_inline(&el.children, &inner));
                        continue;
                    }
                    match self.parse_element(el) {
                        Some(node) if node.is_inline() => out.push(node),
                        Some(node) => {
                            tracing::debug!(node_type = node.node_type(), "block inside inline content, flattening");
                            out.extend(self.parse_inline(&el.children, marks));
                        }
                        None => out.extend(self.parse_inline(&el.children, marks)),
                    }
                }
            }
        }
        out
    }

    fn mark_for(&self, tag: &str) -> Option<SmolStr> {
        self.schema
            .marks()
            .find(|(_, spec)| spec.dom_tags.contains(&tag))
            .map(|(name, _)| name.clone())
    }
}

/// Leading-digit integer parse: `"100px"` is 100, `"abc"` is nothing.
pub fn parse_int(value: &str) -> Option<i64> {
    let digits: String = value
        .trim_start()
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}
