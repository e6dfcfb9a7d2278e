//! Schema registry: node types, mark types, attribute rules and parse rules.
//!
//! A [`Schema`] is built once (usually through [`crate::nodes::default_schema`])
//! and then shared read-only by the importers, exporters and the command engine.

mod content;

use std::collections::HashMap;

use smol_str::SmolStr;

pub use content::ContentExpr;

use crate::actions::EditorCommand;
use crate::dom::{DomNode, Element, Selector};
use crate::error::SchemaError;
use crate::input_rules::InputRule;
use crate::markdown::{MarkdownSerializer, MarkdownToken};
use crate::node::{Node, NodeData};
use crate::state::EditorState;
use crate::transform::Transaction;
use crate::value::{AttrMap, Value};

/// Attribute value check. Returns true when the value is acceptable.
pub type Validator = fn(&Value) -> bool;

/// Builds raw attributes from a markdown token.
pub type MarkdownAttrsFn = fn(&MarkdownToken) -> AttrMap;

/// Builds raw attributes from an element, or `None` when the rule does not apply.
pub type DomAttrsFn = fn(&Element) -> Option<AttrMap>;

/// Writes a node as markdown.
pub type MarkdownSerializeFn = fn(&mut MarkdownSerializer<'_>, &Node);

/// Renders a node as an element tree.
pub type DomRenderFn = fn(&Node, &Schema) -> DomNode;

/// Runs a command against the selected node of this type.
pub type CommandHandler = fn(&EditorCommand, &EditorState, &Schema) -> Option<Transaction>;

/// Declaration of one attribute.
#[derive(Debug, Clone)]
pub struct AttrSpec {
    /// `None` makes the attribute required.
    pub default: Option<Value>,
    pub validate: Option<Validator>,
}

impl AttrSpec {
    pub fn with_default(default: impl Into<Value>) -> Self {
        Self {
            default: Some(default.into()),
            validate: None,
        }
    }

    pub fn required() -> Self {
        Self {
            default: None,
            validate: None,
        }
    }

    pub fn validate(mut self, validator: Validator) -> Self {
        self.validate = Some(validator);
        self
    }

    pub fn accepts(&self, value: &Value) -> bool {
        self.validate.is_none_or(|check| check(value))
    }
}

/// Common attribute validators.
pub mod validators {
    use crate::value::Value;

    pub fn string(v: &Value) -> bool {
        matches!(v, Value::Str(_))
    }

    pub fn optional_string(v: &Value) -> bool {
        matches!(v, Value::Str(_) | Value::Null)
    }

    /// A non-negative integer, or null.
    pub fn optional_dimension(v: &Value) -> bool {
        match v {
            Value::Null => true,
            Value::Int(i) => *i >= 0,
            _ => false,
        }
    }
}

/// Which marks a node's children may carry.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AllowedMarks {
    #[default]
    All,
    None,
    Only(Vec<SmolStr>),
}

impl AllowedMarks {
    pub fn allows(&self, mark: &str) -> bool {
        match self {
            AllowedMarks::All => true,
            AllowedMarks::None => false,
            AllowedMarks::Only(marks) => marks.iter().any(|m| m == mark),
        }
    }
}

/// Markdown-token parse rule.
#[derive(Debug, Clone)]
pub struct MarkdownParseRule {
    /// Token name this rule consumes, e.g. `"image"`.
    pub token: &'static str,
    pub get_attrs: MarkdownAttrsFn,
}

/// Element-tree parse rule. Rules are tried in order and the first one
/// whose selector matches and whose `get_attrs` returns `Some` wins.
#[derive(Debug, Clone)]
pub struct DomParseRule {
    pub selector: Selector,
    pub get_attrs: DomAttrsFn,
}

/// Declaration of a mark type.
#[derive(Debug, Clone)]
pub struct MarkSpec {
    /// Markdown delimiters.
    pub open: &'static str,
    pub close: &'static str,
    /// Content inside the mark is written verbatim (code spans).
    pub verbatim: bool,
    /// Element tags that parse to this mark; the first is used for rendering.
    pub dom_tags: &'static [&'static str],
}

/// Everything the registry knows about one node type.
#[derive(Debug, Clone)]
pub struct NodeTypeSpec {
    pub attrs: Vec<(SmolStr, AttrSpec)>,
    pub content: SmolStr,
    pub marks: AllowedMarks,
    pub group: Option<SmolStr>,
    pub inline: bool,
    /// Attribute naming a fetchable resource (enables the download command).
    pub resource_attr: Option<&'static str>,
    pub markdown_rules: Vec<MarkdownParseRule>,
    pub dom_rules: Vec<DomParseRule>,
    pub input_rules: Vec<InputRule>,
    pub to_markdown: Option<MarkdownSerializeFn>,
    pub to_dom: Option<DomRenderFn>,
    pub commands: Option<CommandHandler>,
}

impl NodeTypeSpec {
    pub fn new(content: &str) -> Self {
        Self {
            attrs: Vec::new(),
            content: SmolStr::new(content),
            marks: AllowedMarks::All,
            group: None,
            inline: false,
            resource_attr: None,
            markdown_rules: Vec::new(),
            dom_rules: Vec::new(),
            input_rules: Vec::new(),
            to_markdown: None,
            to_dom: None,
            commands: None,
        }
    }

    pub fn attr(mut self, name: &str, spec: AttrSpec) -> Self {
        self.attrs.push((SmolStr::new(name), spec));
        self
    }

    pub fn group(mut self, group: &str) -> Self {
        self.group = Some(SmolStr::new(group));
        self
    }

    pub fn inline(mut self) -> Self {
        self.inline = true;
        self
    }

    pub fn marks(mut self, marks: AllowedMarks) -> Self {
        self.marks = marks;
        self
    }

    pub fn attr_spec(&self, name: &str) -> Option<&AttrSpec> {
        self.attrs.iter().find(|(n, _)| n == name).map(|(_, s)| s)
    }
}

/// A registered node type.
#[derive(Debug, Clone)]
pub struct NodeType {
    pub name: SmolStr,
    pub spec: NodeTypeSpec,
    pub content: ContentExpr,
}

impl NodeType {
    pub fn is_leaf(&self) -> bool {
        self.content.is_empty()
    }
}

/// The registry.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    nodes: Vec<NodeType>,
    by_name: HashMap<SmolStr, usize>,
    marks: Vec<(SmolStr, MarkSpec)>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node type. Registration order is also rule priority order.
    pub fn register(&mut self, name: &str, spec: NodeTypeSpec) -> Result<(), SchemaError> {
        if self.by_name.contains_key(name) {
            return Err(SchemaError::DuplicateType(SmolStr::new(name)));
        }
        let content = ContentExpr::parse(&spec.content)?;
        tracing::trace!(node_type = name, content = %spec.content, "registering node type");
        self.by_name.insert(SmolStr::new(name), self.nodes.len());
        self.nodes.push(NodeType {
            name: SmolStr::new(name),
            spec,
            content,
        });
        Ok(())
    }

    pub fn register_mark(&mut self, name: &str, spec: MarkSpec) -> Result<(), SchemaError> {
        if self.marks.iter().any(|(n, _)| n == name) {
            return Err(SchemaError::DuplicateMark(SmolStr::new(name)));
        }
        self.marks.push((SmolStr::new(name), spec));
        Ok(())
    }

    pub fn resolve(&self, name: &str) -> Result<&NodeTypeSpec, SchemaError> {
        self.node_type(name).map(|t| &t.spec)
    }

    pub fn node_type(&self, name: &str) -> Result<&NodeType, SchemaError> {
        self.by_name
            .get(name)
            .map(|&idx| &self.nodes[idx])
            .ok_or_else(|| SchemaError::UnknownType(SmolStr::new(name)))
    }

    /// Node types in registration order.
    pub fn node_types(&self) -> impl Iterator<Item = &NodeType> {
        self.nodes.iter()
    }

    pub fn mark(&self, name: &str) -> Result<&MarkSpec, SchemaError> {
        self.marks
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, s)| s)
            .ok_or_else(|| SchemaError::UnknownMark(SmolStr::new(name)))
    }

    /// Mark types in registration order.
    pub fn marks(&self) -> impl Iterator<Item = (&SmolStr, &MarkSpec)> {
        self.marks.iter().map(|(n, s)| (n, s))
    }

    fn mark_rank(&self, name: &str) -> usize {
        self.marks
            .iter()
            .position(|(n, _)| n == name)
            .unwrap_or(usize::MAX)
    }

    /// Construct a leaf-compatible node with no children.
    ///
    /// Unspecified attributes take their defaults; supplied values must pass
    /// their validator.
    pub fn construct(&self, name: &str, raw: AttrMap) -> Result<Node, SchemaError> {
        self.node(name, raw, Vec::new(), Vec::new())
    }

    /// Like [`Schema::construct`], but invalid supplied values fall back to
    /// the attribute default. Used by importers, which never fail on input.
    pub fn construct_lenient(&self, name: &str, raw: AttrMap) -> Result<Node, SchemaError> {
        let node_type = self.node_type(name)?;
        let mut cleaned = AttrMap::new();
        for (key, value) in raw {
            match node_type.spec.attr_spec(&key) {
                Some(spec) if !spec.accepts(&value) => {
                    tracing::warn!(
                        node_type = name,
                        attr = %key,
                        %value,
                        "invalid attribute value, using default"
                    );
                }
                _ => {
                    cleaned.insert(key, value);
                }
            }
        }
        self.construct(name, cleaned)
    }

    /// Construct a node with children and marks, validating the content
    /// expression and the marks allowed on the children.
    pub fn node(
        &self,
        name: &str,
        raw: AttrMap,
        content: Vec<Node>,
        marks: Vec<SmolStr>,
    ) -> Result<Node, SchemaError> {
        let node_type = self.node_type(name)?;
        let attrs = self.fill_attrs(node_type, raw)?;
        self.check_content(node_type, &content)?;
        let marks = self.normalize_marks(marks)?;

        Ok(Node::from_data(NodeData {
            node_type: node_type.name.clone(),
            attrs,
            content: join_text(content),
            marks,
            text: None,
            leaf: node_type.is_leaf(),
            inline: node_type.spec.inline,
            textblock: self.is_textblock_type(node_type),
        }))
    }

    /// Construct a text node.
    pub fn text(&self, text: &str, marks: Vec<SmolStr>) -> Result<Node, SchemaError> {
        if text.is_empty() {
            return Err(SchemaError::EmptyText);
        }
        let node_type = self.node_type("text")?;
        let marks = self.normalize_marks(marks)?;
        Ok(Node::from_data(NodeData {
            node_type: node_type.name.clone(),
            attrs: AttrMap::new(),
            content: Vec::new(),
            marks,
            text: Some(SmolStr::new(text)),
            leaf: true,
            inline: true,
            textblock: false,
        }))
    }

    /// Rebuild `node` with new attributes, keeping content and marks.
    pub fn with_attrs(&self, node: &Node, raw: AttrMap) -> Result<Node, SchemaError> {
        if node.is_text() {
            return Ok(node.clone());
        }
        self.node(
            node.node_type(),
            raw,
            node.content().to_vec(),
            node.marks().to_vec(),
        )
    }

    /// Rebuild `node` with new content, keeping attributes and marks.
    pub fn with_content(&self, node: &Node, content: Vec<Node>) -> Result<Node, SchemaError> {
        self.node(
            node.node_type(),
            node.attrs().clone(),
            content,
            node.marks().to_vec(),
        )
    }

    fn fill_attrs(&self, node_type: &NodeType, mut raw: AttrMap) -> Result<AttrMap, SchemaError> {
        let mut attrs = AttrMap::new();
        for (name, spec) in &node_type.spec.attrs {
            let value = match raw.remove(name) {
                Some(value) => {
                    if !spec.accepts(&value) {
                        return Err(SchemaError::InvalidAttribute {
                            node_type: node_type.name.clone(),
                            attr: name.clone(),
                            value,
                        });
                    }
                    value
                }
                None => spec.default.clone().ok_or_else(|| SchemaError::MissingAttribute {
                    node_type: node_type.name.clone(),
                    attr: name.clone(),
                })?,
            };
            attrs.insert(name.clone(), value);
        }
        if !raw.is_empty() {
            tracing::trace!(
                node_type = %node_type.name,
                ignored = ?raw.keys().collect::<Vec<_>>(),
                "ignoring undeclared attributes"
            );
        }
        Ok(attrs)
    }

    fn check_content(&self, node_type: &NodeType, content: &[Node]) -> Result<(), SchemaError> {
        let children = content.iter().map(|child| {
            let group = self
                .node_type(child.node_type())
                .ok()
                .and_then(|t| t.spec.group.as_deref());
            (child.node_type(), group)
        });
        if !node_type.content.matches(children) {
            let found: Vec<&str> = content.iter().map(Node::node_type).collect();
            return Err(SchemaError::InvalidContent {
                node_type: node_type.name.clone(),
                reason: format!(
                    "expected `{}`, found [{}]",
                    node_type.content.source(),
                    found.join(", ")
                ),
            });
        }
        for child in content {
            for mark in child.marks() {
                if !node_type.spec.marks.allows(mark) {
                    return Err(SchemaError::MarkNotAllowed {
                        node_type: node_type.name.clone(),
                        mark: mark.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    fn normalize_marks(&self, mut marks: Vec<SmolStr>) -> Result<Vec<SmolStr>, SchemaError> {
        for mark in &marks {
            self.mark(mark)?;
        }
        marks.sort_by_key(|m| self.mark_rank(m));
        marks.dedup();
        Ok(marks)
    }

    /// Whether nodes of this type hold inline content directly.
    pub fn is_textblock_type(&self, node_type: &NodeType) -> bool {
        !node_type.is_leaf()
            && node_type.content.names().any(|name| {
                name == "text"
                    || name == "inline"
                    || self.node_type(name).is_ok_and(|t| t.spec.inline)
            })
    }
}

/// Merge adjacent text nodes that carry the same marks.
pub(crate) fn join_text(content: Vec<Node>) -> Vec<Node> {
    let mut out: Vec<Node> = Vec::with_capacity(content.len());
    for node in content {
        if let (Some(prev), Some(text)) = (out.last(), node.text()) {
            if let Some(prev_text) = prev.text() {
                if prev.marks() == node.marks() {
                    let merged = format!("{prev_text}{text}");
                    let joined = prev.with_text(&merged);
                    out.pop();
                    out.push(joined);
                    continue;
                }
            }
        }
        out.push(node);
    }
    out
}
