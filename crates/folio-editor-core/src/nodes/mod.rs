//! Node type descriptors.
//!
//! A node type is a stateless unit struct composed from capabilities:
//! [`Parsable`] (how it is recognized), [`Serializable`] (how it is written)
//! and [`Commandable`] (what commands it answers). [`NodeKind`] ties them
//! together into a [`NodeTypeSpec`] for the registry.

mod basic;
mod media;
mod simple_media;

pub use basic::{Doc, Paragraph, Text};
pub use media::Media;
pub use simple_media::SimpleMedia;

use crate::actions::EditorCommand;
use crate::dom::DomNode;
use crate::error::SchemaError;
use crate::input_rules::InputRule;
use crate::markdown::MarkdownSerializer;
use crate::node::Node;
use crate::schema::{DomParseRule, MarkSpec, MarkdownParseRule, NodeTypeSpec, Schema};
use crate::state::EditorState;
use crate::transform::Transaction;

pub trait Parsable {
    fn markdown_rules() -> Vec<MarkdownParseRule> {
        Vec::new()
    }

    /// Element rules, most specific first.
    fn dom_rules() -> Vec<DomParseRule> {
        Vec::new()
    }

    fn input_rules() -> Vec<InputRule> {
        Vec::new()
    }
}

pub trait Serializable {
    fn to_markdown(s: &mut MarkdownSerializer<'_>, node: &Node);

    fn to_dom(node: &Node, schema: &Schema) -> DomNode;
}

pub trait Commandable {
    /// Transaction for `command` on the selected node of this type, or
    /// `None` when the command does not apply.
    fn handle(_command: &EditorCommand, _state: &EditorState, _schema: &Schema) -> Option<Transaction> {
        None
    }
}

pub trait NodeKind: Parsable + Serializable + Commandable {
    const NAME: &'static str;

    /// Attributes, content, group and flags.
    fn base_spec() -> NodeTypeSpec;

    fn spec() -> NodeTypeSpec {
        let mut spec = Self::base_spec();
        spec.markdown_rules = Self::markdown_rules();
        spec.dom_rules = Self::dom_rules();
        spec.input_rules = Self::input_rules();
        spec.to_markdown = Some(Self::to_markdown);
        spec.to_dom = Some(Self::to_dom);
        spec.commands = Some(Self::handle);
        spec
    }
}

impl Schema {
    pub fn register_kind<K: NodeKind>(&mut self) -> Result<(), SchemaError> {
        self.register(K::NAME, K::spec())
    }
}

fn register_marks(schema: &mut Schema) -> Result<(), SchemaError> {
    schema.register_mark(
        "em",
        MarkSpec {
            open: "*",
            close: "*",
            verbatim: false,
            dom_tags: &["em", "i"],
        },
    )?;
    schema.register_mark(
        "strong",
        MarkSpec {
            open: "**",
            close: "**",
            verbatim: false,
            dom_tags: &["strong", "b"],
        },
    )?;
    schema.register_mark(
        "code",
        MarkSpec {
            open: "`",
            close: "`",
            verbatim: true,
            dom_tags: &["code"],
        },
    )
}

/// `doc`, `paragraph`, `text`, the `image` media node and the
/// `em`/`strong`/`code` marks.
pub fn default_schema() -> Result<Schema, SchemaError> {
    let mut schema = Schema::new();
    schema.register_kind::<Doc>()?;
    schema.register_kind::<Paragraph>()?;
    schema.register_kind::<Text>()?;
    schema.register_kind::<Media>()?;
    register_marks(&mut schema)?;
    Ok(schema)
}

/// Like [`default_schema`], with the basic media node (no layout, size or
/// download) registered as `image`.
pub fn simple_schema() -> Result<Schema, SchemaError> {
    let mut schema = Schema::new();
    schema.register_kind::<Doc>()?;
    schema.register_kind::<Paragraph>()?;
    schema.register_kind::<Text>()?;
    schema.register_kind::<SimpleMedia>()?;
    register_marks(&mut schema)?;
    Ok(schema)
}
