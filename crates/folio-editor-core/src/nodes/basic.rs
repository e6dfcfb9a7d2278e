use super::{Commandable, NodeKind, Parsable, Serializable};
use crate::dom::{DomNode, Element, Selector, render_children};
use crate::markdown::MarkdownSerializer;
use crate::node::Node;
use crate::schema::{DomParseRule, MarkdownParseRule, NodeTypeSpec, Schema};
use crate::value::AttrMap;

/// The document root.
pub struct Doc;

impl NodeKind for Doc {
    const NAME: &'static str = "doc";

    fn base_spec() -> NodeTypeSpec {
        NodeTypeSpec::new("block+")
    }
}

impl Parsable for Doc {}

impl Serializable for Doc {
    fn to_markdown(s: &mut MarkdownSerializer<'_>, node: &Node) {
        s.render_content(node);
    }

    fn to_dom(node: &Node, schema: &Schema) -> DomNode {
        Element::new("div").children(render_children(node, schema)).into()
    }
}

impl Commandable for Doc {}

pub struct Paragraph;

impl NodeKind for Paragraph {
    const NAME: &'static str = "paragraph";

    fn base_spec() -> NodeTypeSpec {
        NodeTypeSpec::new("inline*").group("block")
    }
}

impl Parsable for Paragraph {
    fn markdown_rules() -> Vec<MarkdownParseRule> {
        vec![MarkdownParseRule {
            token: "paragraph",
            get_attrs: |_| AttrMap::new(),
        }]
    }

    fn dom_rules() -> Vec<DomParseRule> {
        vec![DomParseRule {
            selector: Selector::tag("p"),
            get_attrs: |_| Some(AttrMap::new()),
        }]
    }
}

impl Serializable for Paragraph {
    fn to_markdown(s: &mut MarkdownSerializer<'_>, node: &Node) {
        s.render_inline(node);
        s.close_block();
    }

    fn to_dom(node: &Node, schema: &Schema) -> DomNode {
        Element::new("p").children(render_children(node, schema)).into()
    }
}

impl Commandable for Paragraph {}

pub struct Text;

impl NodeKind for Text {
    const NAME: &'static str = "text";

    fn base_spec() -> NodeTypeSpec {
        NodeTypeSpec::new("").group("inline").inline()
    }
}

impl Parsable for Text {}

impl Serializable for Text {
    fn to_markdown(s: &mut MarkdownSerializer<'_>, node: &Node) {
        s.text(node.text().unwrap_or_default());
    }

    fn to_dom(node: &Node, _schema: &Schema) -> DomNode {
        DomNode::text(node.text().unwrap_or_default())
    }
}

impl Commandable for Text {}
