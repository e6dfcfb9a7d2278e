//! The basic inline media node: a source and a caption.

use super::{Commandable, NodeKind, Parsable, Serializable};
use crate::actions::EditorCommand;
use crate::dom::{DomNode, Element, Selector, sanitize_url};
use crate::execute;
use crate::markdown::{MarkdownSerializer, MarkdownToken};
use crate::node::Node;
use crate::schema::{
    AllowedMarks, AttrSpec, DomParseRule, MarkdownParseRule, NodeTypeSpec, Schema, validators,
};
use crate::state::EditorState;
use crate::transform::Transaction;
use crate::value::{AttrMap, Value};

pub struct SimpleMedia;

impl SimpleMedia {
    /// Spec shared with richer media nodes.
    pub(crate) fn media_spec() -> NodeTypeSpec {
        NodeTypeSpec::new("")
            .attr("src", AttrSpec::with_default("").validate(validators::string))
            .attr(
                "alt",
                AttrSpec::with_default(Value::Null).validate(validators::optional_string),
            )
            .group("inline")
            .inline()
            .marks(AllowedMarks::None)
    }
}

/// `src` and caption from a markdown image token. The caption is the
/// text of all child tokens, or null when there is none.
pub(crate) fn token_attrs(token: &MarkdownToken) -> AttrMap {
    let mut attrs = AttrMap::new();
    attrs.insert("src".into(), Value::from(token.attr("src").unwrap_or_default()));
    let alt = token.text_content();
    attrs.insert("alt".into(), Value::from(Some(alt).filter(|a| !a.is_empty())));
    attrs
}

/// Copy a string attribute from an element when present.
pub(crate) fn copy_attr(attrs: &mut AttrMap, el: &Element, name: &str) {
    if let Some(value) = el.get_attr(name) {
        attrs.insert(name.into(), Value::from(value));
    }
}

/// Caption with newlines removed, escaped for markdown.
pub(crate) fn markdown_alt(s: &MarkdownSerializer<'_>, node: &Node) -> String {
    let alt: String = node
        .attr_str("alt")
        .unwrap_or_default()
        .chars()
        .filter(|&c| c != '\n' && c != '\r')
        .collect();
    s.esc(&alt)
}

/// `div.image > img + p.caption`, with `class` extended by `extra_class`.
pub(crate) fn media_dom(node: &Node, img: Element, extra_class: Option<&str>) -> DomNode {
    let class = match extra_class {
        Some(extra) => format!("image {extra}"),
        None => "image".to_owned(),
    };
    let caption = node.attr_str("alt").unwrap_or_default();
    Element::new("div")
        .attr("class", class)
        .child(img)
        .child(Element::new("p").attr("class", "caption").text(caption))
        .into()
}

pub(crate) fn base_img(node: &Node) -> Element {
    let mut img = Element::new("img").attr("src", sanitize_url(node.attr_str("src").unwrap_or_default()));
    if let Some(alt) = node.attr_str("alt") {
        img.set_attr("alt", alt);
    }
    img
}

impl NodeKind for SimpleMedia {
    const NAME: &'static str = "image";

    fn base_spec() -> NodeTypeSpec {
        Self::media_spec()
    }
}

impl Parsable for SimpleMedia {
    fn markdown_rules() -> Vec<MarkdownParseRule> {
        vec![MarkdownParseRule {
            token: "image",
            get_attrs: token_attrs,
        }]
    }

    fn dom_rules() -> Vec<DomParseRule> {
        vec![DomParseRule {
            selector: Selector::tag("img"),
            get_attrs: |el| {
                let mut attrs = AttrMap::new();
                copy_attr(&mut attrs, el, "src");
                copy_attr(&mut attrs, el, "alt");
                Some(attrs)
            },
        }]
    }
}

impl Serializable for SimpleMedia {
    fn to_markdown(s: &mut MarkdownSerializer<'_>, node: &Node) {
        let alt = markdown_alt(s, node);
        let src = s.esc_destination(node.attr_str("src").unwrap_or_default());
        s.write(&format!("![{alt}]({src})"));
    }

    fn to_dom(node: &Node, _schema: &Schema) -> DomNode {
        media_dom(node, base_img(node).attr("contenteditable", "false"), None)
    }
}

impl Commandable for SimpleMedia {
    fn handle(command: &EditorCommand, state: &EditorState, schema: &Schema) -> Option<Transaction> {
        match command {
            EditorCommand::DeleteMedia => execute::delete_media(state, schema),
            EditorCommand::SetAlt(alt) => execute::set_alt(state, schema, alt),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown::MarkdownParser;
    use crate::nodes::simple_schema;

    #[test]
    fn test_markdown_round_trip() {
        let schema = simple_schema().unwrap();
        let doc = MarkdownParser::new(&schema)
            .parse(r#"![A *cat*](cat.png "ignored")"#)
            .unwrap();
        let image = doc.child(0).unwrap().child(0).unwrap();
        assert_eq!(image.attr_str("alt"), Some("A cat"));
        assert_eq!(image.attrs().len(), 2);
        assert_eq!(MarkdownSerializer::serialize(&schema, &doc), "![A cat](cat.png)");
    }

    #[test]
    fn test_dom_output() {
        let schema = simple_schema().unwrap();
        let image = schema
            .construct("image", crate::value::attrs([("src", "javascript:x"), ("alt", "hi")]))
            .unwrap();
        insta::assert_snapshot!(
            SimpleMedia::to_dom(&image, &schema).to_html(),
            @r#"<div class="image"><img src="" alt="hi" contenteditable="false"><p class="caption">hi</p></div>"#
        );
    }
}
