//! The full media node: simple media plus layout, size, title and download.

use super::simple_media::{self, SimpleMedia};
use super::{Commandable, NodeKind, Parsable, Serializable};
use crate::actions::EditorCommand;
use crate::dom::import::parse_int;
use crate::dom::{DomNode, Element, Selector};
use crate::execute;
use crate::input_rules::{InputRule, match_media_shorthand};
use crate::markdown::{MarkdownSerializer, MarkdownToken};
use crate::node::Node;
use crate::schema::{AttrSpec, DomParseRule, MarkdownParseRule, NodeTypeSpec, Schema, validators};
use crate::state::EditorState;
use crate::title_attrs::{LAYOUT_CLASSES, parse_title_attribute};
use crate::transform::Transaction;
use crate::value::{AttrMap, Value};

pub struct Media;

fn layout_class(v: &Value) -> bool {
    match v {
        Value::Null => true,
        Value::Str(s) => LAYOUT_CLASSES.contains(&s.as_str()),
        _ => false,
    }
}

fn markdown_attrs(token: &MarkdownToken) -> AttrMap {
    let mut attrs = simple_media::token_attrs(token);
    let title = parse_title_attribute(token.attr("title").unwrap_or_default());
    attrs.extend(title.to_attrs());
    attrs
}

/// `src`, `alt`, `title` and dimensions from an `img` element.
fn img_attrs(img: &Element) -> AttrMap {
    let mut attrs = AttrMap::new();
    for name in ["src", "alt", "title"] {
        simple_media::copy_attr(&mut attrs, img, name);
    }
    for name in ["width", "height"] {
        if let Some(value) = img.get_attr(name).and_then(parse_int) {
            attrs.insert(name.into(), Value::Int(value));
        }
    }
    attrs
}

fn container_attrs(div: &Element) -> Option<AttrMap> {
    let img = div.find_first("img")?;
    let mut attrs = img_attrs(img);
    let class = div.class_name();
    let layout = class
        .find("image-")
        .map(|idx| Value::from(&class[idx + "image-".len()..]))
        .unwrap_or_default();
    attrs.insert("layoutClass".into(), layout);
    Some(attrs)
}

impl NodeKind for Media {
    const NAME: &'static str = "image";

    fn base_spec() -> NodeTypeSpec {
        let mut spec = SimpleMedia::media_spec()
            .attr(
                "width",
                AttrSpec::with_default(Value::Null).validate(validators::optional_dimension),
            )
            .attr(
                "height",
                AttrSpec::with_default(Value::Null).validate(validators::optional_dimension),
            )
            .attr("layoutClass", AttrSpec::with_default(Value::Null).validate(layout_class))
            .attr(
                "title",
                AttrSpec::with_default(Value::Null).validate(validators::optional_string),
            );
        spec.resource_attr = Some("src");
        spec
    }
}

impl Parsable for Media {
    fn markdown_rules() -> Vec<MarkdownParseRule> {
        vec![MarkdownParseRule {
            token: "image",
            get_attrs: markdown_attrs,
        }]
    }

    fn dom_rules() -> Vec<DomParseRule> {
        vec![
            DomParseRule {
                selector: Selector::tag("div").attr_includes("class", "image"),
                get_attrs: container_attrs,
            },
            DomParseRule {
                selector: Selector::tag("img"),
                get_attrs: |img| Some(img_attrs(img)),
            },
        ]
    }

    fn input_rules() -> Vec<InputRule> {
        vec![InputRule {
            name: "media-shorthand",
            matcher: match_media_shorthand,
        }]
    }
}

impl Serializable for Media {
    /// `![alt](src "layout|title =WxH")`. The quoted segment carries the
    /// layout class if set, otherwise the title, otherwise only the size.
    fn to_markdown(s: &mut MarkdownSerializer<'_>, node: &Node) {
        let mut markdown = format!(
            "![{}]({}",
            simple_media::markdown_alt(s, node),
            s.esc_destination(node.attr_str("src").unwrap_or_default())
        );

        let width = node.attr_int("width");
        let height = node.attr_int("height");
        let size = if width.is_some() || height.is_some() {
            let side = |v: Option<i64>| v.map(|v| v.to_string()).unwrap_or_default();
            format!(" ={}x{}", side(width), side(height))
        } else {
            String::new()
        };

        let title = node.attr("title").and_then(Value::as_non_empty_str);
        if let Some(layout) = node.attr("layoutClass").and_then(Value::as_non_empty_str) {
            markdown.push_str(&format!(" \"{}{size}\"", s.esc_title(layout)));
        } else if let Some(title) = title {
            markdown.push_str(&format!(" \"{}{size}\"", s.esc_title(title)));
        } else if !size.is_empty() {
            markdown.push_str(&format!(" \"{size}\""));
        }
        markdown.push(')');
        s.write(&markdown);
    }

    fn to_dom(node: &Node, _schema: &Schema) -> DomNode {
        let mut img = simple_media::base_img(node);
        if let Some(title) = node.attr_str("title") {
            img.set_attr("title", title);
        }
        for name in ["width", "height"] {
            if let Some(value) = node.attr_int(name) {
                img.set_attr(name, value.to_string());
            }
        }
        img.set_attr("contenteditable", "false");

        let layout = node
            .attr("layoutClass")
            .and_then(Value::as_non_empty_str)
            .map(|layout| format!("image-{layout}"));
        simple_media::media_dom(node, img, layout.as_deref())
    }
}

impl Commandable for Media {
    fn handle(command: &EditorCommand, state: &EditorState, schema: &Schema) -> Option<Transaction> {
        match command {
            EditorCommand::Resize { width, height } => execute::resize(state, schema, *width, *height),
            EditorCommand::AlignRight => execute::align_right(state, schema),
            EditorCommand::AlignLeft => execute::align_left(state, schema),
            EditorCommand::AlignFullWidth => execute::align_full_width(state, schema),
            EditorCommand::AlignCenter => execute::align_center(state, schema),
            _ => SimpleMedia::handle(command, state, schema),
        }
    }
}
