//! Rendering nodes to element trees and HTML.

use super::{DomNode, Element};
use crate::node::Node;
use crate::schema::Schema;

/// Schemes that can execute script when used as a media source.
const UNSAFE_SCHEMES: &[&str] = &["javascript:", "vbscript:", "data:"];

/// Neutralize URLs that could run script. Relative URLs pass unchanged;
/// `data:image/` URLs are allowed.
pub fn sanitize_url(url: &str) -> String {
    let normalized: String = url
        .trim()
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect::<String>()
        .to_ascii_lowercase();
    if normalized.starts_with("data:image/") {
        return url.to_owned();
    }
    if UNSAFE_SCHEMES.iter().any(|s| normalized.starts_with(s)) {
        tracing::debug!(url, "dropping unsafe url");
        return String::new();
    }
    url.to_owned()
}

/// Render one node. Node types without a renderer become a `div` around
/// their children.
pub fn render(node: &Node, schema: &Schema) -> DomNode {
    if let Some(text) = node.text() {
        return render_text(text, node, schema);
    }
    match schema.resolve(node.node_type()).ok().and_then(|spec| spec.to_dom) {
        Some(to_dom) => to_dom(node, schema),
        None => Element::new("div")
            .children(render_children(node, schema))
            .into(),
    }
}

pub fn render_children(node: &Node, schema: &Schema) -> Vec<DomNode> {
    node.content()
        .iter()
        .map(|child| render(child, schema))
        .collect()
}

fn render_text(text: &str, node: &Node, schema: &Schema) -> DomNode {
    let mut out = DomNode::text(text);
    // Marks are sorted by rank, so the first mark ends up outermost.
    for mark in node.marks().iter().rev() {
        let tag = schema
            .mark(mark)
            .ok()
            .and_then(|spec| spec.dom_tags.first().copied())
            .unwrap_or("span");
        out = Element::new(tag).child(out).into();
    }
    out
}

/// Render a document to an HTML string.
pub fn to_html(doc: &Node, schema: &Schema) -> String {
    render(doc, schema).to_html()
}
