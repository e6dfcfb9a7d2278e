//! A minimal element tree, used as the DOM-side interchange format.

pub mod export;
pub mod import;

use std::fmt;

use pulldown_cmark_escape::{FmtWriter, StrWrite, escape_href, escape_html, escape_html_body_text};
use smol_str::SmolStr;

pub use export::{render, render_children, sanitize_url, to_html};
pub use import::DomParser;

/// Elements that never have children or a closing tag.
const VOID_TAGS: &[&str] = &["br", "hr", "img", "input", "meta", "link"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomNode {
    Element(Element),
    Text(String),
}

impl DomNode {
    pub fn text(text: impl Into<String>) -> Self {
        DomNode::Text(text.into())
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            DomNode::Element(el) => Some(el),
            DomNode::Text(_) => None,
        }
    }

    pub fn text_content(&self) -> String {
        match self {
            DomNode::Element(el) => el.text_content(),
            DomNode::Text(text) => text.clone(),
        }
    }

    pub fn to_html(&self) -> String {
        self.to_string()
    }

    fn write_html<W: StrWrite>(&self, out: &mut W) -> Result<(), W::Error> {
        match self {
            DomNode::Text(text) => escape_html_body_text(out, text),
            DomNode::Element(el) => el.write_html(out),
        }
    }
}

impl fmt::Display for DomNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_html(&mut FmtWriter(f))
    }
}

impl From<Element> for DomNode {
    fn from(el: Element) -> Self {
        DomNode::Element(el)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: SmolStr,
    /// Attributes in insertion order.
    pub attrs: Vec<(SmolStr, String)>,
    pub children: Vec<DomNode>,
}

impl Element {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: SmolStr::new(tag.to_ascii_lowercase()),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Set an attribute, replacing an earlier value with the same name.
    pub fn attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attrs.iter_mut().find(|(n, _)| n == name) {
            Some((_, v)) => *v = value,
            None => self.attrs.push((SmolStr::new(name), value)),
        }
    }

    pub fn child(mut self, child: impl Into<DomNode>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = DomNode>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn text(self, text: &str) -> Self {
        self.child(DomNode::text(text))
    }

    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn class_name(&self) -> &str {
        self.get_attr("class").unwrap_or_default()
    }

    /// Whitespace-separated class list contains `class`.
    pub fn has_class(&self, class: &str) -> bool {
        self.class_name().split_whitespace().any(|c| c == class)
    }

    /// First descendant element with the given tag, depth first.
    pub fn find_first(&self, tag: &str) -> Option<&Element> {
        self.children.iter().find_map(|child| {
            let el = child.as_element()?;
            if el.tag == tag {
                Some(el)
            } else {
                el.find_first(tag)
            }
        })
    }

    pub fn text_content(&self) -> String {
        self.children.iter().map(DomNode::text_content).collect()
    }

    pub fn is_void(&self) -> bool {
        VOID_TAGS.contains(&self.tag.as_str())
    }

    pub fn to_html(&self) -> String {
        self.to_string()
    }

    fn write_html<W: StrWrite>(&self, out: &mut W) -> Result<(), W::Error> {
        out.write_str("<")?;
        out.write_str(&self.tag)?;
        for (name, value) in &self.attrs {
            out.write_str(" ")?;
            out.write_str(name)?;
            out.write_str("=\"")?;
            if name == "src" || name == "href" {
                escape_href(&mut *out, value)?;
            } else {
                escape_html(&mut *out, value)?;
            }
            out.write_str("\"")?;
        }
        out.write_str(">")?;
        if self.is_void() {
            return Ok(());
        }
        for child in &self.children {
            child.write_html(out)?;
        }
        out.write_str("</")?;
        out.write_str(&self.tag)?;
        out.write_str(">")
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_html(&mut FmtWriter(f))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum AttrMatch {
    Exists(SmolStr),
    Equals(SmolStr, SmolStr),
    /// `[attr~=value]`: the whitespace-separated list contains `value`.
    Includes(SmolStr, SmolStr),
}

/// A tag selector with an optional attribute condition:
/// `tag`, `tag[attr]`, `tag[attr=v]` or `tag[attr~=v]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    tag: SmolStr,
    attr: Option<AttrMatch>,
}

impl Selector {
    pub fn tag(tag: &str) -> Self {
        Self {
            tag: SmolStr::new(tag),
            attr: None,
        }
    }

    pub fn with_attr(mut self, name: &str) -> Self {
        self.attr = Some(AttrMatch::Exists(SmolStr::new(name)));
        self
    }

    pub fn attr_equals(mut self, name: &str, value: &str) -> Self {
        self.attr = Some(AttrMatch::Equals(SmolStr::new(name), SmolStr::new(value)));
        self
    }

    pub fn attr_includes(mut self, name: &str, value: &str) -> Self {
        self.attr = Some(AttrMatch::Includes(SmolStr::new(name), SmolStr::new(value)));
        self
    }

    pub fn matches(&self, el: &Element) -> bool {
        if el.tag != self.tag {
            return false;
        }
        match &self.attr {
            None => true,
            Some(AttrMatch::Exists(name)) => el.get_attr(name).is_some(),
            Some(AttrMatch::Equals(name, value)) => el.get_attr(name) == Some(value.as_str()),
            Some(AttrMatch::Includes(name, value)) => el
                .get_attr(name)
                .is_some_and(|v| v.split_whitespace().any(|c| c == value)),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tag)?;
        match &self.attr {
            None => Ok(()),
            Some(AttrMatch::Exists(name)) => write!(f, "[{name}]"),
            Some(AttrMatch::Equals(name, value)) => write!(f, "[{name}={value}]"),
            Some(AttrMatch::Includes(name, value)) => write!(f, "[{name}~={value}]"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_matching() {
        let div = Element::new("div").attr("class", "image image-left-50");
        assert!(Selector::tag("div").attr_includes("class", "image").matches(&div));
        assert!(!Selector::tag("div").attr_includes("class", "imag").matches(&div));
        assert!(Selector::tag("div").with_attr("class").matches(&div));
        assert!(!Selector::tag("div").attr_equals("class", "image").matches(&div));
        assert!(!Selector::tag("img").matches(&div));
        assert_eq!(
            Selector::tag("div").attr_includes("class", "image").to_string(),
            "div[class~=image]"
        );
    }

    #[test]
    fn test_find_first_is_depth_first() {
        let tree = Element::new("div")
            .child(Element::new("span").child(Element::new("img").attr("src", "a")))
            .child(Element::new("img").attr("src", "b"));
        assert_eq!(tree.find_first("img").and_then(|i| i.get_attr("src")), Some("a"));
        assert!(tree.find_first("video").is_none());
    }

    #[test]
    fn test_html_escaping() {
        let el = Element::new("p")
            .attr("title", "a \"b\" <c>")
            .text("1 < 2 & 3")
            .child(Element::new("br"));
        insta::assert_snapshot!(el.to_html(), @r#"<p title="a &quot;b&quot; &lt;c&gt;">1 &lt; 2 &amp; 3<br></p>"#);
    }
}
