//! Markdown to document tree.

use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};
use smol_str::SmolStr;

use super::MarkdownToken;
use crate::error::SchemaError;
use crate::node::Node;
use crate::schema::{MarkdownParseRule, NodeType, Schema};
use crate::value::AttrMap;

pub struct MarkdownParser<'a> {
    schema: &'a Schema,
}

/// Parse state for one document.
#[derive(Default)]
struct Builder {
    blocks: Vec<Node>,
    inline: Vec<Node>,
    marks: Vec<SmolStr>,
    /// Open image tokens; alt text is collected into the innermost.
    images: Vec<MarkdownToken>,
}

impl<'a> MarkdownParser<'a> {
    pub fn new(schema: &'a Schema) -> Self {
        Self { schema }
    }

    /// Parse markdown into a `doc` node. Unsupported constructs are
    /// flattened into paragraphs or dropped; only a broken schema fails.
    pub fn parse(&self, markdown: &str) -> Result<Node, SchemaError> {
        let mut b = Builder::default();
        for event in Parser::new_ext(markdown, Options::ENABLE_STRIKETHROUGH) {
            if !b.images.is_empty() {
                self.image_event(&mut b, event)?;
                continue;
            }
            match event {
                Event::Start(Tag::Emphasis) => b.marks.push(SmolStr::new_static("em")),
                Event::Start(Tag::Strong) => b.marks.push(SmolStr::new_static("strong")),
                Event::End(TagEnd::Emphasis | TagEnd::Strong) => {
                    b.marks.pop();
                }
                Event::Start(Tag::Image {
                    dest_url, title, ..
                }) => {
                    b.images.push(
                        MarkdownToken::new("image")
                            .with_attr("src", dest_url.to_string())
                            .with_attr("title", title.to_string()),
                    );
                }
                Event::Start(Tag::Link { .. } | Tag::Strikethrough)
                | Event::End(TagEnd::Link | TagEnd::Strikethrough) => {}
                Event::Start(_) | Event::End(_) | Event::Rule => self.flush(&mut b)?,
                Event::Text(text) => self.push_text(&mut b, &text, None)?,
                Event::Code(text) => self.push_text(&mut b, &text, Some("code"))?,
                Event::SoftBreak | Event::HardBreak => self.push_text(&mut b, "\n", None)?,
                other => tracing::debug!(event = ?other, "dropping unsupported markdown"),
            }
        }
        self.flush(&mut b)?;

        if b.blocks.is_empty() {
            b.blocks.push(self.paragraph(Vec::new())?);
        }
        self.schema.node("doc", AttrMap::new(), b.blocks, Vec::new())
    }

    fn image_event(&self, b: &mut Builder, event: Event<'_>) -> Result<(), SchemaError> {
        let Some(top) = b.images.last_mut() else {
            return Ok(());
        };
        match event {
            Event::Text(text) | Event::Code(text) => top.children.push(MarkdownToken::text(text.to_string())),
            Event::SoftBreak | Event::HardBreak => top.children.push(MarkdownToken::text("\n")),
            Event::Start(Tag::Image { .. }) => b.images.push(MarkdownToken::new("image")),
            Event::End(TagEnd::Image) => {
                let Some(token) = b.images.pop() else {
                    return Ok(());
                };
                match b.images.last_mut() {
                    // Nested image: only its alt text survives, as part of the outer alt.
                    Some(outer) => outer.children.extend(token.children),
                    None => {
                        if let Some(node) = self.node_for_token(&token) {
                            b.inline.push(node);
                        }
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn push_text(&self, b: &mut Builder, text: &str, mark: Option<&str>) -> Result<(), SchemaError> {
        if text.is_empty() {
            return Ok(());
        }
        let mut marks = b.marks.clone();
        marks.extend(mark.map(SmolStr::new));
        b.inline.push(self.schema.text(text, marks)?);
        Ok(())
    }

    fn flush(&self, b: &mut Builder) -> Result<(), SchemaError> {
        if b.inline.is_empty() {
            return Ok(());
        }
        let content = std::mem::take(&mut b.inline);
        b.blocks.push(self.paragraph(content)?);
        Ok(())
    }

    fn paragraph(&self, content: Vec<Node>) -> Result<Node, SchemaError> {
        let token = MarkdownToken::new("paragraph");
        match self.rule_for(&token.name) {
            Some((node_type, rule)) => {
                self.schema
                    .node(&node_type.name, (rule.get_attrs)(&token), content, Vec::new())
            }
            None => self.schema.node("paragraph", AttrMap::new(), content, Vec::new()),
        }
    }

    /// Build a leaf node from a token through the first rule claiming it.
    pub fn node_for_token(&self, token: &MarkdownToken) -> Option<Node> {
        let Some((node_type, rule)) = self.rule_for(&token.name) else {
            tracing::debug!(token = %token.name, "no parse rule for token");
            return None;
        };
        let attrs = (rule.get_attrs)(token);
        match self.schema.construct_lenient(&node_type.name, attrs) {
            Ok(node) => Some(node),
            Err(err) => {
                tracing::debug!(%err, token = %token.name, "dropping token");
                None
            }
        }
    }

    fn rule_for(&self, token: &str) -> Option<(&'a NodeType, &'a MarkdownParseRule)> {
        self.schema.node_types().find_map(|node_type| {
            node_type
                .spec
                .markdown_rules
                .iter()
                .find(|rule| rule.token == token)
                .map(|rule| (node_type, rule))
        })
    }
}
