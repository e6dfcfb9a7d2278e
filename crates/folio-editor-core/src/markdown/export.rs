//! Document tree to markdown.

use smol_str::SmolStr;

use crate::node::Node;
use crate::schema::Schema;

/// Escape markdown-significant characters.
///
/// Backslash-escapes `` ` * \ ~ [ ] _ ``, except an underscore between two
/// word characters. With `start_of_line`, also escapes characters that would
/// start a block construct.
pub fn esc(s: &str, start_of_line: bool) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::with_capacity(s.len());
    for (i, &c) in chars.iter().enumerate() {
        match c {
            '_' if i > 0 && i + 1 < chars.len() && is_word(chars[i - 1]) && is_word(chars[i + 1]) => {
                out.push(c);
            }
            '`' | '*' | '\\' | '~' | '[' | ']' | '_' => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    if start_of_line {
        escape_line_start(&mut out);
    }
    out
}

/// Escape a link destination for `[..](dest)`. A destination with
/// whitespace is written in the `<dest>` form.
pub fn esc_destination(s: &str) -> String {
    let pointy = s.contains(char::is_whitespace);
    let mut out = String::with_capacity(s.len() + 2);
    if pointy {
        out.push('<');
    }
    for (i, c) in s.char_indices() {
        match c {
            '\\' | '(' | ')' | '<' | '>' => out.push('\\'),
            '&' if starts_entity(&s[i + 1..]) => out.push('\\'),
            _ => {}
        }
        out.push(c);
    }
    if pointy {
        out.push('>');
    }
    out
}

/// Escape the inside of a `"..."` link title.
pub fn esc_title(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for (i, c) in s.char_indices() {
        match c {
            '\\' | '"' => out.push('\\'),
            '&' if starts_entity(&s[i + 1..]) => out.push('\\'),
            _ => {}
        }
        out.push(c);
    }
    out
}

/// Whether text after a `&` would be read as an entity like `&amp;`.
fn starts_entity(rest: &str) -> bool {
    let body = rest.strip_prefix('#').unwrap_or(rest);
    let len = body.bytes().take_while(u8::is_ascii_alphanumeric).count();
    len > 0 && body[len..].starts_with(';')
}

fn is_word(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn escape_line_start(out: &mut String) {
    if out.starts_with(['#', '-', '+', '>']) {
        out.insert(0, '\\');
        return;
    }
    // "1. " would start an ordered list
    let indent = out.len() - out.trim_start().len();
    let digits = out[indent..].bytes().take_while(u8::is_ascii_digit).count();
    if digits > 0 && out[indent + digits..].starts_with(". ") {
        out.insert(indent + digits, '\\');
    }
}

/// Writes nodes as markdown. Node types plug in through their
/// `to_markdown` function and use [`MarkdownSerializer::write`],
/// [`MarkdownSerializer::text`] and [`MarkdownSerializer::esc`].
pub struct MarkdownSerializer<'a> {
    schema: &'a Schema,
    out: String,
    /// Set after a block ends; the next write starts a new block.
    closed: bool,
}

impl<'a> MarkdownSerializer<'a> {
    pub fn new(schema: &'a Schema) -> Self {
        Self {
            schema,
            out: String::new(),
            closed: false,
        }
    }

    /// Serialize a node (usually a `doc`) and return the markdown.
    pub fn serialize(schema: &'a Schema, node: &Node) -> String {
        let mut s = Self::new(schema);
        s.render(node);
        s.finish()
    }

    pub fn finish(self) -> String {
        self.out
    }

    pub fn schema(&self) -> &Schema {
        self.schema
    }

    pub fn esc(&self, s: &str) -> String {
        esc(s, false)
    }

    pub fn esc_destination(&self, s: &str) -> String {
        esc_destination(s)
    }

    pub fn esc_title(&self, s: &str) -> String {
        esc_title(s)
    }

    fn at_line_start(&self) -> bool {
        self.out.is_empty() || self.out.ends_with('\n')
    }

    fn flush_close(&mut self) {
        if self.closed {
            if !self.out.is_empty() {
                self.out.push_str("\n\n");
            }
            self.closed = false;
        }
    }

    /// Append raw markdown.
    pub fn write(&mut self, s: &str) {
        self.flush_close();
        self.out.push_str(s);
    }

    /// Append text, escaped. Newlines become hard breaks.
    pub fn text(&mut self, s: &str) {
        self.flush_close();
        for (i, line) in s.split('\n').enumerate() {
            if i > 0 {
                self.out.push_str("\\\n");
            }
            let start = self.at_line_start();
            self.out.push_str(&esc(line, start));
        }
    }

    /// End the current block.
    pub fn close_block(&mut self) {
        self.closed = true;
    }

    pub fn render(&mut self, node: &Node) {
        if let Some(text) = node.text() {
            self.text(text);
            return;
        }
        match self
            .schema
            .resolve(node.node_type())
            .ok()
            .and_then(|spec| spec.to_markdown)
        {
            Some(to_markdown) => to_markdown(self, node),
            None => {
                tracing::debug!(node_type = node.node_type(), "no markdown serializer, writing content");
                if node.is_textblock() {
                    self.render_inline(node);
                } else {
                    self.render_content(node);
                }
            }
        }
    }

    /// Render block children, one block each.
    pub fn render_content(&mut self, parent: &Node) {
        for child in parent.content() {
            self.render(child);
        }
    }

    /// Render inline children, opening and closing marks as they change.
    /// Whitespace at the edge of a marked run is kept outside the delimiters.
    pub fn render_inline(&mut self, parent: &Node) {
        self.flush_close();
        let mut active: Vec<SmolStr> = Vec::new();
        let mut trailing = String::new();

        for child in parent.content() {
            let marks = child.marks();
            let text = child.text();

            // Whitespace-only text joins the surrounding run unmarked.
            if let Some(t) = text {
                if t.trim().is_empty() {
                    trailing.push_str(t);
                    continue;
                }
            }

            let keep = active
                .iter()
                .zip(marks)
                .take_while(|(a, b)| a == b)
                .count();
            while active.len() > keep {
                if let Some(mark) = active.pop() {
                    self.close_mark(&mark);
                }
            }
            self.out.push_str(&std::mem::take(&mut trailing));

            match text {
                Some(t) => {
                    let inner_start = t.len() - t.trim_start().len();
                    let inner_end = t.trim_end().len();
                    self.out.push_str(&t[..inner_start]);
                    for mark in &marks[keep..] {
                        self.open_mark(mark);
                        active.push(mark.clone());
                    }
                    let inner = &t[inner_start..inner_end];
                    if active.iter().any(|m| self.is_verbatim(m)) {
                        self.out.push_str(inner);
                    } else {
                        self.text(inner);
                    }
                    trailing.push_str(&t[inner_end..]);
                }
                None => self.render(child),
            }
        }

        while let Some(mark) = active.pop() {
            self.close_mark(&mark);
        }
        self.out.push_str(&trailing);
    }

    fn is_verbatim(&self, mark: &str) -> bool {
        self.schema.mark(mark).is_ok_and(|spec| spec.verbatim)
    }

    fn open_mark(&mut self, mark: &str) {
        if let Ok(spec) = self.schema.mark(mark) {
            self.out.push_str(spec.open);
        }
    }

    fn close_mark(&mut self, mark: &str) {
        if let Ok(spec) = self.schema.mark(mark) {
            self.out.push_str(spec.close);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown::MarkdownParser;
    use crate::nodes::default_schema;

    #[test]
    fn test_esc() {
        assert_eq!(esc("a*b", false), "a\\*b");
        assert_eq!(esc("snake_case", false), "snake_case");
        assert_eq!(esc("_lead", false), "\\_lead");
        assert_eq!(esc("[x]", false), "\\[x\\]");
        assert_eq!(esc("# not a heading", true), "\\# not a heading");
        assert_eq!(esc("# inline", false), "# inline");
        assert_eq!(esc("1. item", true), "1\\. item");
        assert_eq!(esc("- item", true), "\\- item");
    }

    #[test]
    fn test_esc_destination() {
        assert_eq!(esc_destination("a_b.png"), "a_b.png");
        assert_eq!(esc_destination("a)b.png"), "a\\)b.png");
        assert_eq!(esc_destination("my photo.png"), "<my photo.png>");
        assert_eq!(esc_destination("x?a=1&b=2"), "x?a=1&b=2");
        assert_eq!(esc_destination("x&amp;y"), "x\\&amp;y");
    }

    #[test]
    fn test_esc_title() {
        assert_eq!(esc_title(r#"say "hi""#), r#"say \"hi\""#);
        assert_eq!(esc_title(r"a\b"), r"a\\b");
        assert_eq!(esc_title("&#42; & co"), "\\&#42; & co");
    }

    fn round_trip(markdown: &str) -> String {
        let schema = default_schema().unwrap();
        let doc = MarkdownParser::new(&schema).parse(markdown).unwrap();
        MarkdownSerializer::serialize(&schema, &doc)
    }

    #[test]
    fn test_marks_and_paragraphs() {
        assert_eq!(
            round_trip("Hello *big* **world**\n\nnext `a*b` para"),
            "Hello *big* **world**\n\nnext `a*b` para"
        );
    }

    #[test]
    fn test_whitespace_moves_outside_marks() {
        let schema = default_schema().unwrap();
        let para = schema
            .node(
                "paragraph",
                Default::default(),
                vec![
                    schema.text("a", vec![]).unwrap(),
                    schema.text(" b ", vec!["strong".into()]).unwrap(),
                    schema.text("c", vec![]).unwrap(),
                ],
                vec![],
            )
            .unwrap();
        let doc = schema.node("doc", Default::default(), vec![para], vec![]).unwrap();
        assert_eq!(MarkdownSerializer::serialize(&schema, &doc), "a **b** c");
    }

    #[test]
    fn test_hard_break_round_trip() {
        assert_eq!(round_trip("one\\\ntwo"), "one\\\ntwo");
    }
}
