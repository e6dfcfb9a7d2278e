use smol_str::SmolStr;

/// A parsed markdown construct, as seen by parse rules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkdownToken {
    /// Token name, e.g. `"image"` or `"paragraph"`.
    pub name: SmolStr,
    pub attrs: Vec<(SmolStr, String)>,
    pub children: Vec<MarkdownToken>,
    /// Literal content for text tokens.
    pub content: String,
}

impl MarkdownToken {
    pub fn new(name: &str) -> Self {
        Self {
            name: SmolStr::new(name),
            ..Default::default()
        }
    }

    pub fn text(content: impl Into<String>) -> Self {
        Self {
            name: SmolStr::new_static("text"),
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn with_attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.attrs.push((SmolStr::new(name), value.into()));
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Concatenated content of all descendant tokens.
    pub fn text_content(&self) -> String {
        let mut out = self.content.clone();
        for child in &self.children {
            out.push_str(&child.text_content());
        }
        out
    }
}
