//! The editor: a schema, the current state and its undo history.
//!
//! Every mutation goes through a [`Transaction`] built by a pure command
//! function. The editor swaps in the resulting state as a whole, so a
//! refused command leaves document and selection exactly as they were.

use folio_common::{Config, DownloadConfig};
use smol_str::SmolStr;

use crate::actions::EditorCommand;
use crate::dom;
use crate::error::{ResourceError, SchemaError};
use crate::execute::{self, download_target};
use crate::input_rules::handle_text_input;
use crate::markdown::{MarkdownParser, MarkdownSerializer};
use crate::node::Node;
use crate::presence::{TypingSignal, TypingThrottle};
use crate::resource::{ResourceExporter, SavedResource, export_resource};
use crate::schema::Schema;
use crate::state::EditorState;
use crate::transform::Transaction;
use crate::types::Selection;
use crate::undo::{UndoManager, UndoableState};

#[derive(Debug, Clone)]
pub struct Editor {
    schema: Schema,
    history: UndoableState,
    lookbehind: usize,
    download: DownloadConfig,
    typing: TypingThrottle,
}

impl Editor {
    /// Editor over `doc` with default settings.
    pub fn new(schema: Schema, doc: Node) -> Self {
        Self::with_config(schema, doc, &Config::default())
    }

    pub fn with_config(schema: Schema, doc: Node, config: &Config) -> Self {
        Self {
            schema,
            history: UndoableState::new(EditorState::new(doc), config.history_depth),
            lookbehind: config.input_rule_lookbehind,
            download: config.download.clone(),
            typing: TypingThrottle::from_config(config),
        }
    }

    /// Parse `markdown` into a new editor.
    pub fn from_markdown(schema: Schema, markdown: &str, config: &Config) -> Result<Self, SchemaError> {
        let doc = MarkdownParser::new(&schema).parse(markdown)?;
        Ok(Self::with_config(schema, doc, config))
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn state(&self) -> &EditorState {
        self.history.state()
    }

    pub fn doc(&self) -> &Node {
        self.state().doc()
    }

    pub fn selection(&self) -> &Selection {
        self.state().selection()
    }

    /// Apply a transaction built against the current state.
    pub fn dispatch(&mut self, tr: &Transaction) -> bool {
        match self.history.apply(tr) {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(%err, "transaction rejected");
                false
            }
        }
    }

    fn run(&mut self, tr: Option<Transaction>) -> bool {
        match tr {
            Some(tr) => self.dispatch(&tr),
            None => false,
        }
    }

    /// Report that the user is typing in `thread` of `document`. Returns
    /// the signal to send, or `None` while throttled.
    pub fn typing(&mut self, document: &str, thread: &str) -> Option<TypingSignal> {
        self.typing.typing(document, thread)
    }

    /// Execute a command. Returns whether it applied.
    ///
    /// [`EditorCommand::DownloadResource`] is asynchronous and always
    /// returns `false` here; use [`Editor::download_resource`].
    pub fn execute(&mut self, command: &EditorCommand) -> bool {
        match command {
            EditorCommand::Undo => self.undo(),
            EditorCommand::Redo => self.redo(),
            EditorCommand::DownloadResource => false,
            command => {
                let tr = execute::execute_command(command, self.state(), &self.schema);
                self.run(tr)
            }
        }
    }

    pub fn resize(&mut self, width: Option<u32>, height: Option<u32>) -> bool {
        let tr = execute::resize(self.state(), &self.schema, width, height);
        self.run(tr)
    }

    pub fn align_right(&mut self) -> bool {
        let tr = execute::align_right(self.state(), &self.schema);
        self.run(tr)
    }

    pub fn align_left(&mut self) -> bool {
        let tr = execute::align_left(self.state(), &self.schema);
        self.run(tr)
    }

    pub fn align_full_width(&mut self) -> bool {
        let tr = execute::align_full_width(self.state(), &self.schema);
        self.run(tr)
    }

    pub fn align_center(&mut self) -> bool {
        let tr = execute::align_center(self.state(), &self.schema);
        self.run(tr)
    }

    pub fn delete_media(&mut self) -> bool {
        let tr = execute::delete_media(self.state(), &self.schema);
        self.run(tr)
    }

    pub fn set_alt(&mut self, alt: &str) -> bool {
        let tr = execute::set_alt(self.state(), &self.schema, alt);
        self.run(tr)
    }

    /// Fetch and save the selected media node's resource.
    ///
    /// `None` when the selection is not a downloadable node. The document
    /// is never modified.
    pub fn download_resource<'a, E: ResourceExporter>(
        &'a self,
        exporter: &'a E,
    ) -> Option<impl Future<Output = Result<SavedResource, ResourceError>> + 'a> {
        let (node, src) = download_target(self.state(), &self.schema)?;
        let config = &self.download;
        Some(async move { export_resource(exporter, &node, &src, config).await })
    }

    /// Node-select the node starting at `pos`.
    pub fn select_node(&mut self, pos: usize) -> bool {
        match Selection::node_at(self.doc(), pos) {
            Some(selection) => {
                self.history.set_selection(selection);
                true
            }
            None => false,
        }
    }

    /// Text selection, clamped into the document.
    pub fn select_text(&mut self, anchor: usize, head: usize) {
        let selection = Selection::text(self.doc(), anchor, head);
        self.history.set_selection(selection);
    }

    /// Type `text` over the selection. Input rules get the first chance;
    /// otherwise the text is inserted with the marks of the text before
    /// the caret.
    pub fn insert_text(&mut self, text: &str) -> bool {
        if text.is_empty() {
            return false;
        }
        let from = self.selection().from();
        let to = self.selection().to();
        if let Some(tr) = handle_text_input(self.state(), &self.schema, from, to, text, self.lookbehind) {
            return self.dispatch(&tr);
        }

        let marks = self.marks_before(from);
        let node = match self.schema.text(text, marks) {
            Ok(node) => node,
            Err(err) => {
                tracing::debug!(%err, "text insert rejected");
                return false;
            }
        };
        let mut tr = Transaction::new(self.state());
        if let Err(err) = tr.replace_with(from, to, vec![node], &self.schema) {
            tracing::debug!(%err, from, to, "text insert rejected");
            return false;
        }
        let caret = from + text.chars().count();
        let selection = Selection::text(tr.doc(), caret, caret);
        tr.set_selection(selection);
        self.dispatch(&tr)
    }

    fn marks_before(&self, pos: usize) -> Vec<SmolStr> {
        let Ok(rp) = self.doc().resolve(pos) else {
            return Vec::new();
        };
        let offset = rp.parent_offset();
        if offset == 0 {
            return Vec::new();
        }
        rp.parent()
            .cut_content(offset - 1, offset)
            .first()
            .filter(|node| node.is_text())
            .map(|node| node.marks().to_vec())
            .unwrap_or_default()
    }

    pub fn undo(&mut self) -> bool {
        self.history.undo()
    }

    pub fn redo(&mut self) -> bool {
        self.history.redo()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn markdown(&self) -> String {
        MarkdownSerializer::serialize(&self.schema, self.doc())
    }

    pub fn html(&self) -> String {
        dom::to_html(self.doc(), &self.schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::default_schema;

    fn editor(markdown: &str) -> Editor {
        Editor::from_markdown(default_schema().unwrap(), markdown, &Config::default()).unwrap()
    }

    #[test]
    fn test_typing_uses_configured_interval() {
        let mut config = Config::default();
        config.typing_throttle = std::time::Duration::from_secs(3600);
        let mut ed = Editor::from_markdown(default_schema().unwrap(), "", &config).unwrap();
        let signal = ed.typing("doc", "thread").unwrap();
        assert_eq!(signal.thread, "thread");
        assert!(ed.typing("doc", "thread").is_none());
        assert!(ed.typing("doc", "other").is_some());
    }

    #[test]
    fn test_commands_and_undo() {
        let mut ed = editor("ab![cat](cat.png)");
        assert!(ed.select_node(3));
        assert!(ed.align_right());
        assert_eq!(ed.markdown(), r#"ab![cat](cat.png "right-50")"#);
        assert!(ed.resize(Some(10), Some(20)));
        assert_eq!(ed.markdown(), r#"ab![cat](cat.png "right-50 =10x20")"#);

        assert!(ed.undo());
        assert_eq!(ed.markdown(), r#"ab![cat](cat.png "right-50")"#);
        assert!(ed.undo());
        assert_eq!(ed.markdown(), "ab![cat](cat.png)");
        assert!(!ed.undo());
        assert!(ed.redo());
        assert_eq!(ed.markdown(), r#"ab![cat](cat.png "right-50")"#);
    }

    #[test]
    fn test_refused_command_keeps_versions() {
        let mut ed = editor("ab![cat](cat.png)");
        ed.select_text(1, 2);
        let doc = ed.doc().clone();
        let selection = ed.selection().clone();
        assert!(!ed.execute(&EditorCommand::AlignLeft));
        assert!(!ed.resize(Some(1), None));
        assert!(ed.doc().ptr_eq(&doc));
        assert_eq!(ed.selection(), &selection);
        assert!(!ed.can_undo());
    }

    #[test]
    fn test_insert_text_keeps_marks() {
        let mut ed = editor("a **b**");
        ed.select_text(4, 4);
        assert!(ed.insert_text("c"));
        assert_eq!(ed.markdown(), "a **bc**");
        assert_eq!(ed.selection().from(), 5);
    }

    #[test]
    fn test_insert_text_runs_input_rules() {
        let mut ed = editor("x");
        ed.select_text(2, 2);
        for c in r#" ![Lorem](image.jpg "left-50")"#.chars() {
            assert!(ed.insert_text(&c.to_string()));
        }
        let para = ed.doc().child(0).unwrap();
        assert_eq!(para.child_count(), 2);
        let image = para.child(1).unwrap();
        assert_eq!(image.attr_str("src"), Some("image.jpg"));
        assert_eq!(image.attr_str("layoutClass"), Some("left-50"));
        assert_eq!(ed.markdown(), r#"x ![Lorem](image.jpg "left-50")"#);
    }

    #[test]
    fn test_execute_routes_undo() {
        let mut ed = editor("![a](a.png)");
        assert!(ed.select_node(1));
        assert!(ed.execute(&EditorCommand::SetAlt("b".into())));
        assert_eq!(ed.doc().node_at(1).unwrap().attr_str("alt"), Some("b"));
        assert!(ed.execute(&EditorCommand::Undo));
        assert_eq!(ed.doc().node_at(1).unwrap().attr_str("alt"), Some("a"));
        assert!(!ed.execute(&EditorCommand::DownloadResource));
    }

    #[test]
    fn test_html() {
        let mut ed = editor("![a](a.png)");
        assert!(ed.select_node(1));
        assert!(ed.align_full_width());
        insta::assert_snapshot!(
            ed.html(),
            @r#"<div><p><div class="image image-full-width"><img src="a.png" alt="a" contenteditable="false"><p class="caption">a</p></div></p></div>"#
        );
    }
}
