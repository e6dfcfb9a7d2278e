//! Input rules: typed shorthand that turns into nodes.
//!
//! On every text insertion the text before the caret in the same textblock
//! (bounded by a lookbehind) plus the inserted text is offered to every
//! registered rule. A rule that matches a suffix of that text replaces the
//! matched span with a constructed node in a single step.

use crate::node::Node;
use crate::schema::Schema;
use crate::state::EditorState;
use crate::title_attrs::parse_title_attribute;
use crate::transform::Transaction;
use crate::types::Selection;
use crate::value::{AttrMap, Value};

/// Stand-in for inline leaves in the matched text.
pub const LEAF_TEXT: &str = "\u{FFFC}";

/// A successful match: the last `len` chars of the text, and the raw
/// attributes for the node that replaces them.
#[derive(Debug, Clone, PartialEq)]
pub struct InputMatch {
    pub len: usize,
    pub attrs: AttrMap,
}

pub type InputMatcher = fn(&str) -> Option<InputMatch>;

#[derive(Debug, Clone)]
pub struct InputRule {
    pub name: &'static str,
    pub matcher: InputMatcher,
}

fn is_bracket(c: char) -> bool {
    matches!(c, '[' | ']')
}

/// Match `![alt](src "title")` at the end of `text`.
///
/// The title may be delimited by straight or curly quotes and is decoded
/// with the title mini-language. `src` is trimmed. Neither `alt` nor the
/// parenthesised part may contain brackets.
pub fn match_media_shorthand(text: &str) -> Option<InputMatch> {
    let body = text.strip_suffix(')')?;

    // Leftmost candidate wins, like an unanchored regex scan.
    for (start, _) in text.match_indices("![") {
        let after = &body[start + 2..];
        let Some(close) = after.find(']') else {
            continue;
        };
        let alt = &after[..close];
        if alt.contains('[') {
            continue;
        }
        let Some(inner) = after[close + 1..].strip_prefix('(') else {
            continue;
        };
        if inner.contains(is_bracket) {
            continue;
        }

        let (src, title) = match inner.find(['"', '“']) {
            Some(quote) => {
                let open_len = inner[quote..].chars().next().map_or(1, char::len_utf8);
                let title = &inner[quote + open_len..];
                let title = title
                    .strip_suffix('"')
                    .or_else(|| title.strip_suffix('”'))
                    .unwrap_or(title);
                (&inner[..quote], Some(title))
            }
            None => (inner, None),
        };
        if src.contains(')') {
            continue;
        }

        let mut attrs = AttrMap::new();
        attrs.insert("src".into(), Value::from(src.trim()));
        attrs.insert("alt".into(), Value::from(Some(alt).filter(|a| !a.is_empty())));
        if let Some(title) = title {
            attrs.extend(parse_title_attribute(title).to_attrs());
        }

        let len = text[start..].chars().count();
        tracing::trace!(len, src = src.trim(), "media shorthand matched");
        return Some(InputMatch { len, attrs });
    }
    None
}

/// Run the input rules for `text` typed over `from..to`.
///
/// Returns the transaction that converts the shorthand, or `None` when no
/// rule matched and the text should be inserted as-is.
pub fn handle_text_input(
    state: &EditorState,
    schema: &Schema,
    from: usize,
    to: usize,
    text: &str,
    lookbehind: usize,
) -> Option<Transaction> {
    let rp = state.doc().resolve(from).ok()?;
    if !rp.parent().is_textblock() {
        return None;
    }
    let offset = rp.parent_offset();
    let mut before = rp
        .parent()
        .text_between(offset.saturating_sub(lookbehind), offset, LEAF_TEXT);
    before.push_str(text);
    let typed = text.chars().count();

    for node_type in schema.node_types() {
        for rule in &node_type.spec.input_rules {
            let Some(found) = (rule.matcher)(&before) else {
                continue;
            };
            if found.len < typed {
                continue;
            }
            let node = match schema.construct_lenient(&node_type.name, found.attrs) {
                Ok(node) => node,
                Err(err) => {
                    tracing::debug!(rule = rule.name, %err, "input rule produced no node");
                    continue;
                }
            };
            let start = from - (found.len - typed);
            if let Some(tr) = replace_span(state, schema, start, to, node) {
                tracing::debug!(rule = rule.name, start, end = to, "input rule applied");
                return Some(tr);
            }
        }
    }
    None
}

fn replace_span(
    state: &EditorState,
    schema: &Schema,
    start: usize,
    end: usize,
    node: Node,
) -> Option<Transaction> {
    let size = node.node_size();
    let mut tr = Transaction::new(state);
    if let Err(err) = tr.replace_with(start, end, vec![node], schema) {
        tracing::debug!(%err, start, end, "input rule replace rejected");
        return None;
    }
    let caret = start + size;
    let selection = Selection::text(tr.doc(), caret, caret);
    tr.set_selection(selection);
    Some(tr)
}
