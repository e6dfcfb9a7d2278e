//! Command execution.
//!
//! Every command is a pure function of `(state, schema, args)` returning the
//! transaction to apply, or `None` when its precondition does not hold. A
//! `None` leaves the caller's document and selection untouched.

use crate::actions::EditorCommand;
use crate::node::Node;
use crate::schema::{NodeTypeSpec, Schema};
use crate::state::EditorState;
use crate::transform::Transaction;
use crate::types::{NodeSelection, Selection};
use crate::value::{AttrMap, Value};

/// Run a document command against the current selection.
///
/// Node-level commands go to the selected node type's handler, so node
/// types without a handler (or without the command) refuse them.
pub fn execute_command(
    command: &EditorCommand,
    state: &EditorState,
    schema: &Schema,
) -> Option<Transaction> {
    if !command.is_transactional() {
        return None;
    }
    let Some(selected) = state.selection().node() else {
        tracing::debug!(command = %command, "command needs a node selection");
        return None;
    };
    let handler = schema.resolve(selected.node.node_type()).ok()?.commands?;
    let tr = handler(command, state, schema);
    tracing::debug!(command = %command, handled = tr.is_some(), "executed command");
    tr
}

/// The node selection and its type, when the selected node declares `attr`.
fn selected_with<'s>(
    state: &'s EditorState,
    schema: &'s Schema,
    attr: &str,
) -> Option<(&'s NodeSelection, &'s NodeTypeSpec)> {
    let selected = state.selection().node()?;
    let spec = schema.resolve(selected.node.node_type()).ok()?;
    spec.attr_spec(attr)?;
    Some((selected, spec))
}

/// Replace attributes of the selected node and re-select it in the new doc.
pub fn set_selected_attrs(
    state: &EditorState,
    schema: &Schema,
    selected: &NodeSelection,
    update: impl FnOnce(&mut AttrMap),
) -> Option<Transaction> {
    let mut attrs = selected.node.attrs().clone();
    update(&mut attrs);

    let mut tr = Transaction::new(state);
    if let Err(err) = tr.set_node_attrs(selected.pos, attrs, schema) {
        tracing::debug!(%err, pos = selected.pos, "attribute update rejected");
        return None;
    }
    let selection = Selection::node_at(tr.doc(), selected.pos)?;
    tr.set_selection(selection);
    Some(tr)
}

/// Set width and height of the selected media node.
pub fn resize(
    state: &EditorState,
    schema: &Schema,
    width: Option<u32>,
    height: Option<u32>,
) -> Option<Transaction> {
    let (selected, spec) = selected_with(state, schema, "width")?;
    spec.attr_spec("height")?;
    set_selected_attrs(state, schema, selected, |attrs| {
        attrs.insert("width".into(), Value::from(width));
        attrs.insert("height".into(), Value::from(height));
    })
}

fn align(state: &EditorState, schema: &Schema, layout: &'static str) -> Option<Transaction> {
    let (selected, _) = selected_with(state, schema, "layoutClass")?;
    set_selected_attrs(state, schema, selected, |attrs| {
        attrs.insert("title".into(), Value::Null);
        attrs.insert("layoutClass".into(), Value::from(layout));
    })
}

pub fn align_right(state: &EditorState, schema: &Schema) -> Option<Transaction> {
    align(state, schema, "right-50")
}

pub fn align_left(state: &EditorState, schema: &Schema) -> Option<Transaction> {
    align(state, schema, "left-50")
}

pub fn align_full_width(state: &EditorState, schema: &Schema) -> Option<Transaction> {
    align(state, schema, "full-width")
}

/// Clear the layout class. The title is kept.
pub fn align_center(state: &EditorState, schema: &Schema) -> Option<Transaction> {
    let (selected, _) = selected_with(state, schema, "layoutClass")?;
    set_selected_attrs(state, schema, selected, |attrs| {
        attrs.insert("layoutClass".into(), Value::Null);
    })
}

/// Remove the selected media node.
pub fn delete_media(state: &EditorState, schema: &Schema) -> Option<Transaction> {
    let (selected, _) = selected_with(state, schema, "src")?;
    let mut tr = Transaction::new(state);
    let end = selected.pos + selected.node.node_size();
    if let Err(err) = tr.delete(selected.pos, end, schema) {
        tracing::debug!(%err, "media delete rejected");
        return None;
    }
    Some(tr)
}

/// Replace the caption of the selected media node. An empty caption clears it.
pub fn set_alt(state: &EditorState, schema: &Schema, alt: &str) -> Option<Transaction> {
    let (selected, _) = selected_with(state, schema, "alt")?;
    let alt = Some(alt).filter(|a| !a.is_empty());
    set_selected_attrs(state, schema, selected, |attrs| {
        attrs.insert("alt".into(), Value::from(alt));
    })
}

/// The selected node and the value of its resource attribute, when the
/// selection allows a download.
pub fn download_target(state: &EditorState, schema: &Schema) -> Option<(Node, String)> {
    let selected = state.selection().node()?;
    let spec = schema.resolve(selected.node.node_type()).ok()?;
    let attr = spec.resource_attr?;
    let src = selected.node.attr(attr).and_then(Value::as_str).unwrap_or_default();
    Some((selected.node.clone(), src.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::{default_schema, simple_schema};
    use crate::value::attrs;

    fn media_state(schema: &Schema, image_attrs: AttrMap) -> EditorState {
        let image = schema.construct("image", image_attrs).unwrap();
        let para = schema
            .node(
                "paragraph",
                AttrMap::new(),
                vec![schema.text("ab", vec![]).unwrap(), image],
                vec![],
            )
            .unwrap();
        let doc = schema.node("doc", AttrMap::new(), vec![para], vec![]).unwrap();
        let state = EditorState::new(doc);
        let sel = Selection::node_at(state.doc(), 3).unwrap();
        state.with_selection(sel)
    }

    #[test]
    fn test_resize_reselects_node() {
        let schema = default_schema().unwrap();
        let state = media_state(&schema, attrs([("src", "a.png")]));
        let tr = resize(&state, &schema, Some(100), None).unwrap();
        let next = state.apply(&tr).unwrap();

        let selected = next.selection().node().unwrap();
        assert_eq!(selected.pos, 3);
        assert_eq!(selected.node.attr_int("width"), Some(100));
        assert_eq!(selected.node.attr("height"), Some(&Value::Null));
        assert!(selected.node.ptr_eq(next.doc().node_at(3).unwrap()));
    }

    #[test]
    fn test_align_clears_title() {
        let schema = default_schema().unwrap();
        let state = media_state(&schema, attrs([("src", "a.png"), ("title", "t")]));
        let next = state.apply(&align_left(&state, &schema).unwrap()).unwrap();
        let node = next.doc().node_at(3).unwrap();
        assert_eq!(node.attr_str("layoutClass"), Some("left-50"));
        assert_eq!(node.attr("title"), Some(&Value::Null));
    }

    #[test]
    fn test_align_center_keeps_title_and_is_idempotent() {
        let schema = default_schema().unwrap();
        let state = media_state(
            &schema,
            attrs([("src", "a.png"), ("title", "t"), ("layoutClass", "right-50")]),
        );
        let once = state.apply(&align_center(&state, &schema).unwrap()).unwrap();
        let twice = once.apply(&align_center(&once, &schema).unwrap()).unwrap();
        assert_eq!(once.doc(), twice.doc());
        let node = twice.doc().node_at(3).unwrap();
        assert_eq!(node.attr("layoutClass"), Some(&Value::Null));
        assert_eq!(node.attr_str("title"), Some("t"));
    }

    #[test]
    fn test_text_selection_refuses() {
        let schema = default_schema().unwrap();
        let state = media_state(&schema, attrs([("src", "a.png")]));
        let state = state.with_selection(Selection::text(state.doc(), 1, 2));
        assert!(resize(&state, &schema, Some(1), Some(1)).is_none());
        assert!(align_right(&state, &schema).is_none());
        assert!(align_center(&state, &schema).is_none());
        assert!(download_target(&state, &schema).is_none());
        assert!(execute_command(&EditorCommand::AlignLeft, &state, &schema).is_none());
    }

    #[test]
    fn test_simple_media_has_no_layout() {
        let schema = simple_schema().unwrap();
        let state = media_state(&schema, attrs([("src", "a.png")]));
        assert!(align_right(&state, &schema).is_none());
        assert!(resize(&state, &schema, Some(1), None).is_none());
        assert!(download_target(&state, &schema).is_none());
        assert!(set_alt(&state, &schema, "caption").is_some());
    }

    #[test]
    fn test_delete_media() {
        let schema = default_schema().unwrap();
        let state = media_state(&schema, attrs([("src", "a.png")]));
        let next = state.apply(&delete_media(&state, &schema).unwrap()).unwrap();
        assert_eq!(next.doc().content_size(), 4);
        assert!(next.selection().node().is_none());
    }

    #[test]
    fn test_download_target() {
        let schema = default_schema().unwrap();
        let state = media_state(&schema, attrs([("src", "a.png")]));
        let (node, src) = download_target(&state, &schema).unwrap();
        assert_eq!(node.node_type(), "image");
        assert_eq!(src, "a.png");
    }
}
