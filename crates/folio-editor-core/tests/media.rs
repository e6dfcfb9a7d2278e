// End-to-end behaviour of the media node: markdown and element-tree
// round trips, format precedence, commands and live shorthand.

use folio_common::Config;
use folio_editor_core::{
    AttrMap, DomParser, Editor, EditorCommand, Element, MarkdownParser, MarkdownSerializer, Node,
    Schema, Value, default_schema, dom,
};

fn image_doc(schema: &Schema, attrs: AttrMap) -> Node {
    let image = schema.construct("image", attrs).unwrap();
    let para = schema.node("paragraph", AttrMap::new(), vec![image], vec![]).unwrap();
    schema.node("doc", AttrMap::new(), vec![para], vec![]).unwrap()
}

fn first_image(doc: &Node) -> &Node {
    doc.child(0).and_then(|p| p.child(0)).unwrap()
}

fn attrs<const N: usize>(pairs: [(&str, Value); N]) -> AttrMap {
    pairs.into_iter().map(|(k, v)| (k.into(), v)).collect()
}

#[test]
fn markdown_round_trip_keeps_layout_and_size() {
    let schema = default_schema().unwrap();
    let layouts = [Value::Null, "right-50".into(), "left-50".into(), "full-width".into()];
    let sizes = [
        (None, None),
        (Some(320i64), None),
        (None, Some(200i64)),
        (Some(1), Some(2)),
        (Some(5_000_000_000), None),
    ];

    for layout in &layouts {
        for (width, height) in sizes {
            let doc = image_doc(
                &schema,
                attrs([
                    ("src", "https://example.com/a_b.png".into()),
                    ("alt", "A [bracketed] caption".into()),
                    ("layoutClass", layout.clone()),
                    ("width", width.into()),
                    ("height", height.into()),
                ]),
            );
            let markdown = MarkdownSerializer::serialize(&schema, &doc);
            let parsed = MarkdownParser::new(&schema).parse(&markdown).unwrap();
            let (before, after) = (first_image(&doc), first_image(&parsed));
            for name in ["src", "alt", "layoutClass", "width", "height"] {
                assert_eq!(after.attr(name), before.attr(name), "{name} via {markdown}");
            }
        }
    }
}

#[test]
fn markdown_round_trip_escapes_src_and_title() {
    let schema = default_schema().unwrap();
    let cases = [
        ("a.png", r#"say "hi""#),
        ("my photo.png", "plain"),
        ("a)b.png", "plain"),
        ("https://example.com/x?a=1&b=2", r"back\slash &amp; co"),
        ("dir\\(1)<x>.png", "t"),
    ];
    for (src, title) in cases {
        let doc = image_doc(
            &schema,
            attrs([
                ("src", src.into()),
                ("alt", "cap".into()),
                ("title", title.into()),
            ]),
        );
        let markdown = MarkdownSerializer::serialize(&schema, &doc);
        let parsed = MarkdownParser::new(&schema).parse(&markdown).unwrap();
        let image = first_image(&parsed);
        assert_eq!(image.node_type(), "image", "{markdown}");
        assert_eq!(image.attr_str("src"), Some(src), "{markdown}");
        assert_eq!(image.attr_str("alt"), Some("cap"), "{markdown}");
        assert_eq!(image.attr_str("title"), Some(title), "{markdown}");
    }
}

#[test]
fn title_mini_language_from_markdown() {
    let schema = default_schema().unwrap();
    let doc = MarkdownParser::new(&schema)
        .parse(r#"![Lorem](image.jpg "left-50 =100x200")"#)
        .unwrap();
    let image = first_image(&doc);
    assert_eq!(image.attr_str("layoutClass"), Some("left-50"));
    assert_eq!(image.attr_int("width"), Some(100));
    assert_eq!(image.attr_int("height"), Some(200));
}

#[test]
fn export_prefers_layout_over_title() {
    let schema = default_schema().unwrap();
    let doc = image_doc(
        &schema,
        attrs([
            ("src", "a.png".into()),
            ("layoutClass", "full-width".into()),
            ("title", "Sunset".into()),
        ]),
    );
    insta::assert_snapshot!(MarkdownSerializer::serialize(&schema, &doc), @r#"![](a.png "full-width")"#);

    let doc = image_doc(&schema, attrs([("src", "a.png".into()), ("title", "Sunset".into())]));
    insta::assert_snapshot!(MarkdownSerializer::serialize(&schema, &doc), @r#"![](a.png "Sunset")"#);
}

#[test]
fn element_tree_container_beats_bare_img() {
    let schema = default_schema().unwrap();
    let root = Element::new("body").child(
        Element::new("div")
            .attr("class", "image image-left-50")
            .child(Element::new("img").attr("src", "a.png").attr("height", "40"))
            .child(Element::new("p").attr("class", "caption").text("ignored")),
    );
    let doc = DomParser::new(&schema).parse_document(&root).unwrap();
    let image = first_image(&doc);
    assert_eq!(image.attr_str("layoutClass"), Some("left-50"));
    assert_eq!(image.attr_int("height"), Some(40));
    assert_eq!(doc.child(0).unwrap().child_count(), 1);
}

#[test]
fn html_round_trip() {
    let schema = default_schema().unwrap();
    let doc = image_doc(
        &schema,
        attrs([
            ("src", "a.png".into()),
            ("alt", "cap".into()),
            ("layoutClass", "right-50".into()),
            ("width", 12u32.into()),
        ]),
    );
    let root = dom::render(&doc, &schema);
    let parsed = DomParser::new(&schema)
        .parse_document(root.as_element().unwrap())
        .unwrap();
    assert_eq!(parsed, doc);
}

#[test]
fn shorthand_typed_closing_paren_becomes_node() {
    let schema = default_schema().unwrap();
    let mut editor = Editor::from_markdown(schema, "", &Config::default()).unwrap();
    editor.select_text(1, 1);
    for c in r#"![Lorem](image.jpg "left-50")"#.chars() {
        assert!(editor.insert_text(&c.to_string()));
    }

    let para = editor.doc().child(0).unwrap();
    assert_eq!(para.child_count(), 1);
    let image = para.child(0).unwrap();
    assert_eq!(image.node_type(), "image");
    assert_eq!(image.attr_str("src"), Some("image.jpg"));
    assert_eq!(image.attr_str("alt"), Some("Lorem"));
    assert_eq!(image.attr_str("layoutClass"), Some("left-50"));
    assert!(!editor.doc().text_content().contains("!["));

    // One undo removes the conversion and restores the typed text.
    assert!(editor.undo());
    assert_eq!(editor.doc().text_content(), r#"![Lorem](image.jpg "left-50""#);
}

#[test]
fn commands_refuse_without_node_selection() {
    let schema = default_schema().unwrap();
    let mut editor = Editor::from_markdown(schema, "text ![a](a.png)", &Config::default()).unwrap();
    editor.select_text(1, 3);
    let doc = editor.doc().clone();
    let selection = editor.selection().clone();

    for command in [
        EditorCommand::AlignRight,
        EditorCommand::AlignLeft,
        EditorCommand::AlignFullWidth,
        EditorCommand::AlignCenter,
        EditorCommand::Resize { width: Some(1), height: Some(1) },
        EditorCommand::DeleteMedia,
    ] {
        assert!(!editor.execute(&command), "{command}");
        assert!(editor.doc().ptr_eq(&doc));
        assert_eq!(editor.selection(), &selection);
    }
    assert!(editor.download_resource(&NoExporter).is_none());
}

#[test]
fn align_center_is_idempotent() {
    let schema = default_schema().unwrap();
    let mut editor =
        Editor::from_markdown(schema, r#"![a](a.png "right-50")"#, &Config::default()).unwrap();
    assert!(editor.select_node(1));
    assert!(editor.align_center());
    let once = editor.doc().clone();
    assert!(editor.align_center());
    assert_eq!(editor.doc(), &once);
    assert_eq!(editor.markdown(), "![a](a.png)");
}

#[test]
fn align_then_undo_restores_title() {
    let schema = default_schema().unwrap();
    let mut editor =
        Editor::from_markdown(schema, r#"![a](a.png "Sunset")"#, &Config::default()).unwrap();
    assert!(editor.select_node(1));
    assert!(editor.align_left());
    assert_eq!(editor.markdown(), r#"![a](a.png "left-50")"#);
    assert!(editor.undo());
    assert_eq!(editor.markdown(), r#"![a](a.png "Sunset")"#);
    assert!(editor.can_redo());
}

struct NoExporter;

impl folio_editor_core::ResourceExporter for NoExporter {
    async fn fetch(
        &self,
        src: &str,
    ) -> Result<folio_editor_core::FetchedResource, folio_editor_core::ResourceError> {
        Err(folio_editor_core::ResourceError::Status {
            src: src.to_owned(),
            status: 404,
        })
    }

    async fn save(
        &self,
        filename: &str,
        _resource: &folio_editor_core::FetchedResource,
    ) -> Result<folio_editor_core::SavedResource, folio_editor_core::ResourceError> {
        Err(folio_editor_core::ResourceError::Save {
            filename: filename.to_owned(),
            source: "read-only".into(),
        })
    }
}
