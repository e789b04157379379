//! Node tree to markup.
//!
//! Output is deterministic: attributes are written in a fixed order and marks
//! are nested in their canonical order, so serializing a parsed document
//! yields the same string every time.

use std::fmt::Write;

use super::parser::{TEXT_BOX_CONTENT_CLASS, TEXT_BOX_TITLE_CLASS, TEXT_BOX_TYPE};
use crate::block::TextBoxAttrs;
use crate::node::{Mark, Node, NodeKind};
use crate::util::escape_html;

/// Serialize a sequence of block nodes.
#[must_use]
pub fn serialize_blocks(nodes: &[Node]) -> String {
    let mut out = String::with_capacity(1024);
    for node in nodes {
        render(node, &mut out);
    }
    out
}

/// Render a single node (and its subtree) as markup.
pub fn render(node: &Node, out: &mut String) {
    match &node.kind {
        NodeKind::Document => render_blocks(&node.children, out),
        NodeKind::Paragraph => wrap("p", node, out),
        NodeKind::Heading { level, anchor } => {
            write!(out, "<h{level}").unwrap();
            if let Some(anchor) = anchor {
                write!(out, r#" id="{}""#, escape_html(anchor)).unwrap();
            }
            out.push('>');
            render_inlines(&node.children, out);
            write!(out, "</h{level}>").unwrap();
        }
        NodeKind::BulletList => wrap("ul", node, out),
        NodeKind::OrderedList { start } => {
            if *start == 1 {
                out.push_str("<ol>");
            } else {
                write!(out, r#"<ol start="{start}">"#).unwrap();
            }
            render_blocks(&node.children, out);
            out.push_str("</ol>");
        }
        NodeKind::ListItem => wrap("li", node, out),
        NodeKind::Blockquote => wrap("blockquote", node, out),
        NodeKind::CodeBlock { language } => {
            match language {
                Some(lang) => write!(out, r#"<pre><code class="language-{}">"#, escape_html(lang))
                    .unwrap(),
                None => out.push_str("<pre><code>"),
            }
            out.push_str(&escape_html(&node.text_content()));
            out.push_str("</code></pre>");
        }
        NodeKind::Table => wrap("table", node, out),
        NodeKind::TableRow => wrap("tr", node, out),
        NodeKind::TableCell { header } => wrap(if *header { "th" } else { "td" }, node, out),
        NodeKind::HorizontalRule => out.push_str("<hr />"),
        NodeKind::Image { src, alt, title } => {
            write!(
                out,
                r#"<img src="{}" alt="{}""#,
                escape_html(src),
                escape_html(alt)
            )
            .unwrap();
            if let Some(title) = title {
                write!(out, r#" title="{}""#, escape_html(title)).unwrap();
            }
            out.push_str(" />");
        }
        NodeKind::HardBreak => out.push_str("<br />"),
        NodeKind::Text { .. } => render_inlines(std::slice::from_ref(node), out),
        NodeKind::TextBox(attrs) => render_text_box(attrs, &node.children, out),
    }
}

fn wrap(tag: &str, node: &Node, out: &mut String) {
    write!(out, "<{tag}>").unwrap();
    if node.kind.is_textblock() {
        render_inlines(&node.children, out);
    } else {
        render_blocks(&node.children, out);
    }
    write!(out, "</{tag}>").unwrap();
}

fn render_blocks(nodes: &[Node], out: &mut String) {
    for node in nodes {
        render(node, out);
    }
}

/// Render inline content, sharing open mark tags between adjacent runs.
fn render_inlines(nodes: &[Node], out: &mut String) {
    let mut open: Vec<&Mark> = Vec::new();

    for node in nodes {
        match &node.kind {
            NodeKind::Text { text, marks } => {
                let shared = open
                    .iter()
                    .zip(marks)
                    .take_while(|(a, b)| **a == *b)
                    .count();
                close_marks(&mut open, shared, out);
                for mark in &marks[shared..] {
                    open_mark(mark, out);
                    open.push(mark);
                }
                out.push_str(&escape_html(text));
            }
            _ => {
                close_marks(&mut open, 0, out);
                render(node, out);
            }
        }
    }
    close_marks(&mut open, 0, out);
}

fn open_mark(mark: &Mark, out: &mut String) {
    match mark {
        Mark::Link { href } => write!(out, r#"<a href="{}">"#, escape_html(href)).unwrap(),
        other => write!(out, "<{}>", other.tag()).unwrap(),
    }
}

fn close_marks(open: &mut Vec<&Mark>, keep: usize, out: &mut String) {
    while open.len() > keep {
        if let Some(mark) = open.pop() {
            write!(out, "</{}>", mark.tag()).unwrap();
        }
    }
}

fn render_text_box(attrs: &TextBoxAttrs, children: &[Node], out: &mut String) {
    write!(
        out,
        r#"<div data-type="{TEXT_BOX_TYPE}" data-x="{}" data-y="{}" data-w="{}" data-h="{}""#,
        attrs.x, attrs.y, attrs.w, attrs.h
    )
    .unwrap();
    if let Some(title) = &attrs.title {
        write!(out, r#" data-title="{}""#, escape_html(title)).unwrap();
    }
    write!(
        out,
        r#" data-vertical="{}" data-background="{}" data-border-color="{}""#,
        attrs.vertical,
        escape_html(&attrs.background),
        escape_html(&attrs.border_color)
    )
    .unwrap();
    if let Some(snap) = attrs.snap_increment {
        write!(out, r#" data-snap="{snap}""#).unwrap();
    }
    write!(out, r#" style="{}">"#, escape_html(&attrs.container_style())).unwrap();

    if let Some(title) = &attrs.title {
        write!(
            out,
            r#"<div class="{TEXT_BOX_TITLE_CLASS}">{}</div>"#,
            escape_html(title)
        )
        .unwrap();
    }
    write!(
        out,
        r#"<div class="{TEXT_BOX_CONTENT_CLASS}" style="{}">"#,
        attrs.content_style()
    )
    .unwrap();
    render_blocks(children, out);
    out.push_str("</div></div>");
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::markup::parse_blocks;

    fn roundtrip(markup: &str) {
        let first = parse_blocks(markup).unwrap();
        let serialized = serialize_blocks(&first);
        let second = parse_blocks(&serialized).unwrap();
        assert_eq!(first, second, "serialized: {serialized}");
    }

    #[test]
    fn test_serialize_marks_share_prefix() {
        let nodes = parse_blocks("<p><strong>a<em>b</em></strong>c</p>").unwrap();
        assert_eq!(
            serialize_blocks(&nodes),
            "<p><strong>a<em>b</em></strong>c</p>"
        );
    }

    #[test]
    fn test_serialize_escapes_text() {
        let nodes = vec![Node::paragraph("a < b & c")];
        assert_eq!(serialize_blocks(&nodes), "<p>a &lt; b &amp; c</p>");
    }

    #[test]
    fn test_serialize_ordered_list_start() {
        let nodes = parse_blocks("<ol><li>a</li></ol><ol start=\"4\"><li>b</li></ol>").unwrap();
        assert_eq!(
            serialize_blocks(&nodes),
            r#"<ol><li><p>a</p></li></ol><ol start="4"><li><p>b</p></li></ol>"#
        );
    }

    #[test]
    fn test_serialize_text_box_contract() {
        let attrs = TextBoxAttrs {
            title: Some("Note".to_owned()),
            vertical: true,
            ..TextBoxAttrs::default()
        };
        let node = Node::new(NodeKind::TextBox(attrs)).with_children(vec![Node::paragraph("x")]);
        let html = serialize_blocks(&[node]);
        assert!(html.starts_with(r#"<div data-type="text-box" data-x="40" data-y="40" data-w="260" data-h="140" data-title="Note""#));
        assert!(html.contains(
            "position:absolute;left:40px;top:40px;width:260px;height:140px;background:#ffffff;border:1px solid #94a3b8"
        ));
        assert!(html.contains(r#"<div class="text-box-title">Note</div>"#));
        assert!(html.contains("writing-mode:vertical-rl;text-orientation:mixed"));
        assert!(html.ends_with("<p>x</p></div></div>"));
    }

    #[test]
    fn test_roundtrip_rich_document() {
        roundtrip(concat!(
            r#"<h1 id="top">Title</h1>"#,
            "<p>Plain <strong>bold <em>both</em></strong> <a href=\"https://x.test/?a=1&amp;b=2\">link</a><br />next</p>",
            "<ul><li><p>one</p><ul><li><p>nested</p></li></ul></li></ul>",
            "<blockquote><p>quoted</p></blockquote>",
            r#"<pre><code class="language-rust">let x = 1 &lt; 2;</code></pre>"#,
            "<table><tr><th><p>H</p></th></tr><tr><td><p>v</p></td></tr></table>",
            "<hr />",
            r#"<p><img src="a.png" alt="A" title="T" /></p>"#,
        ));
    }

    const TEXT_BOX_MARKUP: &str = concat!(
        r#"<div data-type="text-box" data-x="12.5" data-y="-4" data-w="100" data-h="80" "#,
        r##"data-title="A &quot;title&quot;" data-vertical="true" data-background="#fef3c7" "##,
        r##"data-border-color="#f59e0b" data-snap="10"><div class="text-box-content">"##,
        "<h2>Inside</h2><p>text</p></div></div>",
    );

    #[test]
    fn test_roundtrip_text_box() {
        roundtrip(TEXT_BOX_MARKUP);
    }

    #[test]
    fn test_text_box_attrs_survive_serialize() {
        let serialized = serialize_blocks(&parse_blocks(TEXT_BOX_MARKUP).unwrap());
        let nodes = parse_blocks(&serialized).unwrap();
        let NodeKind::TextBox(attrs) = &nodes[0].kind else {
            panic!("expected text box");
        };
        assert_eq!(
            *attrs,
            TextBoxAttrs {
                x: 12.5,
                y: -4.0,
                w: 100.0,
                h: 80.0,
                title: Some(r#"A "title""#.to_owned()),
                vertical: true,
                background: "#fef3c7".to_owned(),
                border_color: "#f59e0b".to_owned(),
                snap_increment: Some(10.0),
            }
        );
        assert_eq!(nodes[0].children.len(), 2);
    }

    #[test]
    fn test_serialize_is_stable() {
        let nodes = parse_blocks("<p><em><b>x</b></em> y</p>").unwrap();
        let once = serialize_blocks(&nodes);
        let twice = serialize_blocks(&parse_blocks(&once).unwrap());
        assert_eq!(once, twice);
    }
}
