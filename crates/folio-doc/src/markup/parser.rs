//! Markup to node tree.
//!
//! Parsing runs in two passes. The XML reader builds a loose element tree,
//! which is then mapped onto the closed node set. Unknown containers are
//! unwrapped, loose inline content at block level is gathered into
//! paragraphs, and marks are normalized so equal content always yields an
//! equal tree.

use std::borrow::Cow;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use super::entities::{decode_entity, normalize};
use crate::block::{
    DEFAULT_BACKGROUND, DEFAULT_BORDER_COLOR, DEFAULT_HEIGHT, DEFAULT_WIDTH, DEFAULT_X, DEFAULT_Y,
    TextBoxAttrs,
};
use crate::error::MarkupError;
use crate::node::{Mark, Node, NodeKind};

/// Value of `data-type` identifying a text box container.
pub(crate) const TEXT_BOX_TYPE: &str = "text-box";
/// Class of the text box title line.
pub(crate) const TEXT_BOX_TITLE_CLASS: &str = "text-box-title";
/// Class of the text box content region.
pub(crate) const TEXT_BOX_CONTENT_CLASS: &str = "text-box-content";

#[derive(Debug, Default)]
struct Element {
    tag: String,
    attrs: Vec<(String, String)>,
    children: Vec<Content>,
}

#[derive(Debug)]
enum Content {
    Element(Element),
    Text(String),
}

impl Element {
    fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }

    fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(&self.children, &mut out);
        out
    }
}

fn collect_text(children: &[Content], out: &mut String) {
    for child in children {
        match child {
            Content::Text(text) => out.push_str(text),
            Content::Element(el) if el.tag == "br" => out.push('\n'),
            Content::Element(el) => collect_text(&el.children, out),
        }
    }
}

/// Parse markup into the top-level block nodes of a document.
pub fn parse_blocks(markup: &str) -> Result<Vec<Node>, MarkupError> {
    let root = read_tree(markup)?;
    Ok(blocks(&root.children))
}

fn read_tree(markup: &str) -> Result<Element, MarkupError> {
    let wrapped = format!("<root>{}</root>", normalize(markup));
    let mut reader = Reader::from_str(&wrapped);
    reader.config_mut().trim_text(false);

    let mut stack: Vec<Element> = Vec::new();
    let mut root = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => stack.push(open_element(&reader, &e)),
            Event::Empty(e) => {
                let element = open_element(&reader, &e);
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(Content::Element(element));
                }
            }
            Event::Text(e) => {
                let text = reader.decoder().decode(&e)?;
                push_text(&mut stack, &text);
            }
            Event::GeneralRef(e) => {
                let entity = reader.decoder().decode(&e)?;
                push_text(&mut stack, &decode_entity(&entity));
            }
            Event::CData(e) => push_text(&mut stack, &String::from_utf8_lossy(&e)),
            Event::End(e) => {
                let Some(done) = stack.pop() else {
                    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                    return Err(MarkupError::UnexpectedClose(name));
                };
                match stack.last_mut() {
                    Some(parent) => parent.children.push(Content::Element(done)),
                    None => root = Some(done),
                }
            }
            Event::Eof => break,
            Event::Comment(_) | Event::Decl(_) | Event::PI(_) | Event::DocType(_) => {}
        }
        buf.clear();
    }

    if let Some(open) = stack.pop() {
        return Err(MarkupError::Unclosed(open.tag));
    }
    root.ok_or_else(|| MarkupError::Unclosed("root".to_owned()))
}

fn open_element<R>(reader: &Reader<R>, e: &BytesStart) -> Element {
    let tag = decode_lossy(reader, e.name().as_ref()).to_ascii_lowercase();
    let attrs = e
        .attributes()
        .flatten()
        .map(|attr| {
            let key = decode_lossy(reader, attr.key.as_ref()).to_ascii_lowercase();
            let value = attr.unescape_value().map_or_else(
                |_| String::from_utf8_lossy(&attr.value).into_owned(),
                Cow::into_owned,
            );
            (key, value)
        })
        .collect();
    Element {
        tag,
        attrs,
        children: Vec::new(),
    }
}

fn decode_lossy<R>(reader: &Reader<R>, bytes: &[u8]) -> String {
    reader.decoder().decode(bytes).map_or_else(
        |_| String::from_utf8_lossy(bytes).into_owned(),
        Cow::into_owned,
    )
}

fn push_text(stack: &mut [Element], text: &str) {
    let Some(parent) = stack.last_mut() else {
        return;
    };
    if let Some(Content::Text(last)) = parent.children.last_mut() {
        last.push_str(text);
    } else {
        parent.children.push(Content::Text(text.to_owned()));
    }
}

/// Map block-context content. Loose inline runs become paragraphs.
fn blocks<'a>(children: impl IntoIterator<Item = &'a Content>) -> Vec<Node> {
    let mut out = Vec::new();
    let mut pending = Vec::new();

    for child in children {
        match child {
            Content::Element(el) if is_block_tag(&el.tag) => {
                flush_paragraph(&mut pending, &mut out);
                block(el, &mut out);
            }
            other => inline(other, &[], &mut pending),
        }
    }
    flush_paragraph(&mut pending, &mut out);
    out
}

fn flush_paragraph(pending: &mut Vec<Node>, out: &mut Vec<Node>) {
    if pending.is_empty() {
        return;
    }
    let run = finish_inlines(std::mem::take(pending));
    let blank = run.iter().all(|n| match &n.kind {
        NodeKind::Text { text, .. } => text.trim().is_empty(),
        _ => false,
    });
    if !blank {
        out.push(Node::new(NodeKind::Paragraph).with_children(run));
    }
}

fn is_block_tag(tag: &str) -> bool {
    matches!(
        tag,
        "p" | "h1"
            | "h2"
            | "h3"
            | "h4"
            | "h5"
            | "h6"
            | "ul"
            | "ol"
            | "li"
            | "blockquote"
            | "pre"
            | "table"
            | "hr"
            | "div"
            | "section"
            | "article"
            | "header"
            | "footer"
            | "main"
            | "nav"
            | "aside"
    )
}

fn block(el: &Element, out: &mut Vec<Node>) {
    let node = match el.tag.as_str() {
        "p" => Node::new(NodeKind::Paragraph).with_children(inlines(&el.children)),
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
            let level = el.tag[1..].parse().unwrap_or(1);
            let anchor = el.attr("id").filter(|id| !id.is_empty()).map(str::to_owned);
            Node::new(NodeKind::Heading { level, anchor }).with_children(inlines(&el.children))
        }
        "ul" => Node::new(NodeKind::BulletList).with_children(list_items(&el.children)),
        "ol" => {
            let start = el.attr("start").and_then(|s| s.trim().parse().ok()).unwrap_or(1);
            Node::new(NodeKind::OrderedList { start }).with_children(list_items(&el.children))
        }
        "li" => Node::new(NodeKind::ListItem).with_children(blocks(&el.children)),
        "blockquote" => Node::new(NodeKind::Blockquote).with_children(blocks(&el.children)),
        "pre" => code_block(el),
        "table" => Node::new(NodeKind::Table).with_children(table_rows(&el.children)),
        "hr" => Node::new(NodeKind::HorizontalRule),
        "div" if el.attr("data-type") == Some(TEXT_BOX_TYPE) => text_box(el),
        _ => {
            out.extend(blocks(&el.children));
            return;
        }
    };
    out.push(node);
}

fn list_items(children: &[Content]) -> Vec<Node> {
    let mut items = Vec::new();
    for child in children {
        match child {
            Content::Element(el) if el.tag == "li" => {
                items.push(Node::new(NodeKind::ListItem).with_children(blocks(&el.children)));
            }
            Content::Text(text) if text.trim().is_empty() => {}
            other => {
                let content = blocks([other]);
                if !content.is_empty() {
                    items.push(Node::new(NodeKind::ListItem).with_children(content));
                }
            }
        }
    }
    items
}

fn table_rows(children: &[Content]) -> Vec<Node> {
    let mut rows = Vec::new();
    for child in children {
        let Content::Element(el) = child else {
            continue;
        };
        match el.tag.as_str() {
            "thead" | "tbody" | "tfoot" => rows.extend(table_rows(&el.children)),
            "tr" => {
                let cells = el
                    .children
                    .iter()
                    .filter_map(|c| match c {
                        Content::Element(cell) if cell.tag == "td" || cell.tag == "th" => Some(
                            Node::new(NodeKind::TableCell {
                                header: cell.tag == "th",
                            })
                            .with_children(blocks(&cell.children)),
                        ),
                        _ => None,
                    })
                    .collect();
                rows.push(Node::new(NodeKind::TableRow).with_children(cells));
            }
            _ => {}
        }
    }
    rows
}

fn code_block(el: &Element) -> Node {
    let code = el.children.iter().find_map(|c| match c {
        Content::Element(inner) if inner.tag == "code" => Some(inner),
        _ => None,
    });
    let language = code
        .and_then(|c| c.attr("class"))
        .and_then(|classes| {
            classes
                .split_whitespace()
                .find_map(|c| c.strip_prefix("language-"))
        })
        .filter(|lang| !lang.is_empty())
        .map(str::to_owned);
    let text = el.text_content();
    let children = if text.is_empty() {
        Vec::new()
    } else {
        vec![Node::text(text)]
    };
    Node::new(NodeKind::CodeBlock { language }).with_children(children)
}

fn text_box(el: &Element) -> Node {
    let mut attrs = TextBoxAttrs {
        x: geometry_attr(el, "data-x", DEFAULT_X, false),
        y: geometry_attr(el, "data-y", DEFAULT_Y, false),
        w: geometry_attr(el, "data-w", DEFAULT_WIDTH, true),
        h: geometry_attr(el, "data-h", DEFAULT_HEIGHT, true),
        title: el.attr("data-title").map(str::to_owned),
        vertical: el.attr("data-vertical") == Some("true"),
        background: el
            .attr("data-background")
            .filter(|v| !v.is_empty())
            .unwrap_or(DEFAULT_BACKGROUND)
            .to_owned(),
        border_color: el
            .attr("data-border-color")
            .filter(|v| !v.is_empty())
            .unwrap_or(DEFAULT_BORDER_COLOR)
            .to_owned(),
        snap_increment: None,
    };

    if let Some(raw) = el.attr("data-snap") {
        match raw.trim().parse::<f64>() {
            Ok(snap) if snap.is_finite() && snap > 0.0 => attrs.snap_increment = Some(snap),
            _ => tracing::warn!(value = raw, "Ignoring invalid text box snap increment"),
        }
    }

    let mut content = None;
    for child in &el.children {
        let Content::Element(inner) = child else {
            continue;
        };
        if inner.has_class(TEXT_BOX_CONTENT_CLASS) {
            content = Some(blocks(&inner.children));
        } else if inner.has_class(TEXT_BOX_TITLE_CLASS) && attrs.title.is_none() {
            attrs.title = Some(inner.text_content());
        }
    }

    // Markup without a content wrapper: everything except the title is content.
    let mut children = content.unwrap_or_else(|| {
        blocks(el.children.iter().filter(|c| {
            !matches!(c, Content::Element(inner) if inner.has_class(TEXT_BOX_TITLE_CLASS))
        }))
    });
    if children.is_empty() {
        children.push(Node::new(NodeKind::Paragraph));
    }

    Node::new(NodeKind::TextBox(attrs)).with_children(children)
}

fn geometry_attr(el: &Element, name: &str, default: f64, positive: bool) -> f64 {
    let Some(raw) = el.attr(name) else {
        return default;
    };
    match raw.trim().trim_end_matches("px").parse::<f64>() {
        Ok(value) if value.is_finite() && (!positive || value > 0.0) => value,
        _ => {
            tracing::warn!(attr = name, value = raw, default, "Invalid text box geometry, using default");
            default
        }
    }
}

fn inlines(children: &[Content]) -> Vec<Node> {
    let mut out = Vec::new();
    for child in children {
        inline(child, &[], &mut out);
    }
    finish_inlines(out)
}

fn inline(content: &Content, marks: &[Mark], out: &mut Vec<Node>) {
    let el = match content {
        Content::Text(text) => {
            if !text.is_empty() {
                out.push(Node::new(NodeKind::Text {
                    text: text.clone(),
                    marks: marks.to_vec(),
                }));
            }
            return;
        }
        Content::Element(el) => el,
    };

    let mark = match el.tag.as_str() {
        "br" => {
            out.push(Node::new(NodeKind::HardBreak));
            return;
        }
        "img" => {
            out.push(Node::new(NodeKind::Image {
                src: el.attr("src").unwrap_or_default().to_owned(),
                alt: el.attr("alt").unwrap_or_default().to_owned(),
                title: el.attr("title").map(str::to_owned),
            }));
            return;
        }
        "strong" | "b" => Some(Mark::Bold),
        "em" | "i" => Some(Mark::Italic),
        "u" => Some(Mark::Underline),
        "s" | "strike" | "del" => Some(Mark::Strike),
        "code" => Some(Mark::Code),
        "a" => el.attr("href").map(|href| Mark::Link {
            href: href.to_owned(),
        }),
        _ => None,
    };

    let mut nested = marks.to_vec();
    nested.extend(mark);
    for child in &el.children {
        inline(child, &nested, out);
    }
}

/// Sort marks canonically and merge adjacent runs with equal marks.
pub(crate) fn finish_inlines(nodes: Vec<Node>) -> Vec<Node> {
    let mut out: Vec<Node> = Vec::with_capacity(nodes.len());
    for mut node in nodes {
        if let NodeKind::Text { text, marks } = &mut node.kind {
            if text.is_empty() {
                continue;
            }
            marks.sort();
            marks.dedup();
            if let Some(NodeKind::Text {
                text: prev_text,
                marks: prev_marks,
            }) = out.last_mut().map(|n| &mut n.kind)
                && prev_marks == marks
            {
                prev_text.push_str(text);
                continue;
            }
        }
        out.push(node);
    }
    out
}
