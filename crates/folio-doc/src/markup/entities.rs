//! Markup normalization ahead of XML parsing.
//!
//! Stored documents are HTML, not XML: named entities such as `&nbsp;` and
//! void elements written without a closing slash (`<br>`) both trip the XML
//! reader, so they are rewritten first.

use std::sync::LazyLock;

use regex::Regex;

static ENTITY_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&([a-zA-Z][a-zA-Z0-9]*);").expect("invalid entity regex"));

static REFERENCE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(#[xX][0-9a-fA-F]+|#[0-9]+|[a-zA-Z][a-zA-Z0-9]*);")
        .expect("invalid entity reference regex")
});

static VOID_ELEMENT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<(br|hr|img|col|wbr)\b([^>]*?)\s*/?>").expect("invalid void element regex")
});

/// Rewrite HTML-only constructs into well-formed XML.
pub(crate) fn normalize(html: &str) -> String {
    let html = convert_html_entities(html);
    VOID_ELEMENT_PATTERN
        .replace_all(&html, "<${1}${2} />")
        .into_owned()
}

/// Replace named HTML entities with the characters they stand for.
///
/// The five XML entities are left for the XML reader. Unknown names are kept
/// verbatim.
pub(crate) fn convert_html_entities(html: &str) -> String {
    ENTITY_PATTERN
        .replace_all(html, |caps: &regex::Captures| {
            named_entity(&caps[1]).map_or_else(|| caps[0].to_owned(), str::to_owned)
        })
        .into_owned()
}

fn named_entity(name: &str) -> Option<&'static str> {
    Some(match name {
        "nbsp" => "\u{00a0}",
        "ensp" => "\u{2002}",
        "emsp" => "\u{2003}",
        "thinsp" => "\u{2009}",
        "shy" => "\u{00ad}",
        "mdash" => "\u{2014}",
        "ndash" => "\u{2013}",
        "hellip" => "\u{2026}",
        "bull" => "\u{2022}",
        "middot" => "\u{00b7}",
        "laquo" => "\u{00ab}",
        "raquo" => "\u{00bb}",
        "lsquo" => "\u{2018}",
        "rsquo" => "\u{2019}",
        "ldquo" => "\u{201c}",
        "rdquo" => "\u{201d}",
        "copy" => "\u{00a9}",
        "reg" => "\u{00ae}",
        "trade" => "\u{2122}",
        "deg" => "\u{00b0}",
        "times" => "\u{00d7}",
        "divide" => "\u{00f7}",
        "plusmn" => "\u{00b1}",
        "euro" => "\u{20ac}",
        "pound" => "\u{00a3}",
        "yen" => "\u{00a5}",
        "sect" => "\u{00a7}",
        "para" => "\u{00b6}",
        "rarr" => "\u{2192}",
        "larr" => "\u{2190}",
        _ => return None,
    })
}

/// Decode every character and entity reference in `text`.
///
/// Unknown references are kept verbatim.
pub fn unescape_html(text: &str) -> String {
    REFERENCE_PATTERN
        .replace_all(text, |caps: &regex::Captures| decode_entity(&caps[1]))
        .into_owned()
}

/// Decode an entity reference reported by the XML reader.
pub(crate) fn decode_entity(entity: &str) -> String {
    match entity {
        "lt" => "<".to_owned(),
        "gt" => ">".to_owned(),
        "amp" => "&".to_owned(),
        "apos" => "'".to_owned(),
        "quot" => "\"".to_owned(),
        s if s.starts_with('#') => {
            let code = match s.strip_prefix("#x").or_else(|| s.strip_prefix("#X")) {
                Some(hex) => u32::from_str_radix(hex, 16).ok(),
                None => s[1..].parse::<u32>().ok(),
            };
            code.and_then(char::from_u32)
                .map_or_else(|| format!("&{entity};"), |c| c.to_string())
        }
        _ => named_entity(entity).map_or_else(|| format!("&{entity};"), str::to_owned),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_named_entities_converted() {
        assert_eq!(convert_html_entities("a&nbsp;b&mdash;c"), "a\u{a0}b\u{2014}c");
    }

    #[test]
    fn test_xml_entities_preserved() {
        assert_eq!(convert_html_entities("&amp;&lt;&gt;"), "&amp;&lt;&gt;");
    }

    #[test]
    fn test_unknown_entity_preserved() {
        assert_eq!(convert_html_entities("&bogus;"), "&bogus;");
    }

    #[test]
    fn test_void_elements_closed() {
        assert_eq!(normalize("a<br>b<br/>c<br />"), "a<br />b<br />c<br />");
        assert_eq!(
            normalize(r#"<img src="a.png" alt="A">"#),
            r#"<img src="a.png" alt="A" />"#
        );
    }

    #[test]
    fn test_decode_numeric_entities() {
        assert_eq!(decode_entity("#x27"), "'");
        assert_eq!(decode_entity("#65"), "A");
        assert_eq!(decode_entity("#xZZ"), "&#xZZ;");
    }

    #[test]
    fn test_unescape_html() {
        assert_eq!(
            unescape_html("a=1&amp;b=&#50;&nbsp;&bogus; &#x41;"),
            "a=1&b=2\u{a0}&bogus; A"
        );
    }
}
