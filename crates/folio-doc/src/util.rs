//! Shared string helpers.

/// Escape text for use in element content or a double-quoted attribute.
#[must_use]
pub fn escape_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#x27;"),
            _ => result.push(c),
        }
    }
    result
}

/// Convert heading text to an anchor slug.
///
/// Lowercases ASCII alphanumerics, collapses runs of whitespace, dashes and
/// underscores into one dash and drops everything else. The result never
/// starts or ends with a dash and may be empty.
#[must_use]
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;

    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else if c.is_whitespace() || c == '-' || c == '_' {
            pending_dash = true;
        }
    }

    slug
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("  Getting   Started  "), "getting-started");
        assert_eq!(slugify("snake_case-and-dash"), "snake-case-and-dash");
        assert_eq!(slugify("What's new?"), "whats-new");
        assert_eq!(slugify("--edge--"), "edge");
    }

    #[test]
    fn test_slugify_non_ascii_is_empty() {
        assert_eq!(slugify("Привет"), "");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#x27;Jerry&#x27;&lt;/a&gt;"
        );
    }
}
