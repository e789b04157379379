//! Standalone HTML page wrapped around exported content.

use std::fmt::Write;

use folio_doc::escape_html;

/// Title used when none is configured.
pub const DEFAULT_TITLE: &str = "Document";

const PRINT_CSS: &str = "\
@page { size: A4; margin: 20mm; }
body { margin: 0; font-family: system-ui, -apple-system, \"Segoe UI\", sans-serif; color: #1f2937; line-height: 1.5; }
header, footer { color: #6b7280; font-size: 0.85em; }
header { border-bottom: 1px solid #e5e7eb; margin-bottom: 1em; }
footer { border-top: 1px solid #e5e7eb; margin-top: 1em; }
main { position: relative; }
nav.toc ul { list-style: none; padding-left: 1.25em; }
img.qrcode { width: 96px; height: 96px; vertical-align: middle; }
.qrcode-error { color: #b91c1c; font-family: monospace; }
table { border-collapse: collapse; }
td, th { border: 1px solid #d1d5db; padding: 0.25em 0.5em; }
@media print { header, footer { break-inside: avoid; } [data-type=\"text-box\"] { break-inside: avoid; } }
";

/// Header, footer and title shared by every export of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentShell {
    pub title: String,
    /// Markup placed in `<header>`.
    pub header: String,
    /// Markup placed in `<footer>`.
    pub footer: String,
}

impl Default for DocumentShell {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_owned(),
            header: String::new(),
            footer: String::new(),
        }
    }
}

impl DocumentShell {
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        self.header = header.into();
        self
    }

    #[must_use]
    pub fn with_footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = footer.into();
        self
    }

    /// Wrap `body` into a complete HTML page.
    #[must_use]
    pub fn assemble(&self, body: &str) -> String {
        let mut html = String::with_capacity(
            body.len() + self.header.len() + self.footer.len() + PRINT_CSS.len() + 256,
        );
        html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
        html.push_str("<meta charset=\"utf-8\">\n");
        writeln!(html, "<title>{}</title>", escape_html(&self.title)).unwrap();
        html.push_str("<style>\n");
        html.push_str(PRINT_CSS);
        html.push_str("</style>\n");
        html.push_str("</head>\n<body>\n");
        writeln!(html, "<header>{}</header>", self.header).unwrap();
        writeln!(html, "<main>{body}</main>").unwrap();
        writeln!(html, "<footer>{}</footer>", self.footer).unwrap();
        html.push_str("</body>\n</html>\n");
        html
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_assemble_layout() {
        let shell = DocumentShell::new("Q3 <Report>")
            .with_header("<p>Acme</p>")
            .with_footer("<p>Page</p>");
        let html = shell.assemble("<p>Body</p>");
        assert!(html.starts_with("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n"));
        assert!(html.contains("<title>Q3 &lt;Report&gt;</title>\n"));
        assert!(html.ends_with(concat!(
            "</head>\n<body>\n",
            "<header><p>Acme</p></header>\n",
            "<main><p>Body</p></main>\n",
            "<footer><p>Page</p></footer>\n",
            "</body>\n</html>\n"
        )));
    }

    #[test]
    fn test_default_title() {
        let html = DocumentShell::default().assemble("");
        assert!(html.contains("<title>Document</title>"));
        assert!(html.contains("<header></header>\n<main></main>\n<footer></footer>"));
    }

    #[test]
    fn test_print_css_included() {
        let html = DocumentShell::default().assemble("");
        assert!(html.contains("@page { size: A4; margin: 20mm; }"));
        assert_eq!(html.matches("<style>").count(), 1);
    }
}
