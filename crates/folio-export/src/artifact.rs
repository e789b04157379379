use crate::format::ExportFormat;

/// Default file stem for exported artifacts.
pub const DEFAULT_FILE_STEM: &str = "document";

/// A rendered export, ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub bytes: Vec<u8>,
    /// Suggested file name, including the extension.
    pub filename: String,
    pub format: ExportFormat,
    pub mime_type: &'static str,
}

impl ExportArtifact {
    /// Build an artifact named `{stem}.{extension}`.
    #[must_use]
    pub fn new(bytes: Vec<u8>, stem: &str, format: ExportFormat) -> Self {
        Self {
            bytes,
            filename: format!("{}.{}", sanitize_stem(stem), format.extension()),
            format,
            mime_type: format.mime_type(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Make `stem` safe to use as a file name on common file systems.
fn sanitize_stem(stem: &str) -> String {
    let cleaned: String = stem
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let cleaned = cleaned.trim_matches('.');
    if cleaned.is_empty() {
        DEFAULT_FILE_STEM.to_owned()
    } else {
        cleaned.to_owned()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_filename_from_stem() {
        let artifact = ExportArtifact::new(b"x".to_vec(), "Q3 report", ExportFormat::Word);
        assert_eq!(artifact.filename, "Q3 report.doc");
        assert_eq!(artifact.mime_type, "application/msword");
        assert_eq!(artifact.len(), 1);
    }

    #[test]
    fn test_sanitize_stem() {
        assert_eq!(sanitize_stem("a/b:c?"), "a_b_c_");
        assert_eq!(sanitize_stem("  ..  "), "document");
        assert_eq!(sanitize_stem("../etc"), "_etc");
    }
}
