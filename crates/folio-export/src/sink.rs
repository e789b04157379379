//! Local delivery of export artifacts.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::artifact::ExportArtifact;
use crate::error::SinkError;

/// Receives finished artifacts, like a browser download.
pub trait ArtifactSink: Send + Sync {
    /// Deliver `artifact`, returning where it ended up.
    fn deliver(&self, artifact: &ExportArtifact) -> Result<String, SinkError>;
}

/// Writes artifacts into a downloads directory.
///
/// Existing files are never overwritten: a second `report.doc` is saved as
/// `report (1).doc`, then `report (2).doc` and so on.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn candidate(&self, filename: &str, attempt: usize) -> PathBuf {
        if attempt == 0 {
            return self.dir.join(filename);
        }
        let (stem, ext) = match filename.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
            _ => (filename, None),
        };
        match ext {
            Some(ext) => self.dir.join(format!("{stem} ({attempt}).{ext}")),
            None => self.dir.join(format!("{stem} ({attempt})")),
        }
    }
}

impl ArtifactSink for DirectorySink {
    fn deliver(&self, artifact: &ExportArtifact) -> Result<String, SinkError> {
        fs::create_dir_all(&self.dir)?;
        let mut attempt = 0;
        loop {
            let path = self.candidate(&artifact.filename, attempt);
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    file.write_all(&artifact.bytes)?;
                    tracing::debug!(path = %path.display(), size = artifact.len(), "Saved artifact");
                    return Ok(path.display().to_string());
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => attempt += 1,
                Err(e) => return Err(e.into()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::format::ExportFormat;

    fn artifact(bytes: &[u8]) -> ExportArtifact {
        ExportArtifact::new(bytes.to_vec(), "report", ExportFormat::Html)
    }

    #[test]
    fn test_deliver_writes_file() {
        let temp = tempfile::tempdir().unwrap();
        let sink = DirectorySink::new(temp.path().join("downloads"));

        let location = sink.deliver(&artifact(b"<html>")).unwrap();

        let path = temp.path().join("downloads/report.html");
        assert_eq!(location, path.display().to_string());
        assert_eq!(fs::read(&path).unwrap(), b"<html>");
    }

    #[test]
    fn test_deliver_never_overwrites() {
        let temp = tempfile::tempdir().unwrap();
        let sink = DirectorySink::new(temp.path());

        sink.deliver(&artifact(b"one")).unwrap();
        sink.deliver(&artifact(b"two")).unwrap();
        sink.deliver(&artifact(b"three")).unwrap();

        assert_eq!(fs::read(temp.path().join("report.html")).unwrap(), b"one");
        assert_eq!(fs::read(temp.path().join("report (1).html")).unwrap(), b"two");
        assert_eq!(
            fs::read(temp.path().join("report (2).html")).unwrap(),
            b"three"
        );
    }

    #[test]
    fn test_candidate_without_extension() {
        let sink = DirectorySink::new("out");
        assert_eq!(sink.candidate("notes", 3), Path::new("out/notes (3)"));
        assert_eq!(sink.candidate(".hidden", 1), Path::new("out/.hidden (1)"));
    }

    #[test]
    fn test_deliver_into_file_path_fails() {
        let temp = tempfile::NamedTempFile::new().unwrap();
        let sink = DirectorySink::new(temp.path());
        assert!(matches!(
            sink.deliver(&artifact(b"x")),
            Err(SinkError::Io(_))
        ));
    }
}
