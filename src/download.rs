//! Delivering finished artifacts to the user.

use crate::export::Artifact;
use crate::Result;
use std::path::{Path, PathBuf};

/// Where artifacts end up once produced.
pub trait DownloadSink {
    /// Hand over one artifact and report where it went.
    fn deliver(&self, artifact: &Artifact) -> Result<PathBuf>;
}

/// Writes artifacts as files into one directory, creating it on demand.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// Filenames come from user topics; keep them inside the target directory.
fn sanitize(name: &str) -> String {
    name.chars().map(|c| if c == '/' || c == '\\' { '_' } else { c }).collect()
}

impl DownloadSink for DirectorySink {
    fn deliver(&self, artifact: &Artifact) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(sanitize(&artifact.filename));
        std::fs::write(&path, &artifact.bytes)?;
        log::info!("wrote {} ({}, {} bytes)", path.display(), artifact.mime, artifact.bytes.len());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact(name: &str) -> Artifact {
        Artifact { filename: name.to_string(), mime: "text/plain", bytes: b"hi".to_vec() }
    }

    #[test]
    fn writes_into_nested_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let sink = DirectorySink::new(tmp.path().join("out/nested"));
        let path = sink.deliver(&artifact("区块链_explanation.html")).unwrap();
        assert_eq!(path, tmp.path().join("out/nested/区块链_explanation.html"));
        assert_eq!(std::fs::read(path).unwrap(), b"hi");
    }

    #[test]
    fn separators_cannot_escape_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let sink = DirectorySink::new(tmp.path());
        let path = sink.deliver(&artifact("a/../b\\c.png")).unwrap();
        assert_eq!(path.file_name().unwrap(), "a_.._b_c.png");
        assert_eq!(path.parent().unwrap(), tmp.path());
    }
}
