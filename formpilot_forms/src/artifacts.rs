use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;

/// Rendered PDFs on disk, one per company, served under a URL prefix.
#[derive(Debug, Clone)]
pub struct FormArtifacts {
    dir: PathBuf,
    url_prefix: String,
}

/// Company ids end up in file names, so only a conservative character set
/// is accepted.
#[must_use]
pub fn is_valid_entity_id(entity_id: &str) -> bool {
    !entity_id.is_empty()
        && entity_id.len() <= 128
        && entity_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

impl FormArtifacts {
    pub fn new(dir: impl Into<PathBuf>, url_prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            url_prefix: url_prefix.into().trim_end_matches('/').to_string(),
        }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn file_name(entity_id: &str) -> String {
        format!("form_{entity_id}.pdf")
    }

    #[must_use]
    pub fn path_for(&self, entity_id: &str) -> PathBuf {
        self.dir.join(Self::file_name(entity_id))
    }

    #[must_use]
    pub fn url_for(&self, entity_id: &str) -> String {
        format!("{}/{}", self.url_prefix, Self::file_name(entity_id))
    }

    /// Write the PDF, replacing any earlier one, and return its public URL.
    ///
    /// The bytes go to a temporary file first and are renamed into place.
    pub async fn write(&self, entity_id: &str, pdf: &[u8]) -> io::Result<String> {
        if !is_valid_entity_id(entity_id) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid company id: {entity_id:?}"),
            ));
        }

        fs::create_dir_all(&self.dir).await?;
        let path = self.path_for(entity_id);
        let staging = path.with_extension("pdf.tmp");
        fs::write(&staging, pdf).await?;
        fs::rename(&staging, &path).await?;

        info!("Wrote {} PDF bytes to {}", pdf.len(), path.display());
        Ok(self.url_for(entity_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_id_rules() {
        assert!(is_valid_entity_id("42"));
        assert!(is_valid_entity_id("acme_co-7"));
        assert!(!is_valid_entity_id(""));
        assert!(!is_valid_entity_id("../etc"));
        assert!(!is_valid_entity_id("a/b"));
    }

    #[tokio::test]
    #[expect(clippy::expect_used, reason = "Test failure should panic with context")]
    async fn write_creates_dir_and_overwrites() {
        let tmp = tempfile::tempdir().expect("temp dir");
        let artifacts = FormArtifacts::new(tmp.path().join("forms"), "/static/forms/");

        let url = artifacts.write("42", b"%PDF-1").await.expect("write");
        assert_eq!(url, "/static/forms/form_42.pdf");

        artifacts.write("42", b"%PDF-2").await.expect("overwrite");
        let stored = std::fs::read(artifacts.path_for("42")).expect("read back");
        assert_eq!(stored, b"%PDF-2");
        assert!(!artifacts.dir().join("form_42.pdf.tmp").exists());
    }

    #[tokio::test]
    #[expect(clippy::expect_used, reason = "Test failure should panic with context")]
    async fn traversal_ids_are_rejected() {
        let tmp = tempfile::tempdir().expect("temp dir");
        let artifacts = FormArtifacts::new(tmp.path(), "/static/forms");
        let err = artifacts.write("../x", b"").await.expect_err("rejected");
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }
}
