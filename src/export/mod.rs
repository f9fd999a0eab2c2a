//! PDF export of completed AI artifacts.
//!
//! `markup` strips structure into plain blocks, `layout` wraps and paginates
//! them with a running header/footer, `pdf` serialises the result. The whole
//! pipeline is a pure function of the artifact and its metadata.

pub mod layout;
pub mod markup;
pub mod pdf;

use std::path::{Path, PathBuf};

pub use layout::{Document, ExportMetadata};

use crate::artifact::models::Artifact;
use crate::errors::ExportError;

/// A rendered, ready-to-save document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub page_count: usize,
}

impl ExportedFile {
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf, ExportError> {
        let path = dir.join(&self.file_name);
        std::fs::create_dir_all(dir)
            .and_then(|_| std::fs::write(&path, &self.bytes))
            .map_err(|source| ExportError::WriteFailed {
                path: path.clone(),
                source,
            })?;
        Ok(path)
    }
}

/// `aether-<kind>-<key fragment>-<YYYYMMDD-HHMMSS>.pdf`, stamped with the
/// artifact's generation time.
pub fn file_name(artifact: &Artifact) -> String {
    format!(
        "aether-{}-{}-{}.pdf",
        artifact.kind.as_str(),
        artifact.key.fragment(),
        artifact.generated_at.format("%Y%m%d-%H%M%S")
    )
}

pub fn export_artifact_to_document(
    artifact: &Artifact,
    meta: &ExportMetadata,
) -> Result<ExportedFile, ExportError> {
    if artifact.content.trim().is_empty() {
        return Err(ExportError::EmptyArtifact);
    }
    let doc = layout::layout(artifact, meta);
    tracing::debug!(
        kind = %artifact.kind,
        key = %artifact.key.fragment(),
        pages = doc.pages.len(),
        "artifact laid out"
    );
    Ok(ExportedFile {
        file_name: file_name(artifact),
        page_count: doc.pages.len(),
        bytes: pdf::render_pdf(&doc),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::models::{ArtifactKey, ArtifactKind};
    use crate::artifact::test_support::artifact;

    #[test]
    fn test_file_name_embeds_kind_key_and_time() {
        let a = artifact(
            ArtifactKind::Analysis,
            ArtifactKey::task_commit(7, "fedcba987654"),
            "x",
        );
        assert_eq!(
            file_name(&a),
            "aether-analysis-task7-fedcba9-20260301-100000.pdf"
        );
    }

    #[test]
    fn test_export_is_pure() {
        let a = artifact(
            ArtifactKind::Explanation,
            ArtifactKey::commit("abc1234"),
            "# Hi\n\nThere",
        );
        let meta = ExportMetadata::default();
        let first = export_artifact_to_document(&a, &meta).unwrap();
        let second = export_artifact_to_document(&a, &meta).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.page_count, 1);
        assert!(first.bytes.starts_with(b"%PDF-"));
    }

    #[test]
    fn test_empty_artifact_rejected() {
        let a = artifact(
            ArtifactKind::Report,
            ArtifactKey::task_commit(1, "abc"),
            "  \n",
        );
        assert!(matches!(
            export_artifact_to_document(&a, &ExportMetadata::default()),
            Err(ExportError::EmptyArtifact)
        ));
    }

    #[test]
    fn test_write_to_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let a = artifact(
            ArtifactKind::Report,
            ArtifactKey::task_commit(1, "abc"),
            "body",
        );
        let file = export_artifact_to_document(&a, &ExportMetadata::default()).unwrap();
        let path = file.write_to(&dir.path().join("exports")).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), file.bytes);
        assert!(path.ends_with(&file.file_name));
    }
}
