//! Filesystem corpus provider
//!
//! Loads role-scoped knowledge from a directory tree:
//!
//! ```text
//! knowledge/
//!   dev/deploys.md
//!   security/auth.md
//!   ...
//! ```
//!
//! Each markdown file is split into `##` section chunks. The corpus
//! version is a content hash over every file, so any edit anywhere
//! produces a new version and invalidates cached retrievals.

use async_trait::async_trait;
use consilium_application::{CorpusError, CorpusProvider};
use consilium_domain::{AgentRole, Corpus, CorpusVersion, SectionChunk, chunk_markdown};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::info;

/// Hex characters kept from the content hash for the version id.
const VERSION_LEN: usize = 12;

pub struct FsCorpusProvider {
    dir: PathBuf,
}

impl FsCorpusProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn role_files(&self, role: AgentRole) -> Result<Vec<PathBuf>, CorpusError> {
        let role_dir = self.dir.join(role.as_str());
        if !role_dir.is_dir() {
            return Ok(Vec::new());
        }

        let entries = std::fs::read_dir(&role_dir)
            .map_err(|e| CorpusError::LoadFailed(format!("{}: {e}", role_dir.display())))?;
        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext == "md"))
            .collect();
        // Sorted so chunk order and the version hash are deterministic.
        files.sort();
        Ok(files)
    }
}

#[async_trait]
impl CorpusProvider for FsCorpusProvider {
    async fn load(&self) -> Result<Corpus, CorpusError> {
        if !self.dir.is_dir() {
            return Err(CorpusError::LoadFailed(format!(
                "corpus directory not found: {}",
                self.dir.display()
            )));
        }

        let mut hasher = Sha256::new();
        let mut by_role: BTreeMap<AgentRole, Vec<SectionChunk>> = BTreeMap::new();

        for role in AgentRole::ALL {
            let mut chunks = Vec::new();
            for path in self.role_files(role)? {
                let content = std::fs::read_to_string(&path)
                    .map_err(|e| CorpusError::LoadFailed(format!("{}: {e}", path.display())))?;
                let doc_name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();

                hasher.update(role.as_str().as_bytes());
                hasher.update(doc_name.as_bytes());
                hasher.update(content.as_bytes());

                chunks.extend(chunk_markdown(&content, &doc_name));
            }
            if !chunks.is_empty() {
                by_role.insert(role, chunks);
            }
        }

        let digest = hasher.finalize();
        let mut version = String::with_capacity(VERSION_LEN);
        for byte in digest.iter().take(VERSION_LEN / 2) {
            version.push_str(&format!("{byte:02x}"));
        }

        let corpus = Corpus::new(CorpusVersion::new(version), by_role);
        info!(
            version = corpus.version().as_str(),
            roles = corpus.roles_loaded().count(),
            "corpus loaded from {}",
            self.dir.display(),
        );
        Ok(corpus)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &std::path::Path, rel: &str, content: &str) {
        let path = dir.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[tokio::test]
    async fn test_loads_role_subdirectories() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "dev/deploys.md",
            "## Rollouts\nUse staged rollouts.\n\n## Flags\nGate risky paths.\n",
        );
        write(dir.path(), "security/auth.md", "## Tokens\nRotate regularly.\n");

        let corpus = FsCorpusProvider::new(dir.path()).load().await.unwrap();

        assert_eq!(corpus.chunks_for(AgentRole::Dev).len(), 2);
        assert_eq!(corpus.chunks_for(AgentRole::Security).len(), 1);
        assert!(corpus.chunks_for(AgentRole::Qa).is_empty());
    }

    #[tokio::test]
    async fn test_version_tracks_content() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "dev/a.md", "## One\ntext\n");
        let provider = FsCorpusProvider::new(dir.path());

        let v1 = provider.load().await.unwrap().version().clone();
        let v1_again = provider.load().await.unwrap().version().clone();
        assert_eq!(v1, v1_again, "same content, same version");

        write(dir.path(), "dev/a.md", "## One\nedited\n");
        let v2 = provider.load().await.unwrap().version().clone();
        assert_ne!(v1, v2, "edits must bump the version");
    }

    #[tokio::test]
    async fn test_missing_directory_is_an_error() {
        let result = FsCorpusProvider::new("/nonexistent/consilium-corpus")
            .load()
            .await;
        assert!(matches!(result, Err(CorpusError::LoadFailed(_))));
    }

    #[tokio::test]
    async fn test_non_markdown_files_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "dev/notes.txt", "not markdown");
        write(dir.path(), "dev/a.md", "## One\ntext\n");

        let corpus = FsCorpusProvider::new(dir.path()).load().await.unwrap();
        assert_eq!(corpus.chunks_for(AgentRole::Dev).len(), 1);
    }
}
