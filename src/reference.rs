//! Persisted digests of the command sources that were last registered.
//!
//! Every reference is a file named after the digest whose first line is the
//! source path that produced it. Keeping one file per reference means adding,
//! renaming or removing one never rewrites the others.

use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::record;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandReference {
    pub path: PathBuf,
    pub hash: String,
}

#[derive(Clone, Debug)]
pub struct ReferenceStore {
    directory: PathBuf,
}
impl ReferenceStore {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn entry_path(&self, hash: &str) -> PathBuf {
        self.directory.join(hash)
    }

    pub async fn ensure_directory(&self) -> anyhow::Result<()> {
        tokio::fs::create_dir_all(&self.directory)
            .await
            .with_context(|| format!("failed to create `{}`", self.directory.display()))
    }

    /// Every stored reference, or none if the directory does not exist yet.
    pub async fn all(&self) -> anyhow::Result<Vec<CommandReference>> {
        if !tokio::fs::try_exists(&self.directory).await? {
            return Ok(vec![]);
        }

        let mut references = vec![];
        for file in record::walk(&self.directory).await? {
            let Some(hash) = file.file_name().and_then(|name| name.to_str()) else {
                continue;
            };
            let content = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("failed to read reference `{}`", file.display()))?;
            let Some(path) = content.lines().next().map(str::trim).filter(|p| !p.is_empty())
            else {
                warn!(reference = hash, "Skipping empty command reference");
                continue;
            };

            references.push(CommandReference {
                path: PathBuf::from(path),
                hash: hash.to_owned(),
            });
        }

        Ok(references)
    }

    pub async fn lookup(&self, hash: &str) -> anyhow::Result<Option<CommandReference>> {
        Ok(self.all().await?.into_iter().find(|r| r.hash == hash))
    }

    /// Records that the command at `path` currently hashes to `hash`.
    pub async fn upsert(&self, path: &Path, hash: &str) -> anyhow::Result<CommandReference> {
        for reference in self.all().await? {
            let same_path = reference.path == path;
            let same_hash = reference.hash == hash;

            if same_path && same_hash {
                return Ok(reference);
            }

            if same_path {
                tokio::fs::rename(self.entry_path(&reference.hash), self.entry_path(hash))
                    .await
                    .with_context(|| format!("failed to rename reference {}", reference.hash))?;

                return Ok(CommandReference {
                    path: path.to_path_buf(),
                    hash: hash.to_owned(),
                });
            }

            if same_hash {
                // FIXME: two distinct sources sharing a digest evict each other here
                debug!(
                    path = %reference.path.display(),
                    hash,
                    "Evicting reference with a colliding digest"
                );
                tokio::fs::remove_file(self.entry_path(hash))
                    .await
                    .with_context(|| format!("failed to remove reference {hash}"))?;
            }
        }

        self.ensure_directory().await?;
        tokio::fs::write(self.entry_path(hash), path.to_string_lossy().as_bytes())
            .await
            .with_context(|| format!("failed to write reference {hash}"))?;

        Ok(CommandReference {
            path: path.to_path_buf(),
            hash: hash.to_owned(),
        })
    }

    /// Deletes references whose source file is gone.
    pub async fn prune_stale(&self) -> anyhow::Result<Vec<CommandReference>> {
        let mut pruned = vec![];

        for reference in self.all().await? {
            let is_file = tokio::fs::metadata(&reference.path)
                .await
                .is_ok_and(|metadata| metadata.is_file());

            if !is_file {
                tokio::fs::remove_file(self.entry_path(&reference.hash))
                    .await
                    .with_context(|| format!("failed to remove reference {}", reference.hash))?;
                pruned.push(reference);
            }
        }

        Ok(pruned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash;

    fn store(dir: &Path) -> ReferenceStore {
        ReferenceStore::new(dir.join(".cordwork/commands"))
    }

    #[tokio::test]
    async fn missing_directory_has_no_references() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());

        assert!(store.all().await.unwrap().is_empty());
        assert!(store.lookup("abc").await.unwrap().is_none());
        assert!(store.prune_stale().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn upsert_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        let path = dir.path().join("ping.rs");
        let hash = hash::digest("ping");

        let first = store.upsert(&path, &hash).await.unwrap();
        let second = store.upsert(&path, &hash).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(store.all().await.unwrap(), vec![first.clone()]);
        assert_eq!(store.lookup(&hash).await.unwrap(), Some(first));

        let stored = std::fs::read_to_string(store.directory().join(&hash)).unwrap();
        assert_eq!(stored, path.to_string_lossy());
    }

    #[tokio::test]
    async fn changed_digest_renames_entry() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        let path = dir.path().join("ping.rs");
        let old = hash::digest("ping v1");
        let new = hash::digest("ping v2");

        store.upsert(&path, &old).await.unwrap();
        let reference = store.upsert(&path, &new).await.unwrap();

        assert_eq!(reference.hash, new);
        assert!(store.lookup(&old).await.unwrap().is_none());
        assert!(!store.directory().join(&old).exists());
        assert_eq!(store.all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn colliding_digest_evicts_older_path() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        let first = dir.path().join("first.rs");
        let second = dir.path().join("second.rs");
        let hash = hash::digest("same");

        store.upsert(&first, &hash).await.unwrap();
        store.upsert(&second, &hash).await.unwrap();

        let all = store.all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].path, second);
    }

    #[tokio::test]
    async fn prune_removes_references_to_deleted_sources() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        let kept = dir.path().join("kept.rs");
        let deleted = dir.path().join("deleted.rs");
        std::fs::write(&kept, "kept").unwrap();
        std::fs::write(&deleted, "deleted").unwrap();

        store.upsert(&kept, &hash::digest("kept")).await.unwrap();
        store.upsert(&deleted, &hash::digest("deleted")).await.unwrap();
        std::fs::remove_file(&deleted).unwrap();

        let pruned = store.prune_stale().await.unwrap();
        assert_eq!(pruned.len(), 1);
        assert_eq!(pruned[0].path, deleted);
        assert!(store.lookup(&hash::digest("deleted")).await.unwrap().is_none());
        assert!(store.lookup(&hash::digest("kept")).await.unwrap().is_some());
    }
}
