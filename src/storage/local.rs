use async_trait::async_trait;
use anyhow::{anyhow, Result};
use std::path::PathBuf;
use std::time::SystemTime;

use super::{NoteMeta, NoteStore, StoreEntry};

/// Notes stored on the local filesystem / 本地笔记存储
pub struct LocalNoteStore {
    root: PathBuf,
}

impl LocalNoteStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Normalize path to prevent directory traversal attacks / 规范化路径
    fn normalize_path(&self, path: &str) -> Result<PathBuf> {
        let path = path.trim_start_matches('/').replace('\\', "/");

        let normalized: Vec<&str> = path.split('/').filter(|s| !s.is_empty() && *s != ".").collect();
        for component in &normalized {
            if *component == ".." {
                return Err(anyhow!("Access path exceeds root directory scope"));
            }
        }

        Ok(self.root.join(normalized.join("/")))
    }
}

fn unix_secs(time: std::io::Result<SystemTime>) -> Option<i64> {
    time.ok()
        .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
        .map(|d| d.as_secs() as i64)
}

#[async_trait]
impl NoteStore for LocalNoteStore {
    fn name(&self) -> &str {
        "local"
    }

    async fn stat(&self, path: &str) -> Result<NoteMeta> {
        let full_path = self.normalize_path(path)?;
        let metadata = tokio::fs::metadata(&full_path).await?;
        Ok(NoteMeta {
            size: if metadata.is_dir() { 0 } else { metadata.len() },
            modified: unix_secs(metadata.modified()),
            created: unix_secs(metadata.created()),
            is_dir: metadata.is_dir(),
        })
    }

    async fn read_dir(&self, path: &str) -> Result<Vec<StoreEntry>> {
        let full_path = self.normalize_path(path)?;
        let mut entries = tokio::fs::read_dir(full_path).await?;
        let mut result = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let metadata = match entry.metadata().await {
                Ok(metadata) => metadata,
                Err(e) => {
                    tracing::debug!("Skipping unreadable entry {:?}: {}", entry.path(), e);
                    continue;
                }
            };
            let is_dir = metadata.is_dir();
            result.push(StoreEntry {
                name: entry.file_name().to_string_lossy().to_string(),
                is_dir,
                size: if is_dir { 0 } else { metadata.len() },
            });
        }

        result.sort_by(|a, b| b.is_dir.cmp(&a.is_dir).then_with(|| a.name.cmp(&b.name)));
        Ok(result)
    }

    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let full_path = self.normalize_path(path)?;
        Ok(tokio::fs::read(full_path).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, LocalNoteStore) {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("work/sub")).unwrap();
        std::fs::write(dir.path().join("work/b.md"), "bee").unwrap();
        std::fs::write(dir.path().join("work/a.md"), "a").unwrap();
        let store = LocalNoteStore::new(dir.path().to_path_buf());
        (dir, store)
    }

    #[tokio::test]
    async fn test_read_dir_folders_first() {
        let (_dir, store) = store();
        let names: Vec<_> = store.read_dir("/work").await.unwrap().into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["sub", "a.md", "b.md"]);
    }

    #[tokio::test]
    async fn test_stat_and_read_file() {
        let (_dir, store) = store();
        let meta = store.stat("work/b.md").await.unwrap();
        assert_eq!(meta.size, 3);
        assert!(!meta.is_dir);
        assert_eq!(store.read_file("work/b.md").await.unwrap(), b"bee");
    }

    #[tokio::test]
    async fn test_traversal_rejected() {
        let (_dir, store) = store();
        assert!(store.read_dir("../").await.is_err());
        assert!(store.read_file("work/../../etc/passwd").await.is_err());
    }
}
