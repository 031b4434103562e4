use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};

use super::client::ObjectStore;
use super::error::PipelineError;

/// Object store backed by a directory tree. Keys are `/`-separated paths
/// relative to `root`.
pub struct LocalDirStore {
    root: PathBuf,
}

impl LocalDirStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, key: &str) -> Option<PathBuf> {
        let relative = Path::new(key);
        let safe = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        safe.then(|| self.root.join(relative))
    }

    async fn walk(&self) -> std::io::Result<Vec<String>> {
        let mut keys = Vec::new();
        let mut pending = vec![self.root.clone()];

        while let Some(dir) = pending.pop() {
            let mut entries = tokio::fs::read_dir(&dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                if entry.file_type().await?.is_dir() {
                    pending.push(path);
                } else if let Ok(relative) = path.strip_prefix(&self.root) {
                    let key = relative
                        .components()
                        .map(|c| c.as_os_str().to_string_lossy())
                        .collect::<Vec<_>>()
                        .join("/");
                    keys.push(key);
                }
            }
        }

        keys.sort();
        Ok(keys)
    }
}

#[async_trait]
impl ObjectStore for LocalDirStore {
    fn store_name(&self) -> &str {
        "local"
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, PipelineError> {
        let keys = self.walk().await.map_err(|e| PipelineError::ListingError {
            prefix: prefix.to_string(),
            message: format!("{}: {}", self.root.display(), e),
        })?;
        Ok(keys.into_iter().filter(|key| key.starts_with(prefix)).collect())
    }

    async fn fetch(&self, key: &str) -> Result<Vec<u8>, PipelineError> {
        let path = self.resolve(key).ok_or_else(|| PipelineError::FetchError {
            key: key.to_string(),
            message: "key escapes the store root".to_string(),
        })?;
        tokio::fs::read(&path).await.map_err(|e| PipelineError::FetchError {
            key: key.to_string(),
            message: e.to_string(),
        })
    }
}
