//! # Local media storage
//!
//! Filesystem implementation of `MediaStorage`. Objects live at
//! `{root}/{key}` and are served by the HTTP layer under `url_prefix`.

use async_trait::async_trait;
use bytes::Bytes;
use domains::traits::MediaStorage;
use domains::{DomainError, Result};
use std::path::{Component, Path, PathBuf};
use tokio::fs;

pub struct LocalMediaStorage {
    /// Root directory for all uploads (e.g., "./data/media")
    root_path: PathBuf,
    /// Public URL prefix (e.g., "/media")
    url_prefix: String,
}

impl LocalMediaStorage {
    pub fn new(root: impl Into<PathBuf>, url_prefix: &str) -> Self {
        Self {
            root_path: root.into(),
            url_prefix: url_prefix.trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root_path
    }

    /// Resolves `key` below the root, refusing anything that could escape it.
    fn object_path(&self, key: &str) -> Result<PathBuf> {
        let rel = Path::new(key);
        let safe = !key.is_empty()
            && rel
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            return Err(DomainError::validation(format!("invalid object key '{key}'")));
        }
        Ok(self.root_path.join(rel))
    }
}

#[async_trait]
impl MediaStorage for LocalMediaStorage {
    async fn put_object(&self, key: &str, data: Bytes, content_type: &str) -> Result<()> {
        let target = self.object_path(key)?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await.map_err(DomainError::internal)?;
        }
        fs::write(&target, &data).await.map_err(DomainError::internal)?;
        tracing::debug!(key, content_type, bytes = data.len(), "stored media object");
        Ok(())
    }

    async fn delete_object(&self, key: &str) -> Result<()> {
        let target = self.object_path(key)?;
        match fs::remove_file(&target).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(DomainError::internal(e)),
        }
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.url_prefix, key)
    }
}
