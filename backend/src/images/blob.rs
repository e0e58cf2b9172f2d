//! Byte storage for uploaded images.
//!
//! Objects are addressed by a relative path (`vehicles/{file}`) and handed back to callers as
//! public references under [`PUBLIC_PREFIX`], which is also the route that serves them.

use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tokio::fs;

pub const PUBLIC_PREFIX: &str = "/uploads";

#[derive(Error, Debug)]
pub enum BlobError {
    #[error("object not found: {0}")]
    NotFound(String),
    #[error("invalid object path: {0}")]
    InvalidPath(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type BlobResult<T> = Result<T, BlobError>;

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Writes `bytes` at `path`, replacing any existing object, and returns its reference.
    async fn store(&self, bytes: &[u8], path: &str) -> BlobResult<String>;

    async fn retrieve(&self, reference: &str) -> BlobResult<Vec<u8>>;

    /// Returns `false` when there was nothing to delete.
    async fn delete(&self, reference: &str) -> BlobResult<bool>;
}

/// Filesystem store rooted at the configured upload directory.
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Maps a reference or relative path onto the filesystem, refusing anything that could
    /// escape the root.
    fn resolve(&self, reference: &str) -> BlobResult<PathBuf> {
        let relative = reference
            .strip_prefix(PUBLIC_PREFIX)
            .unwrap_or(reference)
            .trim_start_matches('/');
        if relative.is_empty() {
            return Err(BlobError::InvalidPath(reference.to_string()));
        }
        let relative = Path::new(relative);
        if !relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
        {
            return Err(BlobError::InvalidPath(reference.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn store(&self, bytes: &[u8], path: &str) -> BlobResult<String> {
        let full = self.resolve(path)?;
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&full, bytes).await?;
        Ok(format!("{PUBLIC_PREFIX}/{}", path.trim_start_matches('/')))
    }

    async fn retrieve(&self, reference: &str) -> BlobResult<Vec<u8>> {
        let full = self.resolve(reference)?;
        match fs::read(&full).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(BlobError::NotFound(reference.to_string()))
            }
            Err(e) => Err(BlobError::Io(e)),
        }
    }

    async fn delete(&self, reference: &str) -> BlobResult<bool> {
        let full = self.resolve(reference)?;
        match fs::remove_file(&full).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(BlobError::Io(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn store_retrieve_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path());

        let reference = store.store(b"jpeg-bytes", "vehicles/a.jpg").await.unwrap();
        assert_eq!(reference, "/uploads/vehicles/a.jpg");
        assert!(dir.path().join("vehicles/a.jpg").is_file());
        assert_eq!(store.retrieve(&reference).await.unwrap(), b"jpeg-bytes");

        assert!(store.delete(&reference).await.unwrap());
        assert!(!store.delete(&reference).await.unwrap());
        assert!(matches!(
            store.retrieve(&reference).await,
            Err(BlobError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn traversal_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path().join("uploads"));

        for bad in ["../secret", "/uploads/../etc/passwd", "vehicles/../../x", ""] {
            assert!(
                matches!(store.retrieve(bad).await, Err(BlobError::InvalidPath(_))),
                "{bad} should be rejected"
            );
        }
        assert!(store.store(b"x", "../x.jpg").await.is_err());
        assert!(!dir.path().join("x.jpg").exists());
    }
}
