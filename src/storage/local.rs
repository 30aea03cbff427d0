use async_trait::async_trait;
use bytes::Bytes;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::{validate_locator, BlobStore};
use crate::error::ApiError;

/// Blob store backed by a directory on the local filesystem.
#[derive(Debug, Clone)]
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

    fn resolve(&self, locator: &str) -> Result<PathBuf, ApiError> {
        validate_locator(locator)?;
        Ok(self.root.join(locator))
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn upload(&self, locator: &str, content: Bytes) -> Result<(), ApiError> {
        let path = self.resolve(locator)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut file = match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(ApiError::conflict(format!(
                    "Blob already exists at {}",
                    locator
                )));
            }
            Err(e) => return Err(e.into()),
        };

        file.write_all(&content).await?;
        file.sync_all().await?;

        tracing::debug!("Stored {} bytes at {}", content.len(), path.display());
        Ok(())
    }

    async fn download(&self, locator: &str) -> Result<Bytes, ApiError> {
        let path = self.resolve(locator)?;
        match fs::read(&path).await {
            Ok(content) => Ok(Bytes::from(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(ApiError::not_found(format!(
                "No stored file at {}",
                locator
            ))),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, locator: &str) -> Result<(), ApiError> {
        let path = self.resolve(locator)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(ApiError::not_found(format!(
                "No stored file at {}",
                locator
            ))),
            Err(e) => Err(e.into()),
        }
    }
}
