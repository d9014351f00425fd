//! Destination for analysis results.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::analysis::path::ResultUploadPath;
use crate::error::UploadError;

/// Stores result files under a [`ResultUploadPath`].
#[async_trait]
pub trait Uploader: Send + Sync {
    /// Store everything `reader` yields at `path`.
    async fn upload(
        &self,
        reader: &mut (dyn AsyncRead + Unpin + Send),
        path: &ResultUploadPath,
    ) -> Result<(), UploadError>;

    /// Whether something is already stored at `path`.
    async fn already_exists(&self, path: &ResultUploadPath) -> Result<bool, UploadError>;
}

/// In-process uploader used by tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryUploader {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    keep_existing: bool,
}

impl MemoryUploader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse to replace stored objects; a second upload to the same path
    /// fails with [`UploadError::AlreadyExists`].
    pub fn keep_existing(mut self) -> Self {
        self.keep_existing = true;
        self
    }

    pub fn get(&self, path: &ResultUploadPath) -> Option<Vec<u8>> {
        self.lock().get(&path.to_string()).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>> {
        // A poisoned map is still consistent: every write is a single insert
        self.objects.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl Uploader for MemoryUploader {
    async fn upload(
        &self,
        reader: &mut (dyn AsyncRead + Unpin + Send),
        path: &ResultUploadPath,
    ) -> Result<(), UploadError> {
        let key = path.to_string();
        if self.keep_existing && self.lock().contains_key(&key) {
            return Err(UploadError::AlreadyExists(key));
        }

        let mut body = Vec::new();
        reader.read_to_end(&mut body).await.map_err(|source| UploadError::Io {
            path: key.clone(),
            source,
        })?;

        tracing::debug!(path = %key, bytes = body.len(), "result stored");
        self.lock().insert(key, body);
        Ok(())
    }

    async fn already_exists(&self, path: &ResultUploadPath) -> Result<bool, UploadError> {
        Ok(self.lock().contains_key(&path.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::request::{AnalysisRequest, NpmRequest, PackageRequest};
    use crate::analysis::types::Type;

    fn path() -> ResultUploadPath {
        NpmRequest(
            PackageRequest::new(Type::NpmStaticTarball, "X", "chalk")
                .with_version("5.1.2")
                .with_shasum("abc"),
        )
        .results_path()
        .unwrap()
    }

    #[tokio::test]
    async fn test_upload_and_exists() {
        let uploader = MemoryUploader::new();
        let path = path();
        assert!(!uploader.already_exists(&path).await.unwrap());

        let mut body: &[u8] = b"{\"verdicts\":[]}";
        uploader.upload(&mut body, &path).await.unwrap();

        assert!(uploader.already_exists(&path).await.unwrap());
        assert_eq!(uploader.get(&path).unwrap(), b"{\"verdicts\":[]}");
        assert_eq!(uploader.len(), 1);
    }

    #[tokio::test]
    async fn test_upload_overwrites_by_default() {
        let uploader = MemoryUploader::new();
        let path = path();
        uploader.upload(&mut &b"one"[..], &path).await.unwrap();
        uploader.upload(&mut &b"two"[..], &path).await.unwrap();
        assert_eq!(uploader.get(&path).unwrap(), b"two");
    }

    #[tokio::test]
    async fn test_keep_existing_rejects_second_upload() {
        let uploader = MemoryUploader::new().keep_existing();
        let path = path();
        uploader.upload(&mut &b"one"[..], &path).await.unwrap();
        let err = uploader.upload(&mut &b"two"[..], &path).await.unwrap_err();
        assert!(matches!(err, UploadError::AlreadyExists(p) if p == path.to_string()));
        assert_eq!(uploader.get(&path).unwrap(), b"one");
    }
}
