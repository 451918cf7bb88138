use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::{AsyncWriteExt, BufReader};
use tracing::warn;

use super::error::StorageError;
use super::exact::copy_exact;
use super::key::BlobKey;
use super::traits::{BlobStore, BoxReader};

/// Filesystem-backed blob store.
///
/// Blobs are stored as `{base_path}/{namespace}/{file_name}`. Writes land in
/// `{base_path}/.tmp` first and are published only once complete.
pub struct FilesystemBlobStore {
    base_path: PathBuf,
}

/// Removes a temporary file when dropped, including when the owning future is
/// cancelled mid-write.
struct TempFile {
    path: PathBuf,
    armed: bool,
}

impl TempFile {
    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for TempFile {
    fn drop(&mut self) {
        if self.armed {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

impl FilesystemBlobStore {
    /// Create a new filesystem blob store.
    pub async fn new(base_path: PathBuf) -> Result<Self, StorageError> {
        fs::create_dir_all(&base_path).await?;
        fs::create_dir_all(base_path.join(".tmp")).await?;
        Ok(Self { base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Compute the filesystem path for a key.
    fn blob_path(&self, key: &BlobKey) -> PathBuf {
        self.base_path.join(key.namespace()).join(key.file_name())
    }

    /// Path for a temporary file during writes.
    fn temp_path(&self) -> PathBuf {
        self.base_path
            .join(".tmp")
            .join(uuid::Uuid::new_v4().to_string())
    }

    /// Stream `reader` into a fresh temp file, enforcing the declared size.
    async fn write_temp(&self, size: u64, reader: BoxReader<'_>) -> Result<TempFile, StorageError> {
        let temp = TempFile {
            path: self.temp_path(),
            armed: true,
        };

        let mut temp_file = fs::File::create(&temp.path).await?;
        copy_exact(reader, &mut temp_file, size).await?;
        temp_file.flush().await?;
        temp_file.sync_all().await?;
        drop(temp_file);

        Ok(temp)
    }

    async fn ensure_parent(&self, blob_path: &Path) -> Result<(), StorageError> {
        if let Some(parent) = blob_path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl BlobStore for FilesystemBlobStore {
    async fn put(
        &self,
        key: &BlobKey,
        size: u64,
        reader: BoxReader<'_>,
    ) -> Result<(), StorageError> {
        let blob_path = self.blob_path(key);
        if fs::try_exists(&blob_path).await? {
            return Err(StorageError::AlreadyExists(key.as_path()));
        }

        let temp = self.write_temp(size, reader).await?;
        self.ensure_parent(&blob_path).await?;

        // A hard link fails if the target exists, so concurrent writers of the
        // same key cannot clobber each other. The temp name is dropped after.
        match fs::hard_link(&temp.path, &blob_path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                Err(StorageError::AlreadyExists(key.as_path()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn replace(
        &self,
        key: &BlobKey,
        size: u64,
        reader: BoxReader<'_>,
    ) -> Result<(), StorageError> {
        let blob_path = self.blob_path(key);
        let mut temp = self.write_temp(size, reader).await?;
        self.ensure_parent(&blob_path).await?;

        fs::rename(&temp.path, &blob_path).await?;
        temp.disarm();
        Ok(())
    }

    async fn get(&self, key: &BlobKey) -> Result<BoxReader<'static>, StorageError> {
        let blob_path = self.blob_path(key);
        match fs::File::open(&blob_path).await {
            Ok(file) => Ok(Box::new(BufReader::new(file))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(key.as_path()))
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to open blob");
                Err(e.into())
            }
        }
    }

    async fn exists(&self, key: &BlobKey) -> Result<bool, StorageError> {
        Ok(fs::try_exists(&self.blob_path(key)).await?)
    }

    async fn delete(&self, key: &BlobKey) -> Result<bool, StorageError> {
        match fs::remove_file(&self.blob_path(key)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
