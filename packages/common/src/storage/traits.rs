use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};

use super::error::StorageError;
use super::key::BlobKey;

/// Type alias for a boxed async reader.
pub type BoxReader<'a> = Box<dyn AsyncRead + Unpin + Send + 'a>;

/// Key-addressed blob storage.
///
/// Implementations must be safe for concurrent use: writes to distinct keys
/// proceed independently, and a key is only readable once its write has
/// fully completed.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store exactly `size` bytes read from `reader` under a new key.
    ///
    /// Fails with [`StorageError::AlreadyExists`] instead of overwriting, and
    /// with [`StorageError::SizeMismatch`] when the stream length differs from
    /// `size`. On failure nothing becomes readable under `key`.
    async fn put(&self, key: &BlobKey, size: u64, reader: BoxReader<'_>)
    -> Result<(), StorageError>;

    /// Like [`BlobStore::put`], but atomically replaces any existing blob.
    async fn replace(
        &self,
        key: &BlobKey,
        size: u64,
        reader: BoxReader<'_>,
    ) -> Result<(), StorageError>;

    /// Retrieve a blob as a streaming async reader.
    async fn get(&self, key: &BlobKey) -> Result<BoxReader<'static>, StorageError>;

    /// Retrieve all bytes for a blob.
    async fn read_all(&self, key: &BlobKey) -> Result<Vec<u8>, StorageError> {
        let mut reader = self.get(key).await?;
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).await?;
        Ok(buf)
    }

    /// Check whether a blob exists.
    async fn exists(&self, key: &BlobKey) -> Result<bool, StorageError>;

    /// Delete a blob.
    ///
    /// Returns `true` if the blob was deleted, `false` if it did not exist.
    async fn delete(&self, key: &BlobKey) -> Result<bool, StorageError>;
}
