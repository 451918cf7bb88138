use std::io::Cursor;

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use super::error::StorageError;
use super::exact::copy_exact;
use super::key::BlobKey;
use super::traits::{BlobStore, BoxReader};

/// In-memory blob store with the same publish semantics as the disk backend.
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: DashMap<BlobKey, Bytes>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }
}

async fn buffer(size: u64, reader: BoxReader<'_>) -> Result<Bytes, StorageError> {
    let mut buf = Vec::with_capacity(usize::try_from(size).unwrap_or(0).min(1 << 20));
    copy_exact(reader, &mut buf, size).await?;
    Ok(Bytes::from(buf))
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(
        &self,
        key: &BlobKey,
        size: u64,
        reader: BoxReader<'_>,
    ) -> Result<(), StorageError> {
        if self.blobs.contains_key(key) {
            return Err(StorageError::AlreadyExists(key.as_path()));
        }
        let data = buffer(size, reader).await?;
        match self.blobs.entry(*key) {
            Entry::Occupied(_) => Err(StorageError::AlreadyExists(key.as_path())),
            Entry::Vacant(slot) => {
                slot.insert(data);
                Ok(())
            }
        }
    }

    async fn replace(
        &self,
        key: &BlobKey,
        size: u64,
        reader: BoxReader<'_>,
    ) -> Result<(), StorageError> {
        let data = buffer(size, reader).await?;
        self.blobs.insert(*key, data);
        Ok(())
    }

    async fn get(&self, key: &BlobKey) -> Result<BoxReader<'static>, StorageError> {
        let data = self
            .blobs
            .get(key)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| StorageError::NotFound(key.as_path()))?;
        Ok(Box::new(Cursor::new(data)))
    }

    async fn exists(&self, key: &BlobKey) -> Result<bool, StorageError> {
        Ok(self.blobs.contains_key(key))
    }

    async fn delete(&self, key: &BlobKey) -> Result<bool, StorageError> {
        Ok(self.blobs.remove(key).is_some())
    }
}
