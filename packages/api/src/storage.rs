use std::sync::Arc;

use anyhow::Context;
use common::storage::BlobStore;
use common::storage::filesystem::FilesystemBlobStore;
use common::storage::memory::MemoryBlobStore;
use tracing::info;

use crate::config::{StorageBackend, StorageConfig};

/// Build the blob store selected by `storage.backend`.
pub async fn init_blob_store(config: &StorageConfig) -> anyhow::Result<Arc<dyn BlobStore>> {
    match config.backend {
        StorageBackend::Filesystem => {
            let store = FilesystemBlobStore::new(config.data_dir.clone())
                .await
                .with_context(|| format!("opening blob directory {}", config.data_dir.display()))?;
            info!(data_dir = %config.data_dir.display(), "Using filesystem blob store");
            Ok(Arc::new(store))
        }
        StorageBackend::Memory => {
            info!("Using in-memory blob store");
            Ok(Arc::new(MemoryBlobStore::new()))
        }
        #[cfg(feature = "object-storage")]
        StorageBackend::S3 => {
            let s3 = config
                .s3
                .as_ref()
                .context("storage.backend is s3 but storage.s3 is not configured")?;
            let store = common::storage::object::ObjectBlobStore::new(s3)
                .context("configuring object storage")?;
            info!(bucket = %s3.bucket, "Using object blob store");
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "object-storage"))]
        StorageBackend::S3 => {
            anyhow::bail!("storage.backend is s3 but the object-storage feature is not enabled")
        }
    }
}
