use std::io::Cursor;

use async_trait::async_trait;
use s3::creds::Credentials;
use s3::error::S3Error;
use s3::{Bucket, Region};
use serde::Deserialize;
use tracing::debug;

use super::error::StorageError;
use super::exact::ExactSizeReader;
use super::key::BlobKey;
use super::traits::{BlobStore, BoxReader};

/// Connection settings for an S3-compatible bucket.
#[derive(Debug, Deserialize, Clone)]
pub struct ObjectStoreConfig {
    pub bucket: String,
    pub region: String,
    /// Custom endpoint (MinIO, Ceph, ...). Uses path-style addressing.
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    /// Key prefix inside the bucket. Default: "".
    #[serde(default)]
    pub prefix: String,
}

/// Blob store backed by an S3-compatible object storage bucket.
///
/// Object stores have no create-if-absent primitive here, so `put` checks for
/// an existing object first; the record store's unique insert remains the
/// authority on identifier collisions.
pub struct ObjectBlobStore {
    bucket: Box<Bucket>,
    prefix: String,
}

fn backend(err: S3Error) -> StorageError {
    StorageError::Backend(err.to_string())
}

impl ObjectBlobStore {
    pub fn new(config: &ObjectStoreConfig) -> Result<Self, StorageError> {
        let region = Region::Custom {
            region: config.region.clone(),
            endpoint: config.endpoint.clone(),
        };
        let credentials = Credentials::new(
            Some(&config.access_key),
            Some(&config.secret_key),
            None,
            None,
            None,
        )
        .map_err(|e| StorageError::Backend(format!("invalid credentials: {e}")))?;

        let bucket = Bucket::new(&config.bucket, region, credentials)
            .map_err(backend)?
            .with_path_style();

        Ok(Self {
            bucket,
            prefix: config.prefix.trim_matches('/').to_string(),
        })
    }

    fn object_path(&self, key: &BlobKey) -> String {
        if self.prefix.is_empty() {
            format!("/{}", key.as_path())
        } else {
            format!("/{}/{}", self.prefix, key.as_path())
        }
    }

    async fn upload(&self, key: &BlobKey, size: u64, reader: BoxReader<'_>) -> Result<(), StorageError> {
        let path = self.object_path(key);
        let mut reader = ExactSizeReader::new(reader, size);
        let result = self.bucket.put_object_stream(&mut reader, &path).await;

        if reader.bytes_read() != size {
            // Partial multipart uploads are aborted by the client on error.
            let _ = self.bucket.delete_object(&path).await;
            return Err(StorageError::SizeMismatch {
                expected: size,
                actual: reader.bytes_read(),
            });
        }

        let response = result.map_err(backend)?;
        let status = response.status_code();
        if !(200..300).contains(&status) {
            return Err(StorageError::Backend(format!(
                "upload of {key} returned HTTP {status}"
            )));
        }
        debug!(key = %key, size, "Uploaded object");
        Ok(())
    }
}

#[async_trait]
impl BlobStore for ObjectBlobStore {
    async fn put(
        &self,
        key: &BlobKey,
        size: u64,
        reader: BoxReader<'_>,
    ) -> Result<(), StorageError> {
        if self.exists(key).await? {
            return Err(StorageError::AlreadyExists(key.as_path()));
        }
        self.upload(key, size, reader).await
    }

    async fn replace(
        &self,
        key: &BlobKey,
        size: u64,
        reader: BoxReader<'_>,
    ) -> Result<(), StorageError> {
        self.upload(key, size, reader).await
    }

    async fn get(&self, key: &BlobKey) -> Result<BoxReader<'static>, StorageError> {
        let response = match self.bucket.get_object(self.object_path(key)).await {
            Ok(response) => response,
            Err(S3Error::HttpFailWithBody(404, _)) => {
                return Err(StorageError::NotFound(key.as_path()));
            }
            Err(e) => return Err(backend(e)),
        };

        match response.status_code() {
            200..=299 => Ok(Box::new(Cursor::new(response.bytes().clone()))),
            404 => Err(StorageError::NotFound(key.as_path())),
            status => Err(StorageError::Backend(format!(
                "download of {key} returned HTTP {status}"
            ))),
        }
    }

    async fn exists(&self, key: &BlobKey) -> Result<bool, StorageError> {
        match self.bucket.head_object(self.object_path(key)).await {
            Ok((_, 404)) => Ok(false),
            Ok((_, status)) if (200..300).contains(&status) => Ok(true),
            Ok((_, status)) => Err(StorageError::Backend(format!(
                "head of {key} returned HTTP {status}"
            ))),
            Err(S3Error::HttpFailWithBody(404, _)) => Ok(false),
            Err(e) => Err(backend(e)),
        }
    }

    async fn delete(&self, key: &BlobKey) -> Result<bool, StorageError> {
        if !self.exists(key).await? {
            return Ok(false);
        }
        self.bucket
            .delete_object(self.object_path(key))
            .await
            .map_err(backend)?;
        Ok(true)
    }
}
