use std::io;
use std::sync::Arc;

use axum::body::Body;
use axum::http::HeaderValue;
use chrono::Utc;
use common::storage::{BlobKey, BlobPart, BlobStore, BoxReader, StorageError};
use futures::TryStreamExt;
use tokio_util::io::StreamReader;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::error::ResourceError;
use crate::ingest::{FormDecoder, IngestLimits, ResourceSchema, blob_reader, drain_field};
use crate::models::resource::{NewModelQuery, RecordPatch, ResourceKind, ResourceRecord};
use crate::store::{RecordError, RecordStore};

/// Operations on one resource kind, composed from a record store and a
/// blob store.
#[derive(Clone)]
pub struct ResourceService {
    kind: ResourceKind,
    records: Arc<dyn RecordStore>,
    blobs: Arc<dyn BlobStore>,
    limits: IngestLimits,
}

/// Parse a path identifier.
pub fn parse_id(raw: &str) -> Result<Uuid, ResourceError> {
    Uuid::parse_str(raw).map_err(|_| ResourceError::MalformedIdentifier(raw.to_owned()))
}

fn backend(err: RecordError) -> ResourceError {
    ResourceError::StorageBackend(err.to_string())
}

impl ResourceService {
    pub fn new(
        kind: ResourceKind,
        records: Arc<dyn RecordStore>,
        blobs: Arc<dyn BlobStore>,
        limits: IngestLimits,
    ) -> Self {
        Self {
            kind,
            records,
            blobs,
            limits,
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    fn primary_key(&self, id: Uuid) -> BlobKey {
        BlobKey::primary(self.kind.as_str(), id)
    }

    fn description_key(&self, id: Uuid) -> BlobKey {
        BlobKey::description(self.kind.as_str(), id)
    }

    /// Create a Problem, Data or Algo from a multipart form whose last
    /// field is the blob.
    #[instrument(skip(self, content_type, body), fields(kind = %self.kind))]
    pub async fn create(
        &self,
        content_type: Option<&HeaderValue>,
        body: Body,
    ) -> Result<ResourceRecord, ResourceError> {
        let schema = ResourceSchema::create(self.kind, self.limits).ok_or_else(|| {
            ResourceError::UnsupportedMediaType(format!(
                "{} uploads take a raw request body",
                self.kind
            ))
        })?;
        let mut decoder = FormDecoder::new(content_type, body, schema)?;

        let (fields, blob) = decoder.read_fields().await?;
        let validated = schema.validate_create(&fields);
        let Some(mut blob) = blob else {
            validated?;
            return Err(ResourceError::RequiredFieldMissing("Blob"));
        };
        let new = match validated {
            Ok(new) => new,
            Err(err) => {
                // The blob is never written for an invalid form, but fields
                // trailing it still take precedence in the reported error.
                drain_field(&mut blob).await?;
                drop(blob);
                decoder.expect_end().await?;
                return Err(err);
            }
        };

        let id = match new.id {
            Some(id) => {
                self.ensure_unused(id).await?;
                id
            }
            None => Uuid::now_v7(),
        };

        let primary = self.primary_key(id);
        self.blobs
            .put(&primary, new.size, blob_reader(blob))
            .await
            .map_err(|e| self.blob_write_error(id, e))?;
        let mut written = vec![primary];

        let committed = async {
            decoder.expect_end().await?;

            if let Some(description) = new.description {
                let key = self.description_key(id);
                let size = description.len() as u64;
                self.blobs
                    .put(&key, size, Box::new(io::Cursor::new(description)))
                    .await
                    .map_err(|e| self.blob_write_error(id, e))?;
                written.push(key);
            }

            let record = ResourceRecord {
                kind: self.kind,
                id,
                owner: new.owner,
                name: new.name,
                size: new.size,
                algo: None,
                created_at: Utc::now(),
            };
            self.insert(&record).await?;
            Ok::<_, ResourceError>(record)
        }
        .await;

        match committed {
            Ok(record) => {
                info!(id = %record.id, size = record.size, "Resource created");
                Ok(record)
            }
            Err(err) => {
                self.discard(&written).await;
                Err(err)
            }
        }
    }

    /// Create a Model from a raw request body. The algorithm must exist;
    /// the owner defaults to the algorithm's owner.
    #[instrument(skip(self, content_length, body), fields(kind = %self.kind))]
    pub async fn create_model(
        &self,
        query: &NewModelQuery,
        content_length: Option<&HeaderValue>,
        body: Body,
    ) -> Result<ResourceRecord, ResourceError> {
        let algo_raw = query
            .algo
            .as_deref()
            .ok_or(ResourceError::RequiredFieldMissing("Algo"))?;
        let algo_id = parse_id(algo_raw)?;
        let owner = query
            .owner
            .as_deref()
            .map(|raw| {
                Uuid::parse_str(raw)
                    .map_err(|source| ResourceError::UuidParse { field: "owner", source })
            })
            .transpose()?;
        let size = parse_content_length(content_length)?;

        let algo = match self.records.get(ResourceKind::Algo, algo_id).await {
            Ok(algo) => algo,
            Err(err) if err.is_not_found() => {
                return Err(ResourceError::ReferenceNotFound {
                    kind: ResourceKind::Algo,
                    id: algo_id,
                });
            }
            Err(err) => return Err(backend(err)),
        };

        let id = Uuid::now_v7();
        let primary = self.primary_key(id);
        let reader: BoxReader<'static> = Box::new(StreamReader::new(
            body.into_data_stream().map_err(io::Error::other),
        ));
        self.blobs
            .put(&primary, size, reader)
            .await
            .map_err(|e| self.blob_write_error(id, e))?;

        let record = ResourceRecord {
            kind: self.kind,
            id,
            owner: owner.unwrap_or(algo.owner),
            name: None,
            size,
            algo: Some(algo.id),
            created_at: Utc::now(),
        };
        if let Err(err) = self.insert(&record).await {
            self.discard(&[primary]).await;
            return Err(err);
        }

        info!(id = %record.id, algo = %algo.id, size, "Model created");
        Ok(record)
    }

    pub async fn list(&self) -> Result<Vec<ResourceRecord>, ResourceError> {
        self.records.list(self.kind).await.map_err(backend)
    }

    pub async fn get(&self, raw_id: &str) -> Result<ResourceRecord, ResourceError> {
        let id = parse_id(raw_id)?;
        self.find(id).await
    }

    /// Open a blob of an existing record. A record whose blob is missing is
    /// a backend inconsistency, not a 404.
    #[instrument(skip(self), fields(kind = %self.kind))]
    pub async fn get_blob(
        &self,
        raw_id: &str,
        part: BlobPart,
    ) -> Result<(ResourceRecord, BoxReader<'static>), ResourceError> {
        let record = self.get(raw_id).await?;
        if part == BlobPart::Description && !self.kind.has_description() {
            return Err(ResourceError::NotFound {
                kind: self.kind,
                id: record.id,
            });
        }

        let key = match part {
            BlobPart::Primary => self.primary_key(record.id),
            BlobPart::Description => self.description_key(record.id),
        };
        let reader = self.blobs.get(&key).await.map_err(|e| {
            warn!(key = %key, error = %e, "Blob of committed record unreadable");
            ResourceError::StorageBackend(e.to_string())
        })?;
        Ok((record, reader))
    }

    /// Apply a multipart patch. Only scalar fields and the description can
    /// change; size and the primary blob are immutable.
    #[instrument(skip(self, content_type, body), fields(kind = %self.kind))]
    pub async fn patch(
        &self,
        raw_id: &str,
        content_type: Option<&HeaderValue>,
        body: Body,
    ) -> Result<ResourceRecord, ResourceError> {
        let id = parse_id(raw_id)?;
        let existing = self.find(id).await?;

        let schema = ResourceSchema::patch(self.kind, self.limits);
        let mut decoder = FormDecoder::new(content_type, body, schema)?;
        // The patch schema has no blob field.
        let (fields, _) = decoder.read_fields().await?;
        let changes = schema.validate_patch(fields)?;

        if let Some(requested) = changes.id.filter(|requested| *requested != existing.id) {
            return Err(ResourceError::IdentifierConflict {
                kind: self.kind,
                id: requested,
            });
        }

        let key = self.description_key(id);
        let mut previous_description = None;
        if let Some(description) = changes.description {
            previous_description = Some(self.snapshot(&key).await?);
            let size = description.len() as u64;
            self.blobs
                .replace(&key, size, Box::new(io::Cursor::new(description)))
                .await
                .map_err(ResourceError::BlobWrite)?;
        }

        let patch = RecordPatch {
            owner: changes.owner,
            name: changes.name,
        };
        if patch.is_empty() {
            return Ok(existing);
        }

        let updated = match self.records.update(self.kind, id, &patch).await {
            Ok(updated) => updated,
            Err(err) => {
                if let Some(previous) = previous_description {
                    self.restore(&key, previous).await;
                }
                return Err(match err {
                    RecordError::NotFound { kind, id } => ResourceError::NotFound { kind, id },
                    other => backend(other),
                });
            }
        };
        info!(id = %id, "Resource updated");
        Ok(updated)
    }

    async fn find(&self, id: Uuid) -> Result<ResourceRecord, ResourceError> {
        self.records.get(self.kind, id).await.map_err(|err| match err {
            RecordError::NotFound { kind, id } => ResourceError::NotFound { kind, id },
            other => backend(other),
        })
    }

    async fn ensure_unused(&self, id: Uuid) -> Result<(), ResourceError> {
        match self.records.get(self.kind, id).await {
            Ok(_) => Err(ResourceError::IdentifierConflict { kind: self.kind, id }),
            Err(err) if err.is_not_found() => Ok(()),
            Err(err) => Err(backend(err)),
        }
    }

    async fn insert(&self, record: &ResourceRecord) -> Result<(), ResourceError> {
        self.records.insert(record).await.map_err(|err| match err {
            RecordError::Conflict { kind, id } => ResourceError::IdentifierConflict { kind, id },
            other => backend(other),
        })
    }

    fn blob_write_error(&self, id: Uuid, err: StorageError) -> ResourceError {
        match err {
            StorageError::AlreadyExists(_) => ResourceError::IdentifierConflict { kind: self.kind, id },
            other => ResourceError::BlobWrite(other),
        }
    }

    /// Current content of a blob, `None` if it was never written.
    async fn snapshot(&self, key: &BlobKey) -> Result<Option<Vec<u8>>, ResourceError> {
        match self.blobs.read_all(key).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(ResourceError::StorageBackend(e.to_string())),
        }
    }

    /// Best-effort return of a blob to a snapshot taken by [`Self::snapshot`].
    async fn restore(&self, key: &BlobKey, previous: Option<Vec<u8>>) {
        let result = match previous {
            Some(content) => {
                let size = content.len() as u64;
                self.blobs
                    .replace(key, size, Box::new(io::Cursor::new(content)))
                    .await
            }
            None => self.blobs.delete(key).await.map(|_| ()),
        };
        if let Err(e) = result {
            warn!(key = %key, error = %e, "Failed to restore blob after aborted update");
        }
    }

    /// Best-effort removal of blobs written for a create that did not commit.
    async fn discard(&self, keys: &[BlobKey]) {
        for key in keys {
            if let Err(e) = self.blobs.delete(key).await {
                warn!(key = %key, error = %e, "Failed to remove orphaned blob");
            }
        }
    }
}

fn parse_content_length(value: Option<&HeaderValue>) -> Result<u64, ResourceError> {
    let value =
        value.ok_or_else(|| ResourceError::HeaderParse("missing Content-Length header".into()))?;
    value
        .to_str()
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .ok_or_else(|| ResourceError::HeaderParse("invalid Content-Length header".into()))
}
