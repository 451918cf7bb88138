//! Record persistence for resource metadata.
//!
//! Handlers and services only see [`RecordStore`]; the SeaORM store backs
//! production and the in-memory store backs tests and local runs.

mod memory;
mod sea;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::resource::{RecordPatch, ResourceKind, ResourceRecord};

pub use memory::MemoryRecordStore;
pub use sea::SeaOrmRecordStore;

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("{kind} {id} not found")]
    NotFound { kind: ResourceKind, id: Uuid },

    #[error("{kind} {id} already exists")]
    Conflict { kind: ResourceKind, id: Uuid },

    #[error("record backend error: {0}")]
    Backend(String),
}

impl RecordError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Durable metadata storage keyed by `(kind, id)`.
///
/// `insert` never replaces an existing row, so two concurrent creates with
/// the same identifier resolve to exactly one success and one
/// [`RecordError::Conflict`].
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn insert(&self, record: &ResourceRecord) -> Result<(), RecordError>;

    async fn get(&self, kind: ResourceKind, id: Uuid) -> Result<ResourceRecord, RecordError>;

    /// All records of `kind`, oldest first.
    async fn list(&self, kind: ResourceKind) -> Result<Vec<ResourceRecord>, RecordError>;

    /// Apply `patch` to an existing record and return the updated row.
    async fn update(
        &self,
        kind: ResourceKind,
        id: Uuid,
        patch: &RecordPatch,
    ) -> Result<ResourceRecord, RecordError>;
}
