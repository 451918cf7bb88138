use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use uuid::Uuid;

use super::{RecordError, RecordStore};
use crate::models::resource::{RecordPatch, ResourceKind, ResourceRecord};

/// Record store held entirely in process memory.
#[derive(Default)]
pub struct MemoryRecordStore {
    records: DashMap<(ResourceKind, Uuid), ResourceRecord>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn insert(&self, record: &ResourceRecord) -> Result<(), RecordError> {
        match self.records.entry((record.kind, record.id)) {
            Entry::Occupied(_) => Err(RecordError::Conflict {
                kind: record.kind,
                id: record.id,
            }),
            Entry::Vacant(slot) => {
                slot.insert(record.clone());
                Ok(())
            }
        }
    }

    async fn get(&self, kind: ResourceKind, id: Uuid) -> Result<ResourceRecord, RecordError> {
        self.records
            .get(&(kind, id))
            .map(|r| r.value().clone())
            .ok_or(RecordError::NotFound { kind, id })
    }

    async fn list(&self, kind: ResourceKind) -> Result<Vec<ResourceRecord>, RecordError> {
        let mut records: Vec<ResourceRecord> = self
            .records
            .iter()
            .filter(|entry| entry.key().0 == kind)
            .map(|entry| entry.value().clone())
            .collect();
        records.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(records)
    }

    async fn update(
        &self,
        kind: ResourceKind,
        id: Uuid,
        patch: &RecordPatch,
    ) -> Result<ResourceRecord, RecordError> {
        let mut entry = self
            .records
            .get_mut(&(kind, id))
            .ok_or(RecordError::NotFound { kind, id })?;
        patch.apply(entry.value_mut());
        Ok(entry.value().clone())
    }
}
