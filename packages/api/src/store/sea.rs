use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, DbErr, EntityTrait, QueryOrder, Set, SqlErr,
};
use uuid::Uuid;

use super::{RecordError, RecordStore};
use crate::entity::{algo, data, model, problem};
use crate::models::resource::{RecordPatch, ResourceKind, ResourceRecord};

/// Record store backed by a SeaORM connection (PostgreSQL in production).
#[derive(Clone)]
pub struct SeaOrmRecordStore {
    db: DatabaseConnection,
}

impl SeaOrmRecordStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

impl From<DbErr> for RecordError {
    fn from(err: DbErr) -> Self {
        RecordError::Backend(err.to_string())
    }
}

fn column_size(size: u64) -> Result<i64, RecordError> {
    i64::try_from(size).map_err(|_| RecordError::Backend(format!("size {size} out of range")))
}

fn record_size(size: i64) -> u64 {
    u64::try_from(size).unwrap_or_default()
}

fn insert_error(err: DbErr, record: &ResourceRecord) -> RecordError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            tracing::debug!(kind = %record.kind, id = %record.id, "Insert raced on primary key");
            RecordError::Conflict {
                kind: record.kind,
                id: record.id,
            }
        }
        _ => RecordError::from(err),
    }
}

impl From<problem::Model> for ResourceRecord {
    fn from(m: problem::Model) -> Self {
        Self {
            kind: ResourceKind::Problem,
            id: m.id,
            owner: m.owner,
            name: Some(m.name),
            size: record_size(m.size),
            algo: None,
            created_at: m.created_at,
        }
    }
}

impl From<data::Model> for ResourceRecord {
    fn from(m: data::Model) -> Self {
        Self {
            kind: ResourceKind::Data,
            id: m.id,
            owner: m.owner,
            name: None,
            size: record_size(m.size),
            algo: None,
            created_at: m.created_at,
        }
    }
}

impl From<algo::Model> for ResourceRecord {
    fn from(m: algo::Model) -> Self {
        Self {
            kind: ResourceKind::Algo,
            id: m.id,
            owner: m.owner,
            name: Some(m.name),
            size: record_size(m.size),
            algo: None,
            created_at: m.created_at,
        }
    }
}

impl From<model::Model> for ResourceRecord {
    fn from(m: model::Model) -> Self {
        Self {
            kind: ResourceKind::Model,
            id: m.id,
            owner: m.owner,
            name: None,
            size: record_size(m.size),
            algo: Some(m.algo_id),
            created_at: m.created_at,
        }
    }
}

#[async_trait]
impl RecordStore for SeaOrmRecordStore {
    async fn insert(&self, record: &ResourceRecord) -> Result<(), RecordError> {
        let size = column_size(record.size)?;
        let name = record.name.clone().unwrap_or_default();

        let result = match record.kind {
            ResourceKind::Problem => problem::ActiveModel {
                id: Set(record.id),
                owner: Set(record.owner),
                name: Set(name),
                size: Set(size),
                created_at: Set(record.created_at),
                ..Default::default()
            }
            .insert(&self.db)
            .await
            .map(drop),
            ResourceKind::Data => data::ActiveModel {
                id: Set(record.id),
                owner: Set(record.owner),
                size: Set(size),
                created_at: Set(record.created_at),
                ..Default::default()
            }
            .insert(&self.db)
            .await
            .map(drop),
            ResourceKind::Algo => algo::ActiveModel {
                id: Set(record.id),
                owner: Set(record.owner),
                name: Set(name),
                size: Set(size),
                created_at: Set(record.created_at),
                ..Default::default()
            }
            .insert(&self.db)
            .await
            .map(drop),
            ResourceKind::Model => {
                let algo_id = record.algo.ok_or_else(|| {
                    RecordError::Backend(format!("model {} has no algorithm", record.id))
                })?;
                model::ActiveModel {
                    id: Set(record.id),
                    algo_id: Set(algo_id),
                    owner: Set(record.owner),
                    size: Set(size),
                    created_at: Set(record.created_at),
                    ..Default::default()
                }
                .insert(&self.db)
                .await
                .map(drop)
            }
        };

        result.map_err(|e| insert_error(e, record))
    }

    async fn get(&self, kind: ResourceKind, id: Uuid) -> Result<ResourceRecord, RecordError> {
        let found = match kind {
            ResourceKind::Problem => problem::Entity::find_by_id(id)
                .one(&self.db)
                .await?
                .map(ResourceRecord::from),
            ResourceKind::Data => data::Entity::find_by_id(id)
                .one(&self.db)
                .await?
                .map(ResourceRecord::from),
            ResourceKind::Algo => algo::Entity::find_by_id(id)
                .one(&self.db)
                .await?
                .map(ResourceRecord::from),
            ResourceKind::Model => model::Entity::find_by_id(id)
                .one(&self.db)
                .await?
                .map(ResourceRecord::from),
        };
        found.ok_or(RecordError::NotFound { kind, id })
    }

    async fn list(&self, kind: ResourceKind) -> Result<Vec<ResourceRecord>, RecordError> {
        let records = match kind {
            ResourceKind::Problem => problem::Entity::find()
                .order_by_asc(problem::Column::CreatedAt)
                .order_by_asc(problem::Column::Id)
                .all(&self.db)
                .await?
                .into_iter()
                .map(ResourceRecord::from)
                .collect(),
            ResourceKind::Data => data::Entity::find()
                .order_by_asc(data::Column::CreatedAt)
                .order_by_asc(data::Column::Id)
                .all(&self.db)
                .await?
                .into_iter()
                .map(ResourceRecord::from)
                .collect(),
            ResourceKind::Algo => algo::Entity::find()
                .order_by_asc(algo::Column::CreatedAt)
                .order_by_asc(algo::Column::Id)
                .all(&self.db)
                .await?
                .into_iter()
                .map(ResourceRecord::from)
                .collect(),
            ResourceKind::Model => model::Entity::find()
                .order_by_asc(model::Column::CreatedAt)
                .order_by_asc(model::Column::Id)
                .all(&self.db)
                .await?
                .into_iter()
                .map(ResourceRecord::from)
                .collect(),
        };
        Ok(records)
    }

    async fn update(
        &self,
        kind: ResourceKind,
        id: Uuid,
        patch: &RecordPatch,
    ) -> Result<ResourceRecord, RecordError> {
        let not_found = || RecordError::NotFound { kind, id };

        let updated = match kind {
            ResourceKind::Problem => {
                let existing = problem::Entity::find_by_id(id)
                    .one(&self.db)
                    .await?
                    .ok_or_else(not_found)?;
                let mut active: problem::ActiveModel = existing.into();
                if let Some(owner) = patch.owner {
                    active.owner = Set(owner);
                }
                if let Some(ref name) = patch.name {
                    active.name = Set(name.clone());
                }
                ResourceRecord::from(active.update(&self.db).await?)
            }
            ResourceKind::Algo => {
                let existing = algo::Entity::find_by_id(id)
                    .one(&self.db)
                    .await?
                    .ok_or_else(not_found)?;
                let mut active: algo::ActiveModel = existing.into();
                if let Some(owner) = patch.owner {
                    active.owner = Set(owner);
                }
                if let Some(ref name) = patch.name {
                    active.name = Set(name.clone());
                }
                ResourceRecord::from(active.update(&self.db).await?)
            }
            ResourceKind::Data => {
                let existing = data::Entity::find_by_id(id)
                    .one(&self.db)
                    .await?
                    .ok_or_else(not_found)?;
                let mut active: data::ActiveModel = existing.into();
                if let Some(owner) = patch.owner {
                    active.owner = Set(owner);
                }
                ResourceRecord::from(active.update(&self.db).await?)
            }
            ResourceKind::Model => {
                let existing = model::Entity::find_by_id(id)
                    .one(&self.db)
                    .await?
                    .ok_or_else(not_found)?;
                let mut active: model::ActiveModel = existing.into();
                if let Some(owner) = patch.owner {
                    active.owner = Set(owner);
                }
                ResourceRecord::from(active.update(&self.db).await?)
            }
        };
        Ok(updated)
    }
}
