use std::sync::Arc;

use common::storage::BlobStore;

use crate::config::AppConfig;
use crate::models::resource::ResourceKind;
use crate::services::ResourceService;
use crate::store::RecordStore;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub records: Arc<dyn RecordStore>,
    pub blobs: Arc<dyn BlobStore>,
}

impl AppState {
    pub fn resources(&self, kind: ResourceKind) -> ResourceService {
        ResourceService::new(
            kind,
            self.records.clone(),
            self.blobs.clone(),
            self.config.ingest.limits(),
        )
    }
}
