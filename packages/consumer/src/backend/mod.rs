//! Execution backends run the actual computation of a task.

pub mod process;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::BackendError;

pub use process::ProcessBackend;

#[async_trait]
pub trait ExecutionBackend: Send + Sync {
    /// Train `model` on `data` and return the training score.
    async fn train(&self, model: Uuid, data: &[Uuid]) -> Result<f64, BackendError>;

    /// Score `model` against `data`.
    async fn test(&self, model: Uuid, data: &[Uuid]) -> Result<f64, BackendError>;

    /// Run `model` on a single dataset and return the prediction.
    async fn predict(&self, model: Uuid, data: Uuid) -> Result<f64, BackendError>;
}
