use async_trait::async_trait;
use common::Topic;
use tracing::info;
use uuid::Uuid;

use crate::error::HandlerError;

/// Result of a task that ran to completion.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskOutcome {
    pub topic: Topic,
    pub task: Uuid,
    pub model: Uuid,
    /// Score for learn and test tasks, prediction for pred tasks.
    pub value: f64,
}

/// Receives finished tasks. Reporting to an orchestrator plugs in here.
#[async_trait]
pub trait OutcomeNotifier: Send + Sync {
    async fn notify(&self, outcome: &TaskOutcome) -> Result<(), HandlerError>;
}

/// Logs every outcome and reports nothing further.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl OutcomeNotifier for LogNotifier {
    async fn notify(&self, outcome: &TaskOutcome) -> Result<(), HandlerError> {
        match outcome.topic {
            Topic::Learn => info!(task = %outcome.task, model = %outcome.model, score = outcome.value, "Train finished"),
            Topic::Test => info!(task = %outcome.task, model = %outcome.model, score = outcome.value, "Test finished"),
            Topic::Pred => info!(task = %outcome.task, model = %outcome.model, prediction = outcome.value, "Prediction finished"),
        }
        Ok(())
    }
}
