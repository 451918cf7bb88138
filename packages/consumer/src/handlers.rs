use common::{LearnTask, PredTask, RetryPolicy, TaskCheckError, TestTask, Topic};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::instrument;

use crate::backend::ExecutionBackend;
use crate::error::{BackendError, HandlerError};
use crate::notifier::{OutcomeNotifier, TaskOutcome};

/// Decodes task envelopes and runs them on an execution backend.
pub struct TaskHandler<B, N> {
    backend: B,
    notifier: N,
    retry_backend_errors: bool,
}

fn label(topic: Topic) -> &'static str {
    match topic {
        Topic::Learn => "train",
        Topic::Test => "test",
        Topic::Pred => "prediction",
    }
}

fn decode<T: DeserializeOwned>(topic: Topic, payload: &Value) -> Result<T, HandlerError> {
    T::deserialize(payload).map_err(|e| {
        HandlerError::fatal(format!(
            "Error un-marshaling {} task: {e} -- Body: {payload}",
            label(topic)
        ))
    })
}

impl<B: ExecutionBackend, N: OutcomeNotifier> TaskHandler<B, N> {
    pub fn new(backend: B, notifier: N, policy: &RetryPolicy) -> Self {
        Self {
            backend,
            notifier,
            retry_backend_errors: policy.retry_backend_errors,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Run one message of `topic`. Decode and validation failures are always
    /// fatal.
    #[instrument(skip(self, payload))]
    pub async fn handle(&self, topic: Topic, payload: &Value) -> Result<TaskOutcome, HandlerError> {
        let invalid = |e: TaskCheckError| {
            HandlerError::fatal(format!("Error in {} task: {e} -- Body: {payload}", label(topic)))
        };

        let outcome = match topic {
            Topic::Learn => {
                let task: LearnTask = decode(topic, payload)?;
                task.check().map_err(invalid)?;
                let score = self
                    .backend
                    .train(task.model, &task.data)
                    .await
                    .map_err(|e| self.backend_error(topic, e))?;
                TaskOutcome {
                    topic,
                    task: task.id,
                    model: task.model,
                    value: score,
                }
            }
            Topic::Test => {
                let task: TestTask = decode(topic, payload)?;
                task.check().map_err(invalid)?;
                let score = self
                    .backend
                    .test(task.model, &task.data)
                    .await
                    .map_err(|e| self.backend_error(topic, e))?;
                TaskOutcome {
                    topic,
                    task: task.id,
                    model: task.model,
                    value: score,
                }
            }
            Topic::Pred => {
                let task: PredTask = decode(topic, payload)?;
                task.check().map_err(invalid)?;
                let prediction = self
                    .backend
                    .predict(task.model, task.data)
                    .await
                    .map_err(|e| self.backend_error(topic, e))?;
                TaskOutcome {
                    topic,
                    task: task.id,
                    model: task.model,
                    value: prediction,
                }
            }
        };

        self.notifier.notify(&outcome).await?;
        Ok(outcome)
    }

    fn backend_error(&self, topic: Topic, err: BackendError) -> HandlerError {
        let message = format!("Error in {} task: {err}", label(topic));
        if self.retry_backend_errors {
            HandlerError::retryable(message)
        } else {
            HandlerError::fatal(message)
        }
    }
}
