use common::{RetryDecision, RetryHistory, RetryPolicy, Topic};
use serde_json::Value;
use tracing::{error, info, warn};

use crate::backend::ExecutionBackend;
use crate::error::ErrorKind;
use crate::handlers::TaskHandler;
use crate::notifier::{OutcomeNotifier, TaskOutcome};

/// Final state of one queue message. Every variant acknowledges the message.
#[derive(Debug, Clone, PartialEq)]
pub enum Disposition {
    Completed(TaskOutcome),
    /// A fatal error; the message is dropped without retry.
    Dropped { reason: String },
    /// Retryable failures used up the retry policy.
    /// Carries the error of every attempt, oldest first.
    Exhausted { attempts: usize, errors: Vec<String> },
}

/// Runs messages through a [`TaskHandler`] and applies the retry policy.
pub struct Dispatcher<B, N> {
    handler: TaskHandler<B, N>,
    policy: RetryPolicy,
}

impl<B: ExecutionBackend, N: OutcomeNotifier> Dispatcher<B, N> {
    pub fn new(backend: B, notifier: N, policy: RetryPolicy) -> Self {
        Self {
            handler: TaskHandler::new(backend, notifier, &policy),
            policy,
        }
    }

    pub fn handler(&self) -> &TaskHandler<B, N> {
        &self.handler
    }

    pub async fn dispatch(&self, topic: Topic, message_id: &str, payload: &Value) -> Disposition {
        let mut history = RetryHistory::new();

        loop {
            let err = match self.handler.handle(topic, payload).await {
                Ok(outcome) => {
                    info!(message_id, %topic, attempts = history.len() + 1, "Task completed");
                    return Disposition::Completed(outcome);
                }
                Err(err) => err,
            };

            if err.kind == ErrorKind::Fatal {
                error!(message_id, %topic, error = %err, "Dropping message after fatal error");
                return Disposition::Dropped {
                    reason: err.message,
                };
            }

            match history.record_failure(&self.policy, &err.message) {
                RetryDecision::Retry { attempt, delay } => {
                    warn!(
                        message_id,
                        %topic,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Retrying task"
                    );
                    tokio::time::sleep(delay).await;
                }
                RetryDecision::Exhausted => {
                    let failures = history.attempts();
                    let errors: Vec<String> = failures.iter().map(|a| a.error.clone()).collect();
                    error!(
                        message_id,
                        %topic,
                        retry_count = failures.len(),
                        first_failure_at = ?failures.first().map(|a| a.timestamp),
                        errors = ?errors,
                        "Max retries exhausted, dropping message"
                    );
                    return Disposition::Exhausted {
                        attempts: failures.len(),
                        errors,
                    };
                }
            }
        }
    }
}
