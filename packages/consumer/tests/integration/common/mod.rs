use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use consumer::{BackendError, Dispatcher, ExecutionBackend, HandlerError, OutcomeNotifier, TaskOutcome};
use ::common::RetryPolicy;
use serde_json::{Value, json};
use uuid::Uuid;

/// Backend replaying scripted results, then succeeding with `1.0`.
#[derive(Default)]
pub struct ScriptedBackend {
    script: Mutex<VecDeque<Result<f64, String>>>,
    calls: AtomicUsize,
}

impl ScriptedBackend {
    pub fn new(script: Vec<Result<f64, String>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn next(&self) -> Result<f64, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.script.lock().unwrap().pop_front() {
            Some(Ok(value)) => Ok(value),
            Some(Err(message)) => Err(BackendError::Other(message)),
            None => Ok(1.0),
        }
    }
}

#[async_trait]
impl ExecutionBackend for ScriptedBackend {
    async fn train(&self, _model: Uuid, _data: &[Uuid]) -> Result<f64, BackendError> {
        self.next()
    }

    async fn test(&self, _model: Uuid, _data: &[Uuid]) -> Result<f64, BackendError> {
        self.next()
    }

    async fn predict(&self, _model: Uuid, _data: Uuid) -> Result<f64, BackendError> {
        self.next()
    }
}

/// Notifier keeping every outcome it receives.
#[derive(Default)]
pub struct RecordingNotifier {
    outcomes: Mutex<Vec<TaskOutcome>>,
}

impl RecordingNotifier {
    pub fn outcomes(&self) -> Vec<TaskOutcome> {
        self.outcomes.lock().unwrap().clone()
    }
}

#[async_trait]
impl OutcomeNotifier for RecordingNotifier {
    async fn notify(&self, outcome: &TaskOutcome) -> Result<(), HandlerError> {
        self.outcomes.lock().unwrap().push(outcome.clone());
        Ok(())
    }
}

pub type TestDispatcher = Dispatcher<ScriptedBackend, RecordingNotifier>;

/// Zero backoff so retries run immediately.
pub fn policy(max_retries: u8, retry_backend_errors: bool) -> RetryPolicy {
    RetryPolicy {
        max_retries,
        base_delay_ms: 0,
        max_delay_ms: 0,
        retry_backend_errors,
    }
}

pub fn dispatcher(
    script: Vec<Result<f64, String>>,
    policy: RetryPolicy,
) -> TestDispatcher {
    Dispatcher::new(ScriptedBackend::new(script), RecordingNotifier::default(), policy)
}

pub fn learn_payload() -> Value {
    json!({
        "id": Uuid::new_v4(),
        "model": Uuid::new_v4(),
        "data": [Uuid::new_v4()],
    })
}

pub fn pred_payload() -> Value {
    json!({
        "id": Uuid::new_v4(),
        "model": Uuid::new_v4(),
        "data": Uuid::new_v4(),
    })
}
