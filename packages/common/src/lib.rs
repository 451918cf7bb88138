pub mod config;
pub mod retry;
pub mod storage;
pub mod task;

pub use retry::{RetryDecision, RetryHistory, RetryPolicy};
pub use task::{LearnTask, PredTask, TaskCheckError, TestTask, Topic};
