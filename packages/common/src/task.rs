use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Queue topics the consumer can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    Learn,
    Test,
    Pred,
}

impl Topic {
    pub const ALL: [Topic; 3] = [Topic::Learn, Topic::Test, Topic::Pred];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Learn => "learn",
            Self::Test => "test",
            Self::Pred => "pred",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Topic {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "learn" => Ok(Self::Learn),
            "test" => Ok(Self::Test),
            "pred" => Ok(Self::Pred),
            _ => Err(format!(
                "Unknown topic: {s}, valid values are learn, test and pred"
            )),
        }
    }
}

/// Validation failure of a decoded task envelope.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TaskCheckError {
    #[error("task id is unset")]
    MissingId,
    #[error("model reference is unset")]
    MissingModel,
    #[error("task references no data")]
    MissingData,
    #[error("data reference #{0} is unset")]
    NilData(usize),
}

/// A training task: fit `model` on every dataset in `data`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearnTask {
    pub id: Uuid,
    pub model: Uuid,
    pub data: Vec<Uuid>,
}

/// A test task: score `model` against every dataset in `data`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestTask {
    pub id: Uuid,
    pub model: Uuid,
    pub data: Vec<Uuid>,
}

/// A prediction task: run `model` on a single dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredTask {
    pub id: Uuid,
    pub model: Uuid,
    pub data: Uuid,
}

fn check_refs(id: Uuid, model: Uuid, data: &[Uuid]) -> Result<(), TaskCheckError> {
    if id.is_nil() {
        return Err(TaskCheckError::MissingId);
    }
    if model.is_nil() {
        return Err(TaskCheckError::MissingModel);
    }
    if data.is_empty() {
        return Err(TaskCheckError::MissingData);
    }
    if let Some(pos) = data.iter().position(Uuid::is_nil) {
        return Err(TaskCheckError::NilData(pos));
    }
    Ok(())
}

impl LearnTask {
    pub fn check(&self) -> Result<(), TaskCheckError> {
        check_refs(self.id, self.model, &self.data)
    }
}

impl TestTask {
    pub fn check(&self) -> Result<(), TaskCheckError> {
        check_refs(self.id, self.model, &self.data)
    }
}

impl PredTask {
    pub fn check(&self) -> Result<(), TaskCheckError> {
        check_refs(self.id, self.model, std::slice::from_ref(&self.data))
    }
}
