use std::path::PathBuf;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, instrument};
use uuid::Uuid;

use super::ExecutionBackend;
use crate::config::BackendConfig;
use crate::error::BackendError;

/// Runs one external process per task:
/// `<program> [args..] <train|test|predict> --model <id> --data <id>... --data-dir <dir>`.
///
/// The last non-empty line of stdout is the score or prediction.
#[derive(Debug, Clone)]
pub struct ProcessBackend {
    program: String,
    args: Vec<String>,
    data_dir: PathBuf,
}

impl ProcessBackend {
    pub fn new(program: impl Into<String>, args: Vec<String>, data_dir: PathBuf) -> Self {
        Self {
            program: program.into(),
            args,
            data_dir,
        }
    }

    #[instrument(skip(self, data), fields(program = %self.program, data = data.len()))]
    async fn run(&self, operation: &str, model: Uuid, data: &[Uuid]) -> Result<f64, BackendError> {
        let mut command = Command::new(&self.program);
        command.args(&self.args).arg(operation);
        command.arg("--model").arg(model.to_string());
        for id in data {
            command.arg("--data").arg(id.to_string());
        }
        command.arg("--data-dir").arg(&self.data_dir);

        let output = command
            .output()
            .await
            .map_err(|source| BackendError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(BackendError::Failed {
                program: self.program.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let value = parse_last_line(&stdout)?;
        debug!(value, "Backend finished");
        Ok(value)
    }
}

impl From<&BackendConfig> for ProcessBackend {
    fn from(config: &BackendConfig) -> Self {
        Self::new(
            config.program.clone(),
            config.args.clone(),
            config.data_dir.clone(),
        )
    }
}

fn parse_last_line(stdout: &str) -> Result<f64, BackendError> {
    let line = stdout
        .lines()
        .map(str::trim)
        .rfind(|l| !l.is_empty())
        .ok_or_else(|| BackendError::InvalidOutput("empty output".into()))?;
    line.parse::<f64>()
        .map_err(|_| BackendError::InvalidOutput(format!("'{line}' is not a number")))
}

#[async_trait]
impl ExecutionBackend for ProcessBackend {
    async fn train(&self, model: Uuid, data: &[Uuid]) -> Result<f64, BackendError> {
        self.run("train", model, data).await
    }

    async fn test(&self, model: Uuid, data: &[Uuid]) -> Result<f64, BackendError> {
        self.run("test", model, data).await
    }

    async fn predict(&self, model: Uuid, data: Uuid) -> Result<f64, BackendError> {
        self.run("predict", model, std::slice::from_ref(&data)).await
    }
}
