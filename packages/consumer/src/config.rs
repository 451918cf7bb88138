use std::path::PathBuf;

use common::{RetryPolicy, Topic};
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Deserializer};

pub use common::config::MqAppConfig;

/// Execution backend settings.
#[derive(Debug, Deserialize, Clone)]
pub struct BackendConfig {
    /// Executable invoked once per task. Default: "morpheo-compute".
    #[serde(default = "default_program")]
    pub program: String,
    /// Arguments placed before the operation, e.g. a script path.
    #[serde(default)]
    pub args: Vec<String>,
    /// Directory handed to the executable for datasets and models. Default: "/data".
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

fn default_program() -> String {
    "morpheo-compute".into()
}
fn default_data_dir() -> PathBuf {
    PathBuf::from("/data")
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            args: Vec::new(),
            data_dir: default_data_dir(),
        }
    }
}

/// Consumer-specific configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct ConsumerConfig {
    /// Identifier used in logs. Default: "consumer-1".
    #[serde(default = "default_consumer_id")]
    pub id: String,
    /// Topic to subscribe to. Default: learn.
    #[serde(
        default = "default_topic",
        deserialize_with = "deserialize_topic"
    )]
    pub topic: Topic,
    /// Messages handled concurrently. Default: 1.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default)]
    pub retry: RetryPolicy,
    #[serde(default)]
    pub backend: BackendConfig,
}

fn default_consumer_id() -> String {
    "consumer-1".into()
}
fn default_topic() -> Topic {
    Topic::Learn
}
fn default_concurrency() -> usize {
    1
}

fn deserialize_topic<'de, D>(deserializer: D) -> Result<Topic, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    raw.parse().map_err(serde::de::Error::custom)
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            id: default_consumer_id(),
            topic: default_topic(),
            concurrency: default_concurrency(),
            retry: RetryPolicy::default(),
            backend: BackendConfig::default(),
        }
    }
}

/// Consumer application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct ConsumerAppConfig {
    #[serde(default)]
    pub consumer: ConsumerConfig,
    #[serde(default)]
    pub mq: MqAppConfig,
}

impl ConsumerAppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var("MORPHEO_CONFIG").unwrap_or_else(|_| "config/config".to_string());

        let s = Config::builder()
            .set_default("consumer.id", "consumer-1")?
            .set_default("consumer.topic", "learn")?
            .set_default("consumer.concurrency", 1_i64)?
            .set_default("mq.url", "redis://localhost:6379")?
            .set_default("mq.pool_size", 5_i64)?
            .add_source(File::with_name(&config_path).required(false))
            .add_source(Environment::with_prefix("MORPHEO").separator("__"))
            .build()?;

        let config: Self = s.try_deserialize()?;
        if config.consumer.concurrency == 0 {
            return Err(ConfigError::Message(
                "consumer.concurrency must be at least 1".into(),
            ));
        }
        Ok(config)
    }
}
