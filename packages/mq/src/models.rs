pub use broccoli_queue::{brokers::broker::BrokerMessage, error::BroccoliError, queue::BroccoliQueue};
use common::config::MqAppConfig;
use tracing::info;

use crate::error::MqError;

pub type MqQueue = BroccoliQueue;

/// Queue payloads are consumed undecoded so the handler owns decode failures.
pub type RawMessage = BrokerMessage<serde_json::Value>;

pub struct MqConfig {
    pub url: String,
    pub pool_size: u8,
}

impl From<&MqAppConfig> for MqConfig {
    fn from(config: &MqAppConfig) -> Self {
        Self {
            url: config.url.clone(),
            pool_size: config.pool_size,
        }
    }
}

pub async fn init_mq(config: MqConfig) -> Result<MqQueue, MqError> {
    if config.pool_size == 0 {
        return Err(MqError::Config("pool_size must be at least 1".into()));
    }

    let queue = BroccoliQueue::builder(&config.url)
        .pool_connections(config.pool_size)
        .build()
        .await?;

    info!(pool_size = config.pool_size, "Connected to message broker");
    Ok(queue)
}
